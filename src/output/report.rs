//! Classification report assembled for display

use crate::processing::classifier::{RoleClassifier, Selection, SelectionOutcome};
use crate::processing::scoring::{KeywordMatchCount, RoleBreakdown, RoleScore};
use crate::processing::templates::TemplateKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a caller needs to show or act on one classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub role: String,
    pub display_name: String,
    pub selection: Selection,
    pub breakdown: RoleBreakdown,
    pub scores: RoleScore,
    /// Matched keywords per role, roles without hits left out
    pub matched_keywords: KeywordMatchCount,
    pub templates: TemplatePaths,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatePaths {
    pub cv: Option<String>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub matcher: String,
    pub text_length: usize,
}

impl ClassificationReport {
    pub fn build(classifier: &RoleClassifier, text: &str, threshold: f64) -> Self {
        let selection = classifier.select(text);
        let breakdown = classifier.breakdown(text, threshold);

        let counts = classifier.keyword_counts(text);
        let scores = classifier.scores(text);
        let matched_keywords: KeywordMatchCount = counts
            .into_iter()
            .filter(|(_, hits)| !hits.is_empty())
            .collect();

        let display_name = classifier
            .catalog()
            .get(&selection.role)
            .map(|r| r.display_name.clone())
            .unwrap_or_else(|| selection.role.clone());

        let store = classifier.template_store();
        let templates = TemplatePaths {
            cv: store
                .resolve_usable(&selection.role, TemplateKind::Cv)
                .map(|r| r.path.display().to_string()),
            cover_letter: store
                .resolve_usable(&selection.role, TemplateKind::CoverLetter)
                .map(|r| r.path.display().to_string()),
        };

        Self {
            role: selection.role.clone(),
            display_name,
            selection,
            breakdown,
            scores,
            matched_keywords,
            templates,
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                matcher: classifier.matcher_name().to_string(),
                text_length: text.chars().count(),
            },
        }
    }

    pub fn is_renderable(&self) -> bool {
        self.selection.is_renderable()
    }

    /// Short human description of how the role was chosen
    pub fn outcome_summary(&self) -> String {
        match &self.selection.outcome {
            SelectionOutcome::Matched => "best-scoring role passed all checks".to_string(),
            SelectionOutcome::Redirected { from } => {
                format!("'{}' lacked its distinguishing keywords; broader role used", from)
            }
            SelectionOutcome::DefaultRole => {
                "no scored role qualified; default role used".to_string()
            }
            SelectionOutcome::FirstAvailable => {
                "default role has no template; first role with a template used".to_string()
            }
            SelectionOutcome::NoTemplates => "no role has a usable CV template".to_string(),
        }
    }

    /// Matched keywords of the selected role, most frequent first
    pub fn selected_keywords(&self) -> Vec<(&str, usize)> {
        let mut hits: Vec<(&str, usize)> = self
            .matched_keywords
            .get(&self.role)
            .map(|m: &BTreeMap<String, usize>| m.iter().map(|(k, c)| (k.as_str(), *c)).collect())
            .unwrap_or_default();
        hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::catalog::RoleCatalog;
    use crate::processing::templates::MemoryTemplateStore;
    use std::sync::Arc;

    #[test]
    fn test_report_reflects_selection() {
        let catalog = Arc::new(RoleCatalog::builtin());
        let store = Arc::new(MemoryTemplateStore::for_catalog(&catalog));
        let classifier = RoleClassifier::new(catalog, store);

        let report = ClassificationReport::build(&classifier, "Android Kotlin Kotlin Gradle", 5.0);

        assert_eq!(report.role, "android_developer");
        assert_eq!(report.display_name, "Android Developer");
        assert!(report.is_renderable());
        assert!(report.templates.cv.is_some());
        assert!(report.templates.cover_letter.is_some());
        assert_eq!(report.selected_keywords()[0], ("kotlin", 2));
        assert_eq!(report.matched_keywords.len(), 1);
        assert_eq!(report.metadata.matcher, "substring");
    }
}
