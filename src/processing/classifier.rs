//! Role classification with template and content-alignment gating

use crate::config::{ClassifierSettings, Config};
use crate::error::Result;
use crate::processing::catalog::{RoleCatalog, RoleCategory};
use crate::processing::keyword_matcher::{KeywordMatcher, SubstringMatcher};
use crate::processing::scoring::{
    build_breakdown, count_keywords, normalize, rank_roles, score_roles, KeywordMatchCount,
    RoleBreakdown, RolePercentage, RoleScore,
};
use crate::processing::templates::{FsTemplateStore, TemplateKind, TemplateStore};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Why a candidate was accepted or skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum GateOutcome {
    Accepted,
    TemplateMissing { path: String },
    Misaligned { distinct_hits: usize, required: usize },
    BelowShare { percentage: f64, min_share: f64 },
}

impl GateOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateOutcome::Accepted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateVerdict {
    pub role: String,
    pub score: f64,
    pub percentage: f64,
    pub gate: GateOutcome,
}

/// How the selected role was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionOutcome {
    /// A scored candidate passed every gate
    Matched,
    /// A narrow role was misaligned and its broader sibling took over
    Redirected { from: String },
    /// Nothing qualified; the configured default role was used
    DefaultRole,
    /// The default had no template; first role with one was used
    FirstAvailable,
    /// No role has a usable template at all
    NoTemplates,
}

/// Selected role plus the trace that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub role: String,
    pub outcome: SelectionOutcome,
    /// Candidates in the order they were evaluated
    pub candidates: Vec<CandidateVerdict>,
}

impl Selection {
    /// False when no template exists for any role; callers should treat
    /// that as a configuration failure
    pub fn is_renderable(&self) -> bool {
        self.outcome != SelectionOutcome::NoTemplates
    }
}

/// Result of the content-alignment gate for one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentCheck {
    pub distinct_hits: usize,
    pub required: usize,
}

impl AlignmentCheck {
    pub fn passed(&self) -> bool {
        self.distinct_hits >= self.required
    }
}

/// Maps job-description text to one role category.
///
/// Holds no mutable state; every call works from the shared catalog and the
/// input text, so one instance can serve concurrent callers.
pub struct RoleClassifier {
    catalog: Arc<RoleCatalog>,
    store: Arc<dyn TemplateStore>,
    matcher: Box<dyn KeywordMatcher>,
    settings: ClassifierSettings,
}

impl RoleClassifier {
    pub fn new(catalog: Arc<RoleCatalog>, store: Arc<dyn TemplateStore>) -> Self {
        Self {
            catalog,
            store,
            matcher: Box::new(SubstringMatcher),
            settings: ClassifierSettings::default(),
        }
    }

    /// Classifier over the configured catalog and template directory
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with_templates(config, config.templates.templates_dir.clone())
    }

    pub fn from_config_with_templates(config: &Config, templates_dir: PathBuf) -> Result<Self> {
        let catalog = Arc::new(config.catalog()?);
        let store = Arc::new(FsTemplateStore::new(templates_dir, catalog.clone()));
        Ok(Self::new(catalog, store)
            .with_matcher_box(config.classifier.matcher.build())
            .with_settings(config.classifier.clone()))
    }

    pub fn with_matcher(self, matcher: impl KeywordMatcher + 'static) -> Self {
        self.with_matcher_box(Box::new(matcher))
    }

    pub fn with_matcher_box(mut self, matcher: Box<dyn KeywordMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_settings(mut self, settings: ClassifierSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    pub fn template_store(&self) -> &dyn TemplateStore {
        self.store.as_ref()
    }

    pub fn matcher_name(&self) -> &'static str {
        self.matcher.name()
    }

    pub fn display_names(&self) -> Vec<(&str, &str)> {
        self.catalog.display_names()
    }

    pub fn keyword_counts(&self, text: &str) -> KeywordMatchCount {
        count_keywords(&self.catalog, self.matcher.as_ref(), text)
    }

    pub fn scores(&self, text: &str) -> RoleScore {
        score_roles(&self.catalog, &self.keyword_counts(text))
    }

    pub fn percentages(&self, text: &str) -> RolePercentage {
        normalize(&self.scores(text))
    }

    /// Percentages at or above `threshold`, highest first. A top share below
    /// the mixed-role threshold is logged and flagged on the result, whether
    /// or not `threshold` hides it.
    pub fn breakdown(&self, text: &str, threshold: f64) -> RoleBreakdown {
        let percentages = self.percentages(text);
        let breakdown = build_breakdown(
            &self.catalog,
            &percentages,
            threshold,
            self.settings.mixed_role_threshold,
        );

        if breakdown.mixed_role {
            if let Some((top, share)) = rank_roles(&self.catalog, &percentages).first() {
                warn!(
                    "Mixed role: top category '{}' holds only {:.1}% (< {:.0}%)",
                    top.key, share, self.settings.mixed_role_threshold
                );
            }
        }

        breakdown
    }

    /// Breakdown using the configured threshold
    pub fn default_breakdown(&self, text: &str) -> RoleBreakdown {
        self.breakdown(text, self.settings.breakdown_threshold)
    }

    /// The selected role key. Always a key from the catalog.
    pub fn classify(&self, text: &str) -> String {
        self.select(text).role
    }

    /// Count a role's distinguishing keywords against its alignment rule.
    /// `None` when the role has no rule.
    pub fn check_alignment(&self, role: &RoleCategory, text: &str) -> Option<AlignmentCheck> {
        let rule = role.alignment.as_ref()?;
        let distinct_hits = self.matcher.count(text, &rule.distinguishing_keywords).len();
        Some(AlignmentCheck {
            distinct_hits,
            required: rule.required_hits(role.keywords.len()),
        })
    }

    pub fn select(&self, text: &str) -> Selection {
        let scores = self.scores(text);
        let percentages = normalize(&scores);
        let ranked = rank_roles(&self.catalog, &scores);

        let mut candidates = Vec::new();
        let mut evaluated: HashSet<&str> = HashSet::new();

        for (role, score) in &ranked {
            if *score <= 0.0 {
                break;
            }
            if !evaluated.insert(role.key.as_str()) {
                continue;
            }

            let percentage = percentages.get(&role.key).copied().unwrap_or(0.0);
            let gate = self.evaluate_gates(role, text, percentage);
            let accepted = gate.is_accepted();
            let misaligned = matches!(gate, GateOutcome::Misaligned { .. });
            candidates.push(CandidateVerdict {
                role: role.key.clone(),
                score: *score,
                percentage,
                gate,
            });

            if accepted {
                info!("Selected role '{}' ({:.1}%)", role.key, percentage);
                return Selection {
                    role: role.key.clone(),
                    outcome: SelectionOutcome::Matched,
                    candidates,
                };
            }

            if !misaligned {
                continue;
            }

            let sibling = role
                .alignment
                .as_ref()
                .and_then(|rule| rule.sibling.as_deref())
                .and_then(|key| self.catalog.get(key));

            if let Some(sibling) = sibling {
                let sibling_score = scores.get(&sibling.key).copied().unwrap_or(0.0);
                if sibling_score > 0.0 && evaluated.insert(sibling.key.as_str()) {
                    let sibling_percentage = percentages.get(&sibling.key).copied().unwrap_or(0.0);
                    let gate = self.evaluate_gates(sibling, text, sibling_percentage);
                    let accepted = gate.is_accepted();
                    candidates.push(CandidateVerdict {
                        role: sibling.key.clone(),
                        score: sibling_score,
                        percentage: sibling_percentage,
                        gate,
                    });

                    if accepted {
                        info!(
                            "Selected role '{}' in place of misaligned '{}'",
                            sibling.key, role.key
                        );
                        return Selection {
                            role: sibling.key.clone(),
                            outcome: SelectionOutcome::Redirected { from: role.key.clone() },
                            candidates,
                        };
                    }
                }
            }
        }

        let (role, outcome) = self.fallback();
        debug!("No scored candidate qualified; falling back to '{}' ({:?})", role, outcome);
        Selection {
            role,
            outcome,
            candidates,
        }
    }

    fn evaluate_gates(&self, role: &RoleCategory, text: &str, percentage: f64) -> GateOutcome {
        if self.store.resolve_usable(&role.key, TemplateKind::Cv).is_none() {
            let path = self.store.describe(&role.key, TemplateKind::Cv);
            warn!("Skipping role '{}': CV template missing or unusable at {}", role.key, path);
            return GateOutcome::TemplateMissing { path };
        }

        if let Some(check) = self.check_alignment(role, text) {
            if !check.passed() {
                warn!(
                    "Skipping role '{}': only {} of {} required distinguishing keywords present",
                    role.key, check.distinct_hits, check.required
                );
                return GateOutcome::Misaligned {
                    distinct_hits: check.distinct_hits,
                    required: check.required,
                };
            }
        }

        if let Some(min_share) = role.min_share {
            if percentage < min_share {
                debug!(
                    "Skipping role '{}': share {:.1}% below required {:.1}%",
                    role.key, percentage, min_share
                );
                return GateOutcome::BelowShare { percentage, min_share };
            }
        }

        GateOutcome::Accepted
    }

    fn fallback(&self) -> (String, SelectionOutcome) {
        let default_key = self.catalog.default_key();
        if self.store.resolve_usable(default_key, TemplateKind::Cv).is_some() {
            return (default_key.to_string(), SelectionOutcome::DefaultRole);
        }

        warn!("Default role '{}' has no usable CV template", default_key);

        if let Some(role) = self
            .catalog
            .roles()
            .iter()
            .find(|r| self.store.resolve_usable(&r.key, TemplateKind::Cv).is_some())
        {
            return (role.key.clone(), SelectionOutcome::FirstAvailable);
        }

        warn!("No role category has a usable CV template");
        (default_key.to_string(), SelectionOutcome::NoTemplates)
    }
}
