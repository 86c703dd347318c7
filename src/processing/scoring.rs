//! Keyword scoring, percentage normalization and the role breakdown

use crate::processing::catalog::{RoleCatalog, RoleCategory};
use crate::processing::keyword_matcher::KeywordMatcher;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Role key → keyword → occurrences
pub type KeywordMatchCount = BTreeMap<String, BTreeMap<String, usize>>;

/// Role key → accumulated keyword weight
pub type RoleScore = BTreeMap<String, f64>;

/// Role key → share of the total score, 0-100
pub type RolePercentage = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleShare {
    pub role: String,
    pub percentage: f64,
}

/// Roles at or above a percentage threshold, highest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBreakdown {
    pub entries: Vec<RoleShare>,
    pub threshold: f64,
    /// Set when the top role's share, before threshold filtering, sits below
    /// the mixed-role threshold
    pub mixed_role: bool,
}

impl RoleBreakdown {
    pub fn top(&self) -> Option<&RoleShare> {
        self.entries.first()
    }
}

/// Count every role's keywords in `text`. Every catalog role gets an entry,
/// empty when nothing matched.
pub fn count_keywords(
    catalog: &RoleCatalog,
    matcher: &dyn KeywordMatcher,
    text: &str,
) -> KeywordMatchCount {
    catalog
        .roles()
        .iter()
        .map(|role| (role.key.clone(), matcher.count(text, &role.keywords)))
        .collect()
}

pub fn score_roles(catalog: &RoleCatalog, counts: &KeywordMatchCount) -> RoleScore {
    catalog
        .roles()
        .iter()
        .map(|role| {
            let occurrences: usize = counts
                .get(&role.key)
                .map(|hits| hits.values().sum())
                .unwrap_or(0);
            (role.key.clone(), occurrences as f64 * role.keyword_weight)
        })
        .collect()
}

/// Normalize scores to sum to 100. A zero total spreads 100 evenly so
/// "no signal" still reads as a uniform distribution.
pub fn normalize(scores: &RoleScore) -> RolePercentage {
    let total: f64 = scores.values().sum();

    if scores.is_empty() {
        return RolePercentage::new();
    }

    if total <= 0.0 {
        let uniform = 100.0 / scores.len() as f64;
        return scores.keys().map(|k| (k.clone(), uniform)).collect();
    }

    scores
        .iter()
        .map(|(k, score)| (k.clone(), 100.0 * score / total))
        .collect()
}

/// Ordering used wherever roles are ranked: value descending, then
/// priority ascending, then configuration order.
pub fn rank_order(
    catalog: &RoleCatalog,
    a: (&RoleCategory, f64),
    b: (&RoleCategory, f64),
) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.priority.cmp(&b.0.priority))
        .then_with(|| catalog.position(&a.0.key).cmp(&catalog.position(&b.0.key)))
}

/// Roles ranked by score
pub fn rank_roles<'a>(
    catalog: &'a RoleCatalog,
    scores: &RoleScore,
) -> Vec<(&'a RoleCategory, f64)> {
    let mut ranked: Vec<(&RoleCategory, f64)> = catalog
        .roles()
        .iter()
        .map(|role| (role, scores.get(&role.key).copied().unwrap_or(0.0)))
        .collect();
    ranked.sort_by(|a, b| rank_order(catalog, *a, *b));
    ranked
}

pub fn build_breakdown(
    catalog: &RoleCatalog,
    percentages: &RolePercentage,
    threshold: f64,
    mixed_role_threshold: f64,
) -> RoleBreakdown {
    let mut ranked: Vec<(&RoleCategory, f64)> = catalog
        .roles()
        .iter()
        .filter_map(|role| percentages.get(&role.key).map(|p| (role, *p)))
        .collect();
    ranked.sort_by(|a, b| rank_order(catalog, *a, *b));

    let mixed_role = ranked
        .first()
        .map(|(_, p)| *p < mixed_role_threshold)
        .unwrap_or(false);

    RoleBreakdown {
        entries: ranked
            .into_iter()
            .filter(|(_, p)| *p >= threshold)
            .map(|(role, percentage)| RoleShare {
                role: role.key.clone(),
                percentage,
            })
            .collect(),
        threshold,
        mixed_role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::keyword_matcher::SubstringMatcher;

    fn scores_for(text: &str) -> (RoleCatalog, RoleScore) {
        let catalog = RoleCatalog::builtin();
        let counts = count_keywords(&catalog, &SubstringMatcher, text);
        let scores = score_roles(&catalog, &counts);
        (catalog, scores)
    }

    #[test]
    fn test_every_role_is_scored() {
        let (catalog, scores) = scores_for("nothing relevant here");
        assert_eq!(scores.len(), catalog.len());
        assert!(scores.values().all(|s| *s == 0.0));
    }

    #[test]
    fn test_repeated_keywords_accumulate() {
        let (_, scores) = scores_for("Android, android, ANDROID and Kotlin");
        assert_eq!(scores["android_developer"], 4.0);
    }

    #[test]
    fn test_keyword_weight_scales_score() {
        let mut roles = crate::processing::catalog::builtin_roles();
        for role in roles.iter_mut() {
            if role.key == "android_developer" {
                role.keyword_weight = 2.5;
            }
        }
        let catalog = RoleCatalog::new(roles, "software_engineer").unwrap();
        let counts = count_keywords(&catalog, &SubstringMatcher, "kotlin kotlin");
        let scores = score_roles(&catalog, &counts);
        assert_eq!(scores["android_developer"], 5.0);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let (_, scores) = scores_for("React, TypeScript, Kubernetes, Docker and Kotlin");
        let percentages = normalize(&scores);
        let total: f64 = percentages.values().sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(percentages.values().all(|p| (0.0..=100.0).contains(p)));
    }

    #[test]
    fn test_zero_total_is_uniform() {
        let (catalog, scores) = scores_for("");
        let percentages = normalize(&scores);
        let expected = 100.0 / catalog.len() as f64;
        assert!(percentages.values().all(|p| (p - expected).abs() < 1e-9));
    }

    #[test]
    fn test_breakdown_is_sorted_and_filtered() {
        let (catalog, scores) = scores_for("android kotlin gradle react");
        let percentages = normalize(&scores);
        let breakdown = build_breakdown(&catalog, &percentages, 5.0, 50.0);

        assert_eq!(breakdown.top().unwrap().role, "android_developer");
        assert!(breakdown.entries.windows(2).all(|w| w[0].percentage >= w[1].percentage));
        assert!(breakdown.entries.iter().all(|e| e.percentage >= 5.0));
        assert!(!breakdown.entries.iter().any(|e| e.role == "data_engineer"));
    }

    #[test]
    fn test_mixed_flag_ignores_display_threshold() {
        // android 2, frontend 2 and full stack 1 ("react") of 5 points
        let (catalog, scores) = scores_for("Android Kotlin. React Vue.");
        let percentages = normalize(&scores);

        let shown = build_breakdown(&catalog, &percentages, 0.0, 50.0);
        assert!(shown.mixed_role);

        let hidden = build_breakdown(&catalog, &percentages, 60.0, 50.0);
        assert!(hidden.entries.is_empty());
        assert!(hidden.mixed_role);

        let single = build_breakdown(&catalog, &normalize(&scores_for("kotlin").1), 100.0, 50.0);
        assert_eq!(single.entries.len(), 1);
        assert!(!single.mixed_role);
    }

    #[test]
    fn test_ties_break_on_priority() {
        // "rest api" and "postgresql" score the same for full stack and backend
        let (catalog, scores) = scores_for("rest api postgresql");
        let ranked = rank_roles(&catalog, &scores);
        assert_eq!(ranked[0].0.key, "fullstack_developer");
        assert_eq!(ranked[1].0.key, "backend_developer");
        assert_eq!(ranked[0].1, ranked[1].1);
    }
}
