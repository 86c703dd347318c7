//! Role categories and the immutable catalog the classifier scores against

use crate::error::{Result, SelectorError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// A job-role archetype with the keywords that identify it and the
/// templates rendered for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleCategory {
    pub key: String,
    pub display_name: String,
    /// Lower values win ties between equal scores.
    pub priority: u32,
    pub keywords: Vec<String>,
    /// Score contributed by each keyword occurrence
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
    pub cv_template: PathBuf,
    pub cover_letter_template: PathBuf,
    /// Minimum percentage share required before this role may be selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_share: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentRule>,
}

/// Content-alignment gate for narrow roles that share most of their
/// keywords with a broader sibling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRule {
    pub distinguishing_keywords: Vec<String>,
    #[serde(default = "default_min_hits")]
    pub min_hits: usize,
    /// Fraction of the role's full keyword list
    #[serde(default = "default_min_ratio")]
    pub min_ratio: f64,
    /// Broader role tried first when this one is rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling: Option<String>,
}

fn default_keyword_weight() -> f64 {
    1.0
}

fn default_min_hits() -> usize {
    2
}

fn default_min_ratio() -> f64 {
    0.10
}

impl AlignmentRule {
    /// Distinct distinguishing keywords needed for a role with
    /// `keyword_count` keywords. Satisfying either the absolute count or the
    /// ratio is enough, so the smaller of the two applies.
    pub fn required_hits(&self, keyword_count: usize) -> usize {
        let by_ratio = (self.min_ratio * keyword_count as f64).ceil() as usize;
        self.min_hits.min(by_ratio).max(1)
    }
}

impl RoleCategory {
    pub fn required_alignment_hits(&self) -> Option<usize> {
        self.alignment
            .as_ref()
            .map(|rule| rule.required_hits(self.keywords.len()))
    }
}

/// Validated, read-only table of role categories.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it
/// afterwards.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    roles: Vec<RoleCategory>,
    default_role: String,
}

impl RoleCatalog {
    pub fn new(roles: Vec<RoleCategory>, default_role: impl Into<String>) -> Result<Self> {
        let default_role = default_role.into();

        if roles.is_empty() {
            return Err(SelectorError::InvalidCatalog("no role categories configured".to_string()));
        }

        let mut seen = HashSet::new();
        for role in &roles {
            if role.key.trim().is_empty() {
                return Err(SelectorError::InvalidCatalog("role with empty key".to_string()));
            }
            if !seen.insert(role.key.as_str()) {
                return Err(SelectorError::InvalidCatalog(format!(
                    "duplicate role key '{}'",
                    role.key
                )));
            }
            if role.keywords.is_empty() || role.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(SelectorError::InvalidCatalog(format!(
                    "role '{}' needs a non-empty keyword list without blank entries",
                    role.key
                )));
            }
            let mut keywords = HashSet::new();
            let repeated = role
                .keywords
                .iter()
                .find(|k| !keywords.insert(k.trim().to_lowercase()));
            if let Some(repeated) = repeated {
                return Err(SelectorError::InvalidCatalog(format!(
                    "role '{}' lists keyword '{}' more than once",
                    role.key, repeated
                )));
            }
            if !role.keyword_weight.is_finite() || role.keyword_weight <= 0.0 {
                return Err(SelectorError::InvalidCatalog(format!(
                    "role '{}' has invalid keyword weight {}",
                    role.key, role.keyword_weight
                )));
            }
            if let Some(share) = role.min_share {
                if !(0.0..=100.0).contains(&share) {
                    return Err(SelectorError::InvalidCatalog(format!(
                        "role '{}' min_share {} is outside 0-100",
                        role.key, share
                    )));
                }
            }
            if let Some(rule) = &role.alignment {
                if rule.distinguishing_keywords.is_empty() {
                    return Err(SelectorError::InvalidCatalog(format!(
                        "role '{}' alignment rule has no distinguishing keywords",
                        role.key
                    )));
                }
                if !(0.0..=1.0).contains(&rule.min_ratio) {
                    return Err(SelectorError::InvalidCatalog(format!(
                        "role '{}' alignment min_ratio {} is outside 0-1",
                        role.key, rule.min_ratio
                    )));
                }
            }
        }

        for role in &roles {
            if let Some(sibling) = role.alignment.as_ref().and_then(|r| r.sibling.as_ref()) {
                if sibling == &role.key || !seen.contains(sibling.as_str()) {
                    return Err(SelectorError::InvalidCatalog(format!(
                        "role '{}' names unknown sibling '{}'",
                        role.key, sibling
                    )));
                }
            }
        }

        if !seen.contains(default_role.as_str()) {
            return Err(SelectorError::InvalidCatalog(format!(
                "default role '{}' is not a configured category",
                default_role
            )));
        }

        Ok(Self { roles, default_role })
    }

    /// Catalog with the built-in role table
    pub fn builtin() -> Self {
        Self {
            roles: builtin_roles(),
            default_role: DEFAULT_ROLE.to_string(),
        }
    }

    pub fn roles(&self) -> &[RoleCategory] {
        &self.roles
    }

    pub fn get(&self, key: &str) -> Option<&RoleCategory> {
        self.roles.iter().find(|r| r.key == key)
    }

    /// Position in configuration order, used as the last tie-breaker
    pub fn position(&self, key: &str) -> Option<usize> {
        self.roles.iter().position(|r| r.key == key)
    }

    pub fn default_key(&self) -> &str {
        &self.default_role
    }

    pub fn default_role(&self) -> &RoleCategory {
        // `new` guarantees the default key is present
        self.get(&self.default_role).unwrap_or(&self.roles[0])
    }

    /// Role key → display name, in configuration order
    pub fn display_names(&self) -> Vec<(&str, &str)> {
        self.roles
            .iter()
            .map(|r| (r.key.as_str(), r.display_name.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Generic category used when nothing more specific qualifies
pub const DEFAULT_ROLE: &str = "software_engineer";

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn role(key: &str, display_name: &str, priority: u32, keywords: Vec<String>) -> RoleCategory {
    RoleCategory {
        key: key.to_string(),
        display_name: display_name.to_string(),
        priority,
        keywords,
        keyword_weight: default_keyword_weight(),
        cv_template: PathBuf::from("cv").join(format!("{}.tex", key)),
        cover_letter_template: PathBuf::from("cover_letters").join(format!("{}.tex", key)),
        min_share: None,
        alignment: None,
    }
}

const DEVOPS_KEYWORDS: &[&str] = &[
    "kubernetes", "docker", "terraform", "ci/cd", "aws", "azure", "gcp",
    "infrastructure", "devops", "ansible", "helm", "jenkins", "prometheus",
    "grafana", "site reliability", "cloud",
];

const FINTECH_KEYWORDS: &[&str] = &[
    "fintech", "banking", "payment", "trading", "financial services",
    "pci", "regulatory", "capital markets", "insurance",
];

/// Default role table
pub fn builtin_roles() -> Vec<RoleCategory> {
    let mut ai = role(
        "ai_ml_engineer",
        "AI/ML Engineer",
        1,
        words(&[
            "machine learning", "deep learning", "pytorch", "tensorflow",
            "model training", "fine-tuning", "neural network", "computer vision",
            "nlp", "llm", "transformer", "mlops", "hugging face",
            "reinforcement learning", "ml engineer",
        ]),
    );
    ai.min_share = Some(50.0);

    let android = role(
        "android_developer",
        "Android Developer",
        2,
        words(&[
            "android", "kotlin", "jetpack compose", "android studio", "gradle",
            "play store", "material design", "coroutines", "retrofit", "mvvm",
        ]),
    );

    let mut fintech_keywords = words(DEVOPS_KEYWORDS);
    fintech_keywords.extend(words(FINTECH_KEYWORDS));
    let mut fintech = role("devops_fintech", "DevOps Engineer (FinTech)", 3, fintech_keywords);
    fintech.alignment = Some(AlignmentRule {
        distinguishing_keywords: words(FINTECH_KEYWORDS),
        min_hits: default_min_hits(),
        min_ratio: default_min_ratio(),
        sibling: Some("devops_cloud".to_string()),
    });

    let devops = role("devops_cloud", "DevOps / Cloud Engineer", 4, words(DEVOPS_KEYWORDS));

    let frontend = role(
        "frontend_developer",
        "Frontend Developer",
        5,
        words(&[
            "frontend", "front-end", "react", "typescript", "javascript", "vue",
            "angular", "css", "html", "tailwind", "redux", "webpack",
            "accessibility", "responsive design",
        ]),
    );

    let fullstack = role(
        "fullstack_developer",
        "Full Stack Developer",
        6,
        words(&[
            "full stack", "full-stack", "fullstack", "node.js", "react",
            "typescript", "rest api", "graphql", "postgresql", "express",
            "next.js", "mongodb",
        ]),
    );

    let backend = role(
        "backend_developer",
        "Backend Developer",
        7,
        words(&[
            "backend", "back-end", "microservices", "api design", "rest api",
            "grpc", "postgresql", "redis", "spring boot", "golang",
            "distributed systems", "scalability",
        ]),
    );

    let data = role(
        "data_engineer",
        "Data Engineer",
        8,
        words(&[
            "data pipeline", "etl", "spark", "airflow", "data warehouse",
            "snowflake", "dbt", "bigquery", "data engineering", "databricks",
            "data lake", "kafka",
        ]),
    );

    let generic = role(
        DEFAULT_ROLE,
        "Software Engineer",
        99,
        words(&[
            "software engineer", "software developer", "programming",
            "code review", "unit testing", "agile", "git", "python",
        ]),
    );

    vec![ai, android, fintech, devops, frontend, fullstack, backend, data, generic]
}
