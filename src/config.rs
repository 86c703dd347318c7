//! Configuration management for the role selector

use crate::error::{Result, SelectorError};
use crate::processing::catalog::{builtin_roles, RoleCatalog, RoleCategory, DEFAULT_ROLE};
use crate::processing::keyword_matcher::MatcherKind;
use crate::processing::templates::install_bundled_templates;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub classifier: ClassifierSettings,
    pub templates: TemplateConfig,
    pub output: OutputConfig,
    pub roles: RolesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Minimum percentage for a role to appear in the breakdown
    pub breakdown_threshold: f64,
    /// Top share below which a description counts as a mixed role
    pub mixed_role_threshold: f64,
    #[serde(default)]
    pub matcher: MatcherKind,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            breakdown_threshold: 5.0,
            mixed_role_threshold: 50.0,
            matcher: MatcherKind::Substring,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub templates_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolesConfig {
    pub default_role: String,
    pub categories: Vec<RoleCategory>,
}

impl Default for Config {
    fn default() -> Self {
        let templates_dir = Self::app_dir().join("templates");

        Self {
            classifier: ClassifierSettings::default(),
            templates: TemplateConfig { templates_dir },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
            roles: RolesConfig {
                default_role: DEFAULT_ROLE.to_string(),
                categories: builtin_roles(),
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load `path`. On first run, write the defaults there and install the
    /// bundled templates into a `templates` directory beside it.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::defaults_for(path);
            config.save_to(path)?;
            config.ensure_templates_dir()?;
            info!("Wrote default configuration to {}", path.display());
            Ok(config)
        }
    }

    /// Defaults with the templates directory placed next to `config_path`
    pub fn defaults_for(config_path: &Path) -> Self {
        let mut config = Self::default();
        if let Some(parent) = config_path.parent() {
            config.templates.templates_dir = parent.join("templates");
        }
        config
    }

    /// Create the templates directory and fill in any missing bundled
    /// templates
    pub fn ensure_templates_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.templates.templates_dir)?;
        install_bundled_templates(&self.templates.templates_dir)?;
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| SelectorError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SelectorError::Configuration(format!("Failed to serialize config: {}", e)))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        Self::app_dir().join("config.toml")
    }

    fn app_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("cv-role-selector")
    }

    fn validate(&self) -> Result<()> {
        let settings = &self.classifier;
        if !(0.0..=100.0).contains(&settings.breakdown_threshold) {
            return Err(SelectorError::Configuration(format!(
                "breakdown_threshold {} must be within 0-100",
                settings.breakdown_threshold
            )));
        }
        if !(0.0..=100.0).contains(&settings.mixed_role_threshold) {
            return Err(SelectorError::Configuration(format!(
                "mixed_role_threshold {} must be within 0-100",
                settings.mixed_role_threshold
            )));
        }
        self.catalog().map(|_| ())
    }

    /// Validated role catalog built from the `roles` section
    pub fn catalog(&self) -> Result<RoleCatalog> {
        RoleCatalog::new(self.roles.categories.clone(), self.roles.default_role.clone())
    }

    pub fn templates_dir(&self) -> &PathBuf {
        &self.templates.templates_dir
    }
}
