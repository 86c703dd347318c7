//! Template lookup for role categories

use crate::error::{Result, SelectorError};
use crate::processing::catalog::RoleCatalog;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Cv,
    CoverLetter,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Cv => write!(f, "CV"),
            TemplateKind::CoverLetter => write!(f, "cover letter"),
        }
    }
}

/// Handle to a role's template, on disk or held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateResource {
    pub role: String,
    pub kind: TemplateKind,
    pub path: PathBuf,
    inline: Option<Arc<str>>,
}

impl TemplateResource {
    pub fn file(role: impl Into<String>, kind: TemplateKind, path: impl Into<PathBuf>) -> Self {
        Self {
            role: role.into(),
            kind,
            path: path.into(),
            inline: None,
        }
    }

    pub fn inline(
        role: impl Into<String>,
        kind: TemplateKind,
        content: impl Into<Arc<str>>,
    ) -> Self {
        let role = role.into();
        let path = PathBuf::from(format!("memory://{}/{:?}", role, kind));
        Self {
            role,
            kind,
            path,
            inline: Some(content.into()),
        }
    }

    pub fn read(&self) -> Result<String> {
        match &self.inline {
            Some(content) => Ok(content.to_string()),
            None => Ok(std::fs::read_to_string(&self.path)?),
        }
    }

    /// Readable and satisfying the LaTeX template contract
    pub fn is_usable(&self) -> bool {
        self.read().map(|c| satisfies_contract(&c)).unwrap_or(false)
    }
}

/// A template must be non-empty and carry a document body for the
/// renderer to substitute into.
pub fn satisfies_contract(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty() && trimmed.contains(r"\begin{document}")
}

/// Maps a role category and template kind to a resource.
///
/// Implementations must only read: the classifier calls `resolve` while
/// gating candidates and may do so from several threads at once.
pub trait TemplateStore: Send + Sync {
    fn resolve(&self, role: &str, kind: TemplateKind) -> Option<TemplateResource>;

    /// Resolve and keep the resource only if it passes the template contract
    fn resolve_usable(&self, role: &str, kind: TemplateKind) -> Option<TemplateResource> {
        self.resolve(role, kind).filter(TemplateResource::is_usable)
    }

    /// Path a lookup would use, for log messages
    fn describe(&self, role: &str, kind: TemplateKind) -> String {
        self.resolve(role, kind)
            .map(|r| r.path.display().to_string())
            .unwrap_or_else(|| format!("<no {} template for {}>", kind, role))
    }
}

/// Templates stored under a root directory at the paths the catalog names.
pub struct FsTemplateStore {
    root: PathBuf,
    catalog: Arc<RoleCatalog>,
}

impl FsTemplateStore {
    pub fn new(root: impl Into<PathBuf>, catalog: Arc<RoleCatalog>) -> Self {
        Self {
            root: root.into(),
            catalog,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_path(&self, role: &str, kind: TemplateKind) -> Option<PathBuf> {
        let category = self.catalog.get(role)?;
        let relative = match kind {
            TemplateKind::Cv => &category.cv_template,
            TemplateKind::CoverLetter => &category.cover_letter_template,
        };
        Some(self.root.join(relative))
    }
}

impl TemplateStore for FsTemplateStore {
    fn resolve(&self, role: &str, kind: TemplateKind) -> Option<TemplateResource> {
        let path = self.template_path(role, kind)?;
        if path.is_file() {
            Some(TemplateResource::file(role, kind, path))
        } else {
            None
        }
    }

    fn describe(&self, role: &str, kind: TemplateKind) -> String {
        self.template_path(role, kind)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("<unknown role {}>", role))
    }
}

/// In-memory templates, keyed by role and kind
#[derive(Debug, Default, Clone)]
pub struct MemoryTemplateStore {
    templates: HashMap<(String, TemplateKind), Arc<str>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        role: impl Into<String>,
        kind: TemplateKind,
        content: impl Into<Arc<str>>,
    ) {
        self.templates.insert((role.into(), kind), content.into());
    }

    pub fn with_template(
        mut self,
        role: impl Into<String>,
        kind: TemplateKind,
        content: impl Into<Arc<str>>,
    ) -> Self {
        self.insert(role, kind, content);
        self
    }

    /// A usable CV and cover letter for every role in the catalog
    pub fn for_catalog(catalog: &RoleCatalog) -> Self {
        let mut store = Self::new();
        for role in catalog.roles() {
            for kind in [TemplateKind::Cv, TemplateKind::CoverLetter] {
                store.insert(
                    role.key.clone(),
                    kind,
                    format!(
                        "\\documentclass{{article}}\n\\begin{{document}}\n{} {}\n\\end{{document}}\n",
                        role.display_name, kind
                    ),
                );
            }
        }
        store
    }

    pub fn remove(&mut self, role: &str, kind: TemplateKind) {
        self.templates.remove(&(role.to_string(), kind));
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn resolve(&self, role: &str, kind: TemplateKind) -> Option<TemplateResource> {
        self.templates
            .get(&(role.to_string(), kind))
            .map(|content| TemplateResource::inline(role, kind, content.clone()))
    }
}

/// Load a resolved template's text, failing when the store has nothing usable
pub fn load_template(store: &dyn TemplateStore, role: &str, kind: TemplateKind) -> Result<String> {
    let resource = store.resolve(role, kind).ok_or_else(|| {
        SelectorError::TemplateUnavailable(format!(
            "{} template for '{}' not found at {}",
            kind,
            role,
            store.describe(role, kind)
        ))
    })?;
    let content = resource.read()?;
    if !satisfies_contract(&content) {
        return Err(SelectorError::TemplateUnavailable(format!(
            "{} template for '{}' at {} is empty or has no document body",
            kind,
            role,
            resource.path.display()
        )));
    }
    Ok(content)
}

macro_rules! bundled {
    ($path:literal) => {
        ($path, include_str!(concat!("../../templates/", $path)))
    };
}

/// Templates shipped with the binary for the built-in roles, as
/// (path under the templates directory, content)
pub const BUNDLED_TEMPLATES: &[(&str, &str)] = &[
    bundled!("cv/ai_ml_engineer.tex"),
    bundled!("cv/android_developer.tex"),
    bundled!("cv/devops_fintech.tex"),
    bundled!("cv/devops_cloud.tex"),
    bundled!("cv/frontend_developer.tex"),
    bundled!("cv/fullstack_developer.tex"),
    bundled!("cv/backend_developer.tex"),
    bundled!("cv/data_engineer.tex"),
    bundled!("cv/software_engineer.tex"),
    bundled!("cover_letters/ai_ml_engineer.tex"),
    bundled!("cover_letters/android_developer.tex"),
    bundled!("cover_letters/devops_fintech.tex"),
    bundled!("cover_letters/devops_cloud.tex"),
    bundled!("cover_letters/frontend_developer.tex"),
    bundled!("cover_letters/fullstack_developer.tex"),
    bundled!("cover_letters/backend_developer.tex"),
    bundled!("cover_letters/data_engineer.tex"),
    bundled!("cover_letters/software_engineer.tex"),
];

/// Write the bundled templates under `root`, keeping any file already there.
/// Returns how many files were written.
pub fn install_bundled_templates(root: &Path) -> Result<usize> {
    let mut written = 0;
    for (relative, content) in BUNDLED_TEMPLATES {
        let path = root.join(relative);
        if path.exists() {
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        written += 1;
    }

    if written > 0 {
        info!("Installed {} bundled templates into {}", written, root.display());
    }
    Ok(written)
}
