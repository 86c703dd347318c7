//! Job description role classifier and CV template selector

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod output;

pub use config::Config;
pub use error::{Result, SelectorError};
pub use processing::catalog::{RoleCatalog, RoleCategory};
pub use processing::classifier::{RoleClassifier, Selection, SelectionOutcome};
pub use processing::templates::{FsTemplateStore, MemoryTemplateStore, TemplateKind, TemplateStore};
