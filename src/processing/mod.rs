//! Role classification and template selection

pub mod catalog;
pub mod keyword_matcher;
pub mod scoring;
pub mod templates;
pub mod classifier;
