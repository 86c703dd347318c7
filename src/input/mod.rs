//! Job description input
//! Detects the file type and extracts plain text for classification

pub mod file_detector;
pub mod text_extractor;
pub mod manager;

pub use manager::{InputManager, JobSource};
