//! Database configuration.

/// Where the single embedded SQLite file lives, and how many writer
/// connections to open (spec.md §5: writers serialize via a single
/// connection or explicit transactions).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: std::path::PathBuf,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}
