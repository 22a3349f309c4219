//! Database configuration.

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to sync the log to disk on every commit (safer but slower).
    pub sync_on_commit: bool,

    /// Whether to create the log file if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync_on_commit: true,
            create_if_missing: true,
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to sync the log on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets whether to create the log file if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.sync_on_commit);
        assert!(config.create_if_missing);
    }

    #[test]
    fn builder() {
        let config = Config::new().sync_on_commit(false).create_if_missing(false);
        assert!(!config.sync_on_commit);
        assert!(!config.create_if_missing);
    }
}
