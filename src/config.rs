//! Run-time configuration of the chunked read engine.

/// How members of a group access a chunk file they all need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    /// Members take turns, one at a time, separated by group barriers.
    /// Use on storage that does not tolerate concurrent access to one file.
    #[default]
    Serialized,
    /// Members needing data from the chunk read it concurrently.
    Parallel,
}

/// Configuration for [`crate::read::ChunkedReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReadConfig {
    access_mode: AccessMode,
    validate_table: bool,
}

impl ReadConfig {
    pub fn new(access_mode: AccessMode) -> Self {
        Self {
            access_mode,
            ..Self::default()
        }
    }

    /// Sets the chunk file access mode.
    pub fn with_access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// Check the handle's chunk table before every read.
    pub fn with_table_validation(mut self, enabled: bool) -> Self {
        self.validate_table = enabled;
        self
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    pub fn validate_table(&self) -> bool {
        self.validate_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_serialized_without_validation() {
        let config = ReadConfig::default();
        assert_eq!(config.access_mode(), AccessMode::Serialized);
        assert!(!config.validate_table());
    }

    #[test]
    fn builder_sets_fields() {
        let config = ReadConfig::new(AccessMode::Parallel).with_table_validation(true);
        assert_eq!(config.access_mode(), AccessMode::Parallel);
        assert!(config.validate_table());
    }
}
