//! Migration settings.

use serde::{Deserialize, Serialize};

/// Table options appended to every `CREATE TABLE` when none is configured.
pub const DEFAULT_CHARSET_COLLATE: &str = "DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_520_ci";

/// Settings shared by every statement a [`Migrator`](crate::Migrator) renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Charset and collation clause, e.g. `DEFAULT CHARACTER SET utf8mb4`.
    pub charset_collate: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            charset_collate: DEFAULT_CHARSET_COLLATE.to_string(),
        }
    }
}

impl MigrationConfig {
    /// Replaces the charset and collation clause. An empty clause omits it.
    #[must_use]
    pub fn with_charset_collate(mut self, clause: impl Into<String>) -> Self {
        self.charset_collate = clause.into().trim().to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_utf8mb4() {
        let config = MigrationConfig::default();
        assert!(config.charset_collate.contains("utf8mb4"));
    }

    #[test]
    fn test_override_is_trimmed() {
        let config = MigrationConfig::default().with_charset_collate("  DEFAULT CHARSET=latin1 ");
        assert_eq!(config.charset_collate, "DEFAULT CHARSET=latin1");
    }
}
