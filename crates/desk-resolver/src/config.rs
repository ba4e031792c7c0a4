//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Id of the implicit root router pane
pub const ROOT_PANE_ID: &str = "root";

/// Settings for pane and intent resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// Router id of the implicit root pane
    pub root_id: String,
    /// Resolve an unmatched `edit` intent to a bare editor pane instead of failing
    pub fallback_editor: bool,
    /// Deepest structure level the intent tree walk visits
    pub intent_max_depth: usize,
    /// Reuse resolutions of unchanged panes across navigations
    pub memoize: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            root_id: ROOT_PANE_ID.to_string(),
            fallback_editor: false,
            intent_max_depth: 16,
            memoize: true,
        }
    }
}

impl ResolverConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With fallback editor
    #[inline]
    #[must_use]
    pub fn with_fallback_editor(mut self, enabled: bool) -> Self {
        self.fallback_editor = enabled;
        self
    }

    /// With maximum intent walk depth
    #[inline]
    #[must_use]
    pub fn with_intent_max_depth(mut self, depth: usize) -> Self {
        self.intent_max_depth = depth;
        self
    }

    /// With memoization
    #[inline]
    #[must_use]
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Parse TOML config
    ///
    /// # Errors
    /// Returns the TOML error for malformed input.
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.root_id, "root");
        assert!(!config.fallback_editor);
        assert!(config.memoize);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ResolverConfig::from_toml_str("fallbackEditor = true").unwrap();
        assert!(config.fallback_editor);
        assert_eq!(config.intent_max_depth, 16);
    }
}
