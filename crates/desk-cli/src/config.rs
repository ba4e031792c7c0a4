//! CLI configuration
//!
//! Environment is read once at startup into a [`CliConfig`]; commands only
//! ever see the snapshot.

use anyhow::Context;
use desk_resolver::ResolverConfig;
use std::path::Path;

/// Auth token for the hosted MCP server
pub const AUTH_TOKEN_VAR: &str = "SANITY_AUTH_TOKEN";
/// `staging` switches hosted endpoints to staging
pub const INTERNAL_ENV_VAR: &str = "SANITY_INTERNAL_ENV";

const MCP_URL: &str = "https://mcp.sanity.io";
const MCP_STAGING_URL: &str = "https://mcp.sanity.work";

/// Process-wide CLI settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Value of `SANITY_AUTH_TOKEN`
    pub auth_token: Option<String>,
    /// Value of `SANITY_INTERNAL_ENV`
    pub internal_env: Option<String>,
    /// `--debug` was passed
    pub debug: bool,
    /// Resolver settings for `structure` commands
    pub resolver: ResolverConfig,
}

impl CliConfig {
    /// Snapshot the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable lookup
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            auth_token: non_empty(AUTH_TOKEN_VAR),
            internal_env: non_empty(INTERNAL_ENV_VAR),
            ..Self::default()
        }
    }

    /// With debug output
    #[inline]
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// With auth token
    #[inline]
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// With resolver settings
    #[inline]
    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace resolver settings with a TOML file
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed.
    pub fn with_resolver_file(self, path: &Path) -> anyhow::Result<Self> {
        let input = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        let resolver = ResolverConfig::from_toml_str(&input)
            .with_context(|| format!("invalid resolver config {}", path.display()))?;
        Ok(self.with_resolver(resolver))
    }

    /// Running against staging
    #[must_use]
    pub fn is_staging(&self) -> bool {
        self.internal_env.as_deref() == Some("staging")
    }

    /// Hosted MCP endpoint for the current environment
    #[must_use]
    pub fn mcp_url(&self) -> &'static str {
        if self.is_staging() {
            MCP_STAGING_URL
        } else {
            MCP_URL
        }
    }
}
