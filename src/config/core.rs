use crate::config::{FilterOptions, SymlinkPolicy};
use crate::error::FunnelError;
use crate::filter::Predicate;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Prefix for environment overrides, e.g. `CONTENT_FUNNEL_INCLUDE__LITERAL`
pub const ENV_PREFIX: &str = "CONTENT_FUNNEL_";

/// Base name of the config file looked up in the working directory
pub const REPO_CONFIG_NAME: &str = "content-funnel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Pick a format from a file extension, defaulting to TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        }
    }

    fn merge_file(self, figment: Figment, path: &Path) -> Figment {
        match self {
            ConfigFormat::Json => figment.merge(Json::file(path)),
            ConfigFormat::Toml => figment.merge(Toml::file(path)),
            ConfigFormat::Yaml => figment.merge(Yaml::file(path)),
        }
    }
}

/// File/env form of a predicate. Functions are programmatic-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateSpec {
    Literal(String),
    Pattern(String),
}

impl PredicateSpec {
    fn compile(&self) -> Result<Predicate, FunnelError> {
        match self {
            PredicateSpec::Literal(needle) => Ok(Predicate::literal(needle.as_str())),
            PredicateSpec::Pattern(pattern) => Predicate::pattern(pattern)
                .map_err(|e| FunnelError::config(format!("invalid pattern `{}`: {}", pattern, e))),
        }
    }
}

/// Declarative filter configuration, layered with figment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<PredicateSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<PredicateSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    pub symlinks: SymlinkPolicy,
}

impl FunnelConfig {
    /// Load the layered configuration.
    ///
    /// Later layers win: embedded defaults, `content-funnel.{toml,yaml,yml,json}`
    /// in the working directory, `custom_config` if given, then `CONTENT_FUNNEL_*`
    /// environment variables. Missing files are skipped.
    pub fn load(custom_config: Option<&Path>) -> Result<Self, FunnelError> {
        tracing::trace!("CONFIG LOAD: Starting");
        Self::from_figment(Self::figment(custom_config))
    }

    /// The provider chain used by [`load`](FunnelConfig::load)
    pub fn figment(custom_config: Option<&Path>) -> Figment {
        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::file(format!("{}.toml", REPO_CONFIG_NAME)))
            .merge(Yaml::file(format!("{}.yaml", REPO_CONFIG_NAME)))
            .merge(Yaml::file(format!("{}.yml", REPO_CONFIG_NAME)))
            .merge(Json::file(format!("{}.json", REPO_CONFIG_NAME)));

        if let Some(path) = custom_config {
            tracing::trace!("CONFIG LOAD: Merging custom config {}", path.display());
            figment = ConfigFormat::from_path(path).merge_file(figment, path);
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract a config from any figment
    pub fn from_figment(figment: Figment) -> Result<Self, FunnelError> {
        figment.extract().map_err(FunnelError::config)
    }

    /// Compile into filter options.
    ///
    /// Patterns are compiled here so a bad regex fails before any filter is
    /// constructed. The include/exclude exclusivity check happens at filter
    /// construction.
    pub fn into_options(self) -> Result<FilterOptions, FunnelError> {
        Ok(FilterOptions {
            include: self.include.as_ref().map(PredicateSpec::compile).transpose()?,
            exclude: self.exclude.as_ref().map(PredicateSpec::compile).transpose()?,
            annotation: self.annotation,
            callback: None,
            symlinks: self.symlinks,
        })
    }
}
