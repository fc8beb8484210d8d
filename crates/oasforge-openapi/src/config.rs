//! YAML-loadable generator configuration: naming-pipeline, dedup, and
//! target-version/info/server overrides for a [`crate::DocumentBuilder`].
//!
//! # File format
//!
//! ```yaml
//! target_version: v3_1
//! naming_strategy: pascal_case
//! deduplicate: true
//! info:
//!   title: Pet Store
//!   version: "1.0.0"
//! servers:
//!   - url: https://api.example.com
//!     description: production
//! ```

use std::path::Path;

use oasforge_core::OasVersion;
use oasforge_schema::{GenericOptions, GenericStrategy, NamingPipeline, Strategy};
use serde::Deserialize;

/// Top-level generator configuration, loaded from a YAML file or built
/// programmatically. All fields default to the built-in, zero-configuration
/// behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// The OAS version family to target.
    pub target_version: TargetVersion,
    /// The built-in naming strategy (overridden by `naming_template` when set).
    pub naming_strategy: NamingStrategy,
    /// A percent-placeholder naming template (`%{Base}`, `%{Package}`,
    /// `%{Params}`), taking precedence over `naming_strategy` when set.
    pub naming_template: Option<String>,
    /// Generic-parameter formatting knobs.
    pub generics: GenericConfig,
    /// Whether structural deduplication runs automatically at finalization.
    pub deduplicate: bool,
    /// `info` overrides applied on top of `SetTitle`/`SetVersion`/etc.
    pub info: InfoOverrides,
    /// Servers registered before any explicit `AddServer` call.
    pub servers: Vec<ServerEntry>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target_version: TargetVersion::default(),
            naming_strategy: NamingStrategy::default(),
            naming_template: None,
            generics: GenericConfig::default(),
            deduplicate: true,
            info: InfoOverrides::default(),
            servers: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Load a [`GeneratorConfig`] from a YAML file.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&contents)?)
    }

    /// Build the [`NamingPipeline`] described by this configuration. A
    /// malformed `naming_template` is not raised here: `NamingPipeline`
    /// defers the parse error to `deferred_template_error`, which
    /// [`crate::DocumentBuilder`] surfaces as a `BuilderError` at
    /// finalization.
    #[must_use]
    pub fn naming_pipeline(&self) -> NamingPipeline {
        let mut pipeline = NamingPipeline::new()
            .with_strategy(self.naming_strategy.into())
            .with_generic_options(self.generics.clone().into());
        if let Some(template) = &self.naming_template {
            pipeline = pipeline.with_template(template);
        }
        pipeline
    }
}

/// The OAS version family a [`GeneratorConfig`] targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetVersion {
    V2_0,
    V3_0,
    #[default]
    V3_1,
    V3_2,
}

impl From<TargetVersion> for OasVersion {
    fn from(v: TargetVersion) -> Self {
        match v {
            TargetVersion::V2_0 => Self::V2_0,
            TargetVersion::V3_0 => Self::V3_0,
            TargetVersion::V3_1 => Self::V3_1,
            TargetVersion::V3_2 => Self::V3_2,
        }
    }
}

/// Mirrors `oasforge_schema::Strategy` for YAML deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    Default,
    PascalCase,
    CamelCase,
    SnakeCase,
    KebabCase,
    TypeOnly,
    FullPath,
}

impl From<NamingStrategy> for Strategy {
    fn from(s: NamingStrategy) -> Self {
        match s {
            NamingStrategy::Default => Self::Default,
            NamingStrategy::PascalCase => Self::PascalCase,
            NamingStrategy::CamelCase => Self::CamelCase,
            NamingStrategy::SnakeCase => Self::SnakeCase,
            NamingStrategy::KebabCase => Self::KebabCase,
            NamingStrategy::TypeOnly => Self::TypeOnly,
            NamingStrategy::FullPath => Self::FullPath,
        }
    }
}

/// Mirrors `oasforge_schema::GenericStrategy` for YAML deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericStrategyConfig {
    #[default]
    Underscore,
    Of,
    For,
    AngleBrackets,
    Flattened,
}

impl From<GenericStrategyConfig> for GenericStrategy {
    fn from(s: GenericStrategyConfig) -> Self {
        match s {
            GenericStrategyConfig::Underscore => Self::Underscore,
            GenericStrategyConfig::Of => Self::Of,
            GenericStrategyConfig::For => Self::For,
            GenericStrategyConfig::AngleBrackets => Self::AngleBrackets,
            GenericStrategyConfig::Flattened => Self::Flattened,
        }
    }
}

/// The four generic-parameter-handling knobs, YAML-loadable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenericConfig {
    pub strategy: GenericStrategyConfig,
    pub base_separator: String,
    pub param_separator: String,
    pub include_package: bool,
    pub apply_base_casing: bool,
}

impl Default for GenericConfig {
    fn default() -> Self {
        let defaults = GenericOptions::default();
        Self {
            strategy: GenericStrategyConfig::default(),
            base_separator: defaults.base_separator,
            param_separator: defaults.param_separator,
            include_package: defaults.include_package,
            apply_base_casing: defaults.apply_base_casing,
        }
    }
}

impl From<GenericConfig> for GenericOptions {
    fn from(c: GenericConfig) -> Self {
        Self {
            strategy: c.strategy.into(),
            base_separator: c.base_separator,
            param_separator: c.param_separator,
            include_package: c.include_package,
            apply_base_casing: c.apply_base_casing,
        }
    }
}

/// `info` fields applied at `Build*` time. A config value only fills in a
/// field the builder's own `SetTitle`/`SetVersion`/etc. calls left unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InfoOverrides {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub terms_of_service: Option<String>,
    pub contact: Option<ContactInfo>,
    pub license: Option<LicenseInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LicenseInfo {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// A server entry loaded from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_defaults() {
        let config: GeneratorConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config.target_version, TargetVersion::V3_1);
        assert!(config.deduplicate);
        assert!(config.servers.is_empty());
    }

    #[test]
    fn deserialize_full() {
        let yaml = indoc::indoc! {r#"
            target_version: v2_0
            naming_strategy: snake_case
            naming_template: "%{Package}_%{Base}"
            generics:
              strategy: angle_brackets
              include_package: true
            deduplicate: false
            info:
              title: Pet Store
              version: "1.0.0"
              contact:
                email: team@example.com
            servers:
              - url: https://api.example.com
                description: production
        "#};
        let config: GeneratorConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.target_version, TargetVersion::V2_0);
        assert_eq!(config.naming_strategy, NamingStrategy::SnakeCase);
        assert_eq!(config.naming_template.as_deref(), Some("%{Package}_%{Base}"));
        assert_eq!(config.generics.strategy, GenericStrategyConfig::AngleBrackets);
        assert!(config.generics.include_package);
        assert!(!config.deduplicate);
        assert_eq!(config.info.title.as_deref(), Some("Pet Store"));
        assert_eq!(
            config.info.contact.unwrap().email.as_deref(),
            Some("team@example.com")
        );
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].url, "https://api.example.com");
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("oasforge-openapi-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test-config.yaml");
        std::fs::write(&path, "target_version: v3_2\n").unwrap();

        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.target_version, TargetVersion::V3_2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_nonexistent_file_returns_error() {
        let result = GeneratorConfig::load(Path::new("/nonexistent/oasforge.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_invalid_yaml_returns_error() {
        let dir = std::env::temp_dir().join("oasforge-openapi-config-test-invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.yaml");
        std::fs::write(&path, "target_version: [[[invalid").unwrap();

        let result = GeneratorConfig::load(&path);
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
