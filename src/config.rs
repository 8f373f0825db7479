//! Layered project configuration (`shaderxc.toml`).
//!
//! Three layers, lowest to highest precedence: built-in defaults, the
//! project's `shaderxc.toml` (if present), then CLI flags. Each layer is
//! represented by the same `Config` shape with `Option` fields so a higher
//! layer can selectively override only what it sets; `merge` folds a higher
//! layer onto a lower one.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name-mangling prefix defaults, split out so both the file format and
/// `api::NameMangling` can share field names.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MangleDefaults {
    pub input: Option<String>,
    pub output: Option<String>,
    pub reserved_word: Option<String>,
    pub temporary: Option<String>,
    pub namespace: Option<String>,
}

/// The deserialized shape of `shaderxc.toml`, and the layered merge target
/// for built-in defaults and CLI overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Additional `-I` search paths, relative to the config file's directory.
    #[serde(default)]
    pub include_paths: Vec<String>,

    /// Default warnings mask, as a list of warning names (`"implicit-cast"`,
    /// `"unused-parameter"`, ...). An empty list means "all enabled".
    #[serde(default)]
    pub disabled_warnings: Vec<String>,

    /// Maximum include-nesting depth before `PreprocessError::IncludeDepth`.
    pub max_include_depth: Option<usize>,

    #[serde(default)]
    pub mangling: MangleDefaults,

    /// Whether unresolved bindings should be auto-assigned sequential slots.
    pub auto_binding: Option<bool>,
}

impl Config {
    /// The compiler's built-in defaults, used when no `shaderxc.toml` is
    /// found and no CLI flag overrides a field.
    pub fn builtin_defaults() -> Self {
        Self {
            include_paths: Vec::new(),
            disabled_warnings: Vec::new(),
            max_include_depth: Some(64),
            mangling: MangleDefaults {
                input: Some("_i_".to_string()),
                output: Some("_o_".to_string()),
                reserved_word: Some("xc_".to_string()),
                temporary: Some("_t_".to_string()),
                namespace: None,
            },
            auto_binding: Some(false),
        }
    }

    /// Loads `shaderxc.toml` from `path`, if it exists. Returns
    /// `Ok(Config::default())` (all fields unset) when the file is absent —
    /// absence is not an error, since the built-in defaults cover that case.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))
    }

    /// Folds `override_layer` onto `self`, preferring `override_layer`'s
    /// fields wherever they're set. `Vec` fields are replaced wholesale
    /// rather than concatenated, matching "CLI flags override file config"
    /// rather than "CLI flags append to file config".
    pub fn merge(mut self, override_layer: Config) -> Self {
        if !override_layer.include_paths.is_empty() {
            self.include_paths = override_layer.include_paths;
        }
        if !override_layer.disabled_warnings.is_empty() {
            self.disabled_warnings = override_layer.disabled_warnings;
        }
        if override_layer.max_include_depth.is_some() {
            self.max_include_depth = override_layer.max_include_depth;
        }
        if override_layer.auto_binding.is_some() {
            self.auto_binding = override_layer.auto_binding;
        }
        macro_rules! merge_field {
            ($field:ident) => {
                if override_layer.mangling.$field.is_some() {
                    self.mangling.$field = override_layer.mangling.$field;
                }
            };
        }
        merge_field!(input);
        merge_field!(output);
        merge_field!(reserved_word);
        merge_field!(temporary);
        merge_field!(namespace);
        self
    }

    pub fn max_include_depth(&self) -> usize {
        self.max_include_depth.unwrap_or(64)
    }
}

#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(std::path::PathBuf, String),
    Parse(std::path::PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, msg) => {
                write!(f, "could not read config file {}: {}", path.display(), msg)
            }
            ConfigError::Parse(path, msg) => {
                write!(f, "could not parse config file {}: {}", path.display(), msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_override_when_set() {
        let base = Config::builtin_defaults();
        let over = Config {
            max_include_depth: Some(8),
            ..Config::default()
        };
        let merged = base.merge(over);
        assert_eq!(merged.max_include_depth(), 8);
        assert_eq!(merged.mangling.input.as_deref(), Some("_i_"));
    }

    #[test]
    fn missing_file_yields_all_unset() {
        let config = Config::load(Path::new("/does/not/exist/shaderxc.toml")).unwrap();
        assert!(config.max_include_depth.is_none());
    }
}
