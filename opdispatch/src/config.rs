//! Type hierarchy configuration.
//!
//! Embedding applications describe their nominal types in TOML:
//!
//! ```toml
//! numeric_tower = true
//!
//! [[types]]
//! name = "Matrix"
//! supertypes = ["Tensor"]
//!
//! [[types]]
//! name = "bool"
//! supertypes = ["Integer"]
//! ```
//!
//! Names of primitive types (`i64`, `f64`, `bool`, `String`, ...) refer to
//! the native Rust types. Every other name is a nominal tag.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{HierarchyError, TypeHierarchy, TypeTag};

/// Errors raised while loading or applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid hierarchy configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize hierarchy configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// A type hierarchy as written in a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Start from [`TypeHierarchy::numeric`] before applying `types`.
    pub numeric_tower: bool,

    /// Declared types and their direct supertypes.
    pub types: Vec<TypeDecl>,
}

/// One type and its direct supertypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,

    #[serde(default)]
    pub supertypes: Vec<String>,
}

impl HierarchyConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// An example configuration extending the numeric tower.
    pub fn sample() -> Self {
        Self {
            numeric_tower: true,
            types: vec![
                TypeDecl {
                    name: "Matrix".to_string(),
                    supertypes: vec!["Tensor".to_string()],
                },
                TypeDecl {
                    name: "bool".to_string(),
                    supertypes: vec!["Integer".to_string()],
                },
            ],
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Build the hierarchy this configuration describes.
    pub fn build(&self) -> Result<TypeHierarchy, ConfigError> {
        let mut hierarchy = if self.numeric_tower {
            TypeHierarchy::numeric()
        } else {
            TypeHierarchy::new()
        };

        for decl in &self.types {
            let sub = resolve_tag(&decl.name);
            for sup in &decl.supertypes {
                hierarchy.declare(sub.clone(), resolve_tag(sup))?;
            }
        }

        Ok(hierarchy)
    }
}

/// Resolve a configured type name to a tag.
pub fn resolve_tag(name: &str) -> TypeTag {
    TypeTag::builtin(name).unwrap_or_else(|| TypeTag::nominal(name))
}
