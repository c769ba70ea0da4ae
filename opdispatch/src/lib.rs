//! Precedence-ordered runtime multiple dispatch.
//!
//! A [`DispatchTable`] holds [`Rule`]s, each pairing a type pattern with a
//! handler. Calling the table with a tuple of argument [`Value`]s scans the
//! rules newest-first and invokes the first rule whose pattern matches the
//! runtime types of the arguments.
//!
//! # Algorithm Overview
//!
//! 1. **Length gate**: a rule applies only to tuples of exactly its arity
//! 2. **Type check**: each position is a wildcard or a supertype of the argument's tag
//! 3. **Precedence**: the most recently inserted applicable rule wins, with no specificity ranking
//! 4. **Selection**: the winning rule may reorder, drop, or duplicate arguments before invoking
//!
//! When nothing matches the table returns [`DispatchResult::NoMatch`], which
//! is an ordinary value and not an error.
//!
//! # Module Structure
//!
//! - [`value`] - Type-erased argument values and keyword arguments
//! - [`types`] - Type tags, pattern descriptors and the subtype hierarchy
//! - [`rule`] - A single pattern/handler/selector rule
//! - [`table`] - The precedence-ordered dispatch table
//! - [`result`] - Call outcomes and dispatch errors
//! - [`shared`] - A dispatch table guarded for concurrent use
//! - [`family`] - The four parallel tables (direct, reduce, accumulate, outer) of one operator
//! - [`registry`] - Explicitly initialized collection of operator families
//! - [`config`] - Loading type hierarchies from TOML

pub mod config;
pub mod family;
pub mod registry;
pub mod result;
pub mod rule;
pub mod shared;
pub mod table;
pub mod types;
pub mod value;

pub use config::{ConfigError, HierarchyConfig, TypeDecl};
pub use family::{DispatchKind, Operation, OperatorFamily};
pub use registry::OperatorRegistry;
pub use result::{DispatchError, DispatchResult};
pub use rule::{Handler, Rule, RuleError};
pub use shared::SharedDispatchTable;
pub use table::DispatchTable;
pub use types::{HierarchyError, TypeDescriptor, TypeHierarchy, TypeTag};
pub use value::{NamedArgs, Value};
