//! # Constraints Core
//!
//! Core data structures and types for the constraints engine.
//!
//! This crate provides the building blocks the engine works on: a small
//! runtime object model, check definitions and the configuration shapes a
//! [`Configurer`] hands to the engine.
//!
//! ## Key Concepts
//!
//! - **Value / Object / ClassInfo**: the object graph being validated
//! - **Check**: a single constraint predicate plus metadata (message, error code, severity, profiles, activation condition, container targets)
//! - **Context**: where a validated value came from
//! - **Violation**: a record of one failed check against one value
//! - **Configurer**: the collaborator answering "which checks does this class carry"
//!
//! ## Example
//!
//! ```rust
//! use constraints_core::{Check, ClassBuilder, ClassConfigBuilder, Object, ValueKind};
//!
//! let person = ClassBuilder::new("Person")
//!     .field("name", ValueKind::String)
//!     .build();
//! let alice = Object::with_values(&person, [("name", "Alice")]).unwrap();
//!
//! let config = ClassConfigBuilder::new("Person")
//!     .field("name", [Check::not_null(), Check::max_length(20)])
//!     .build();
//! assert_eq!(config.fields[0].checks.len(), 2);
//! assert_eq!(alice.get("name").unwrap().as_str(), Some("Alice"));
//! ```

pub mod builder;
pub mod check;
pub mod config;
pub mod context;
pub mod error;
pub mod expression;
pub mod object;
pub mod value;
pub mod violation;

pub use builder::*;
pub use check::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use expression::*;
pub use object::*;
pub use value::*;
pub use violation::*;
