//! # Constraints Validator
//!
//! Validation engine for object graphs constrained by declarative checks.
//! This crate evaluates the checks attached to a class model, including:
//!
//! - Field, invariant and object-level checks along the class hierarchy
//! - Method parameter, constructor parameter and return value checks
//! - Checks on container elements, map keys and map values
//! - Cascading validation of referenced objects, safe on cyclic graphs
//! - Profile filtering, conditional activation and reusable constraint sets
//!
//! ## Example
//!
//! ```rust
//! use constraints_core::{Check, ClassBuilder, ClassConfigBuilder, Object, ValueKind};
//! use constraints_core::ProgrammaticConfigurer;
//! use constraints_validator::{Validator, ValidatorConfig};
//!
//! let person = ClassBuilder::new("Person")
//!     .field("name", ValueKind::String)
//!     .build();
//!
//! let configurer = ProgrammaticConfigurer::new();
//! configurer.add_class_config(
//!     ClassConfigBuilder::new("Person")
//!         .field("name", [Check::not_null(), Check::length(2, 50)])
//!         .build(),
//! );
//! let validator = Validator::with_config(ValidatorConfig::new().configurer(configurer));
//!
//! let alice = Object::with_values(&person, [("name", "Alice")]).unwrap();
//! assert!(validator.validate(&alice).unwrap().is_empty());
//!
//! let nobody = Object::new(&person);
//! let violations = validator.validate(&nobody).unwrap();
//! println!("{}", violations[0]);
//! ```

mod compiler;
mod config;
mod constraint_set;
mod constraints;
mod cycle;
mod engine;
mod error;
mod expression;
mod message;
mod profiles;
mod registry;

pub use compiler::*;
pub use config::*;
pub use constraint_set::*;
pub use constraints::*;
pub use cycle::*;
pub use engine::*;
pub use error::*;
pub use expression::*;
pub use message::*;
pub use profiles::*;
pub use registry::*;
