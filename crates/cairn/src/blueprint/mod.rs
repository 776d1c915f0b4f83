//! # Blueprints
//!
//! Declarative entity descriptions and the machinery that turns them into
//! live entities.
//!
//! - [`model`]: The serializable document (`EntityBlueprint`) and file I/O
//! - [`convert`]: `FromProperty`, how untyped values become Rust values
//! - [`registry`]: `ComponentRegistry`, type names to factories and setters
//! - [`materialize`]: `Materializer`, blueprint trees to entity graphs

pub mod convert;
pub mod materialize;
pub mod model;
pub mod registry;

pub use convert::FromProperty;
pub use materialize::{Diagnostic, DiagnosticKind, Materializer};
pub use model::{ComponentBlueprint, EntityBlueprint, load_blueprint, save_blueprint};
pub use registry::{ComponentRegistry, ComponentTypeBuilder};
