//! Error types.
//!
//! Only blueprint I/O and the per-entity component lookup are fatal to an
//! operation. Property-level failures ([`PropertyError`]) are reported and
//! skipped by the materializer so one bad value never costs a whole entity.
//!
//! "Not found" is never an error anywhere in cairn: lookups return `Option`.

use std::path::PathBuf;

use thiserror::Error;

use crate::ecs::Entity;
use crate::ecs::hierarchy::NodeId;

/// Failure to read or write a blueprint document.
#[derive(Error, Debug)]
pub enum BlueprintError {
    /// The file could not be read or written.
    #[error("blueprint I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a valid blueprint document.
    #[error("failed to parse blueprint '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The blueprint could not be encoded as JSON.
    #[error("failed to encode blueprint: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failure to materialize a single entity. The entity is not created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterializeError {
    /// A component descriptor names a type the registry does not know.
    #[error("entity '{entity}': component type '{component_type}' is not registered")]
    UnknownComponentType {
        entity: String,
        component_type: String,
    },

    /// The entity was built but the world refused to spawn it under the
    /// requested parent. The built entities are destroyed again.
    #[error("entity '{entity}': spawn rejected")]
    SpawnRejected { entity: String },
}

/// Failure to apply one property to one component. Recoverable.
#[derive(Error, Debug)]
pub enum PropertyError {
    /// Neither a property nor a field of that name is registered for the type.
    #[error("'{component_type}' has no property or field named '{property}'")]
    Unbound {
        component_type: String,
        property: String,
    },

    /// The value's shape does not fit the target's declared type.
    #[error("'{component_type}.{property}': {source}")]
    Conversion {
        component_type: String,
        property: String,
        #[source]
        source: ConversionError,
    },
}

/// A serialized value could not be converted into the requested Rust type.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: String,
    },

    #[error("{value} does not fit in {expected}")]
    OutOfRange { expected: &'static str, value: String },

    /// Structural (serde) decoding into the target type failed.
    #[error("structural decode failed: {0}")]
    Structural(#[from] serde_json::Error),
}

/// A rejected transform tree edit.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HierarchyError {
    /// The edit would make a node its own ancestor.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("transform node {0:?} does not exist")]
    MissingNode(NodeId),

    #[error("entity {0:?} is not alive")]
    MissingEntity(Entity),

    /// The node is not reachable from the world root.
    #[error("transform node {0:?} is not attached to the world")]
    Detached(NodeId),

    /// The node belongs to an entity that is built or already destroyed.
    #[error("entity {0:?} is not spawned")]
    NotSpawned(Entity),
}
