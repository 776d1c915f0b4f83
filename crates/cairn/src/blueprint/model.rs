//! Blueprint documents: the serializable description of an entity tree.
//!
//! ```json
//! {
//!   "name": "Rock",
//!   "position": [0.0, 0.0],
//!   "size": [1.0, 1.0],
//!   "rotation": 0.0,
//!   "components": [
//!     { "componentType": "PhysicsBody", "properties": { "mass": 3, "velocity": [1, 0] } }
//!   ],
//!   "children": [ { "name": "Chip", "position": [1.0, 1.0] } ]
//! }
//! ```
//!
//! Everything except `name` is optional on load: position defaults to the
//! origin, size to `(1, 1)`, rotation to 0 and both lists to empty.
//! `rotation` is in degrees. It is carried through load/save but nothing in
//! the transform hierarchy reads it.
//!
//! Property values stay untyped (`serde_json::Value`) until the materializer
//! converts them against the target component's declared types.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BlueprintError;
use crate::math::Vec2;

/// Description of one component instance: its registered type name and the
/// property values to apply, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBlueprint {
    pub component_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl ComponentBlueprint {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            properties: Map::new(),
        }
    }

    /// Append a property. A repeated name replaces the earlier value.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Append a `Vec2` property in its `[x, y]` document form.
    pub fn with_vec2(self, name: impl Into<String>, value: Vec2) -> Self {
        self.with_property(name, vec![value.x, value.y])
    }
}

/// Description of an entity: name, local transform, components and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityBlueprint {
    pub name: String,
    #[serde(default)]
    pub position: Vec2,
    #[serde(default = "unit_size")]
    pub size: Vec2,
    /// Degrees. Reserved: stored and saved, never applied.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub components: Vec<ComponentBlueprint>,
    #[serde(default)]
    pub children: Vec<EntityBlueprint>,
}

fn unit_size() -> Vec2 {
    Vec2::ONE
}

impl EntityBlueprint {
    /// An empty blueprint at the origin with unit size.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec2::ZERO,
            size: Vec2::ONE,
            rotation: 0.0,
            components: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_component(mut self, component: ComponentBlueprint) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_child(mut self, child: EntityBlueprint) -> Self {
        self.children.push(child);
        self
    }

    /// Number of entities described, this one included.
    pub fn entity_count(&self) -> usize {
        1 + self.children.iter().map(EntityBlueprint::entity_count).sum::<usize>()
    }

    /// Parse a blueprint document.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, BlueprintError> {
        serde_json::to_string_pretty(self).map_err(BlueprintError::Encode)
    }
}

/// Read and parse a blueprint file.
pub fn load_blueprint(path: impl AsRef<Path>) -> Result<EntityBlueprint, BlueprintError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| BlueprintError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    EntityBlueprint::from_json_str(&json).map_err(|source| BlueprintError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode `blueprint` and write it to `path`.
///
/// Encoding finishes before the file is touched, so a failed encode never
/// leaves a truncated file behind.
pub fn save_blueprint(
    blueprint: &EntityBlueprint,
    path: impl AsRef<Path>,
) -> Result<(), BlueprintError> {
    let path = path.as_ref();
    let json = blueprint.to_json_string()?;
    std::fs::write(path, json).map_err(|source| BlueprintError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Saved blueprint '{}' to {}", blueprint.name, path.display());
    Ok(())
}
