//! # Component Registry: Names to Factories and Setters
//!
//! Blueprints name component types and their members as strings. The
//! registry turns those strings into code: a factory per type, plus a table
//! of typed setters per member.
//!
//! ```text
//! ComponentRegistry
//! ├── "PhysicsBody" ─┐
//! ├── "physics.PhysicsBody" (alias) ─┤
//! │                                  ▼
//! │        ComponentType { factory: PhysicsBody::default,
//! │                        properties: { … },
//! │                        fields: { mass, velocity, drag_x, … } }
//! └── "Health" ──► ComponentType { … }
//! ```
//!
//! Members come in two flavours, looked up in this order:
//!
//! - **properties**: a setter function that receives the converted value
//!   and may run logic (clamping, derived state),
//! - **fields**: a plain place (`|c| &mut c.mass`) the value is stored into.
//!
//! Both convert through [`FromProperty`], so the member's Rust type decides
//! what blueprint values are acceptable.
//!
//! ```ignore
//! let mut registry = ComponentRegistry::new();
//! registry
//!     .register::<Health>("Health")
//!     .field("max", |h: &mut Health| &mut h.max)
//!     .property("current", |h: &mut Health, v: u32| h.current = v.min(h.max));
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;

use serde_json::Value;

use crate::blueprint::convert::FromProperty;
use crate::ecs::Component;
use crate::error::{ConversionError, PropertyError};

type Factory = Box<dyn Fn() -> Box<dyn Component>>;
type Setter = Box<dyn Fn(&mut dyn Component, &Value) -> Result<(), ConversionError>>;

struct ComponentType {
    name: String,
    type_id: TypeId,
    factory: Factory,
    properties: HashMap<String, Setter>,
    fields: HashMap<String, Setter>,
}

/// Maps component type names to factories and member setters.
#[derive(Default)]
pub struct ComponentRegistry {
    types: Vec<ComponentType>,
    by_name: HashMap<String, usize>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with cairn's built-in components already registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::components::register_builtins(&mut registry);
        registry
    }

    /// Register `T` under `name`. Registering a name again replaces the
    /// earlier type.
    pub fn register<T: Component + Default>(
        &mut self,
        name: impl Into<String>,
    ) -> ComponentTypeBuilder<'_, T> {
        let name = name.into();
        let entry = ComponentType {
            name: name.clone(),
            type_id: TypeId::of::<T>(),
            factory: Box::new(|| Box::new(T::default()) as Box<dyn Component>),
            properties: HashMap::new(),
            fields: HashMap::new(),
        };

        let index = match self.by_name.get(&name) {
            Some(&index) => {
                log::warn!("Component type '{name}' registered twice; replacing");
                self.types[index] = entry;
                index
            }
            None => {
                self.types.push(entry);
                self.types.len() - 1
            }
        };
        self.by_name.insert(name, index);

        ComponentTypeBuilder {
            registry: self,
            index,
            _marker: PhantomData,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered names in registration order, aliases excluded.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.name.as_str())
    }

    /// The name `name` was registered under (resolves aliases).
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|t| t.name.as_str())
    }

    /// The registered name of the Rust type `T`, if any.
    pub fn name_of<T: Component>(&self) -> Option<&str> {
        let id = TypeId::of::<T>();
        self.types.iter().find(|t| t.type_id == id).map(|t| t.name.as_str())
    }

    /// Property and field names of a type, properties first, each sorted.
    pub fn members(&self, name: &str) -> Vec<&str> {
        let Some(ty) = self.lookup(name) else {
            return Vec::new();
        };
        let mut properties: Vec<&str> = ty.properties.keys().map(String::as_str).collect();
        let mut fields: Vec<&str> = ty.fields.keys().map(String::as_str).collect();
        properties.sort_unstable();
        fields.sort_unstable();
        properties.extend(fields);
        properties
    }

    /// A default-constructed instance of the named type.
    pub fn create(&self, name: &str) -> Option<Box<dyn Component>> {
        self.lookup(name).map(|t| (t.factory)())
    }

    /// Convert `value` and store it into member `property` of `component`,
    /// which must be an instance of the type registered as `type_name`.
    pub fn bind(
        &self,
        type_name: &str,
        component: &mut dyn Component,
        property: &str,
        value: &Value,
    ) -> Result<(), PropertyError> {
        let unbound = || PropertyError::Unbound {
            component_type: type_name.to_string(),
            property: property.to_string(),
        };
        let ty = self.lookup(type_name).ok_or_else(unbound)?;
        let setter = ty
            .properties
            .get(property)
            .or_else(|| ty.fields.get(property))
            .ok_or_else(unbound)?;

        setter(component, value).map_err(|source| PropertyError::Conversion {
            component_type: type_name.to_string(),
            property: property.to_string(),
            source,
        })
    }

    fn lookup(&self, name: &str) -> Option<&ComponentType> {
        self.by_name.get(name).and_then(|&i| self.types.get(i))
    }
}

/// Builder returned by [`ComponentRegistry::register`] for declaring members.
pub struct ComponentTypeBuilder<'r, T> {
    registry: &'r mut ComponentRegistry,
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentTypeBuilder<'_, T> {
    /// A writable property: `set` receives the converted value.
    pub fn property<V, F>(mut self, name: impl Into<String>, set: F) -> Self
    where
        V: FromProperty,
        F: Fn(&mut T, V) + 'static,
    {
        let setter: Setter = Box::new(
            move |component: &mut dyn Component, value: &Value| -> Result<(), ConversionError> {
                let value = V::from_property(value)?;
                set(downcast::<T>(component)?, value);
                Ok(())
            },
        );
        self.entry().properties.insert(name.into(), setter);
        self
    }

    /// A plain field: the converted value is stored into `place`.
    pub fn field<V, F>(mut self, name: impl Into<String>, place: F) -> Self
    where
        V: FromProperty,
        F: Fn(&mut T) -> &mut V + 'static,
    {
        let setter: Setter = Box::new(
            move |component: &mut dyn Component, value: &Value| -> Result<(), ConversionError> {
                let value = V::from_property(value)?;
                *place(downcast::<T>(component)?) = value;
                Ok(())
            },
        );
        self.entry().fields.insert(name.into(), setter);
        self
    }

    /// An additional lookup name, e.g. a namespaced `"physics.PhysicsBody"`.
    pub fn alias(self, name: impl Into<String>) -> Self {
        let index = self.index;
        self.registry.by_name.insert(name.into(), index);
        self
    }

    fn entry(&mut self) -> &mut ComponentType {
        &mut self.registry.types[self.index]
    }
}

fn downcast<T: Component>(component: &mut dyn Component) -> Result<&mut T, ConversionError> {
    component.downcast_mut::<T>().ok_or_else(|| ConversionError::Mismatch {
        expected: std::any::type_name::<T>(),
        found: "a different component type".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::math::Vec2;

    #[derive(Debug, Default)]
    struct Health {
        max: u32,
        current: u32,
        regen: Option<f32>,
    }

    impl Component for Health {}

    #[derive(Debug, Default)]
    struct Mover {
        speed: Vec2,
    }

    impl Component for Mover {}

    fn registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry
            .register::<Health>("Health")
            .field("max", |h: &mut Health| &mut h.max)
            .field("current", |h: &mut Health| &mut h.current)
            .field("regen", |h: &mut Health| &mut h.regen)
            .property("clamped", |h: &mut Health, v: u32| h.current = v.min(h.max))
            .alias("game.Health");
        registry
            .register::<Mover>("Mover")
            .field("speed", |m: &mut Mover| &mut m.speed);
        registry
    }

    fn health(component: &dyn Component) -> &Health {
        component.downcast_ref::<Health>().unwrap()
    }

    #[test]
    fn create_by_name_and_alias() {
        let registry = registry();
        assert!(registry.create("Health").unwrap().as_ref().is::<Health>());
        assert!(registry.create("game.Health").unwrap().as_ref().is::<Health>());
        assert!(registry.create("Shield").is_none());
        assert_eq!(registry.canonical_name("game.Health"), Some("Health"));
        assert_eq!(registry.name_of::<Mover>(), Some("Mover"));
        assert_eq!(registry.type_names().collect::<Vec<_>>(), vec!["Health", "Mover"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn fields_and_properties_bind() {
        let registry = registry();
        let mut component = registry.create("Health").unwrap();
        registry.bind("Health", component.as_mut(), "max", &json!(10)).unwrap();
        registry.bind("Health", component.as_mut(), "clamped", &json!(25)).unwrap();
        registry.bind("Health", component.as_mut(), "regen", &json!(0.5)).unwrap();

        let h = health(component.as_ref());
        assert_eq!(h.max, 10);
        assert_eq!(h.current, 10);
        assert_eq!(h.regen, Some(0.5));
    }

    #[test]
    fn properties_shadow_fields() {
        let mut registry = ComponentRegistry::new();
        registry
            .register::<Health>("Health")
            .field("current", |h: &mut Health| &mut h.current)
            .property("current", |h: &mut Health, v: u32| h.current = v * 2);

        let mut component = registry.create("Health").unwrap();
        registry.bind("Health", component.as_mut(), "current", &json!(4)).unwrap();
        assert_eq!(health(component.as_ref()).current, 8);
    }

    #[test]
    fn unknown_members_are_unbound() {
        let registry = registry();
        let mut component = registry.create("Health").unwrap();
        let err = registry.bind("Health", component.as_mut(), "armor", &json!(1)).unwrap_err();
        assert!(matches!(err, PropertyError::Unbound { ref property, .. } if property == "armor"));
    }

    #[test]
    fn conversion_failures_leave_the_component_untouched() {
        let registry = registry();
        let mut component = registry.create("Mover").unwrap();
        let err = registry
            .bind("Mover", component.as_mut(), "speed", &json!([1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, PropertyError::Conversion { .. }));
        assert_eq!(component.as_ref().downcast_ref::<Mover>().unwrap().speed, Vec2::ZERO);
    }

    #[test]
    fn wrong_instance_type_is_a_conversion_error() {
        let registry = registry();
        let mut component = registry.create("Mover").unwrap();
        let err = registry.bind("Health", component.as_mut(), "max", &json!(1)).unwrap_err();
        assert!(matches!(err, PropertyError::Conversion { .. }));
    }

    #[test]
    fn members_are_listed() {
        let registry = registry();
        assert_eq!(registry.members("Health"), vec!["clamped", "current", "max", "regen"]);
        assert!(registry.members("Nope").is_empty());
    }

    #[test]
    fn re_registering_replaces() {
        let mut registry = registry();
        registry.register::<Mover>("Health");
        assert!(registry.create("Health").unwrap().as_ref().is::<Mover>());
        assert_eq!(registry.len(), 2);
    }
}
