//! Scenery objects
//!
//! A minimal [`Placeable`]: a sprite name and a shape make up the model, and
//! an arbitrary record holds the mutable state. Good enough for props,
//! decoration and test fixtures; richer game objects implement the trait
//! themselves.

use super::{Category, Placeable, PlaceableFactory};
use crate::foundation::hashing::content_hash;
use crate::foundation::math::fmt_coordinate;
use crate::record::{Record, RecordError};
use crate::spatial::Aabb;
use std::any::Any;
use std::collections::HashSet;

/// A placeable defined by its sprite and extent
#[derive(Debug, Clone, PartialEq)]
pub struct SceneryObject {
    sprite: String,
    extent: Aabb,
    category: Category,
    state: Record,
}

impl SceneryObject {
    /// Create an object with an empty state
    pub fn new(sprite: impl Into<String>, extent: Aabb, category: Category) -> Self {
        Self {
            sprite: sprite.into(),
            extent,
            category,
            state: Record::new(),
        }
    }

    /// Blank object waiting for its model to be read
    pub fn empty(category: Category) -> Self {
        Self::new(String::new(), Aabb::default(), category)
    }

    /// Sprite resource name
    pub fn sprite(&self) -> &str {
        &self.sprite
    }

    /// Mutable state
    pub fn state(&self) -> &Record {
        &self.state
    }

    /// Mutable state for modification
    pub fn state_mut(&mut self) -> &mut Record {
        &mut self.state
    }
}

impl Placeable for SceneryObject {
    fn extent(&self) -> Aabb {
        self.extent
    }

    fn content_hash(&self) -> String {
        let model = format!(
            "{}|{}|{}|{}",
            self.sprite,
            fmt_coordinate(&self.extent.min),
            fmt_coordinate(&self.extent.max),
            self.category.bits()
        );
        content_hash(model.as_bytes())
    }

    fn category(&self) -> Category {
        self.category
    }

    fn serialize_model(&self, record: &mut Record) {
        record.put_string("sprite", self.sprite.as_str());
        self.extent.put_corners(record);
    }

    fn deserialize_model(&mut self, record: &Record) -> Result<(), RecordError> {
        let sprite = record.get_string("sprite")?.to_string();
        let extent = Aabb::read_corners(record)?;

        self.sprite = sprite;
        self.extent = extent;
        Ok(())
    }

    fn serialize_state(&self, record: &mut Record) {
        for (key, value) in self.state.fields() {
            record.put(key, value.clone());
        }
    }

    fn deserialize_state(&mut self, record: &Record) -> Result<(), RecordError> {
        self.state = record.clone();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Factory creating [`SceneryObject`]s for every category
///
/// Named characters are only linked if their id has been registered with
/// [`SceneryFactory::with_character`].
#[derive(Debug, Clone, Default)]
pub struct SceneryFactory {
    characters: HashSet<String>,
}

impl SceneryFactory {
    /// Create a factory with no registered characters
    pub fn new() -> Self {
        Self::default()
    }

    /// Register gameplay data for a named character
    pub fn with_character(mut self, id: impl Into<String>) -> Self {
        self.characters.insert(id.into());
        self
    }
}

impl PlaceableFactory for SceneryFactory {
    fn create(&self, category: Category, _hash: &str) -> Option<Box<dyn Placeable>> {
        Some(Box::new(SceneryObject::empty(category)))
    }

    fn bind_named(&self, id: &str, object: &mut dyn Placeable) -> bool {
        !object.category().contains(Category::CHARACTER) || self.characters.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Coordinate;

    fn crate_box() -> SceneryObject {
        SceneryObject::new(
            "crate.png",
            Aabb::new(Coordinate::new(-4, -4, 0), Coordinate::new(4, 4, 8)),
            Category::OBJECT,
        )
    }

    #[test]
    fn test_hash_depends_on_model_only() {
        let a = crate_box();
        let mut b = crate_box();
        b.state_mut().put_bool("open", true);
        assert_eq!(a.content_hash(), b.content_hash());

        let barrel = SceneryObject::new("barrel.png", a.extent(), Category::OBJECT);
        let item = SceneryObject::new("crate.png", a.extent(), Category::ITEM);
        let taller = SceneryObject::new(
            "crate.png",
            Aabb::new(Coordinate::new(-4, -4, 0), Coordinate::new(4, 4, 9)),
            Category::OBJECT,
        );
        assert_ne!(a.content_hash(), barrel.content_hash());
        assert_ne!(a.content_hash(), item.content_hash());
        assert_ne!(a.content_hash(), taller.content_hash());
    }

    #[test]
    fn test_model_and_state_round_trip() {
        let mut original = crate_box();
        original.state_mut().put_sint32("hp", 3);

        let mut model = Record::new();
        original.serialize_model(&mut model);
        let mut state = Record::new();
        original.serialize_state(&mut state);

        let mut restored = SceneryObject::empty(Category::OBJECT);
        restored.deserialize_model(&model).expect("model");
        restored.deserialize_state(&state).expect("state");
        assert_eq!(restored, original);
        assert_eq!(restored.content_hash(), original.content_hash());
    }

    #[test]
    fn test_incomplete_model_is_rejected() {
        let mut model = Record::new();
        model.put_string("sprite", "rock.png");

        let mut object = SceneryObject::empty(Category::OBJECT);
        assert_eq!(
            object.deserialize_model(&model),
            Err(RecordError::MissingField("min".to_string()))
        );
        assert_eq!(object.sprite(), "");
    }

    #[test]
    fn test_inverted_extent_is_rejected() {
        let mut model = Record::new();
        model.put_string("sprite", "rock.png");
        model.put_coordinate("min", &Coordinate::new(4, 4, 4));
        model.put_coordinate("max", &Coordinate::new(4, 0, 4));

        let mut object = SceneryObject::empty(Category::OBJECT);
        assert!(matches!(
            object.deserialize_model(&model),
            Err(RecordError::InvalidValue { .. })
        ));
        assert_eq!(object.sprite(), "");
    }

    #[test]
    fn test_factory_binds_registered_characters() {
        let factory = SceneryFactory::new().with_character("guard");
        let mut npc = SceneryObject::empty(Category::CHARACTER);
        let mut sign = SceneryObject::empty(Category::OBJECT);

        assert!(factory.bind_named("guard", &mut npc));
        assert!(!factory.bind_named("thief", &mut npc));
        assert!(factory.bind_named("anything", &mut sign));
        assert!(factory.create(Category::ITEM, "h").is_some());
    }
}
