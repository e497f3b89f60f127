//! Grouping placements by model for saving
//!
//! Many placements typically share one model (a forest of identical trees).
//! The collector walks the chunk tree once and files every placement under
//! the content hash of its object, so the area writes each model and state
//! once and only stores positions per placement.

use super::{Entity, Placeable};
use crate::foundation::collections::{HandleMap, ObjectKey};
use crate::spatial::{Chunk, ChunkInfo};
use std::collections::BTreeMap;

/// Placements sharing one content hash
#[derive(Debug)]
pub struct CollectorEntry<'a> {
    /// Key of the first object seen with this hash
    pub key: ObjectKey,
    /// Object whose model and state represent the hash
    pub object: &'a dyn Placeable,
    /// Placements of named entities with their ids
    pub named: Vec<(&'a str, &'a ChunkInfo)>,
    /// Placements of anonymous entities
    pub anonymous: Vec<&'a ChunkInfo>,
}

impl CollectorEntry<'_> {
    /// Total number of placements
    pub fn len(&self) -> usize {
        self.named.len() + self.anonymous.len()
    }

    /// Check whether no placement was collected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Placements grouped by content hash, in hash order
pub type Collection<'a> = BTreeMap<String, CollectorEntry<'a>>;

/// Group every placement in `tree` by the content hash of its object
///
/// Placements whose entity or object no longer exists are skipped with a
/// warning. Distinct objects reporting the same hash are merged under the
/// first one seen.
pub fn collect<'a>(
    tree: &'a Chunk,
    entities: &'a [Option<Entity>],
    objects: &'a HandleMap<Box<dyn Placeable>>,
) -> Collection<'a> {
    let mut collection = Collection::new();

    for info in tree {
        let index = info.entity().index();
        let Some(entity) = entities.get(index).and_then(Option::as_ref) else {
            log::warn!("Placement at {} refers to retired entity {}", info.bounds(), index);
            continue;
        };

        let key = entity.object();
        let Some(object) = objects.get(key) else {
            log::warn!("Entity {} refers to a released object", index);
            continue;
        };

        let hash = object.content_hash();
        let entry = collection.entry(hash).or_insert_with_key(|hash| {
            log::trace!("Collecting model {}", hash);
            CollectorEntry {
                key,
                object: object.as_ref(),
                named: Vec::new(),
                anonymous: Vec::new(),
            }
        });

        if entry.key != key {
            log::debug!("Distinct objects share hash {}; saving them as one model", object.content_hash());
        }

        match entity.id() {
            Some(id) => entry.named.push((id, info)),
            None => entry.anonymous.push(info),
        }
    }

    collection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::foundation::math::Coordinate;
    use crate::spatial::Aabb;
    use crate::world::{Category, EntityIndex, SceneryObject};

    fn tree_object(sprite: &str) -> Box<dyn Placeable> {
        Box::new(SceneryObject::new(
            sprite,
            Aabb::new(Coordinate::zeros(), Coordinate::new(2, 2, 6)),
            Category::OBJECT,
        ))
    }

    #[test]
    fn test_groups_by_hash() {
        let mut objects = HandleMap::with_key();
        let oak_a = objects.insert(tree_object("oak"));
        let oak_b = objects.insert(tree_object("oak"));
        let pine = objects.insert(tree_object("pine"));

        let entities = vec![
            Some(Entity::anonymous(oak_a)),
            Some(Entity::anonymous(oak_b)),
            Some(Entity::named("old_pine", pine)),
            None,
        ];

        let mut tree = Chunk::new(WorldConfig::default());
        let shape = objects[oak_a].as_ref();
        for (i, x) in [0, 10, 20, 30, 40].into_iter().enumerate() {
            tree.add(EntityIndex::new(i.min(3)), Coordinate::new(x, 0, 0), shape);
        }

        let collection = collect(&tree, &entities, &objects);
        assert_eq!(collection.len(), 2);

        let oak = &collection[&objects[oak_a].content_hash()];
        assert_eq!(oak.anonymous.len(), 2);
        assert!(oak.named.is_empty());

        let pine = &collection[&objects[pine].content_hash()];
        assert_eq!(pine.named.len(), 1);
        assert_eq!(pine.named[0].0, "old_pine");

        // The two placements of the retired entity are dropped
        assert_eq!(collection.values().map(CollectorEntry::len).sum::<usize>(), 3);
    }
}
