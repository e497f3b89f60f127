//! Areas
//!
//! An [`Area`] is one loaded map: the chunk tree indexing every placement,
//! the entities placed in it, the objects they own, and the zones. It also
//! knows how to write itself to a [`Record`] and read itself back.
//!
//! # Saved layout
//!
//! ```text
//! objects:  <hash> -> { type, <model fields> }
//! actions:  <action hash> -> { <action fields> }
//! entities: <hash> -> { anonym: { placement* }, named: { placement* } }
//!           placement = { pos, action?, id? }
//! states:   <hash> -> { <state fields> }
//! zones:    <name> -> { type, min, max }
//! ```
//!
//! Each model and state is written once per content hash, however many
//! entities share it.

use super::collector::{collect, CollectorEntry};
use super::{Action, Category, Entity, EntityIndex, LoadReport, Placeable, PlaceableFactory, WorldError, Zone, ZoneType};
use crate::config::WorldConfig;
use crate::foundation::collections::{HandleMap, ObjectKey};
use crate::foundation::math::{fmt_coordinate, Coordinate};
use crate::record::{Record, RecordError, Value, ValueType};
use crate::spatial::{Chunk, ChunkInfo};
use std::collections::{HashMap, HashSet};

/// One loaded map
#[derive(Debug)]
pub struct Area {
    tree: Chunk,
    objects: HandleMap<Box<dyn Placeable>>,
    entities: Vec<Option<Entity>>,
    named: HashMap<String, EntityIndex>,
    zones: Vec<Zone>,
    config: WorldConfig,
}

impl Default for Area {
    fn default() -> Self {
        Self::empty(WorldConfig::default())
    }
}

impl Area {
    /// Create an empty area with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty area with a custom tree configuration
    pub fn with_config(config: WorldConfig) -> Result<Self, WorldError> {
        config.validate()?;
        Ok(Self::empty(config))
    }

    fn empty(config: WorldConfig) -> Self {
        Self {
            tree: Chunk::new(config),
            objects: HandleMap::with_key(),
            entities: Vec::new(),
            named: HashMap::new(),
            zones: Vec::new(),
            config,
        }
    }

    /// Tree configuration
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The chunk tree
    pub fn chunks(&self) -> &Chunk {
        &self.tree
    }

    /// Drop every entity, object, zone and chunk
    pub fn clear(&mut self) {
        *self = Self::empty(self.config);
    }

    // ===== OBJECTS =====

    /// Hand an object to the area's object table
    pub fn add_object(&mut self, object: Box<dyn Placeable>) -> ObjectKey {
        self.objects.insert(object)
    }

    /// Look up an object by key
    pub fn object(&self, key: ObjectKey) -> Option<&dyn Placeable> {
        self.objects.get(key).map(|object| object.as_ref())
    }

    /// Look up an object by key for modification
    pub fn object_mut(&mut self, key: ObjectKey) -> Option<&mut dyn Placeable> {
        match self.objects.get_mut(key) {
            Some(object) => Some(object.as_mut()),
            None => None,
        }
    }

    /// Number of objects in the object table
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    // ===== ENTITIES =====

    /// Register an entity
    ///
    /// Named entities must have a non-empty id not used by another entity;
    /// on error the area is left unchanged.
    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityIndex, WorldError> {
        if let Some(id) = entity.id() {
            self.check_id(id)?;
        }
        if !self.objects.contains_key(entity.object()) {
            return Err(WorldError::StaleObject(self.entities.len()));
        }

        let index = EntityIndex::new(self.entities.len());
        if let Some(id) = entity.id() {
            self.named.insert(id.to_string(), index);
        }
        self.entities.push(Some(entity));
        Ok(index)
    }

    /// Add an object as a new anonymous entity
    pub fn spawn(&mut self, object: Box<dyn Placeable>) -> EntityIndex {
        let key = self.add_object(object);
        let index = EntityIndex::new(self.entities.len());
        self.entities.push(Some(Entity::anonymous(key)));
        index
    }

    /// Add an object as a new named entity owning it
    pub fn spawn_named(
        &mut self,
        id: impl Into<String>,
        object: Box<dyn Placeable>,
    ) -> Result<EntityIndex, WorldError> {
        let id = id.into();
        self.check_id(&id)?;
        let key = self.add_object(object);
        self.add_entity(Entity::named(id, key))
    }

    /// Add a named entity sharing the object of entity `of`
    pub fn alias(&mut self, id: impl Into<String>, of: EntityIndex) -> Result<EntityIndex, WorldError> {
        let key = self.live_entity(of)?.object();
        self.add_entity(Entity::alias(id, key))
    }

    /// The entity at `index`, if it has not been retired
    pub fn entity(&self, index: EntityIndex) -> Option<&Entity> {
        self.entities.get(index.index()).and_then(Option::as_ref)
    }

    /// The object of the entity at `index`
    pub fn get_entity(&self, index: EntityIndex) -> Option<&dyn Placeable> {
        self.entity(index).and_then(|entity| self.object(entity.object()))
    }

    /// The object of the entity at `index` for modification
    pub fn get_entity_mut(&mut self, index: EntityIndex) -> Option<&mut dyn Placeable> {
        let key = self.entity(index)?.object();
        self.object_mut(key)
    }

    /// The object of the named entity `id`
    pub fn get_named(&self, id: &str) -> Option<&dyn Placeable> {
        match self.named_index(id) {
            Some(index) => self.get_entity(index),
            None => {
                let mut known: Vec<&str> = self.named.keys().map(String::as_str).collect();
                known.sort_unstable();
                log::debug!("No entity named '{}'; known ids: {}", id, known.join(", "));
                None
            }
        }
    }

    /// Index of the named entity `id`
    pub fn named_index(&self, id: &str) -> Option<EntityIndex> {
        self.named.get(id).copied()
    }

    /// Id of the first named entity referring to `object`
    pub fn entity_name(&self, object: ObjectKey) -> Option<&str> {
        self.entities
            .iter()
            .flatten()
            .filter(|entity| entity.object() == object)
            .find_map(Entity::id)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.iter().flatten().count()
    }

    /// Iterate over live entities with their indices
    pub fn entities(&self) -> impl Iterator<Item = (EntityIndex, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(i, entity)| entity.as_ref().map(|e| (EntityIndex::new(i), e)))
    }

    /// Remove an entity and all of its placements
    ///
    /// Returns the object if the entity owned it. Aliases of a released
    /// object become stale and are skipped when saving.
    pub fn retire_entity(&mut self, index: EntityIndex) -> Result<Option<Box<dyn Placeable>>, WorldError> {
        let entity = self
            .entities
            .get_mut(index.index())
            .and_then(Option::take)
            .ok_or(WorldError::NoEntityAtIndex(index.index()))?;

        let removed = self.tree.remove_entity(index);
        log::debug!("Retired entity {} with {} placements", index.index(), removed);

        if let Some(id) = entity.id() {
            self.named.remove(id);
        }

        Ok(if entity.is_unique() {
            self.objects.remove(entity.object())
        } else {
            None
        })
    }

    // ===== PLACEMENT =====

    /// Place the entity at `index` on the map at `position`
    ///
    /// Returns the new entry, so the caller can attach an action to it.
    pub fn place_entity(&mut self, index: EntityIndex, position: Coordinate) -> Result<&mut ChunkInfo, WorldError> {
        let info = self.entry_for(index, position).map_err(|e| {
            log::error!("Cannot place entity {}: {}", index.index(), e);
            e
        })?;

        if self.tree.exists_info(&info) {
            return Err(WorldError::DuplicatePlacement {
                index: index.index(),
                position: fmt_coordinate(&position),
            });
        }
        Ok(self.tree.add_info(info))
    }

    /// Check whether the entity at `index` is placed at `position`
    pub fn exists(&self, index: EntityIndex, position: Coordinate) -> bool {
        self.entry_for(index, position)
            .is_ok_and(|info| self.tree.exists_info(&info))
    }

    /// Take the entity at `index` off the map at `position`
    ///
    /// The entity stays registered; the removed entry is returned with its
    /// action.
    pub fn remove(&mut self, index: EntityIndex, position: Coordinate) -> Option<ChunkInfo> {
        let info = self.entry_for(index, position).ok()?;
        self.tree.take_info(&info)
    }

    /// Remove the entry matching `info`, returning its entity
    pub fn remove_info(&mut self, info: &ChunkInfo) -> Option<EntityIndex> {
        self.tree.remove_info(info)
    }

    /// Entries visible in a map view, see [`Chunk::objects_in_view`]
    pub fn objects_in_view(&self, x: i32, y: i32, z: i32, length: i32, width: i32) -> Vec<&ChunkInfo> {
        self.tree.objects_in_view(x, y, z, length, width)
    }

    /// Entries of the given categories overlapping a bounding box
    pub fn objects_in_bbox(&self, min: &Coordinate, max: &Coordinate, category: Category) -> Vec<&ChunkInfo> {
        self.tree.objects_in_bbox(min, max, category)
    }

    // ===== ZONES =====

    /// Add a zone; zone names are unique
    pub fn add_zone(&mut self, zone: Zone) -> Result<(), WorldError> {
        if self.zones.iter().any(|z| z.name() == zone.name()) {
            return Err(WorldError::DuplicateZone(zone.name().to_string()));
        }
        self.zones.push(zone);
        Ok(())
    }

    /// Remove a zone by name
    pub fn remove_zone(&mut self, name: &str) -> Option<Zone> {
        let index = self.zones.iter().position(|z| z.name() == name)?;
        Some(self.zones.remove(index))
    }

    /// Look up a meta zone by name
    pub fn get_zone(&self, name: &str) -> Option<&Zone> {
        self.zones
            .iter()
            .find(|z| z.kind().contains(ZoneType::META) && z.name() == name)
    }

    /// Zones of the given type containing `point`
    pub fn find_zones(&self, point: &Coordinate, kind: ZoneType) -> Vec<&Zone> {
        self.zones.iter().filter(|z| z.matches(point, kind)).collect()
    }

    /// All zones in insertion order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    // ===== PERSISTENCE =====

    /// Write the whole area into `record`
    pub fn put_state(&self, record: &mut Record) {
        let collection = collect(&self.tree, &self.entities, &self.objects);

        let mut objects = Record::new();
        let mut actions = Record::new();
        let mut entities = Record::new();
        let mut states = Record::new();
        let mut saved_actions = HashSet::new();

        for (hash, entry) in &collection {
            let mut model = Record::new();
            model.put_uint32("type", entry.object.category().bits());
            entry.object.serialize_model(&mut model);
            objects.put_record(hash.as_str(), model);

            entities.put_record(hash.as_str(), placements_record(entry, &mut actions, &mut saved_actions));

            let mut state = Record::new();
            entry.object.serialize_state(&mut state);
            states.put_record(hash.as_str(), state);
        }

        let mut zones = Record::new();
        for zone in &self.zones {
            let mut z = Record::new();
            zone.put_state(&mut z);
            zones.put_record(zone.name(), z);
        }

        log::debug!(
            "Saved {} models, {} placements, {} zones",
            collection.len(),
            collection.values().map(CollectorEntry::len).sum::<usize>(),
            self.zones.len()
        );

        record.put_record("objects", objects);
        record.put_record("actions", actions);
        record.put_record("entities", entities);
        record.put_record("states", states);
        record.put_record("zones", zones);
    }

    /// Replace the area with the one stored in `record`
    ///
    /// A missing `objects`, `entities` or `states` section fails the call and
    /// leaves the area untouched. Otherwise loading is best effort: malformed
    /// objects and placements are skipped and listed in the returned report.
    pub fn get_state(&mut self, record: &Record, factory: &dyn PlaceableFactory) -> Result<LoadReport, WorldError> {
        let objects = section(record, "objects")?;
        let entities = section(record, "entities")?;
        let states = section(record, "states")?;
        let actions = record.get_record("actions").ok();
        let zones = record.get_record("zones").ok();

        let mut area = Self::empty(self.config);
        let mut report = LoadReport::default();
        let mut models: HashMap<&str, ObjectKey> = HashMap::new();

        for (hash, value) in objects.fields() {
            match nested(hash, value).map_err(WorldError::from).and_then(|model| load_model(hash, model, factory)) {
                Ok(object) => {
                    models.insert(hash, area.objects.insert(object));
                }
                Err(e) => report.push(format!("model '{hash}'"), e),
            }
        }

        for (hash, value) in entities.fields() {
            let Some(&key) = models.get(hash) else {
                report.push(format!("placements of '{hash}'"), WorldError::MissingModel(hash.to_string()));
                continue;
            };
            match nested(hash, value) {
                Ok(placements) => area.load_placements(hash, key, placements, actions, factory, &mut report),
                Err(e) => report.push(format!("placements of '{hash}'"), e),
            }
        }

        for (hash, value) in states.fields() {
            let Some(object) = models.get(hash).and_then(|&key| area.objects.get_mut(key)) else {
                report.push(format!("state of '{hash}'"), WorldError::MissingModel(hash.to_string()));
                continue;
            };
            if let Err(e) = nested(hash, value).and_then(|state| object.deserialize_state(state)) {
                report.push(format!("state of '{hash}'"), e);
            }
        }

        let referenced: HashSet<ObjectKey> = area.entities.iter().flatten().map(Entity::object).collect();
        area.objects.retain(|key, _| {
            let keep = referenced.contains(&key);
            if !keep {
                log::debug!("Dropping model with no placements");
            }
            keep
        });

        if let Some(zones) = zones {
            for (name, value) in zones.fields() {
                let zone = nested(name, value).and_then(|z| Zone::from_record(name, z));
                if let Err(e) = zone.map_err(WorldError::from).and_then(|z| area.add_zone(z)) {
                    report.push(format!("zone '{name}'"), e);
                }
            }
        }

        log::debug!(
            "Loaded {} models, {} entities, {} placements, {} zones ({} skipped)",
            area.objects.len(),
            area.entity_count(),
            area.tree.len(),
            area.zones.len(),
            report.failures().len()
        );

        *self = area;
        Ok(report)
    }

    fn load_placements(
        &mut self,
        hash: &str,
        key: ObjectKey,
        placements: &Record,
        actions: Option<&Record>,
        factory: &dyn PlaceableFactory,
        report: &mut LoadReport,
    ) {
        // The first entity created for a hash owns its object
        let mut owner_exists = false;

        if let Ok(anonym) = placements.get_record("anonym") {
            let mut shared = None;
            for (_, value) in anonym.fields() {
                let placement = match SavedPlacement::parse(value, actions) {
                    Ok(placement) => placement,
                    Err(e) => {
                        report.push(format!("anonymous placement of '{hash}'"), e);
                        continue;
                    }
                };

                let index = match shared {
                    Some(index) => index,
                    None => {
                        let index = EntityIndex::new(self.entities.len());
                        self.entities.push(Some(Entity::anonymous(key)));
                        owner_exists = true;
                        shared = Some(index);
                        index
                    }
                };
                if let Err(e) = self.load_placement(index, key, placement) {
                    report.push(format!("anonymous placement of '{hash}'"), e);
                }
            }
        }

        if let Ok(named) = placements.get_record("named") {
            // An entity with several placements is saved once per placement
            let mut loaded: HashMap<String, EntityIndex> = HashMap::new();
            for (_, value) in named.fields() {
                let result = SavedPlacement::parse(value, actions).and_then(|placement| {
                    let id = placement.id.clone().ok_or_else(|| RecordError::MissingField("id".to_string()))?;
                    Ok((id, placement))
                });
                let (id, placement) = match result {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        report.push(format!("named placement of '{hash}'"), e);
                        continue;
                    }
                };

                let index = match loaded.get(&id) {
                    Some(&index) => index,
                    None => match self.load_named(&id, key, owner_exists, factory, report) {
                        Ok(index) => {
                            owner_exists = true;
                            loaded.insert(id.clone(), index);
                            index
                        }
                        Err(e) => {
                            report.push(format!("named placement of '{hash}'"), e);
                            continue;
                        }
                    },
                };

                if let Err(e) = self.load_placement(index, key, placement) {
                    report.push(format!("placement of '{id}'"), e);
                }
            }
        }
    }

    /// Create the entity for a named id and let the factory bind it
    fn load_named(
        &mut self,
        id: &str,
        key: ObjectKey,
        owner_exists: bool,
        factory: &dyn PlaceableFactory,
        report: &mut LoadReport,
    ) -> Result<EntityIndex, WorldError> {
        let entity = if owner_exists {
            Entity::alias(id, key)
        } else {
            Entity::named(id, key)
        };
        let index = self.add_entity(entity)?;

        if let Some(object) = self.objects.get_mut(key) {
            if !factory.bind_named(id, object.as_mut()) {
                report.push(format!("named entity '{id}'"), WorldError::UnresolvedLink(id.to_string()));
            }
        }
        Ok(index)
    }

    fn load_placement(&mut self, index: EntityIndex, key: ObjectKey, placement: SavedPlacement) -> Result<(), WorldError> {
        let object = self.objects.get(key).ok_or(WorldError::StaleObject(index.index()))?;
        let mut info = ChunkInfo::checked_new(index, placement.position, object.as_ref())
            .ok_or_else(|| out_of_range(index, &placement.position))?;
        if let Some(action) = placement.action {
            info = info.with_action(action);
        }
        self.tree.add_info(info);
        Ok(())
    }

    fn check_id(&self, id: &str) -> Result<(), WorldError> {
        if id.is_empty() {
            return Err(WorldError::EmptyEntityId);
        }
        if self.named.contains_key(id) {
            return Err(WorldError::DuplicateEntity(id.to_string()));
        }
        Ok(())
    }

    fn live_entity(&self, index: EntityIndex) -> Result<&Entity, WorldError> {
        self.entity(index).ok_or(WorldError::NoEntityAtIndex(index.index()))
    }

    fn entry_for(&self, index: EntityIndex, position: Coordinate) -> Result<ChunkInfo, WorldError> {
        let entity = self.live_entity(index)?;
        let object = self
            .objects
            .get(entity.object())
            .ok_or(WorldError::StaleObject(index.index()))?;
        ChunkInfo::checked_new(index, position, object.as_ref()).ok_or_else(|| out_of_range(index, &position))
    }
}

fn out_of_range(index: EntityIndex, position: &Coordinate) -> WorldError {
    WorldError::PositionOutOfRange {
        index: index.index(),
        position: fmt_coordinate(position),
    }
}

/// A placement as read back from a save
struct SavedPlacement {
    position: Coordinate,
    action: Option<Action>,
    id: Option<String>,
}

impl SavedPlacement {
    fn parse(value: &Value, actions: Option<&Record>) -> Result<Self, WorldError> {
        let record = nested("placement", value)?;
        let position = record.get_coordinate("pos")?;

        let action = match record.get("action") {
            Some(_) => {
                let hash = record.get_string("action")?;
                let data = actions
                    .and_then(|table| table.get_record(hash).ok())
                    .ok_or_else(|| WorldError::UnknownAction(hash.to_string()))?;
                let mut action = Action::new(hash);
                action.get_state(data)?;
                Some(action)
            }
            None => None,
        };

        let id = match record.get("id") {
            Some(_) => Some(record.get_string("id")?.to_string()),
            None => None,
        };

        Ok(Self { position, action, id })
    }
}

fn placements_record(entry: &CollectorEntry<'_>, actions: &mut Record, saved: &mut HashSet<String>) -> Record {
    let mut anonym = Record::new();
    for info in &entry.anonymous {
        anonym.put_record("placement", placement_record(info, None, actions, saved));
    }

    let mut named = Record::new();
    for (id, info) in &entry.named {
        named.put_record("placement", placement_record(info, Some(*id), actions, saved));
    }

    let mut placements = Record::new();
    placements.put_record("anonym", anonym);
    placements.put_record("named", named);
    placements
}

fn placement_record(info: &ChunkInfo, id: Option<&str>, actions: &mut Record, saved: &mut HashSet<String>) -> Record {
    let mut placement = Record::new();
    placement.put_coordinate("pos", &info.position());

    if let Some(action) = info.action() {
        placement.put_string("action", action.hash());
        if saved.insert(action.hash().to_string()) {
            let mut data = Record::new();
            action.put_state(&mut data);
            actions.put_record(action.hash(), data);
        }
    }

    if let Some(id) = id {
        placement.put_string("id", id);
    }
    placement
}

fn load_model(hash: &str, model: &Record, factory: &dyn PlaceableFactory) -> Result<Box<dyn Placeable>, WorldError> {
    let bits = model.get_uint32("type")?;
    let mut object = factory
        .create(Category::from_bits_retain(bits), hash)
        .ok_or_else(|| WorldError::UnknownObjectType {
            hash: hash.to_string(),
            category: bits,
        })?;
    object.deserialize_model(model)?;

    if object.content_hash() != hash {
        log::debug!("Model '{}' now hashes to '{}'", hash, object.content_hash());
    }
    Ok(object)
}

fn section<'r>(record: &'r Record, name: &'static str) -> Result<&'r Record, WorldError> {
    record.get_record(name).map_err(|e| match e {
        RecordError::MissingField(_) => WorldError::MissingSection(name),
        other => other.into(),
    })
}

fn nested<'r>(key: &str, value: &'r Value) -> Result<&'r Record, RecordError> {
    value.as_record().ok_or_else(|| RecordError::TypeMismatch {
        key: key.to_string(),
        expected: ValueType::Record,
        found: value.kind(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Aabb;
    use crate::world::{SceneryFactory, SceneryObject};

    fn coord(x: i32, y: i32, z: i32) -> Coordinate {
        Coordinate::new(x, y, z)
    }

    fn npc(sprite: &str) -> Box<dyn Placeable> {
        Box::new(SceneryObject::new(
            sprite,
            Aabb::new(coord(0, 0, 0), coord(3, 3, 10)),
            Category::CHARACTER,
        ))
    }

    fn rock() -> Box<dyn Placeable> {
        Box::new(SceneryObject::new("rock", Aabb::new(coord(0, 0, 0), coord(4, 4, 2)), Category::OBJECT))
    }

    fn save(area: &Area) -> Record {
        let mut record = Record::new();
        area.put_state(&mut record);
        record
    }

    /// Copy of `record` with the top-level section `name` replaced or appended
    fn with_section(record: &Record, name: &str, section: Record) -> Record {
        let mut section = Some(section);
        let mut rebuilt = Record::new();
        for (key, value) in record.fields() {
            let replacement = if key == name { section.take() } else { None };
            match replacement {
                Some(replacement) => rebuilt.put_record(key, replacement),
                None => rebuilt.put(key, value.clone()),
            }
        }
        if let Some(section) = section {
            rebuilt.put_record(name, section);
        }
        rebuilt
    }

    fn placement_at(position: Coordinate, id: Option<&str>) -> Record {
        let mut placement = Record::new();
        placement.put_coordinate("pos", &position);
        if let Some(id) = id {
            placement.put_string("id", id);
        }
        placement
    }

    #[test]
    fn test_duplicate_named_entity_is_rejected() {
        let mut area = Area::new();
        let first = area.spawn_named("guard", npc("guard")).expect("first");

        let objects_before = area.object_count();
        assert!(matches!(
            area.spawn_named("guard", npc("guard")),
            Err(WorldError::DuplicateEntity(id)) if id == "guard"
        ));
        assert!(matches!(area.spawn_named("", npc("nobody")), Err(WorldError::EmptyEntityId)));
        assert_eq!(area.object_count(), objects_before);
        assert_eq!(area.entity_count(), 1);
        assert_eq!(area.named_index("guard"), Some(first));
    }

    #[test]
    fn test_named_lookup_and_alias() {
        let mut area = Area::new();
        let owner = area.spawn_named("npc_a", npc("villager")).expect("owner");
        let alias = area.alias("npc_b", owner).expect("alias");

        assert!(area.entity(owner).is_some_and(Entity::is_unique));
        assert!(area.entity(alias).is_some_and(|e| !e.is_unique()));
        assert!(area.get_named("npc_b").is_some());
        assert!(area.get_named("npc_c").is_none());

        let key = area.entity(alias).map(Entity::object).expect("key");
        assert_eq!(area.entity_name(key), Some("npc_a"));
        assert!(matches!(area.alias("npc_c", EntityIndex::new(99)), Err(WorldError::NoEntityAtIndex(99))));
    }

    #[test]
    fn test_place_and_remove() {
        let mut area = Area::new();
        let index = area.spawn(rock());

        area.place_entity(index, coord(10, 10, 0)).expect("place");
        area.place_entity(index, coord(30, 10, 0)).expect("place");
        assert!(matches!(
            area.place_entity(index, coord(10, 10, 0)),
            Err(WorldError::DuplicatePlacement { index: 0, .. })
        ));
        assert!(matches!(
            area.place_entity(EntityIndex::new(5), coord(0, 0, 0)),
            Err(WorldError::NoEntityAtIndex(5))
        ));

        assert!(area.exists(index, coord(10, 10, 0)));
        assert_eq!(area.objects_in_bbox(&coord(0, 0, 0), &coord(20, 20, 20), Category::ANY).len(), 1);

        let removed = area.remove(index, coord(10, 10, 0)).expect("removed");
        assert_eq!(removed.entity(), index);
        assert!(!area.exists(index, coord(10, 10, 0)));
        assert!(area.get_entity(index).is_some());
        assert_eq!(area.chunks().len(), 1);
    }

    #[test]
    fn test_retire_entity() {
        let mut area = Area::new();
        let owner = area.spawn_named("npc_a", npc("villager")).expect("owner");
        let alias = area.alias("npc_b", owner).expect("alias");
        area.place_entity(owner, coord(0, 0, 0)).expect("place");
        area.place_entity(alias, coord(20, 0, 0)).expect("place");
        area.place_entity(alias, coord(40, 0, 0)).expect("place");

        assert!(area.retire_entity(alias).expect("retire").is_none());
        assert_eq!(area.chunks().len(), 1);
        assert_eq!(area.named_index("npc_b"), None);
        assert!(matches!(area.retire_entity(alias), Err(WorldError::NoEntityAtIndex(1))));

        let object = area.retire_entity(owner).expect("retire").expect("owned object");
        assert_eq!(object.category(), Category::CHARACTER);
        assert!(area.chunks().is_empty());
        assert_eq!(area.object_count(), 0);
    }

    #[test]
    fn test_zones() {
        let mut area = Area::new();
        let bounds = Aabb::new(coord(0, 0, 0), coord(10, 10, 10));
        area.add_zone(Zone::new("spawn", ZoneType::META, bounds)).expect("zone");
        area.add_zone(Zone::new("floor", ZoneType::RENDER, bounds)).expect("zone");
        assert!(matches!(
            area.add_zone(Zone::new("spawn", ZoneType::RENDER, bounds)),
            Err(WorldError::DuplicateZone(_))
        ));

        assert!(area.get_zone("spawn").is_some());
        assert!(area.get_zone("floor").is_none());
        assert_eq!(area.find_zones(&coord(5, 5, 5), ZoneType::RENDER).len(), 1);
        assert_eq!(area.find_zones(&coord(5, 5, 5), ZoneType::empty()).len(), 2);
        assert!(area.find_zones(&coord(50, 5, 5), ZoneType::empty()).is_empty());

        assert!(area.remove_zone("floor").is_some());
        assert!(area.remove_zone("floor").is_none());
        assert_eq!(area.zones().len(), 1);
    }

    #[test]
    fn test_save_shares_models_and_actions() {
        let mut area = Area::new();
        let a = area.spawn(rock());
        let b = area.spawn(rock());
        area.place_entity(a, coord(0, 0, 0)).expect("place");
        area.place_entity(a, coord(10, 0, 0)).expect("place");
        area.place_entity(b, coord(20, 0, 0))
            .expect("place")
            .set_action("push")
            .data_mut()
            .put_sint32("force", 3);
        area.place_entity(b, coord(30, 0, 0)).expect("place").set_action("push");

        let record = save(&area);
        let objects = record.get_record("objects").expect("objects");
        let states = record.get_record("states").expect("states");
        let actions = record.get_record("actions").expect("actions");
        assert_eq!(objects.len(), 1);
        assert_eq!(states.len(), 1);
        assert_eq!(actions.len(), 1);

        let hash = objects.fields().next().map(|(h, _)| h.to_string()).expect("hash");
        let placements = record
            .get_record("entities")
            .and_then(|e| e.get_record(&hash))
            .and_then(|p| p.get_record("anonym"))
            .expect("anonym");
        assert_eq!(placements.len(), 4);
    }

    #[test]
    fn test_load_reuses_one_anonymous_entity_per_model() {
        let mut area = Area::new();
        for x in [0, 10, 20] {
            let index = area.spawn(rock());
            area.place_entity(index, coord(x, 0, 0)).expect("place");
        }

        let mut loaded = Area::new();
        let report = loaded.get_state(&save(&area), &SceneryFactory::new()).expect("load");
        assert!(report.is_clean());
        assert_eq!(loaded.entity_count(), 1);
        assert_eq!(loaded.object_count(), 1);
        assert_eq!(loaded.chunks().len(), 3);
    }

    #[test]
    fn test_missing_section_leaves_area_untouched() {
        let mut area = Area::new();
        let index = area.spawn(rock());
        area.place_entity(index, coord(1, 2, 3)).expect("place");

        let mut record = Record::new();
        record.put_record("objects", Record::new());
        record.put_record("states", Record::new());

        assert!(matches!(
            area.get_state(&record, &SceneryFactory::new()),
            Err(WorldError::MissingSection("entities"))
        ));
        assert_eq!(area.chunks().len(), 1);
        assert!(area.exists(index, coord(1, 2, 3)));
    }

    #[test]
    fn test_load_skips_broken_items() {
        let mut area = Area::new();
        let index = area.spawn(rock());
        area.place_entity(index, coord(0, 0, 0)).expect("place");
        area.place_entity(index, coord(9, 0, 0)).expect("place");
        let mut record = save(&area);

        // Placements and state for a model that was never saved
        let mut orphan = Record::new();
        orphan.put_record("anonym", Record::new());
        let mut entities = record.get_record("entities").expect("entities").clone();
        entities.put_record("deadbeef", orphan);

        // A model the factory refuses to create
        let mut objects = record.get_record("objects").expect("objects").clone();
        let mut alien = Record::new();
        alien.put_uint32("type", 1 << 8);
        objects.put_record("cafe", alien);

        let rebuilt = {
            let mut r = Record::new();
            for (key, value) in record.fields() {
                match key {
                    "entities" => r.put_record(key, entities.clone()),
                    "objects" => r.put_record(key, objects.clone()),
                    _ => r.put(key, value.clone()),
                }
            }
            r
        };
        record = rebuilt;

        let factory = |category: Category, _hash: &str| -> Option<Box<dyn Placeable>> {
            Category::ANY
                .contains(category)
                .then(|| Box::new(SceneryObject::empty(category)) as Box<dyn Placeable>)
        };

        let mut loaded = Area::new();
        let report = loaded.get_state(&record, &factory).expect("load");
        assert_eq!(report.failures().len(), 2);
        assert!(matches!(report.failures()[0].error, WorldError::UnknownObjectType { category: 256, .. }));
        assert!(matches!(&report.failures()[1].error, WorldError::MissingModel(h) if h == "deadbeef"));
        assert_eq!(loaded.chunks().len(), 2);
    }

    #[test]
    fn test_named_entity_with_several_placements_reloads() {
        let mut area = Area::new();
        let guard = area.spawn_named("guard", npc("guard")).expect("guard");
        let cadet = area.alias("cadet", guard).expect("cadet");
        for x in [0, 20, 40] {
            area.place_entity(guard, coord(x, 0, 0)).expect("place");
        }
        area.place_entity(cadet, coord(0, 30, 0)).expect("place");
        area.place_entity(cadet, coord(20, 30, 0)).expect("place");

        let factory = SceneryFactory::new().with_character("guard").with_character("cadet");
        let mut loaded = Area::new();
        let report = loaded.get_state(&save(&area), &factory).expect("load");
        assert!(report.is_clean(), "{:?}", report.failures());
        assert_eq!(loaded.entity_count(), 2);
        assert_eq!(loaded.object_count(), 1);
        assert_eq!(loaded.chunks().len(), 5);

        let guard = loaded.named_index("guard").expect("guard");
        let cadet = loaded.named_index("cadet").expect("cadet");
        for x in [0, 20, 40] {
            assert!(loaded.exists(guard, coord(x, 0, 0)));
        }
        assert!(loaded.exists(cadet, coord(20, 30, 0)));
        assert_eq!(
            loaded.entity(guard).map(Entity::object),
            loaded.entity(cadet).map(Entity::object)
        );
    }

    #[test]
    fn test_load_skips_inverted_boxes() {
        let mut area = Area::new();
        let index = area.spawn(rock());
        area.place_entity(index, coord(0, 0, 0)).expect("place");
        area.add_zone(Zone::new("square", ZoneType::META, Aabb::new(coord(0, 0, 0), coord(9, 9, 9))))
            .expect("zone");
        let saved = save(&area);

        let mut zones = saved.get_record("zones").expect("zones").clone();
        let mut upside_down = Record::new();
        upside_down.put_uint32("type", ZoneType::META.bits());
        upside_down.put_coordinate("min", &coord(9, 9, 9));
        upside_down.put_coordinate("max", &coord(0, 0, 0));
        zones.put_record("upside_down", upside_down);

        let mut objects = saved.get_record("objects").expect("objects").clone();
        let mut bent = Record::new();
        bent.put_uint32("type", Category::OBJECT.bits());
        bent.put_string("sprite", "bent");
        bent.put_coordinate("min", &coord(0, 5, 0));
        bent.put_coordinate("max", &coord(5, 0, 5));
        objects.put_record("bent", bent);

        let record = with_section(&with_section(&saved, "zones", zones), "objects", objects);

        let mut loaded = Area::new();
        let report = loaded.get_state(&record, &SceneryFactory::new()).expect("load");
        assert_eq!(report.failures().len(), 2);
        assert!(report.failures().iter().all(|failure| matches!(
            failure.error,
            WorldError::Record(RecordError::InvalidValue { .. })
        )));
        assert_eq!(loaded.object_count(), 1);
        assert_eq!(loaded.chunks().len(), 1);
        assert_eq!(loaded.zones().len(), 1);
        assert!(loaded.get_zone("square").is_some());
    }

    #[test]
    fn test_out_of_range_position_is_skipped() {
        let mut area = Area::new();
        let index = area.spawn(rock());
        area.place_entity(index, coord(0, 0, 0)).expect("place");
        assert!(matches!(
            area.place_entity(index, coord(i32::MAX - 1, 0, 0)),
            Err(WorldError::PositionOutOfRange { index: 0, .. })
        ));
        assert_eq!(area.chunks().len(), 1);

        let saved = save(&area);
        let hash = saved
            .get_record("objects")
            .ok()
            .and_then(|objects| objects.fields().next())
            .map(|(hash, _)| hash.to_string())
            .expect("hash");

        let mut anonym = saved
            .get_record("entities")
            .and_then(|e| e.get_record(&hash))
            .and_then(|p| p.get_record("anonym"))
            .expect("anonym")
            .clone();
        anonym.put_record("placement", placement_at(coord(5, i32::MAX, 0), None));
        anonym.put_record("placement", placement_at(coord(30, 0, 0), None));
        let mut placements = Record::new();
        placements.put_record("anonym", anonym);
        let mut entities = Record::new();
        entities.put_record(hash.as_str(), placements);
        let record = with_section(&saved, "entities", entities);

        let mut loaded = Area::new();
        let report = loaded.get_state(&record, &SceneryFactory::new()).expect("load");
        assert_eq!(report.failures().len(), 1);
        assert!(matches!(report.failures()[0].error, WorldError::PositionOutOfRange { .. }));
        assert_eq!(loaded.entity_count(), 1);
        assert_eq!(loaded.chunks().len(), 2);
        assert!(loaded.exists(EntityIndex::new(0), coord(30, 0, 0)));
    }

    #[test]
    fn test_unbound_character_is_reported_but_kept() {
        let mut area = Area::new();
        let index = area.spawn_named("merchant", npc("merchant")).expect("spawn");
        area.place_entity(index, coord(5, 5, 0)).expect("place");

        let mut loaded = Area::new();
        let report = loaded.get_state(&save(&area), &SceneryFactory::new()).expect("load");
        assert_eq!(report.failures().len(), 1);
        assert!(matches!(&report.failures()[0].error, WorldError::UnresolvedLink(id) if id == "merchant"));
        assert!(loaded.get_named("merchant").is_some());

        let bound = SceneryFactory::new().with_character("merchant");
        assert!(loaded.get_state(&save(&area), &bound).expect("load").is_clean());
    }

    #[test]
    fn test_clear_keeps_config() {
        let config = WorldConfig::default().with_max_entries_per_chunk(3);
        let mut area = Area::with_config(config).expect("config");
        let index = area.spawn(rock());
        area.place_entity(index, coord(0, 0, 0)).expect("place");
        area.add_zone(Zone::new("z", ZoneType::META, Aabb::default())).expect("zone");

        area.clear();
        assert_eq!(area.entity_count(), 0);
        assert!(area.chunks().is_empty());
        assert!(area.zones().is_empty());
        assert_eq!(area.config().max_entries_per_chunk, 3);

        assert!(Area::with_config(WorldConfig::default().with_min_chunk_extent(0)).is_err());
    }
}
