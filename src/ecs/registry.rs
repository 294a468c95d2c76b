//! Registry - central entity/component store

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, trace};
use rayon::prelude::*;

use super::contract;
use super::set::{distinct_type_ids, Components};
use super::{
    Component, ComponentSet, ComponentTypeId, EntityAllocator, EntityId, RegistryError, ValueBox,
};
use crate::config::{RegistryConfig, RemovalPolicy};

/// Registry holds all entities and their components.
///
/// Every precondition failure on the plain operations (`add`, `get`,
/// `remove`, `destroy`, `query`, ...) is a contract violation and panics.
/// The `try_*` twins report the same failures as [`RegistryError`].
///
/// Mutation is single-threaded: the only parallel access the registry hands
/// out is the disjoint component tuples given to [`Registry::transform`].
pub struct Registry {
    allocator: EntityAllocator,
    /// Storage bucket per live entity. Under [`RemovalPolicy::Deferred`]
    /// removed values linger here as tombstones.
    entities: HashMap<EntityId, Components>,
    /// Validity index: entities holding a live value of each type.
    valids: HashMap<ComponentTypeId, HashSet<EntityId>>,
    config: RegistryConfig,
    workers: Option<Arc<rayon::ThreadPool>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            entities: HashMap::new(),
            valids: HashMap::new(),
            config: RegistryConfig::default(),
            workers: None,
        }
    }

    /// Build a registry with a removal policy and transform worker settings.
    ///
    /// Fails only if a dedicated worker pool was requested and could not be
    /// started.
    pub fn with_config(config: RegistryConfig) -> Result<Self, RegistryError> {
        let workers = match config.transform.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|index| format!("ctx-transform-{index}"))
                    .build()?;
                Some(Arc::new(pool))
            }
            None => None,
        };
        debug!(
            "registry created: removal={:?}, transform threads={:?}",
            config.removal, config.transform.threads
        );

        Ok(Self {
            workers,
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create a new entity
    pub fn entity(&mut self) -> EntityId {
        let entity = self.allocator.allocate();
        self.entities.insert(entity, Components::new());
        trace!("allocated {entity}");
        entity
    }

    /// Number of live entities, regardless of what they hold
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Whether `entity` is alive and holds a live `T`
    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        self.check_live(entity, ComponentTypeId::of::<T>()).is_ok()
    }

    /// Attach `value`, replacing (and dropping) any previous `T` on `entity`.
    #[track_caller]
    pub fn add<T: Component>(&mut self, entity: EntityId, value: T) -> &mut T {
        contract::enforce(self.try_add(entity, value))
    }

    /// Attach a `T` built from `args`.
    #[track_caller]
    pub fn emplace<T, A>(&mut self, entity: EntityId, args: A) -> &mut T
    where
        T: Component + From<A>,
    {
        contract::enforce(self.try_add(entity, T::from(args)))
    }

    /// Attach the `T` returned by `init`.
    #[track_caller]
    pub fn emplace_with<T: Component>(
        &mut self,
        entity: EntityId,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        contract::enforce(self.try_add(entity, init()))
    }

    pub fn try_add<T: Component>(
        &mut self,
        entity: EntityId,
        value: T,
    ) -> Result<&mut T, RegistryError> {
        let component = ComponentTypeId::of::<T>();
        let components = self
            .entities
            .get_mut(&entity)
            .ok_or(RegistryError::InvalidEntity(entity))?;

        // Overwriting drops whatever held the slot, tombstone or not.
        let slot = match components.entry(component) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                *slot = ValueBox::new(value);
                slot
            }
            Entry::Vacant(entry) => entry.insert(ValueBox::new(value)),
        };
        self.valids.entry(component).or_default().insert(entity);
        trace!("attached {component} to {entity}");

        slot.get_mut::<T>()
            .ok_or(RegistryError::MissingComponent { entity, component })
    }

    /// Get a component from an entity
    #[track_caller]
    pub fn get<T: Component>(&self, entity: EntityId) -> &T {
        contract::enforce(self.try_get(entity))
    }

    /// Get a mutable component from an entity
    #[track_caller]
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> &mut T {
        contract::enforce(self.try_get_mut(entity))
    }

    pub fn try_get<T: Component>(&self, entity: EntityId) -> Result<&T, RegistryError> {
        let component = ComponentTypeId::of::<T>();
        self.check_live(entity, component)?;
        self.entities
            .get(&entity)
            .and_then(|components| components.get(&component))
            .and_then(|slot| slot.get::<T>())
            .ok_or(RegistryError::MissingComponent { entity, component })
    }

    pub fn try_get_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T, RegistryError> {
        let component = ComponentTypeId::of::<T>();
        self.check_live(entity, component)?;
        self.entities
            .get_mut(&entity)
            .and_then(|components| components.get_mut(&component))
            .and_then(|slot| slot.get_mut::<T>())
            .ok_or(RegistryError::MissingComponent { entity, component })
    }

    /// Detach the live `T` from `entity`.
    ///
    /// Under [`RemovalPolicy::Deferred`] the value itself survives as a
    /// tombstone until the slot is overwritten or the entity destroyed.
    #[track_caller]
    pub fn remove<T: Component>(&mut self, entity: EntityId) {
        contract::enforce(self.try_remove::<T>(entity))
    }

    pub fn try_remove<T: Component>(&mut self, entity: EntityId) -> Result<(), RegistryError> {
        let component = ComponentTypeId::of::<T>();
        self.check_live(entity, component)?;

        if let Some(holders) = self.valids.get_mut(&component) {
            holders.remove(&entity);
        }
        if self.config.removal == RemovalPolicy::Eager {
            if let Some(components) = self.entities.get_mut(&entity) {
                components.remove(&component);
            }
        }
        trace!("removed {component} from {entity}");
        Ok(())
    }

    /// Destroy an entity and every value it still stores, tombstones included.
    #[track_caller]
    pub fn destroy(&mut self, entity: EntityId) {
        contract::enforce(self.try_destroy(entity))
    }

    pub fn try_destroy(&mut self, entity: EntityId) -> Result<(), RegistryError> {
        let components = self
            .entities
            .remove(&entity)
            .ok_or(RegistryError::InvalidEntity(entity))?;

        for component in components.keys() {
            if let Some(holders) = self.valids.get_mut(component) {
                holders.remove(&entity);
            }
        }
        trace!("destroyed {entity}, dropping {} slots", components.len());
        Ok(())
    }

    /// Entities holding a live value of every type in `Q`.
    pub fn group<Q: ComponentSet>(&self) -> HashSet<EntityId> {
        let mut indices = Vec::new();
        for component in Q::type_ids() {
            match self.valids.get(&component) {
                Some(holders) if !holders.is_empty() => indices.push(holders),
                _ => return HashSet::new(),
            }
        }

        // Seeding with the smallest index keeps every later pass short.
        indices.sort_by_key(|holders| holders.len());
        let Some((seed, rest)) = indices.split_first() else {
            return HashSet::new();
        };

        let mut members = (*seed).clone();
        for holders in rest {
            members.retain(|entity| holders.contains(entity));
            if members.is_empty() {
                break;
            }
        }
        members
    }

    /// One tuple of mutable references per member of `group::<Q>()`.
    ///
    /// Order is unspecified and may differ between calls.
    #[track_caller]
    pub fn query<Q: ComponentSet>(&mut self) -> Vec<Q::Refs<'_>> {
        contract::enforce(self.try_query::<Q>())
    }

    pub fn try_query<Q: ComponentSet>(&mut self) -> Result<Vec<Q::Refs<'_>>, RegistryError> {
        distinct_type_ids::<Q>()?;
        let members = self.group::<Q>();

        Ok(self
            .entities
            .iter_mut()
            .filter(|(entity, _)| members.contains(*entity))
            .filter_map(|(_, components)| Q::fetch(components))
            .collect())
    }

    /// Call `f` once per member of `group::<Q>()`, sequentially.
    ///
    /// The registry is handed back to `f`, which may attach or detach
    /// components. It must leave the entity being visited alive.
    pub fn task<Q, F>(&mut self, mut f: F)
    where
        Q: ComponentSet,
        F: FnMut(&mut Registry, EntityId),
    {
        let members = self.group::<Q>();
        for entity in members {
            f(self, entity);
        }
    }

    /// Call `f` on every `query::<Q>()` tuple in parallel and wait for all of
    /// them to finish.
    ///
    /// Invocations run in no particular order. The registry stays mutably
    /// borrowed for the duration, so `f` cannot reach back into it.
    #[track_caller]
    pub fn transform<'r, Q, F>(&'r mut self, f: F)
    where
        Q: ComponentSet,
        F: Fn(Q::Refs<'r>) + Send + Sync,
    {
        contract::enforce(self.try_transform::<Q, F>(f))
    }

    pub fn try_transform<'r, Q, F>(&'r mut self, f: F) -> Result<(), RegistryError>
    where
        Q: ComponentSet,
        F: Fn(Q::Refs<'r>) + Send + Sync,
    {
        let workers = self.workers.clone();
        let min_batch = self.config.transform.min_batch.max(1);
        let view = self.try_query::<Q>()?;
        debug!("transform over {} tuples", view.len());

        match workers {
            Some(pool) => pool.install(|| {
                view.into_par_iter()
                    .with_min_len(min_batch)
                    .for_each(&f)
            }),
            None => view.into_par_iter().with_min_len(min_batch).for_each(&f),
        }
        Ok(())
    }

    fn check_live(&self, entity: EntityId, component: ComponentTypeId) -> Result<(), RegistryError> {
        if !self.entities.contains_key(&entity) {
            return Err(RegistryError::InvalidEntity(entity));
        }
        let live = self
            .valids
            .get(&component)
            .is_some_and(|holders| holders.contains(&entity));
        if !live {
            return Err(RegistryError::MissingComponent { entity, component });
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
