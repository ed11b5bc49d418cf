//! Per-type component storage
//!
//! Each component type lives in a sparse set: a sparse array indexed by
//! entity slot points into a dense array of values, and every dense entry
//! remembers the exact handle that owns it. A handle whose generation no
//! longer matches never resolves, even when its slot has been reused.

use super::components::{Ai, LightSource, Physics, Renderable, Transform};
use super::Entity;

/// Sparse-set storage for one component type
#[derive(Debug)]
pub struct ComponentStore<T> {
    sparse: Vec<Option<usize>>,
    owners: Vec<Entity>,
    dense: Vec<T>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            sparse: Vec::new(),
            owners: Vec::new(),
            dense: Vec::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let index = (*self.sparse.get(entity.index() as usize)?)?;
        (self.owners[index] == entity).then_some(index)
    }

    /// Whether `entity` (exact generation) has a value here
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Insert a value; gives it back if `entity` already has one
    pub fn insert(&mut self, entity: Entity, component: T) -> Result<(), T> {
        if self.contains(entity) {
            return Err(component);
        }

        let slot = entity.index() as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        // A stale owner for this slot means a destroy skipped us; drop it
        if let Some(stale) = self.sparse[slot] {
            let stale_owner = self.owners[stale];
            self.remove(stale_owner);
        }

        self.sparse[slot] = Some(self.dense.len());
        self.owners.push(entity);
        self.dense.push(component);
        Ok(())
    }

    /// Remove and return `entity`'s value
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let index = self.dense_index(entity)?;
        self.sparse[entity.index() as usize] = None;

        let last = self.dense.len() - 1;
        if index != last {
            let moved = self.owners[last];
            self.sparse[moved.index() as usize] = Some(index);
        }
        self.owners.swap_remove(index);
        Some(self.dense.swap_remove(index))
    }

    /// Shared access to `entity`'s value
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|index| &self.dense[index])
    }

    /// Exclusive access to `entity`'s value
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(|index| &mut self.dense[index])
    }

    /// Iterate `(owner, value)` pairs in dense order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
}

/// One store per component kind
///
/// Fields are addressed through [`Component::store`](super::Component::store),
/// so adding a kind means adding a field here and a line to `remove_all`.
#[derive(Debug, Default)]
pub struct ComponentStores {
    pub(crate) renderables: ComponentStore<Renderable>,
    pub(crate) transforms: ComponentStore<Transform>,
    pub(crate) physics: ComponentStore<Physics>,
    pub(crate) lights: ComponentStore<LightSource>,
    pub(crate) ais: ComponentStore<Ai>,
}

impl ComponentStores {
    /// Drop every component owned by `entity`
    pub(crate) fn remove_all(&mut self, entity: Entity) {
        self.renderables.remove(entity);
        self.transforms.remove(entity);
        self.physics.remove(entity);
        self.lights.remove(entity);
        self.ais.remove(entity);
    }
}
