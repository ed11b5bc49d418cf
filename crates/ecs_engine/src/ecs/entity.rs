//! Entity handles and the entity directory
//!
//! An [`Entity`] packs a slot index (high 16 bits) and a generation (low 16
//! bits) into one `u32`. The [`EntityDirectory`] hands out handles, recycles
//! slots through a FIFO free list and tracks each live slot's component mask.

use std::collections::VecDeque;
use std::fmt;

use super::component::ComponentMask;

/// Number of low bits holding the generation
pub const GENERATION_BITS: u32 = 16;

/// Mask selecting the generation field
pub const GENERATION_MASK: u32 = (1 << GENERATION_BITS) - 1;

/// Highest slot index a handle can encode
pub const MAX_ENTITY_INDEX: u32 = u32::MAX >> GENERATION_BITS;

/// Entity identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    id: u32,
}

impl Entity {
    /// Build a handle from its index and generation
    pub(crate) fn from_parts(index: u32, generation: u16) -> Self {
        debug_assert!(index <= MAX_ENTITY_INDEX);
        Self { id: (index << GENERATION_BITS) | u32::from(generation) }
    }

    /// Reinterpret a raw handle value
    pub fn from_raw(id: u32) -> Self {
        Self { id }
    }

    /// Get the raw handle value
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Slot index
    pub fn index(&self) -> u32 {
        self.id >> GENERATION_BITS
    }

    /// Generation of the slot this handle was issued for
    pub fn generation(&self) -> u16 {
        (self.id & GENERATION_MASK) as u16
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u16,
    alive: bool,
    mask: ComponentMask,
}

/// Issues, recycles and tracks entity handles
#[derive(Debug, Default)]
pub struct EntityDirectory {
    slots: Vec<Slot>,
    free: VecDeque<u32>,
    live: usize,
}

impl EntityDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a handle, reusing the oldest freed slot when one exists
    ///
    /// # Panics
    /// Panics when all 65 536 slot indices are live at once.
    pub fn create(&mut self) -> Entity {
        let entity = if let Some(index) = self.free.pop_front() {
            let slot = &mut self.slots[index as usize];
            // Wraps within the 16-bit field instead of carrying into the index
            slot.generation = slot.generation.wrapping_add(1);
            slot.alive = true;
            slot.mask = ComponentMask::empty();
            Entity::from_parts(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            assert!(
                index <= MAX_ENTITY_INDEX,
                "entity index space exhausted ({} slots)",
                MAX_ENTITY_INDEX + 1
            );
            self.slots.push(Slot { generation: 0, alive: true, mask: ComponentMask::empty() });
            Entity::from_parts(index, 0)
        };

        self.live += 1;
        log::trace!("Created {}", entity);
        entity
    }

    /// Release a live handle; returns `false` and changes nothing otherwise
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let slot = &mut self.slots[entity.index() as usize];
        slot.alive = false;
        slot.mask = ComponentMask::empty();
        self.free.push_back(entity.index());
        self.live -= 1;
        log::trace!("Destroyed {}", entity);
        true
    }

    /// Whether `entity` is live with a matching generation
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index() as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation())
    }

    /// Component mask of a live entity, empty for stale handles
    pub fn mask(&self, entity: Entity) -> ComponentMask {
        if self.is_alive(entity) {
            self.slots[entity.index() as usize].mask
        } else {
            ComponentMask::empty()
        }
    }

    /// OR bits into a live entity's mask
    pub(crate) fn insert_mask(&mut self, entity: Entity, bits: ComponentMask) {
        if self.is_alive(entity) {
            self.slots[entity.index() as usize].mask.insert(bits);
        }
    }

    /// Clear bits from a live entity's mask
    pub(crate) fn remove_mask(&mut self, entity: Entity, bits: ComponentMask) {
        if self.is_alive(entity) {
            self.slots[entity.index() as usize].mask.remove(bits);
        }
    }

    /// Every live entity whose mask contains all of `required`, in index order
    pub fn matching(&self, required: ComponentMask) -> Vec<Entity> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive && slot.mask.contains(required))
            .map(|(index, slot)| Entity::from_parts(index as u32, slot.generation))
            .collect()
    }

    /// Number of live entities
    pub fn live_count(&self) -> usize {
        self.live
    }
}
