//! Component trait, component kinds and presence masks

use bitflags::bitflags;

use super::storage::{ComponentStore, ComponentStores};

bitflags! {
    /// Per-entity component presence bits
    ///
    /// Bit `k` is set iff the entity owns a component of kind `k`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentMask: u32 {
        /// [`Renderable`](super::components::Renderable)
        const RENDERABLE = 1 << 0;
        /// [`Transform`](super::components::Transform)
        const TRANSFORM = 1 << 1;
        /// [`Physics`](super::components::Physics)
        const PHYSICS = 1 << 2;
        /// [`LightSource`](super::components::LightSource)
        const LIGHT_SOURCE = 1 << 3;
        /// [`Ai`](super::components::Ai)
        const AI = 1 << 4;
    }
}

/// The closed set of component kinds, one mask bit each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Mesh + texture + material scalars
    Renderable = 0,
    /// Position, rotation and scale
    Transform = 1,
    /// Velocity, acceleration, mass, static flag
    Physics = 2,
    /// Point light parameters
    LightSource = 3,
    /// Behaviour state and waypoints
    Ai = 4,
}

impl ComponentKind {
    /// Every kind in bit order
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Renderable,
        ComponentKind::Transform,
        ComponentKind::Physics,
        ComponentKind::LightSource,
        ComponentKind::Ai,
    ];

    /// The presence bit for this kind
    pub const fn mask(self) -> ComponentMask {
        ComponentMask::from_bits_truncate(1 << self as u32)
    }
}

/// Implemented by every component type
///
/// Each type names its kind and how to reach its typed store, which keeps
/// lookups free of runtime type ids.
pub trait Component: Sized + 'static {
    /// Kind (and therefore mask bit) of this component
    const KIND: ComponentKind;

    /// Shared access to this type's store
    fn store(stores: &ComponentStores) -> &ComponentStore<Self>;

    /// Exclusive access to this type's store
    fn store_mut(stores: &mut ComponentStores) -> &mut ComponentStore<Self>;
}

/// Wire a component type to its kind and its field in [`ComponentStores`]
macro_rules! impl_component {
    ($ty:ty, $kind:expr, $field:ident) => {
        impl $crate::ecs::Component for $ty {
            const KIND: $crate::ecs::ComponentKind = $kind;

            fn store(stores: &$crate::ecs::storage::ComponentStores) -> &$crate::ecs::storage::ComponentStore<Self> {
                &stores.$field
            }

            fn store_mut(stores: &mut $crate::ecs::storage::ComponentStores) -> &mut $crate::ecs::storage::ComponentStore<Self> {
                &mut stores.$field
            }
        }
    };
}

pub(crate) use impl_component;
