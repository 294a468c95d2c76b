//! Tuples of component types used by group/query/task/transform

use std::collections::{HashMap, HashSet};

use super::{Component, ComponentTypeId, RegistryError, ValueBox};

/// One entity's storage bucket: component type to boxed value.
pub type Components = HashMap<ComponentTypeId, ValueBox>;

/// A non-empty tuple of distinct component types, e.g. `(Position,)` or
/// `(Position, Velocity)`.
///
/// Implemented for tuples of one to eight types. There is deliberately no
/// implementation for `()`: a group over no types has no seed set.
pub trait ComponentSet: 'static {
    /// Mutable references to each member, in tuple order.
    type Refs<'a>: Send;

    fn type_ids() -> Vec<ComponentTypeId>;

    /// Borrow every member out of one bucket at once.
    ///
    /// Returns `None` if any member is physically absent. Presence in the
    /// bucket says nothing about liveness; callers filter on the validity
    /// index first.
    fn fetch(components: &mut Components) -> Option<Self::Refs<'_>>;
}

/// Type ids of `Q`, rejecting a tuple that names the same type twice.
pub(crate) fn distinct_type_ids<Q: ComponentSet>() -> Result<Vec<ComponentTypeId>, RegistryError> {
    let ids = Q::type_ids();
    let mut seen = HashSet::with_capacity(ids.len());
    for id in &ids {
        if !seen.insert(*id) {
            return Err(RegistryError::DuplicateComponent(*id));
        }
    }
    Ok(ids)
}

macro_rules! impl_component_set {
    ($($T:ident => $slot:ident),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            type Refs<'a> = ($(&'a mut $T,)+);

            fn type_ids() -> Vec<ComponentTypeId> {
                vec![$(ComponentTypeId::of::<$T>()),+]
            }

            fn fetch(components: &mut Components) -> Option<Self::Refs<'_>> {
                $(let mut $slot: Option<&mut $T> = None;)+
                for (type_id, value) in components.iter_mut() {
                    $(if *type_id == ComponentTypeId::of::<$T>() {
                        $slot = value.get_mut::<$T>();
                    } else)+ {}
                }
                Some(($($slot?,)+))
            }
        }
    };
}

impl_component_set!(A => a);
impl_component_set!(A => a, B => b);
impl_component_set!(A => a, B => b, C => c);
impl_component_set!(A => a, B => b, C => c, D => d);
impl_component_set!(A => a, B => b, C => c, D => d, E => e);
impl_component_set!(A => a, B => b, C => c, D => d, E => e, F => f);
impl_component_set!(A => a, B => b, C => c, D => d, E => e, F => f, G => g);
impl_component_set!(A => a, B => b, C => c, D => d, E => e, F => f, G => g, H => h);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(i32, i32);
    #[derive(Debug, PartialEq)]
    struct Velocity(i32);
    #[derive(Debug, PartialEq)]
    struct Health(u8);

    fn bucket() -> Components {
        let mut components = Components::new();
        components.insert(ComponentTypeId::of::<Position>(), ValueBox::new(Position(1, 2)));
        components.insert(ComponentTypeId::of::<Velocity>(), ValueBox::new(Velocity(5)));
        components
    }

    #[test]
    fn test_fetch_borrows_members_disjointly() {
        let mut components = bucket();

        let (pos, vel) = <(Position, Velocity)>::fetch(&mut components).unwrap();
        pos.0 += vel.0;
        vel.0 = 0;

        assert_eq!(
            components[&ComponentTypeId::of::<Position>()].get::<Position>(),
            Some(&Position(6, 2))
        );
        assert_eq!(
            components[&ComponentTypeId::of::<Velocity>()].get::<Velocity>(),
            Some(&Velocity(0))
        );
    }

    #[test]
    fn test_fetch_follows_tuple_order() {
        let mut components = bucket();
        let (vel, pos) = <(Velocity, Position)>::fetch(&mut components).unwrap();
        assert_eq!(*vel, Velocity(5));
        assert_eq!(*pos, Position(1, 2));
    }

    #[test]
    fn test_fetch_missing_member() {
        let mut components = bucket();
        assert!(<(Position, Health)>::fetch(&mut components).is_none());
    }

    #[test]
    fn test_duplicate_members_rejected() {
        assert!(distinct_type_ids::<(Position, Velocity)>().is_ok());
        assert!(matches!(
            distinct_type_ids::<(Position, Velocity, Position)>(),
            Err(RegistryError::DuplicateComponent(id)) if id == ComponentTypeId::of::<Position>()
        ));
    }
}
