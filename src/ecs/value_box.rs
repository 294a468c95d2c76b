//! Type-erased, move-only owner of a single component value

use std::any::Any;
use std::fmt;

use super::Component;

/// Owns at most one heap-allocated value of an arbitrary component type.
///
/// The drop glue for the concrete type is captured in the trait object when
/// the box is created, so the holder never needs to name the type again to
/// destroy it. The box is not `Clone`; ownership moves with [`ValueBox::take`]
/// or a plain Rust move.
#[derive(Default)]
pub struct ValueBox {
    value: Option<Box<dyn Any + Send + Sync>>,
    type_name: Option<&'static str>,
}

impl ValueBox {
    pub fn new<T: Component>(value: T) -> Self {
        Self {
            value: Some(Box::new(value)),
            type_name: Some(std::any::type_name::<T>()),
        }
    }

    /// Construct the value in the box from a closure.
    pub fn create<T: Component>(init: impl FnOnce() -> T) -> Self {
        Self::new(init())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Move the held value out into a new box, leaving this one empty.
    pub fn take(&mut self) -> ValueBox {
        std::mem::take(self)
    }

    pub fn get<T: Component>(&self) -> Option<&T> {
        self.value.as_deref()?.downcast_ref::<T>()
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.value.as_deref_mut()?.downcast_mut::<T>()
    }

    /// Consume the box and recover the concrete value.
    ///
    /// Returns the box unchanged when it is empty or holds another type.
    pub fn into_inner<T: Component>(mut self) -> Result<T, ValueBox> {
        match self.value.take().map(|value| value.downcast::<T>()) {
            Some(Ok(value)) => Ok(*value),
            Some(Err(value)) => {
                self.value = Some(value);
                Err(self)
            }
            None => Err(self),
        }
    }

    pub fn holds<T: Component>(&self) -> bool {
        self.value.as_deref().is_some_and(|value| value.is::<T>())
    }

    /// Destroy the held value now. Calling this on an empty box does nothing.
    pub fn release(&mut self) {
        self.value = None;
        self.type_name = None;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Name of the held type, if any
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_name
    }
}

impl fmt::Debug for ValueBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_name {
            Some(name) => write!(f, "ValueBox<{name}>"),
            None => f.write_str("ValueBox(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug, PartialEq)]
    struct Position {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_get_typed_value() {
        let mut boxed = ValueBox::new(Position { x: 1, y: 2 });

        assert!(boxed.holds::<Position>());
        assert_eq!(boxed.get::<Position>(), Some(&Position { x: 1, y: 2 }));
        assert!(boxed.get::<u32>().is_none());

        boxed.get_mut::<Position>().unwrap().x = 10;
        assert_eq!(boxed.get::<Position>().unwrap().x, 10);
    }

    #[test]
    fn test_take_leaves_source_empty() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut source = ValueBox::new(DropCounter(drops.clone()));

        let moved = source.take();
        assert!(source.is_empty());
        assert!(!moved.is_empty());

        drop(source);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        drop(moved);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut boxed = ValueBox::create(|| DropCounter(drops.clone()));

        boxed.release();
        boxed.release();
        assert!(boxed.is_empty());
        assert_eq!(boxed.type_name(), None);
        drop(boxed);

        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_overwrite_destroys_previous() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut slot = ValueBox::new(DropCounter(drops.clone()));
        assert!(slot.holds::<DropCounter>());

        slot = ValueBox::new(DropCounter(drops.clone()));
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(!slot.is_empty());
    }

    #[test]
    fn test_into_inner() {
        let boxed = ValueBox::new(Position { x: 3, y: 4 });
        let boxed = boxed.into_inner::<u8>().unwrap_err();
        assert_eq!(boxed.into_inner::<Position>().unwrap(), Position { x: 3, y: 4 });

        assert!(ValueBox::empty().into_inner::<Position>().is_err());
    }

    #[test]
    fn test_debug_names_type() {
        let boxed = ValueBox::new(7u32);
        assert_eq!(format!("{boxed:?}"), "ValueBox<u32>");
        assert_eq!(format!("{:?}", ValueBox::empty()), "ValueBox(empty)");
    }
}
