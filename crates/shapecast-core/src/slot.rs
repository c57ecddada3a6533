//! Single-slot register for the live shape.
//!
//! The presenter shows one shape at a time. Every successful generation
//! replaces the previous one, and the previous renderable is released
//! before the new one is stored.

/// Something that holds resources which must be freed when it is replaced.
pub trait Dispose {
    fn dispose(&mut self);
}

/// Holds at most one live resource.
#[derive(Debug)]
pub struct ShapeSlot<R: Dispose> {
    current: Option<R>,
    generation: u64,
}

impl<R: Dispose> Default for ShapeSlot<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Dispose> ShapeSlot<R> {
    pub fn new() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }

    /// Dispose the current resource, then store `next` in its place.
    pub fn replace(&mut self, next: R) -> &R {
        if let Some(mut prev) = self.current.take() {
            prev.dispose();
        }
        self.generation += 1;
        self.current.insert(next)
    }

    pub fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    /// Number of replacements so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn clear(&mut self) {
        if let Some(mut prev) = self.current.take() {
            prev.dispose();
        }
    }
}

impl<R: Dispose> Drop for ShapeSlot<R> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    struct Tracked {
        id: u32,
        log: Rc<RefCell<Vec<u32>>>,
    }

    impl Dispose for Tracked {
        fn dispose(&mut self) {
            self.log.borrow_mut().push(self.id);
        }
    }

    fn tracked(id: u32, log: &Rc<RefCell<Vec<u32>>>) -> Tracked {
        Tracked {
            id,
            log: log.clone(),
        }
    }

    #[test]
    fn test_empty_slot() {
        let slot: ShapeSlot<Tracked> = ShapeSlot::new();
        assert!(slot.current().is_none());
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn test_replace_disposes_previous() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut slot = ShapeSlot::new();

        slot.replace(tracked(1, &log));
        assert!(log.borrow().is_empty());

        slot.replace(tracked(2, &log));
        assert_eq!(*log.borrow(), vec![1]);
        assert_eq!(slot.current().map(|t| t.id), Some(2));
        assert_eq!(slot.generation(), 2);
    }

    #[test]
    fn test_drop_disposes_current() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut slot = ShapeSlot::new();
            slot.replace(tracked(7, &log));
        }
        assert_eq!(*log.borrow(), vec![7]);
    }

    #[test]
    fn test_clear_disposes_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut slot = ShapeSlot::new();
        slot.replace(tracked(3, &log));
        slot.clear();
        slot.clear();
        drop(slot);
        assert_eq!(*log.borrow(), vec![3]);
    }
}
