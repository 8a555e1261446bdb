//! A sorted collection that keeps only its first `capacity` elements.

use std::cmp::Ordering;

/// Sorted set bounded to the best `capacity` elements under a comparator.
///
/// Elements comparing equal to one already present are not inserted. Once
/// full, an element that would sort after the current last one is dropped,
/// and an element that sorts earlier evicts the last one.
#[derive(Debug, Clone)]
pub struct BoundedOrderedSet<E, C> {
    elements: Vec<E>,
    capacity: usize,
    compare: C,
}

impl<E, C> BoundedOrderedSet<E, C>
where
    C: Fn(&E, &E) -> Ordering,
{
    pub fn new(capacity: usize, compare: C) -> Self {
        BoundedOrderedSet {
            elements: Vec::with_capacity(capacity.min(1024)),
            capacity,
            compare,
        }
    }

    /// Insert `element`, returning whether it was retained.
    pub fn insert(&mut self, element: E) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.elements.len() == self.capacity {
            if let Some(last) = self.elements.last() {
                if (self.compare)(&element, last) != Ordering::Less {
                    return false;
                }
            }
        }

        match self
            .elements
            .binary_search_by(|existing| (self.compare)(existing, &element))
        {
            Ok(_) => false,
            Err(pos) => {
                self.elements.insert(pos, element);
                self.elements.truncate(self.capacity);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[E] {
        &self.elements
    }

    pub fn into_vec(self) -> Vec<E> {
        self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_smallest_elements_in_order() {
        let mut set = BoundedOrderedSet::new(3, |a: &i32, b: &i32| a.cmp(b));
        for v in [9, 4, 7, 1, 8, 3] {
            set.insert(v);
        }
        assert_eq!(set.as_slice(), &[1, 3, 4]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_rejects_equal_and_overflow() {
        let mut set = BoundedOrderedSet::new(2, |a: &i32, b: &i32| b.cmp(a));
        assert!(set.insert(5));
        assert!(!set.insert(5));
        assert!(set.insert(6));
        assert!(!set.insert(1));
        assert!(set.insert(10));
        assert_eq!(set.into_vec(), vec![10, 6]);
    }

    #[test]
    fn test_zero_capacity() {
        let mut set = BoundedOrderedSet::new(0, |a: &i32, b: &i32| a.cmp(b));
        assert!(!set.insert(1));
        assert!(set.is_empty());
        assert_eq!(set.capacity(), 0);
    }
}
