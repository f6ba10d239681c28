//! Array-backed binary heap with a fixed capacity and an external ordering.
//!
//! The root is the minimum under the comparator; pass `order::reverse(..)`
//! for max-heap behavior. Slots `[len, capacity)` are free for `insert`
//! without reorganizing the heap.

use std::cmp::Ordering;

use seqops_core::error::{Error, Result};
use seqops_core::order::Comparator;

pub struct BoundedHeap<T, C> {
    data: Vec<T>,
    capacity: usize,
    cmp: C,
}

impl<T, C: Comparator<T>> BoundedHeap<T, C> {
    pub fn new(capacity: usize, cmp: C) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            cmp,
        }
    }

    /// Build a heap over `items` in O(n).
    pub fn from_vec(items: Vec<T>, capacity: usize, cmp: C) -> Result<Self> {
        if items.len() > capacity {
            return Err(Error::InvalidArgument(format!(
                "{} items exceed heap capacity {}",
                items.len(),
                capacity
            )));
        }
        let mut heap = Self {
            data: items,
            capacity,
            cmp,
        };
        heap.data.reserve(capacity - heap.data.len());
        heap.heapify();
        Ok(heap)
    }

    /// Move every element of `items` into the heap and restore the heap
    /// property. `items` is left empty (its allocation is kept).
    pub fn refill(&mut self, items: &mut Vec<T>) -> Result<()> {
        if self.data.len() + items.len() > self.capacity {
            return Err(Error::InvalidState(format!(
                "refill of {} items overflows heap ({} of {} used)",
                items.len(),
                self.data.len(),
                self.capacity
            )));
        }
        self.data.append(items);
        self.heapify();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Current minimum.
    pub fn peek(&self) -> Result<&T> {
        self.data.first().ok_or(Error::Exhausted)
    }

    /// Remove and return the minimum.
    pub fn dequeue(&mut self) -> Result<T> {
        if self.data.is_empty() {
            return Err(Error::Exhausted);
        }
        let top = self.data.swap_remove(0);
        self.sift_down(0);
        Ok(top)
    }

    /// Substitute the minimum with `value` and return the old minimum.
    /// Same result as `dequeue` then `insert`, with a single sift.
    pub fn replace(&mut self, value: T) -> Result<T> {
        let root = self.data.first_mut().ok_or(Error::Exhausted)?;
        let top = std::mem::replace(root, value);
        self.sift_down(0);
        Ok(top)
    }

    pub fn insert(&mut self, value: T) -> Result<()> {
        if self.is_full() {
            return Err(Error::InvalidState(format!(
                "heap is full ({} elements)",
                self.capacity
            )));
        }
        self.data.push(value);
        self.sift_up(self.data.len() - 1);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Remaining elements in heap (not sorted) order.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.cmp.compare(&self.data[a], &self.data[b]) == Ordering::Less
    }

    fn heapify(&mut self) {
        for i in (0..self.data.len() / 2).rev() {
            self.sift_down(i);
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.data.len();
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let right = left + 1;
            let child = if right < n && self.less(right, left) {
                right
            } else {
                left
            };
            if !self.less(child, i) {
                break;
            }
            self.data.swap(i, child);
            i = child;
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.less(i, parent) {
                break;
            }
            self.data.swap(i, parent);
            i = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqops_core::order::{reverse, Natural};
    use seqops_core::ErrorKind;

    #[test]
    fn test_peek_tracks_minimum_under_mixed_ops() {
        let mut heap = BoundedHeap::new(16, Natural);
        let mut shadow: Vec<u32> = Vec::new();
        let mut seed = 17u32;
        for step in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let v = (seed >> 16) % 100;
            match step % 3 {
                0 | 1 if !heap.is_full() => {
                    heap.insert(v).unwrap();
                    shadow.push(v);
                }
                _ if !heap.is_empty() => {
                    let old = heap.replace(v).unwrap();
                    let pos = shadow.iter().position(|x| *x == old).unwrap();
                    shadow[pos] = v;
                }
                _ => {}
            }
            if step % 7 == 0 && !heap.is_empty() {
                let top = heap.dequeue().unwrap();
                let pos = shadow.iter().position(|x| *x == top).unwrap();
                shadow.swap_remove(pos);
            }
            assert_eq!(heap.len(), shadow.len());
            if let Some(min) = shadow.iter().min() {
                assert_eq!(heap.peek().unwrap(), min);
            }
        }
    }

    #[test]
    fn test_reversed_comparator_gives_max_heap() {
        let mut heap = BoundedHeap::from_vec(vec![4, 9, 1, 7], 4, reverse(Natural)).unwrap();
        assert_eq!(*heap.peek().unwrap(), 9);
        assert_eq!(heap.replace(3).unwrap(), 9);
        let mut out = Vec::new();
        while !heap.is_empty() {
            out.push(heap.dequeue().unwrap());
        }
        assert_eq!(out, vec![7, 4, 3, 1]);
    }

    #[test]
    fn test_capacity_errors() {
        let mut heap = BoundedHeap::new(1, Natural);
        assert_eq!(heap.peek().unwrap_err().kind(), ErrorKind::Exhausted);
        assert_eq!(heap.dequeue().unwrap_err().kind(), ErrorKind::Exhausted);
        assert_eq!(heap.replace(1).unwrap_err().kind(), ErrorKind::Exhausted);
        heap.insert(5).unwrap();
        assert_eq!(heap.insert(6).unwrap_err().kind(), ErrorKind::InvalidState);
        assert!(BoundedHeap::from_vec(vec![1, 2], 1, Natural).is_err());
    }
}
