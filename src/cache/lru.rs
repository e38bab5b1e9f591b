//! Recency List Module
//!
//! Arena-backed doubly-linked list that orders cache entries by access time.
//! Nodes are addressed by slot index instead of pointers, so the list owns
//! every node and no `unsafe` is needed.

// == Slot ==
/// One arena cell. `item` is `None` while the slot sits on the free list.
#[derive(Debug)]
struct Slot<T> {
    item: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency List ==
/// Doubly-linked list ordered by recency.
///
/// - Front (head) = most recently used
/// - Back (tail) = least recently used
///
/// Every operation that takes a slot handle is O(1); the list is never
/// searched.
#[derive(Debug)]
pub struct RecencyList<T> {
    /// Node arena
    slots: Vec<Slot<T>>,
    /// Most recently used slot
    head: Option<usize>,
    /// Least recently used slot
    tail: Option<usize>,
    /// Slots released by `remove`, reused by `push_front`
    free: Vec<usize>,
    /// Number of linked nodes
    len: usize,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free: Vec::new(),
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts an item as the most recently used node.
    ///
    /// Returns the slot handle, which stays valid until the node is removed.
    pub fn push_front(&mut self, item: T) -> usize {
        let slot = Slot {
            item: Some(item),
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };

        self.attach_front(idx);
        self.len += 1;
        idx
    }

    // == Move To Front ==
    /// Marks the node at `idx` as most recently used.
    pub fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) || !self.is_linked(idx) {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    // == Remove ==
    /// Unlinks the node at `idx` and returns its item.
    ///
    /// Returns None if the slot is not linked.
    pub fn remove(&mut self, idx: usize) -> Option<T> {
        if !self.is_linked(idx) {
            return None;
        }
        self.detach(idx);
        self.len -= 1;
        self.free.push(idx);
        self.slots[idx].item.take()
    }

    // == Pop Back ==
    /// Removes and returns the least recently used item.
    pub fn pop_back(&mut self) -> Option<T> {
        let idx = self.tail?;
        self.remove(idx)
    }

    // == Accessors ==
    /// Returns the item at `idx` without changing its position.
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx).and_then(|slot| slot.item.as_ref())
    }

    /// Returns a mutable reference to the item at `idx` without changing its position.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.slots.get_mut(idx).and_then(|slot| slot.item.as_mut())
    }

    /// Returns the most recently used item.
    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|idx| self.get(idx))
    }

    /// Returns the least recently used item.
    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|idx| self.get(idx))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates from most recently used to least recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
            remaining: self.len,
        }
    }

    // == Consistency Check ==
    /// Verifies the link structure.
    ///
    /// Walking `next` from the head must reach the tail in exactly `len`
    /// steps, and the `prev` walk from the tail must visit the same slots in
    /// reverse.
    pub fn is_consistent(&self) -> bool {
        let mut forward = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        let mut prev = None;
        while let Some(idx) = cursor {
            if forward.len() > self.len {
                return false;
            }
            let Some(slot) = self.slots.get(idx) else {
                return false;
            };
            if slot.item.is_none() || slot.prev != prev {
                return false;
            }
            forward.push(idx);
            prev = Some(idx);
            cursor = slot.next;
        }
        if forward.len() != self.len || prev != self.tail {
            return false;
        }

        let mut backward = Vec::with_capacity(self.len);
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            if backward.len() > self.len {
                return false;
            }
            let Some(slot) = self.slots.get(idx) else {
                return false;
            };
            backward.push(idx);
            cursor = slot.prev;
        }
        backward.reverse();
        forward == backward
    }

    // == Link Surgery ==
    fn is_linked(&self, idx: usize) -> bool {
        self.slots
            .get(idx)
            .map(|slot| slot.item.is_some())
            .unwrap_or(false)
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let slot = &mut self.slots[idx];
            slot.prev = None;
            slot.next = old_head;
        }
        match old_head {
            Some(old) => self.slots[old].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = &self.slots[idx];
            (slot.prev, slot.next)
        };
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        let slot = &mut self.slots[idx];
        slot.prev = None;
        slot.next = None;
    }
}

// == Iterator ==
/// Front-to-back iterator over a [`RecencyList`].
pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.list.slots.get(self.next?)?;
        self.next = slot.next;
        self.remaining -= 1;
        slot.item.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn order(list: &RecencyList<&'static str>) -> Vec<&'static str> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_list_new() {
        let list: RecencyList<&str> = RecencyList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.front().is_none());
        assert!(list.back().is_none());
        assert!(list.is_consistent());
    }

    #[test]
    fn test_push_front_orders_newest_first() {
        let mut list = RecencyList::new();

        list.push_front("key1");
        list.push_front("key2");
        list.push_front("key3");

        assert_eq!(list.len(), 3);
        assert_eq!(order(&list), vec!["key3", "key2", "key1"]);
        // key1 is oldest (added first)
        assert_eq!(list.back(), Some(&"key1"));
        assert!(list.is_consistent());
    }

    #[test]
    fn test_move_to_front() {
        let mut list = RecencyList::new();

        let a = list.push_front("a");
        list.push_front("b");
        list.push_front("c");

        list.move_to_front(a);

        assert_eq!(order(&list), vec!["a", "c", "b"]);
        assert_eq!(list.back(), Some(&"b"));
        assert!(list.is_consistent());
    }

    #[test]
    fn test_move_tail_and_middle() {
        let mut list = RecencyList::new();

        let a = list.push_front("a");
        let b = list.push_front("b");
        list.push_front("c");

        list.move_to_front(b);
        assert_eq!(order(&list), vec!["b", "c", "a"]);

        list.move_to_front(a);
        assert_eq!(order(&list), vec!["a", "b", "c"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_move_head_is_noop() {
        let mut list = RecencyList::new();

        list.push_front("a");
        let b = list.push_front("b");

        list.move_to_front(b);
        assert_eq!(order(&list), vec!["b", "a"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_pop_back() {
        let mut list = RecencyList::new();

        list.push_front("key1");
        list.push_front("key2");
        list.push_front("key3");

        assert_eq!(list.pop_back(), Some("key1"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.pop_back(), Some("key2"));
        assert_eq!(list.pop_back(), Some("key3"));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
        assert!(list.is_consistent());
    }

    #[test]
    fn test_remove_middle() {
        let mut list = RecencyList::new();

        list.push_front("key1");
        let key2 = list.push_front("key2");
        list.push_front("key3");

        assert_eq!(list.remove(key2), Some("key2"));
        assert_eq!(order(&list), vec!["key3", "key1"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_remove_twice_returns_none() {
        let mut list = RecencyList::new();

        let idx = list.push_front("only");

        assert_eq!(list.remove(idx), Some("only"));
        assert_eq!(list.remove(idx), None);
        assert!(list.is_empty());
        assert!(list.is_consistent());
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let mut list = RecencyList::new();

        list.push_front("a");
        let b = list.push_front("b");
        list.remove(b);

        let c = list.push_front("c");
        assert_eq!(c, b);
        assert_eq!(list.get(c), Some(&"c"));
        assert_eq!(order(&list), vec!["c", "a"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_stale_handle_is_ignored() {
        let mut list = RecencyList::new();

        list.push_front("a");
        let b = list.push_front("b");
        list.remove(b);

        // Moving a freed slot must not relink it
        list.move_to_front(b);
        assert_eq!(order(&list), vec!["a"]);
        assert!(list.get(b).is_none());
        assert!(list.is_consistent());
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut list = RecencyList::new();

        let idx = list.push_front(String::from("old"));
        if let Some(item) = list.get_mut(idx) {
            *item = String::from("new");
        }

        assert_eq!(list.front().map(String::as_str), Some("new"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_order_after_multiple_touches() {
        let mut list = RecencyList::new();

        let a = list.push_front("a");
        let b = list.push_front("b");
        let c = list.push_front("c");

        list.move_to_front(a);
        list.move_to_front(c);
        list.move_to_front(b);

        // Least to most recent: a, c, b
        assert_eq!(list.pop_back(), Some("a"));
        assert_eq!(list.pop_back(), Some("c"));
        assert_eq!(list.pop_back(), Some("b"));
    }
}
