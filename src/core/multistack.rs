//! # MultiStack Store
//!
//! An ordered collection of named stacks. Keys are kept in
//! most-recently-used order: pushing to a key, or touching it, moves it to
//! the top. Reads and pops always act on the MRU key.
//!
//! ```text
//!   LRU ─────────────────────────────► MRU
//!   [search: a]  [library: b c]  [home: d e f]
//!                                          ▲
//!                               peek() == (home, f)
//! ```
//!
//! An empty-but-present stack behaves exactly like an absent one. Empty
//! stacks are left in place when they empty out and pruned lazily the next
//! time `peek`/`pop` walks past them, so a tab popped down to nothing never
//! leaves a phantom MRU key behind.

/// Per-key stacks with MRU key ordering. Generic over the key and the value;
/// knows nothing about views.
#[derive(Debug, Clone)]
pub struct MultiStack<K, V> {
    // Ordered LRU-first; the last element is the MRU key.
    stacks: Vec<(K, Vec<V>)>,
}

impl<K, V> Default for MultiStack<K, V> {
    fn default() -> Self {
        Self { stacks: Vec::new() }
    }
}

impl<K: Copy + PartialEq, V> MultiStack<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: K) -> Option<usize> {
        self.stacks.iter().position(|(k, _)| *k == key)
    }

    /// Push `value` onto `key`'s stack, creating the stack if needed, and
    /// make `key` the most recently used.
    pub fn push(&mut self, key: K, value: V) {
        if self.position(key).is_none() {
            self.stacks.push((key, Vec::new()));
        } else {
            self.touch(key);
        }
        if let Some((_, stack)) = self.stacks.last_mut() {
            stack.push(value);
        }
    }

    /// Move `key` to the MRU position. No-op if absent or already on top.
    pub fn touch(&mut self, key: K) {
        if let Some(idx) = self.position(key)
            && idx + 1 != self.stacks.len()
        {
            let entry = self.stacks.remove(idx);
            self.stacks.push(entry);
        }
    }

    /// Alias for [`touch`](Self::touch).
    pub fn move_to_top(&mut self, key: K) {
        self.touch(key);
    }

    /// Drop empty stacks sitting at the MRU end.
    fn prune(&mut self) {
        while self
            .stacks
            .last()
            .is_some_and(|(_, stack)| stack.is_empty())
        {
            self.stacks.pop();
        }
    }

    /// Pop the top value of the MRU stack. `None` once every stack is empty.
    pub fn pop(&mut self) -> Option<V> {
        self.prune();
        self.stacks.last_mut().and_then(|(_, stack)| stack.pop())
    }

    pub fn peek(&mut self) -> Option<(K, &V)> {
        self.prune();
        self.stacks
            .last()
            .and_then(|(key, stack)| stack.last().map(|value| (*key, value)))
    }

    /// Same answer as [`peek`](Self::peek), without pruning. For read-only
    /// callers.
    pub fn top(&self) -> Option<(K, &V)> {
        self.stacks
            .iter()
            .rev()
            .find_map(|(key, stack)| stack.last().map(|value| (*key, value)))
    }

    pub fn peek_key(&mut self) -> Option<K> {
        self.peek().map(|(key, _)| key)
    }

    pub fn peek_value(&mut self) -> Option<&V> {
        self.peek().map(|(_, value)| value)
    }

    /// Snapshot of `key`'s stack, bottom to top.
    pub fn get(&self, key: K) -> Option<&[V]> {
        self.position(key).map(|idx| self.stacks[idx].1.as_slice())
    }

    pub fn len_of(&self, key: K) -> usize {
        self.get(key).map_or(0, <[V]>::len)
    }

    pub fn remove(&mut self, key: K) -> Option<Vec<V>> {
        self.position(key).map(|idx| self.stacks.remove(idx).1)
    }

    pub fn clear(&mut self) {
        self.stacks.clear();
    }

    /// True only when `key` has a non-empty stack.
    pub fn stack_exists(&self, key: K) -> bool {
        self.len_of(key) > 0
    }

    /// Keys from most to least recently used, including empty stacks that
    /// have not been pruned yet.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.stacks.iter().rev().map(|(key, _)| *key)
    }

    /// Every value, MRU stack first, each stack bottom to top.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.stacks.iter().rev().flat_map(|(_, stack)| stack.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.iter().all(|(_, stack)| stack.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_creates_stack_and_moves_key_to_top() {
        let mut store = MultiStack::new();
        store.push(1, "a");
        store.push(2, "b");
        assert_eq!(store.peek(), Some((2, &"b")));

        store.push(1, "c");
        assert_eq!(store.peek(), Some((1, &"c")));
        assert_eq!(store.get(1), Some(&["a", "c"][..]));
        assert_eq!(store.keys().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_touch_reorders_without_pushing() {
        let mut store = MultiStack::new();
        store.push(1, "a");
        store.push(2, "b");
        store.push(3, "c");

        store.touch(1);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec![1, 3, 2]);
        assert_eq!(store.len_of(1), 1);

        // Already on top, and absent keys, leave the order alone
        store.touch(1);
        store.move_to_top(9);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn test_pop_walks_past_emptied_stacks() {
        let mut store = MultiStack::new();
        store.push(1, "a");
        store.push(2, "b");

        assert_eq!(store.pop(), Some("b"));
        // Key 2 is now empty but still MRU until the next read prunes it
        assert_eq!(store.keys().next(), Some(2));
        assert_eq!(store.top(), Some((1, &"a")));
        assert_eq!(store.keys().next(), Some(2));
        assert_eq!(store.peek(), Some((1, &"a")));
        assert_eq!(store.keys().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_push_n_then_pop_n_exhausts_store() {
        let mut store = MultiStack::new();
        for i in 0..5 {
            store.push("home", i);
        }
        for i in (0..5).rev() {
            assert_eq!(store.pop(), Some(i));
        }
        assert_eq!(store.len_of("home"), 0);
        assert_eq!(store.pop(), None);
        assert_eq!(store.peek(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_stack_counts_as_absent() {
        let mut store = MultiStack::new();
        store.push(1, "a");
        store.pop();
        assert!(!store.stack_exists(1));
        assert_eq!(store.top(), None);
        assert_eq!(store.peek_key(), None);
        assert_eq!(store.peek_value(), None);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = MultiStack::new();
        store.push(1, "a");
        store.push(1, "b");
        store.push(2, "c");

        assert_eq!(store.remove(1), Some(vec!["a", "b"]));
        assert_eq!(store.remove(1), None);
        assert_eq!(store.values().collect::<Vec<_>>(), vec![&"c"]);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.keys().count(), 0);
    }

    #[test]
    fn test_values_are_mru_first_bottom_to_top() {
        let mut store = MultiStack::new();
        store.push(1, "a");
        store.push(2, "b");
        store.push(2, "c");
        store.touch(1);
        assert_eq!(store.values().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
