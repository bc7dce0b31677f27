use crate::types::{Role, Turn};
use std::collections::VecDeque;

/// Bounded conversation log. Oldest turns fall off first; the bound holds
/// after every append.
#[derive(Debug)]
pub struct ContextStore {
    turns: VecDeque<Turn>,
    max_messages: usize,
}

impl ContextStore {
    pub fn new(max_messages: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_messages),
            max_messages,
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.max_messages {
            self.turns.pop_front();
        }
    }

    /// Both turns of a completed cycle land together, so an aborted cycle
    /// never leaves a dangling user turn behind.
    pub fn record_cycle(&mut self, query: &str, summary: &str) {
        self.append(Turn::new(Role::User, query));
        self.append(Turn::new(Role::Assistant, summary));
    }

    pub fn window(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(store: &ContextStore) -> Vec<String> {
        store.window().map(|t| t.content.clone()).collect()
    }

    #[test]
    fn append_evicts_oldest_first() {
        let mut store = ContextStore::new(2);
        store.append(Turn::new(Role::User, "A"));
        store.append(Turn::new(Role::Assistant, "B"));
        store.append(Turn::new(Role::User, "C"));
        assert_eq!(contents(&store), vec!["B", "C"]);
    }

    #[test]
    fn bound_holds_after_every_append() {
        let mut store = ContextStore::new(5);
        for i in 0..50 {
            store.append(Turn::new(Role::User, format!("turn {i}")));
            assert!(store.len() <= 5);
        }
        assert_eq!(contents(&store).first().map(String::as_str), Some("turn 45"));
    }

    #[test]
    fn clear_is_idempotent() {
        let mut store = ContextStore::new(3);
        store.append(Turn::new(Role::User, "hello"));
        store.clear();
        assert!(store.is_empty());
        store.clear();
        assert_eq!(store.window().count(), 0);
    }

    #[test]
    fn record_cycle_appends_both_turns_in_order() {
        let mut store = ContextStore::new(10);
        store.record_cycle("list files", "$ ls -la\n(exit 0)");
        let roles: Vec<Role> = store.window().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn record_cycle_respects_bound_of_one() {
        let mut store = ContextStore::new(1);
        store.record_cycle("q", "a");
        assert_eq!(store.len(), 1);
        assert_eq!(contents(&store), vec!["a"]);
    }
}
