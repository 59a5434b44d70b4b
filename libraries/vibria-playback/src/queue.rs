//! Active queue
//!
//! The base order is the selected playlist's songs or the whole library.
//! With shuffle on, a separately materialized permutation of the base is the
//! play order:
//!
//! ```text
//! base:      A B C D
//! shuffled:  C A D B   <- order() while shuffling
//! ```
//!
//! Navigation is circular over the play order.

use crate::shuffle::shuffled;
use vibria_core::TrackRef;

/// Base sequence plus optional shuffled permutation
#[derive(Debug, Clone, Default)]
pub struct ActiveQueue {
    base: Vec<TrackRef>,
    shuffled: Option<Vec<TrackRef>>,
}

impl ActiveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the base; a new permutation is drawn if shuffling
    pub fn set_base(&mut self, base: Vec<TrackRef>) {
        self.base = base;
        if self.shuffled.is_some() {
            self.shuffled = Some(shuffled(&self.base));
        }
    }

    /// Turn shuffle on (fresh permutation) or off (base order)
    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffled = enabled.then(|| shuffled(&self.base));
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled.is_some()
    }

    /// Base order
    pub fn base(&self) -> &[TrackRef] {
        &self.base
    }

    /// Play order: the permutation while shuffling, else the base
    pub fn order(&self) -> &[TrackRef] {
        self.shuffled.as_deref().unwrap_or(self.base.as_slice())
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn contains(&self, track: &TrackRef) -> bool {
        self.base.contains(track)
    }

    /// First track of the base order
    pub fn first(&self) -> Option<&TrackRef> {
        self.base.first()
    }

    /// Index of `track` in the play order
    pub fn position(&self, track: &TrackRef) -> Option<usize> {
        self.order().iter().position(|t| t == track)
    }

    /// Track after `current`, wrapping to the start
    pub fn next_after(&self, current: &TrackRef) -> Option<&TrackRef> {
        let order = self.order();
        let index = self.position(current)?;
        order.get((index + 1) % order.len())
    }

    /// Track before `current`, wrapping to the end
    pub fn previous_before(&self, current: &TrackRef) -> Option<&TrackRef> {
        let order = self.order();
        let index = self.position(current)?;
        order.get((index + order.len() - 1) % order.len())
    }

    /// Track after `current` without wrapping
    pub fn following(&self, current: &TrackRef) -> Option<&TrackRef> {
        let index = self.position(current)?;
        self.order().get(index + 1)
    }

    /// Remove `track` from the base and the permutation
    pub fn remove(&mut self, track: &TrackRef) -> bool {
        let before = self.base.len();
        self.base.retain(|t| t != track);
        if let Some(order) = self.shuffled.as_mut() {
            order.retain(|t| t != track);
        }
        self.base.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str) -> TrackRef {
        TrackRef::from(format!("/music/{name}.mp3").as_str())
    }

    fn queue_of(names: &[&str]) -> ActiveQueue {
        let mut queue = ActiveQueue::new();
        queue.set_base(names.iter().map(|n| track(n)).collect());
        queue
    }

    #[test]
    fn next_and_previous_wrap() {
        let queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.next_after(&track("c")), Some(&track("a")));
        assert_eq!(queue.previous_before(&track("a")), Some(&track("c")));
        assert_eq!(queue.next_after(&track("a")), Some(&track("b")));
    }

    #[test]
    fn following_does_not_wrap() {
        let queue = queue_of(&["a", "b"]);
        assert_eq!(queue.following(&track("a")), Some(&track("b")));
        assert_eq!(queue.following(&track("b")), None);
    }

    #[test]
    fn unknown_selection_has_no_neighbours() {
        let queue = queue_of(&["a", "b"]);
        assert_eq!(queue.next_after(&track("zzz")), None);
        assert_eq!(queue.previous_before(&track("zzz")), None);
        assert_eq!(ActiveQueue::new().next_after(&track("a")), None);
    }

    #[test]
    fn shuffle_on_off() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e"]);
        queue.set_shuffle(true);
        assert!(queue.is_shuffled());
        assert_eq!(queue.order().len(), 5);
        assert!(queue.order().iter().all(|t| queue.contains(t)));

        queue.set_shuffle(false);
        assert_eq!(queue.order(), queue.base());
    }

    #[test]
    fn new_base_reshuffles() {
        let mut queue = queue_of(&["a", "b"]);
        queue.set_shuffle(true);
        queue.set_base(vec![track("x"), track("y"), track("z")]);
        let mut order = queue.order().to_vec();
        order.sort_by_key(|t| t.to_string());
        assert_eq!(order, vec![track("x"), track("y"), track("z")]);
    }

    #[test]
    fn remove_from_both_orders() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_shuffle(true);
        assert!(queue.remove(&track("b")));
        assert!(!queue.contains(&track("b")));
        assert!(!queue.order().contains(&track("b")));
        assert_eq!(queue.order().len(), 2);
        assert!(!queue.remove(&track("b")));
    }
}
