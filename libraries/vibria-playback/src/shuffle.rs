//! Shuffle for the active queue
//!
//! Every call produces a fresh permutation of the base order; previous
//! shuffled orders are never reused.

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use vibria_core::TrackRef;

/// Random permutation of `base` (Fisher-Yates)
pub fn shuffled(base: &[TrackRef]) -> Vec<TrackRef> {
    shuffled_with(base, &mut thread_rng())
}

/// Random permutation of `base` using the given RNG
pub fn shuffled_with<R: Rng + ?Sized>(base: &[TrackRef], rng: &mut R) -> Vec<TrackRef> {
    let mut order = base.to_vec();
    order.shuffle(rng);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn tracks(count: usize) -> Vec<TrackRef> {
        (0..count)
            .map(|i| TrackRef::from(format!("/music/{i}.mp3").as_str()))
            .collect()
    }

    #[test]
    fn shuffle_is_permutation() {
        let base = tracks(40);
        let order = shuffled(&base);

        assert_eq!(order.len(), base.len());
        let a: HashSet<_> = base.iter().collect();
        let b: HashSet<_> = order.iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn seeded_shuffle_changes_order() {
        let base = tracks(20);
        let mut rng = StdRng::seed_from_u64(7);
        let order = shuffled_with(&base, &mut rng);
        assert_ne!(order, base);
    }

    #[test]
    fn empty_and_single() {
        assert!(shuffled(&[]).is_empty());
        let one = tracks(1);
        assert_eq!(shuffled(&one), one);
    }
}
