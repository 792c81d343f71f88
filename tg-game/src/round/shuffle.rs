//! Option order shuffling

use rand::seq::SliceRandom;
use rand::Rng;

/// Uniformly shuffled copy of `items`; the input is left untouched
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with(items, &mut rand::thread_rng())
}

/// Same as [`shuffle`] with a caller-provided RNG (Fisher–Yates)
pub fn shuffle_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    shuffled
}
