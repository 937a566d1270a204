//! Shared fixtures for bias-probe-core integration tests.
//!
//! All embeddings are synthetic and seeded, so every test is reproducible.

#![allow(dead_code)]

use bias_probe_core::words::{AttributePair, WordGroup};
use bias_probe_core::EmbeddingStore;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

pub const MALE_ATTRS: [&str; 2] = ["he", "man"];
pub const FEMALE_ATTRS: [&str; 2] = ["she", "woman"];

/// Male-leaning target words beyond the two of the base scenario.
pub const MALE_CAREERS: [&str; 8] = [
    "doctor", "engineer", "pilot", "surgeon", "architect", "mechanic", "banker", "lawyer",
];

/// Female-leaning target words beyond the two of the base scenario.
pub const FEMALE_CAREERS: [&str; 8] = [
    "nurse", "teacher", "dancer", "librarian", "nanny", "secretary", "stylist", "midwife",
];

/// 3-d space: axis 0 is the male pole, axis 1 the female pole, axis 2 a
/// small per-word offset so no two targets score alike.
pub fn gendered_store() -> EmbeddingStore {
    let mut entries: Vec<(String, Vec<f32>)> = vec![
        ("he".into(), vec![1.0, 0.0, 0.0]),
        ("man".into(), vec![0.95, 0.05, 0.1]),
        ("she".into(), vec![0.0, 1.0, 0.0]),
        ("woman".into(), vec![0.05, 0.95, 0.1]),
    ];
    for (i, word) in MALE_CAREERS.iter().enumerate() {
        entries.push((word.to_string(), vec![1.0, 0.2, 0.03 * i as f32]));
    }
    for (i, word) in FEMALE_CAREERS.iter().enumerate() {
        entries.push((word.to_string(), vec![0.2, 1.0, 0.03 * i as f32]));
    }
    EmbeddingStore::from_entries(3, entries).expect("fixture dimensions are consistent")
}

pub fn gender_attrs() -> AttributePair {
    AttributePair::new(
        WordGroup::new("male", MALE_ATTRS),
        WordGroup::new("female", FEMALE_ATTRS),
    )
    .expect("attribute groups are non-empty")
}

/// `count` words `w0..` with i.i.d. standard normal components, plus the
/// attribute words, also random.
pub fn random_store(count: usize, dimension: usize, seed: u64) -> EmbeddingStore {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0f32, 1.0).expect("valid normal parameters");
    let names = MALE_ATTRS
        .iter()
        .chain(FEMALE_ATTRS.iter())
        .map(|w| w.to_string())
        .chain((0..count).map(|i| format!("w{}", i)))
        .collect::<Vec<_>>();

    let entries: Vec<(String, Vec<f32>)> = names
        .into_iter()
        .map(|name| {
            let vector = (0..dimension).map(|_| rng.sample(normal)).collect();
            (name, vector)
        })
        .collect();
    EmbeddingStore::from_entries(dimension, entries).expect("fixture dimensions are consistent")
}

pub fn random_words(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("w{}", i)).collect()
}
