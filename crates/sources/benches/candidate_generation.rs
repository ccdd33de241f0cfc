//! Benchmarks for candidate generation
//!
//! Run with: cargo bench --package sources
//!
//! Uses synthetic fixtures so it runs without a dataset on disk.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{ItemId, Rating, RatingStore, UserId};
use predictor::RatingPredictor;
use sources::{CollaborativeSource, ContentSource, VirtualUser};
use std::sync::Arc;

const ITEMS: u32 = 2_000;
const USERS: u32 = 1_500;

const WORDS: &[&str] = &[
    "space", "pirates", "heist", "romance", "wedding", "detective", "noir", "robots",
    "dragons", "zombies", "western", "musical", "spy", "submarine", "volcano", "alien",
];

/// Deterministic pseudo-random feature text for item `i`
fn feature_text(i: u32) -> String {
    (0..6)
        .map(|k| WORDS[((i * 7 + k * 13 + i / 5) as usize) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

struct HashPredictor;

impl RatingPredictor for HashPredictor {
    fn predict(&self, user_id: UserId, item_id: ItemId) -> f32 {
        ((user_id.wrapping_mul(31) ^ item_id.wrapping_mul(17)) % 50) as f32 / 10.0
    }
}

fn synthetic_ratings() -> RatingStore {
    let ratings = (1..=USERS).flat_map(|user| {
        (0..40).map(move |k| {
            let item = (user * 13 + k * 37) % ITEMS + 1;
            let value = ((user + k) % 10) as f32 / 2.0 + 0.5;
            Rating::new(user, item, value)
        })
    });
    RatingStore::from_ratings(ratings)
}

fn bench_content_candidates(c: &mut Criterion) {
    let ids: Vec<ItemId> = (1..=ITEMS).collect();
    let texts: Vec<String> = ids.iter().map(|&i| feature_text(i)).collect();
    let content = ContentSource::new(ids, &texts);

    c.bench_function("content_get_candidates", |b| {
        b.iter(|| {
            let candidates = content.get_candidates(black_box(&[1, 2, 3])).unwrap();
            black_box(candidates)
        })
    });

    c.bench_function("content_similarity_row", |b| {
        b.iter(|| black_box(content.similarity().similarity_row(black_box(42))))
    });
}

fn bench_collaborative_candidates(c: &mut Criterion) {
    let working = synthetic_ratings();
    let collaborative =
        CollaborativeSource::new(Arc::new(HashPredictor), VirtualUser::new(USERS + 1));

    c.bench_function("collaborative_get_candidates", |b| {
        b.iter(|| {
            let candidates = collaborative.get_candidates(black_box(&[5, 50, 500]), &working);
            black_box(candidates)
        })
    });
}

criterion_group!(benches, bench_content_candidates, bench_collaborative_candidates);
criterion_main!(benches);
