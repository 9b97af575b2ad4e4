use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lexidx::codec::{decode_delta, decode_gamma, encode_delta, encode_gamma};
use lexidx::{InvertedIndex, NaiveMatcher, NormalizingTokenizer, Tokenizer};
use std::sync::Arc;

const WORDS: &[&str] = &[
    "rector", "university", "students", "library", "morning", "early", "walked", "politics",
    "parliament", "campus", "lecture", "exam", "professor", "dormitory", "faculty", "seminar",
];

fn corpus(n: u32) -> Vec<(u32, String)> {
    (0..n)
        .map(|id| {
            let text: Vec<&str> = (0..10).map(|w| WORDS[((id * 31 + w * 7) % WORDS.len() as u32) as usize]).collect();
            (id, text.join(" "))
        })
        .collect()
}

fn bench_search(c: &mut Criterion) {
    let tok: Arc<dyn Tokenizer> = Arc::new(NormalizingTokenizer::default());
    let docs = corpus(20_000);
    let mut index = InvertedIndex::new(tok.clone());
    let mut naive = NaiveMatcher::new(tok.clone());
    for (id, text) in &docs {
        index.insert_document(*id, text.as_str()).expect("raw insert");
        naive.insert_document(*id, text.as_str());
    }

    c.bench_function("tokenize_document", |b| b.iter(|| tok.tokenize(black_box(&docs[7].1))));
    c.bench_function("naive_search", |b| b.iter(|| naive.search(black_box("rector university"))));
    c.bench_function("indexed_search_all", |b| b.iter(|| index.search_all(black_box("rector university"))));
    c.bench_function("ranked_search", |b| b.iter(|| index.search(black_box("rector university"))));
    index.compress().expect("compress");
    c.bench_function("ranked_search_compressed", |b| b.iter(|| index.search(black_box("rector university"))));
}

fn bench_codec(c: &mut Criterion) {
    c.bench_function("gamma_round_trip", |b| {
        b.iter(|| (1..1_000u64).map(|k| decode_gamma(&encode_gamma(black_box(k))).map_or(0, |(v, _)| v)).sum::<u64>())
    });
    c.bench_function("delta_round_trip", |b| {
        b.iter(|| {
            (1..1_000u64)
                .filter_map(|k| encode_delta(black_box(k)).ok())
                .map(|bits| decode_delta(&bits).map_or(0, |(v, _)| v))
                .sum::<u64>()
        })
    });
}

criterion_group!(benches, bench_search, bench_codec);
criterion_main!(benches);
