use bm25_matrix::{Bm25Params, Bm25Vectorizer, Corpus, Stoplist, VectorizerConfig};
use criterion::{criterion_group, criterion_main, Criterion};

const WORDS: &[&str] = &[
    "colour", "color", "favourite", "favorite", "centre", "center", "lorry", "truck", "flat", "apartment",
    "queue", "line", "holiday", "vacation", "petrol", "gas", "football", "soccer", "biscuit", "cookie",
    "the", "and", "river", "market", "council", "city", "train", "school", "garden", "weather",
];

/// Deterministic synthetic corpus; texts vary in length and term mix
fn synthetic_corpus(docs: usize, words_per_doc: usize) -> Corpus {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    let mut corpus = Corpus::new();
    for i in 0..docs {
        let len = words_per_doc / 2 + (next() as usize % words_per_doc);
        let text: Vec<String> = (0..len)
            .map(|_| match next() % 4 {
                0 => WORDS[next() as usize % WORDS.len()].to_string(),
                _ => format!("term{}", next() % 3_000),
            })
            .collect();
        let label = if i % 2 == 0 { "UK" } else { "US" };
        corpus.push(text.join(" "), label, format!("{label}_{i:05}.txt"));
    }
    corpus
}

fn fit_transform_benchmark(c: &mut Criterion) {
    let corpus = synthetic_corpus(2_000, 200);
    let config = VectorizerConfig {
        min_df: 5,
        max_df: 0.95,
        max_features: 20_000,
        bm25: Bm25Params::default(),
        stoplist: Stoplist::english(),
    };
    let vectorizer = Bm25Vectorizer::new(config).expect("valid config");

    c.bench_function("fit_transform_2000_docs", |b| {
        b.iter(|| vectorizer.fit_transform(&corpus).expect("pipeline run"));
    });
}

criterion_group!(benches, fit_transform_benchmark);
criterion_main!(benches);
