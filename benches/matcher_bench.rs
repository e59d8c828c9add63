use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docsim::{Matcher, MatcherConfig};

const FILLER: &[&str] = &[
    "we", "train", "deep", "models", "on", "large", "corpora", "and", "report", "results",
];

/// Synthetic dictionary of `size` two-word collocations.
fn dictionary(size: usize) -> Vec<String> {
    (0..size).map(|i| format!("term{i} model{}", i % 97)).collect()
}

/// Text that mentions roughly one keyword per ten words.
fn abstract_text(words: usize, dict: &[String]) -> String {
    let mut out = Vec::with_capacity(words);
    for i in 0..words {
        if i % 10 == 0 && !dict.is_empty() {
            out.push(dict[(i * 31) % dict.len()].clone());
        } else {
            out.push(FILLER[i % FILLER.len()].to_string());
        }
    }
    out.join(" ")
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher_build");
    for size in [1_000usize, 10_000] {
        let dict = dictionary(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &dict, |b, dict| {
            b.iter(|| {
                let matcher = Matcher::build(black_box(dict), &MatcherConfig::default())
                    .expect("bench dictionary is valid");
                black_box(matcher.state_count());
            });
        });
    }
    group.finish();
}

fn bench_find_all(c: &mut Criterion) {
    let dict = dictionary(10_000);
    let matcher = Matcher::build(&dict, &MatcherConfig::default()).expect("bench dictionary is valid");

    let mut group = c.benchmark_group("matcher_find_all");
    for words in [200usize, 5_000] {
        let text = abstract_text(words, &dict);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words), &text, |b, text| {
            b.iter(|| black_box(matcher.find_all(black_box(text))));
        });
    }
    group.finish();
}

criterion_group!(matcher_benches, bench_build, bench_find_all);
criterion_main!(matcher_benches);
