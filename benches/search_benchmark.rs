//! Performance benchmarks for codeindex
//!
//! **Benchmarks Included:**
//! - `index_walk`: full walk of a generated tree at 100, 500 and 2000 files
//! - `search_files`: ranked search over an in-memory snapshot
//! - `symbol_extraction`: regex extraction on a mid-sized source file
//! - `store`: save and load of a 500-file snapshot
//!
//! **Run benchmarks:**
//! ```bash
//! cargo bench                     # Run all benchmarks
//! cargo bench -- index_walk       # Walk only
//! cargo bench -- search_files     # Search only
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use codeindex::index::{search_files, Indexer, Language, RegexSymbolExtractor, SymbolExtractor};
use codeindex::IndexStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write `count` small source files across a few languages and directories.
fn create_tree(count: usize) -> TempDir {
    let tmpdir = TempDir::new().expect("failed to create temp dir");
    for i in 0..count {
        let dir = tmpdir.path().join(format!("pkg_{}", i % 20));
        fs::create_dir_all(&dir).expect("failed to create dir");
        let (name, content) = match i % 3 {
            0 => (
                format!("mod_{i}.py"),
                format!("class Model{i}:\n    def save_{i}(self):\n        pass\n"),
            ),
            1 => (
                format!("util_{i}.ts"),
                format!("export const handler{i} = async (req) => req;\nclass Service{i} {{}}\n"),
            ),
            _ => (
                format!("Repo{i}.java"),
                format!("public class Repo{i} {{\n    public void load{i}() {{}}\n}}\n"),
            ),
        };
        fs::write(dir.join(name), content).expect("failed to write file");
    }
    // Ignored noise the walk must skip.
    let modules = tmpdir.path().join("node_modules/dep");
    fs::create_dir_all(&modules).expect("failed to create dir");
    fs::write(modules.join("index.js"), "function dep() {}\n").expect("failed to write file");
    tmpdir
}

fn source_sample() -> String {
    (0..200)
        .map(|i| {
            format!(
                "public class Widget{i} {{\n    private int count;\n    public void render{i}(int x) {{\n        helper(x);\n    }}\n}}\n"
            )
        })
        .collect()
}

/// Benchmark: full index walk at various tree sizes.
fn bench_index_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_walk");
    group.sample_size(10);
    group.measurement_time(std::time::Duration::from_secs(5));

    let indexer = Indexer::default();
    for count in &[100, 500, 2000] {
        let tree = create_tree(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &tree, |b, tree| {
            b.iter(|| {
                let index = indexer.index(tree.path()).expect("index failed");
                black_box(index.file_count);
            });
        });
    }

    group.finish();
}

/// Benchmark: ranked search over a snapshot.
fn bench_search(c: &mut Criterion) {
    let tree = create_tree(2000);
    let index = Indexer::default().index(tree.path()).expect("index failed");

    let mut group = c.benchmark_group("search_files");
    group.sample_size(10);

    for query in &["handler1999", "service", "pkg_7/"] {
        group.bench_with_input(BenchmarkId::from_parameter(query), query, |b, query| {
            b.iter(|| black_box(search_files(&index, query, 10).len()));
        });
    }

    group.finish();
}

/// Benchmark: symbol extraction on a 200-class Java file.
fn bench_symbol_extraction(c: &mut Criterion) {
    let content = source_sample();
    let extractor = RegexSymbolExtractor;

    c.bench_function("symbol_extraction/java_200_classes", |b| {
        b.iter(|| black_box(extractor.extract(&content, Language::Java).len()));
    });
}

/// Benchmark: persisting and reloading a snapshot.
fn bench_store(c: &mut Criterion) {
    let tree = create_tree(500);
    let index = Indexer::default().index(tree.path()).expect("index failed");
    let data = TempDir::new().expect("failed to create temp dir");
    let store = IndexStore::open(data.path()).expect("failed to open store");
    let root: &Path = tree.path();

    let mut group = c.benchmark_group("store");
    group.sample_size(10);
    group.measurement_time(std::time::Duration::from_secs(5));

    group.bench_function("save_500_files", |b| {
        b.iter(|| store.save(root, &index).expect("save failed"));
    });

    store.save(root, &index).expect("save failed");
    group.bench_function("load_500_files", |b| {
        b.iter(|| black_box(store.load(root).expect("load failed")));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_index_walk,
    bench_search,
    bench_symbol_extraction,
    bench_store,
);

criterion_main!(benches);
