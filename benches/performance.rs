use std::borrow::Cow;

use criterion::{criterion_group, criterion_main, Criterion};
use rel_core::config::RelConfig;
use rel_core::record::Record;
use rel_io::Input;
use rel_mem::ReplayCache;
use rel_operators::{Registry, RunArgs};

fn make_group(rows: usize) -> Vec<Record> {
    (0..rows)
        .map(|i| vec![b"key".to_vec(), format!("value-{i}").into_bytes()])
        .collect()
}

fn make_relation(head: &str, rows: usize, keys: usize, tag: &str) -> String {
    let mut text = format!("{head}\n");
    for i in 0..rows {
        text.push_str(&format!("k{:05}\t{tag}{i}\n", (i * 7919) % keys));
    }
    text
}

fn bench_replay_cache(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let group = make_group(4096);
    let mut cache = ReplayCache::new(1024, dir.path()).unwrap();
    c.bench_function("replay_cache_spill", |b| {
        b.iter(|| {
            cache.cache(group.iter().cloned().map(Ok)).unwrap();
            let n = cache.iter().unwrap().map(|r| r.map(Cow::into_owned)).count();
            assert_eq!(n, 4096);
        })
    });
    cache.release().unwrap();
}

fn bench_operators(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let args = RunArgs::new(RelConfig {
        tmp_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    });
    let registry = Registry::new();
    let left = make_relation("id\tname", 2000, 500, "n");
    let right = make_relation("id\tcolor", 2000, 500, "c");
    let other = make_relation("id\tname", 2000, 500, "n");

    for (op, rels) in [("join", [&left, &right]), ("meet", [&left, &other])] {
        let operator = registry.make(op).unwrap();
        c.bench_function(op, |b| {
            b.iter(|| {
                let inputs = rels
                    .iter()
                    .map(|r| Input::from_bytes(op, r.as_bytes().to_vec()))
                    .collect();
                let mut out = Vec::new();
                operator.run(&args, inputs, &mut out).unwrap();
            })
        });
    }
}

criterion_group!(relations, bench_replay_cache, bench_operators);
criterion_main!(relations);
