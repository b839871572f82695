//! Shared helpers for building test relations.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rel_core::config::RelConfig;
use rel_io::Input;
use rel_operators::{Registry, RunArgs, RunStats};

/// Config whose scratch files go to `<dir>/scratch`.
pub fn config(dir: &Path, cache_limit: usize) -> RelConfig {
    let scratch = dir.join("scratch");
    fs::create_dir_all(&scratch).unwrap();
    RelConfig {
        cache_limit,
        tmp_dir: Some(scratch),
        ..Default::default()
    }
}

pub fn scratch_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir.join("scratch")).unwrap().next().is_none()
}

/// Write a relation file and return its path.
pub fn relation(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

/// Run a registered operator over in-memory relations.
pub fn run_op(op: &str, args: &RunArgs, rels: &[&str]) -> rel_core::Result<(String, RunStats)> {
    let op = Registry::new().make(op).unwrap();
    let inputs = rels
        .iter()
        .enumerate()
        .map(|(i, r)| Input::from_bytes(format!("rel{i}"), r.to_string()))
        .collect();
    let mut buf = Vec::new();
    let stats = op.run(args, inputs, &mut buf)?;
    Ok((String::from_utf8(buf).unwrap(), stats))
}

/// Header line and body lines, the body sorted.
pub fn split_output(out: &str) -> (String, Vec<String>) {
    let mut lines = out.lines().map(str::to_string);
    let head = lines.next().unwrap_or_default();
    let mut body: Vec<String> = lines.collect();
    body.sort();
    (head, body)
}

/// `head` then `per_key(k)` records for each key `k` in `0..keys`, shuffled
/// by a fixed stride so the input is not already sorted.
pub fn grouped(head: &str, keys: usize, per_key: impl Fn(usize) -> usize, tag: &str) -> String {
    let mut rows = Vec::new();
    for k in 0..keys {
        for i in 0..per_key(k) {
            rows.push(format!("k{k:03}\t{tag}{i}"));
        }
    }
    let n = rows.len();
    let mut text = format!("{head}\n");
    if n > 0 {
        let stride = (0..).map(|s| 7 + s).find(|s| gcd(*s, n) == 1).unwrap();
        for i in 0..n {
            text.push_str(&rows[(i * stride) % n]);
            text.push('\n');
        }
    }
    text
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
