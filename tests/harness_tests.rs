//! Transput harness tests: endpoints, atomic output, failure reporting

mod test_data_gen;

use std::fs;
use std::path::Path;

use rel_exec::{Engine, ExecError, Invocation};
use test_data_gen::{config, relation, scratch_is_empty};

fn engine(dir: &Path) -> Engine {
    Engine::new(config(dir, 100)).with_program("rel")
}

fn leftover_temps(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".tmp"))
        .collect()
}

#[test]
fn test_output_appears_only_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let a = relation(dir.path(), "a.tsv", "id\tname\n1\tann\n2\tbob\n");
    let b = relation(dir.path(), "b.tsv", "id\tcolor\n2\tred\n");
    let out = dir.path().join("out.tsv");

    let e = engine(dir.path());
    let inv = Invocation::new("join", [a.display().to_string(), b.display().to_string()]).with_out(&out);
    let report = e.run(&inv).unwrap();
    assert_eq!(report.operation, "join");
    assert_eq!(report.relations, 2);
    assert_eq!(report.records_out, 1);
    assert_eq!(fs::read_to_string(&out).unwrap(), "id\tname\tcolor\n2\tbob\tred\n");
    assert!(leftover_temps(dir.path()).is_empty());
    assert!(scratch_is_empty(dir.path()));

    // Running again would overwrite: refused before anything is read.
    let err = e.run(&inv).unwrap_err();
    assert!(matches!(err, ExecError::Usage(_)));
    assert_eq!(fs::read_to_string(&out).unwrap(), "id\tname\tcolor\n2\tbob\tred\n");
}

#[test]
fn test_sort_failure_keeps_temp_output() {
    let dir = tempfile::tempdir().unwrap();
    let a = relation(dir.path(), "a.tsv", "id\tx\n1\ta\n");
    let b = relation(dir.path(), "b.tsv", "id\tx\n2\tb\n");
    let out = dir.path().join("out.tsv");

    let mut cfg = config(dir.path(), 100);
    cfg.sort_program = "false".to_string();
    let e = Engine::new(cfg).with_program("rel");
    let inv = Invocation::new("union", [a.display().to_string(), b.display().to_string()]).with_out(&out);
    let err = e.run(&inv).unwrap_err();
    assert!(!out.exists());

    let lines = e.report(&err);
    assert!(lines[0].starts_with("rel: sort failed: "), "{lines:?}");
    assert_eq!(lines[1], "rel: non-zero status 1");
    let temps = leftover_temps(dir.path());
    assert_eq!(temps.len(), 1);
    assert!(lines[2].starts_with("rel: leaving output in "));
    assert!(lines[2].ends_with(&temps[0]));
    // The header was written before the sort was needed.
    assert_eq!(fs::read_to_string(dir.path().join(&temps[0])).unwrap(), "id\tx\n");
    assert!(scratch_is_empty(dir.path()));
}

#[test]
fn test_bad_input_name_reported_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let a = relation(dir.path(), "a.tsv", "id\tx\n1\ta\n");
    let out = dir.path().join("out.tsv");
    let e = engine(dir.path());

    let missing = dir.path().join("missing.tsv").display().to_string();
    let err = e
        .run(&Invocation::new("meet", [a.display().to_string(), missing]).with_out(&out))
        .unwrap_err();
    assert!(matches!(err, ExecError::Run { kept: None, .. }));
    assert!(!out.exists());
    assert!(leftover_temps(dir.path()).is_empty());
}

#[test]
fn test_malformed_record_names_the_input() {
    let dir = tempfile::tempdir().unwrap();
    let a = relation(dir.path(), "a.tsv", "id\tx\n1\ta\n");
    let b = relation(dir.path(), "b.tsv", "id\tx\n2\n");
    let e = engine(dir.path());
    let err = e
        .run(&Invocation::new("symm", [a.display().to_string(), b.display().to_string()]))
        .unwrap_err();
    let lines = e.report(&err);
    assert!(lines[0].starts_with("rel: error in data: "), "{lines:?}");
    assert_eq!(lines[1], "rel: non-zero status 1");
    assert_eq!(lines.len(), 2);
    assert!(scratch_is_empty(dir.path()));
}

#[test]
fn test_usage_errors_and_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let a = relation(dir.path(), "a.tsv", "id\n1\n").display().to_string();
    let e = engine(dir.path());

    assert_eq!(e.execute(&Invocation::new("join", [&a])), 1);
    assert_eq!(e.execute(&Invocation::new("image", [&a, &a, &a])), 1);
    assert_eq!(e.execute(&Invocation::new("meet", ["-", "-"])), 1);
    assert_eq!(e.execute(&Invocation::new("project", [&a, &a])), 1);
    assert_eq!(e.execute(&Invocation::new("sum", [&a, &a])), 1);
    let out = dir.path().join("out.tsv");
    assert_eq!(e.execute(&Invocation::new("sum", [&a, &a]).with_tag("src").with_out(&out)), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "id\tsrc\n1\t1\n1\t2\n");
}
