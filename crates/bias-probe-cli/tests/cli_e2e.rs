//! End-to-end runs of the `bias-probe` binary on small synthetic inputs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// =============================================================================
// Constants
// =============================================================================

const EXIT_SUCCESS: i32 = 0;
const EXIT_INVALID_INPUT: i32 = 2;
const EXIT_CASES_FAILED: i32 = 3;

// =============================================================================
// Helpers
// =============================================================================

fn bias_probe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bias-probe"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn bias-probe")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

/// Text word2vec file, word lists and a cases file in `dir`.
struct Fixture {
    vectors: PathBuf,
    male: PathBuf,
    female: PathBuf,
    cases: PathBuf,
}

fn write_fixture(dir: &Path) -> Fixture {
    let rows = [
        ("he", [1.0, 0.0, 0.0]),
        ("man", [0.95, 0.05, 0.1]),
        ("she", [0.0, 1.0, 0.0]),
        ("woman", [0.05, 0.95, 0.1]),
        ("doctor", [1.0, 0.2, 0.0]),
        ("engineer", [1.0, 0.2, 0.03]),
        ("pilot", [1.0, 0.2, 0.06]),
        ("surgeon", [1.0, 0.2, 0.09]),
        ("nurse", [0.2, 1.0, 0.0]),
        ("teacher", [0.2, 1.0, 0.03]),
        ("dancer", [0.2, 1.0, 0.06]),
        ("nanny", [0.2, 1.0, 0.09]),
    ];
    let mut text = format!("{} 3\n", rows.len());
    for (word, v) in rows {
        text.push_str(&format!("{} {} {} {}\n", word, v[0], v[1], v[2]));
    }

    let write = |name: &str, content: &str| {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    };
    let vectors = write("vectors.txt", &text);
    let male = write("male.txt", "he\nman\n");
    let female = write("female.txt", "she\nwoman\n");
    let x = write("x.txt", "doctor\nengineer\npilot\nsurgeon\n");
    let y = write("y.txt", "nurse\nteacher\ndancer\nnanny\n");
    let cases = write(
        "cases.tsv",
        &format!(
            "careers\t{}\t{}\nmissing\t{}\t{}\n",
            path_str(&x),
            path_str(&y),
            path_str(&dir.join("nope.txt")),
            path_str(&y)
        ),
    );

    Fixture {
        vectors,
        male,
        female,
        cases,
    }
}

// =============================================================================
// hypotest
// =============================================================================

#[test]
fn test_hypotest_writes_successful_cases_and_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let fx = write_fixture(dir.path());
    let out = dir.path().join("results.tsv");

    let output = bias_probe(&[
        "hypotest",
        "--vectors",
        path_str(&fx.vectors),
        "--format",
        "text",
        "-m",
        path_str(&fx.male),
        "-f",
        path_str(&fx.female),
        "--cases",
        path_str(&fx.cases),
        "--out",
        path_str(&out),
        "--iter",
        "200",
        "--include-words",
    ]);
    println!("stderr: {}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(output.status.code(), Some(EXIT_CASES_FAILED));
    let results = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = results.lines().collect();
    assert_eq!(lines.len(), 1);
    let fields: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(fields[0], "careers");
    assert!(fields[2].parse::<f64>().unwrap() > 0.0);
    assert_eq!(fields[3], "doctor,engineer,pilot,surgeon");

    let sorted = dir.path().join("sorted.tsv");
    let output = bias_probe(&["sort", "--tests", path_str(&out), "--out", path_str(&sorted)]);
    assert_eq!(output.status.code(), Some(EXIT_SUCCESS));
    assert_eq!(fs::read_to_string(&sorted).unwrap(), results);
}

#[test]
fn test_hypotest_rejects_zero_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let fx = write_fixture(dir.path());
    let out = dir.path().join("results.tsv");

    let output = bias_probe(&[
        "hypotest",
        "--vectors",
        path_str(&fx.vectors),
        "--format",
        "text",
        "-m",
        path_str(&fx.male),
        "-f",
        path_str(&fx.female),
        "--cases",
        path_str(&fx.cases),
        "--out",
        path_str(&out),
        "--iter",
        "0",
    ]);

    assert_eq!(output.status.code(), Some(EXIT_INVALID_INPUT));
    assert!(!out.exists(), "no output before validation passes");
}

#[test]
fn test_config_file_sets_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bias.toml");
    fs::write(&config, "[permutation]\niterations = -3\n").unwrap();
    let fx = write_fixture(dir.path());

    let output = bias_probe(&[
        "--config",
        path_str(&config),
        "hypotest",
        "--vectors",
        path_str(&fx.vectors),
        "--format",
        "text",
        "-m",
        path_str(&fx.male),
        "-f",
        path_str(&fx.female),
        "--cases",
        path_str(&fx.cases),
        "--out",
        path_str(&dir.path().join("r.tsv")),
    ]);
    assert_eq!(output.status.code(), Some(EXIT_INVALID_INPUT));
}

// =============================================================================
// Clustering
// =============================================================================

#[test]
fn test_cluster_associations_and_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let fx = write_fixture(dir.path());
    let clusters = dir.path().join("clusters.tsv");
    let assoc = dir.path().join("assoc.tsv");

    let output = bias_probe(&[
        "cluster",
        "--vectors",
        path_str(&fx.vectors),
        "--format",
        "text",
        "-k",
        "2",
        "--batch-size",
        "6",
        "--out",
        path_str(&clusters),
    ]);
    assert_eq!(output.status.code(), Some(EXIT_SUCCESS));
    assert_eq!(fs::read_to_string(&clusters).unwrap().lines().count(), 12);

    let output = bias_probe(&[
        "associations",
        "--vectors",
        path_str(&fx.vectors),
        "--format",
        "text",
        "-m",
        path_str(&fx.male),
        "-f",
        path_str(&fx.female),
        "--clusters",
        path_str(&clusters),
        "--out",
        path_str(&assoc),
        "--neighbors",
        "2",
    ]);
    assert_eq!(output.status.code(), Some(EXIT_SUCCESS));
    let text = fs::read_to_string(&assoc).unwrap();
    assert_eq!(text.lines().count(), 12);
    let nurse: Vec<&str> = text
        .lines()
        .map(|l| l.split('\t').collect::<Vec<_>>())
        .find(|f| f[2] == "nurse")
        .unwrap();
    assert_eq!(nurse[3], "F");

    let output = bias_probe(&["cluster-sizes", "--clusters", path_str(&clusters)]);
    assert_eq!(output.status.code(), Some(EXIT_SUCCESS));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Mean cluster size"));
}

#[test]
fn test_missing_vectors_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let output = bias_probe(&[
        "cluster",
        "--vectors",
        path_str(&dir.path().join("absent.bin")),
        "--out",
        path_str(&dir.path().join("c.tsv")),
    ]);
    assert_eq!(output.status.code(), Some(EXIT_INVALID_INPUT));
}
