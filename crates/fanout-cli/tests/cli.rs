//! Black-box runs of the `fanout` binary over scratch trees, with `sh` standing in for cargo.
#![cfg(unix)]

use assert_cmd::Command;
use fanout_test_util::{TempTree, normalize_nondeterministic, relativize_paths};
use predicates::prelude::*;

const PKG: &str = "[package]\nname = \"p\"\nversion = \"0.1.0\"\n";

/// `check` fails in any root named `bad`, and echoes the root it ran in.
const CONFIG: &str = r#"
[hooks.check]
program = "sh"
args = ["-c", 'r=$(basename "$(pwd -P)"); echo "checked $r"; [ "$r" != bad ]']

[hooks.missing]
program = "fanout-definitely-not-installed"
"#;

#[allow(deprecated)]
fn fanout_in(tree: &TempTree) -> Command {
    let mut cmd = Command::cargo_bin("fanout").unwrap();
    cmd.arg("--base-dir")
        .arg(tree.root())
        .arg("--boundary")
        .arg(tree.root())
        .env_remove("FANOUT_LOG");
    cmd
}

fn disconnected() -> TempTree {
    let tree = TempTree::new();
    tree.write("fanout.toml", CONFIG);
    tree.write("good/Cargo.toml", PKG);
    tree.write("good/src/lib.rs", "");
    tree.write("other/Cargo.toml", PKG);
    tree.write("other/src/lib.rs", "");
    tree.write("bad/Cargo.toml", PKG);
    tree.write("bad/src/lib.rs", "");
    tree.write("README.md", "");
    tree
}

#[test]
fn passing_roots_exit_zero_with_tagged_output() {
    let tree = disconnected();
    fanout_in(&tree)
        .args(["check", "other/src/lib.rs", "good/src/lib.rs", "README.md"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("==> other (sh -c"))
        .stdout(predicate::str::contains("[other] checked other"))
        .stdout(predicate::str::contains("[good] checked good"))
        .stdout(predicate::str::contains(
            "fanout check: 2 root(s): 2 passed, 0 failed, 0 invocation error(s), 0 timed out",
        ));
}

#[test]
fn one_failing_root_exits_one_and_others_still_run() {
    let tree = disconnected();
    let assert = fanout_in(&tree)
        .args(["check", "bad/src/lib.rs", "good/src/lib.rs"])
        .assert()
        .code(1);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();

    let bad = stdout.find("==> bad ").expect("bad header");
    let good = stdout.find("==> good ").expect("good header");
    assert!(bad < good, "headers follow first-seen order:\n{stdout}");
    assert!(stdout.contains("--> bad: failed (exit 1)"));
    assert!(stdout.contains("--> good: passed"));
}

#[test]
fn missing_executable_is_reported_as_invocation_error() {
    let tree = disconnected();
    fanout_in(&tree)
        .args(["run", "missing", "good/src/lib.rs"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("invocation error"))
        .stdout(predicate::str::contains("1 invocation error(s)"));
}

#[test]
fn no_prefix_drops_root_tags() {
    let tree = disconnected();
    fanout_in(&tree)
        .args(["--no-prefix", "check", "good/src/lib.rs"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\nchecked good\n"))
        .stdout(predicate::str::contains("[good]").not());
}

#[test]
fn nothing_relevant_is_a_pass() {
    let tree = disconnected();
    fanout_in(&tree)
        .args(["check", "README.md"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("0 root(s)"));
}

#[test]
fn unknown_hook_is_a_config_error() {
    let tree = disconnected();
    fanout_in(&tree)
        .args(["run", "nope", "good/src/lib.rs"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fanout error: unknown hook: nope"));
}

#[test]
fn broken_config_is_a_config_error() {
    let tree = TempTree::new();
    tree.write("fanout.toml", "jobs = \"many\"\n");
    fanout_in(&tree)
        .args(["check", "x.rs"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("parse fanout.toml"));
}

#[test]
fn timeout_is_reported_separately() {
    let tree = TempTree::new();
    tree.write(
        "fanout.toml",
        "[hooks.slow]\nprogram = \"sh\"\nargs = [\"-c\", \"exec sleep 5\"]\ntimeout_secs = 1\n",
    );
    tree.write("a/Cargo.toml", PKG);
    fanout_in(&tree)
        .args(["run", "slow", "a/src/lib.rs"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("--> a: timed out"))
        .stdout(predicate::str::contains("1 timed out"));
}

#[test]
fn extra_args_are_appended() {
    let tree = TempTree::new();
    tree.write(
        "fanout.toml",
        "[hooks.check]\nprogram = \"sh\"\nargs = [\"-c\", 'echo \"args: $*\"', \"sh\"]\n",
    );
    tree.write("a/Cargo.toml", PKG);
    fanout_in(&tree)
        .args(["check", "--features", "serde", "a/src/lib.rs"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[a] args: --features serde"));
}

#[test]
fn all_mode_runs_every_root() {
    let tree = disconnected();
    fanout_in(&tree)
        .args(["check", "--all"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("3 root(s): 2 passed, 1 failed"));
}

#[test]
fn roots_lists_grouping_without_running() {
    let tree = disconnected();
    fanout_in(&tree)
        .args(["roots", "good/src/lib.rs", "README.md", "good/Cargo.toml"])
        .assert()
        .code(0)
        .stdout(predicate::eq(
            "good\n  good/src/lib.rs\n  good/Cargo.toml\n(no project root)\n  README.md\n",
        ));
}

#[test]
fn hooks_lists_presets_and_configured_hooks() {
    let tree = disconnected();
    fanout_in(&tree)
        .arg("hooks")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("clippy: cargo clippy -- -D warnings"))
        .stdout(predicate::str::contains("fmt: cargo fmt --"))
        .stdout(predicate::str::contains("missing: fanout-definitely-not-installed"));
}

#[test]
fn summary_out_writes_machine_readable_json() {
    let tree = disconnected();
    let out = tree.root().join("artifacts/summary.json");
    fanout_in(&tree)
        .args(["--summary-out", out.as_str(), "check", "bad/src/lib.rs", "good/src/lib.rs"])
        .assert()
        .code(1);

    let text = std::fs::read_to_string(&out).expect("summary written");
    let mut value = normalize_nondeterministic(serde_json::from_str(&text).expect("json"));
    relativize_paths(&mut value, &tree.canonical_root());

    assert_eq!(value["schema"], "fanout.summary.v1");
    assert_eq!(value["tool"]["name"], "fanout");
    assert_eq!(value["status"], "failed");
    assert_eq!(value["counts"]["failed"], 1);
    assert_eq!(value["counts"]["succeeded"], 1);
    assert_eq!(value["roots"][0]["path"], "bad");
    assert_eq!(value["roots"][0]["exit_code"], 1);
    assert_eq!(value["roots"][1]["files"][0], "good/src/lib.rs");
}

#[test]
fn annotations_flag_emits_workflow_commands() {
    let tree = disconnected();
    fanout_in(&tree)
        .args(["--annotations", "check", "bad/src/lib.rs", "good/src/lib.rs"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "::error file=bad/Cargo.toml,title=fanout check::bad: failed (exit 1)",
        ))
        .stdout(predicate::str::contains("::error file=good").not());
}

#[test]
fn missing_base_dir_is_an_error() {
    let tree = TempTree::new();
    #[allow(deprecated)]
    Command::cargo_bin("fanout")
        .unwrap()
        .arg("--base-dir")
        .arg(tree.root().join("nope"))
        .args(["check", "x.rs"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fanout error: base directory"));
}
