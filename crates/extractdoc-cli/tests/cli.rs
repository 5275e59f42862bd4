use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const GREETER: &str = "/// !! # Greeter\n/// !show\ndef greet():\n    return 'hi'\n/// !hide\nprint(greet())\n";

const GREETER_MD: &str =
    "# Greeter\n```py\ndef greet():\n    return 'hi'\n```\n<small>[greet.py](src/greet.py)</small>\n";

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write fixture");
}

fn project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "src/greet.py", GREETER);
    dir
}

fn extractdoc(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("extractdoc").expect("binary exists");
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn dash_writes_to_stdout_with_links_relative_to_working_directory() {
    let dir = project();

    extractdoc(&dir)
        .args(["src/*.py", "-"])
        .assert()
        .success()
        .stdout(GREETER_MD)
        .stderr(predicate::str::is_empty());
}

#[test]
fn file_destination_links_relative_to_its_directory() {
    let dir = project();
    fs::create_dir(dir.path().join("docs")).unwrap();

    extractdoc(&dir)
        .args(["src/*.py", "docs/README.md"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(dir.path().join("docs/README.md")).unwrap();
    assert!(written.contains("<small>[greet.py](../src/greet.py)</small>"));
}

#[test]
fn pattern_without_matches_leaves_an_empty_file() {
    let dir = project();
    write(dir.path(), "out.md", "stale contents");

    extractdoc(&dir)
        .args(["nothing/**/*.rs", "out.md"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(dir.path().join("out.md")).unwrap(), "");
}

#[test]
fn unwritable_destination_exits_with_destination_code() {
    let dir = project();

    extractdoc(&dir)
        .args(["src/*.py", "missing/dir/out.md"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("cannot write destination"));
}

#[test]
fn malformed_pattern_exits_with_pattern_code() {
    let dir = project();

    extractdoc(&dir)
        .args(["src/***/x", "-"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("invalid glob pattern"));
}

#[test]
fn missing_positional_is_a_usage_error() {
    let dir = project();

    extractdoc(&dir).arg("src/*.py").assert().code(2);
}

#[test]
fn depth_flag_limits_directory_recursion() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "docs/top.py", "/// !! top\n");
    write(dir.path(), "docs/nested/deep.py", "/// !! deep\n");

    extractdoc(&dir)
        .args(["docs", "-"])
        .assert()
        .success()
        .stdout("deep\ntop\n");

    extractdoc(&dir)
        .args(["docs", "-", "--depth", "1"])
        .assert()
        .success()
        .stdout("top\n");
}

#[test]
fn depth_flag_above_maximum_is_a_usage_error() {
    let dir = project();

    extractdoc(&dir)
        .args(["src", "-", "--depth", "100000"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}

#[test]
fn trailing_double_star_includes_files_directly_inside() {
    let dir = project();
    write(dir.path(), "src/.cache/skip.py", "/// !! cached\n");

    let assert = extractdoc(&dir).args(["src/**", "-"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    // `src` itself, then `src/greet.py`; the hidden directory is never a match.
    assert_eq!(stdout.matches("[greet.py](src/greet.py)").count(), 2);
    assert_eq!(stdout.matches("cached").count(), 1);
}

#[test]
fn unterminated_region_is_dropped_with_a_warning() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/open.py", "/// !! kept\n/// !show\nlost = True\n");

    extractdoc(&dir)
        .args(["src/open.py", "-"])
        .assert()
        .success()
        .stdout("kept\n")
        .stderr(predicate::str::contains("never closed"));
}

#[test]
fn verbose_logs_summary_to_stderr() {
    let dir = project();

    extractdoc(&dir)
        .args(["src/*.py", "-", "--verbose"])
        .assert()
        .success()
        .stdout(GREETER_MD)
        .stderr(predicate::str::contains("rendering file"));
}

#[test]
fn invalid_config_fails_before_rendering() {
    let dir = project();
    write(dir.path(), ".extractdoc.toml", "[render]\ndepth = 100\n");

    extractdoc(&dir)
        .args(["src/*.py", "out.md"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("render.depth must be at most 32"));

    assert!(!dir.path().join("out.md").exists());
}

#[cfg(unix)]
mod tree {
    use super::*;

    #[test]
    fn tree_directive_uses_configured_command() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pkg/index.ts", "/// !! Layout:\n/// !tree\n");
        write(
            dir.path(),
            ".extractdoc.toml",
            "[render]\ntree_command = \"echo listing-of-pkg\"\n",
        );

        extractdoc(&dir)
            .args(["pkg/index.ts", "-"])
            .assert()
            .success()
            .stdout("Layout:\n```\nlisting-of-pkg\n```\n");
    }

    #[test]
    fn failing_tree_command_exits_with_command_code() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pkg/index.ts", "/// !tree\n");
        write(dir.path(), "ci.toml", "[render]\ntree_command = \"echo boom >&2; exit 3\"\n");

        extractdoc(&dir)
            .args(["pkg/index.ts", "-", "--config", "ci.toml"])
            .assert()
            .code(4)
            .stderr(predicate::str::contains("boom"));
    }
}
