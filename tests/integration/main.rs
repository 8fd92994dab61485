//! Integration tests for Lazybuild

use assert_cmd::{cargo::cargo_bin_cmd, Command};

/// Variables the binary reads. Scrubbed from every spawned command so the
/// tests stay hermetic even when they run inside a real Actions job.
const AMBIENT_VARS: &[&str] = &[
    "INPUT_TAGS",
    "INPUT_CONTEXT",
    "INPUT_FILE",
    "INPUT_EXTRA-INPUTS",
    "INPUT_ANNOTATIONS",
    "INPUT_BUILD-ARGS",
    "INPUT_BUILD-CONTEXTS",
    "INPUT_TARGET",
    "INPUT_ULIMIT",
    "INPUT_LABELS",
    "INPUT_MODE",
    "INPUT_ATTEMPTS",
    "INPUT_CHECK-TIMEOUT",
    "INPUT_DEADLINE",
    "INPUT_CONCURRENCY",
    "LAZYBUILD_DOCKER_BIN",
    "GITHUB_ACTIONS",
    "GITHUB_OUTPUT",
];

fn lazybuild() -> Command {
    let mut cmd = cargo_bin_cmd!("lazybuild");
    for var in AMBIENT_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Pull one `Output: name="value"` line out of captured stdout.
fn output_value(stdout: &str, name: &str) -> String {
    let prefix = format!("Output: {name}=");
    let line = stdout
        .lines()
        .find(|l| l.starts_with(&prefix))
        .unwrap_or_else(|| panic!("no '{name}' output in:\n{stdout}"));
    line[prefix.len()..].trim_matches('"').to_string()
}

mod cli_tests {
    use super::*;
    use predicates::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn help_displays() {
        lazybuild()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Skip container image builds"));
    }

    #[test]
    fn version_displays() {
        lazybuild()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("lazybuild"));
    }

    #[test]
    fn missing_tags_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").unwrap();

        lazybuild()
            .current_dir(dir.path())
            .arg("decide")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Missing value for input 'tags'"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn invalid_reference_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").unwrap();

        lazybuild()
            .current_dir(dir.path())
            .args(["decide", "--tags", "a:b:c"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid image reference"));
    }

    #[test]
    fn malformed_build_args_fail() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").unwrap();

        lazybuild()
            .current_dir(dir.path())
            .args(["hash", "--build-args", "missing-separator"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("build-args"));
    }

    #[test]
    fn completions_generate() {
        lazybuild()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("lazybuild"));
    }
}

mod hash_tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(dockerfile: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), dockerfile).unwrap();
        dir
    }

    fn hash_in(dir: &TempDir, args: &[&str]) -> String {
        let mut cmd = lazybuild();
        cmd.current_dir(dir.path()).arg("hash").args(args);
        stdout_of(&mut cmd)
    }

    #[test]
    fn emits_sha256_hex() {
        let dir = workspace("FROM alpine\n");
        let hash = hash_in(&dir, &[]);
        assert_eq!(hash.trim().len(), 64);
        assert!(hash.trim().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn identical_workspaces_hash_identically() {
        let first = workspace("FROM alpine\nRUN apk add git\n");
        let second = workspace("FROM alpine\nRUN apk add git\n");
        assert_eq!(hash_in(&first, &[]), hash_in(&second, &[]));
    }

    #[test]
    fn dockerfile_content_changes_the_hash() {
        let first = workspace("FROM alpine\n");
        let second = workspace("FROM debian\n");
        assert_ne!(hash_in(&first, &[]), hash_in(&second, &[]));
    }

    #[test]
    fn build_args_change_the_hash() {
        let dir = workspace("FROM alpine\n");
        let bare = hash_in(&dir, &[]);
        let with_args = hash_in(&dir, &["--build-args", "VERSION=1.2.3"]);
        assert_ne!(bare, with_args);
    }

    #[test]
    fn env_inputs_match_flag_inputs() {
        let dir = workspace("FROM alpine\n");
        let via_flag = hash_in(&dir, &["--build-args", "VERSION=1.2.3"]);

        let mut cmd = lazybuild();
        cmd.current_dir(dir.path())
            .arg("hash")
            .env("INPUT_BUILD-ARGS", "VERSION=1.2.3");
        let via_env = stdout_of(&mut cmd);

        assert_eq!(via_flag, via_env);
    }

    #[test]
    fn extra_input_content_changes_the_hash() {
        let dir = workspace("FROM alpine\n");
        std::fs::write(dir.path().join("app.conf"), "threads = 4\n").unwrap();
        let before = hash_in(&dir, &["--extra-inputs", "app.conf"]);

        std::fs::write(dir.path().join("app.conf"), "threads = 8\n").unwrap();
        let after = hash_in(&dir, &["--extra-inputs", "app.conf"]);

        assert_ne!(before, after);
    }

    #[test]
    fn unlisted_files_leave_the_hash_unchanged() {
        let dir = workspace("FROM alpine\n");
        std::fs::write(dir.path().join("app.conf"), "threads = 4\n").unwrap();
        let before = hash_in(&dir, &["--extra-inputs", "app.conf"]);

        std::fs::write(dir.path().join("scratch.log"), "noise\n").unwrap();
        let after = hash_in(&dir, &["--extra-inputs", "app.conf"]);

        assert_eq!(before, after);
    }
}

#[cfg(unix)]
mod decide_tests {
    use super::*;
    use predicates::prelude::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").unwrap();
        dir
    }

    /// Drop a fake docker CLI into the workspace.
    fn stub_docker(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("docker-stub");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn decide(dir: &TempDir, stub: &Path, tags: &str) -> Command {
        let mut cmd = lazybuild();
        cmd.current_dir(dir.path())
            .args(["decide", "--tags", tags, "--attempts", "1", "--docker-bin"])
            .arg(stub);
        cmd
    }

    #[test]
    fn skips_the_build_when_the_tag_exists() {
        let dir = workspace();
        let stub = stub_docker(dir.path(), "exit 0");

        let stdout = stdout_of(&mut decide(&dir, &stub, "user/app:latest"));
        assert!(stdout.contains("already exists"));
        assert_eq!(output_value(&stdout, "tag-existed"), "true");
        assert_eq!(output_value(&stdout, "build-required"), "false");
        assert_eq!(output_value(&stdout, "image-name"), "user/app");
        assert!(output_value(&stdout, "image-tag").starts_with("content-hash-"));
    }

    #[test]
    fn requires_a_build_when_the_tag_is_missing() {
        let dir = workspace();
        let stub = stub_docker(
            dir.path(),
            "echo 'no such manifest: user/app:latest' >&2; exit 1",
        );

        let stdout = stdout_of(&mut decide(&dir, &stub, "user/app:latest"));
        assert!(stdout.contains("needs building"));
        assert_eq!(output_value(&stdout, "tag-existed"), "false");
        assert_eq!(output_value(&stdout, "build-required"), "true");
    }

    #[test]
    fn requires_a_build_when_the_check_errors() {
        let dir = workspace();
        let stub = stub_docker(dir.path(), "echo 'connection refused' >&2; exit 1");

        let stdout = stdout_of(&mut decide(&dir, &stub, "user/app:latest"));
        assert_eq!(output_value(&stdout, "tag-existed"), "false");
        assert_eq!(output_value(&stdout, "build-required"), "true");
        assert!(stdout.contains("existence checks failed"));
    }

    #[test]
    fn probes_each_distinct_name_once() {
        let dir = workspace();
        let log = dir.path().join("probe.log");
        let stub = stub_docker(dir.path(), "echo \"$@\" >> \"$STUB_LOG\"; exit 0");

        let mut cmd = decide(&dir, &stub, "a/x:latest,a/x:v2,a/y");
        cmd.args(["--concurrency", "1"]).env("STUB_LOG", &log);
        stdout_of(&mut cmd);

        let probes = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = probes.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("manifest inspect a/x:content-hash-"));
        assert!(lines[1].contains("manifest inspect a/y:content-hash-"));
    }

    #[test]
    fn writes_the_github_output_file() {
        let dir = workspace();
        let stub = stub_docker(dir.path(), "exit 0");
        let github_output = dir.path().join("github_output");

        let mut cmd = decide(&dir, &stub, "user/app:latest");
        cmd.env("GITHUB_ACTIONS", "true")
            .env("GITHUB_OUTPUT", &github_output);
        stdout_of(&mut cmd);

        let contents = std::fs::read_to_string(&github_output).unwrap();
        assert!(contents.contains("tags<<gh-delim-"));
        assert!(contents.contains("tag-existed<<gh-delim-"));
        assert!(contents.contains("build-required<<gh-delim-"));
        assert!(contents.contains("user/app:content-hash-"));
    }

    #[test]
    fn on_actions_without_output_file_fails() {
        let dir = workspace();
        let stub = stub_docker(dir.path(), "exit 0");

        let mut cmd = decide(&dir, &stub, "user/app:latest");
        cmd.env("GITHUB_ACTIONS", "true");
        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("GITHUB_OUTPUT"));
    }

    #[test]
    fn json_format_emits_one_document() {
        let dir = workspace();
        let stub = stub_docker(dir.path(), "exit 0");

        let mut cmd = decide(&dir, &stub, "user/app:latest");
        cmd.args(["--format", "json"]);
        let stdout = stdout_of(&mut cmd);

        let doc: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(doc["tag-existed"], serde_json::json!(true));
        assert_eq!(doc["build-required"], serde_json::json!(false));
        assert_eq!(doc["image-name"], serde_json::json!("user/app"));
        assert!(doc["image-tag"]
            .as_str()
            .unwrap()
            .starts_with("content-hash-"));
        assert_eq!(doc["tags"].as_array().unwrap().len(), 2);
    }
}

mod sandbox_tests {
    use super::*;
    use predicates::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn stages_the_declared_inputs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").unwrap();
        std::fs::write(dir.path().join(".dockerignore"), "target/\n").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.c"), "int main;\n").unwrap();

        let mut cmd = lazybuild();
        cmd.current_dir(dir.path())
            .args(["sandbox", "--extra-inputs", "src"]);
        let stdout = stdout_of(&mut cmd);

        assert!(stdout.contains("Sandbox staged in"));
        let tmpdir = std::path::PathBuf::from(output_value(&stdout, "tmpdir"));
        assert!(tmpdir.join("Dockerfile").is_file());
        assert!(tmpdir.join(".dockerignore").is_file());
        assert!(tmpdir.join("src/main.c").is_file());
        assert_eq!(output_value(&stdout, "context"), tmpdir.display().to_string());

        std::fs::remove_dir_all(&tmpdir).ok();
    }

    #[test]
    fn missing_dockerfile_fails() {
        let dir = TempDir::new().unwrap();

        lazybuild()
            .current_dir(dir.path())
            .arg("sandbox")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Sandbox input not found"));
    }

    #[test]
    fn absolute_context_fails_and_leaves_the_source_alone() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").unwrap();

        let ctx = dir.path().display().to_string();
        lazybuild()
            .current_dir(dir.path())
            .args(["sandbox", "--context", ctx.as_str()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("outside the staging root"));

        let body = std::fs::read_to_string(dir.path().join("Dockerfile")).unwrap();
        assert_eq!(body, "FROM alpine\n");
    }
}
