//! Integration tests for the CLI

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Helper to run kustomizily command
fn kustomizily(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kustomizily"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute kustomizily")
}

/// Run with the given bytes on stdin
fn kustomizily_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_kustomizily"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn kustomizily");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for kustomizily")
}

/// Get a fixture path
fn fixture(name: &str) -> String {
    format!("{}/../../fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
}

mod build_command {
    use super::*;

    #[test]
    fn test_app_fixture_layout() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let output = kustomizily(&["-i", &fixture("app.yaml"), "-o", out.to_str().unwrap()]);

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        assert_eq!(read(&out.join("app/index.html")), "<h1>hi</h1>");
        assert!(read(&out.join("app/deployment.yaml")).starts_with("apiVersion: apps/v1\n"));

        let app = read(&out.join("app/kustomization.yaml"));
        assert!(app.contains("resources:\n- deployment.yaml\n"));
        assert!(app.contains("configMapGenerator:\n- name: app-cfg\n"));
        assert!(app.contains("  files:\n  - index.html\n"));

        assert_eq!(
            read(&out.join("kustomization.yaml")),
            "apiVersion: kustomize.config.k8s.io/v1beta1\nkind: Kustomization\n\nresources:\n- app\n"
        );

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("4 files in 2 directories"));
    }

    #[test]
    fn test_release_fixture_layout() {
        let temp = TempDir::new().unwrap();
        let out = temp.path();
        let output = kustomizily(&[
            "-q",
            "-i",
            &fixture("release.yaml"),
            "-o",
            out.to_str().unwrap(),
        ]);
        assert!(output.status.success());

        assert!(out.join("namespace.yaml").is_file());
        assert!(out.join("crd/shop.example.com_carts.yaml").is_file());
        assert!(out.join("db/service.yaml").is_file());
        assert!(out.join("db/statefulset.yaml").is_file());
        assert_eq!(read(&out.join("db/password")), "secret");
        assert_eq!(read(&out.join("db/username")), "admin");
        assert!(!out.join("ghost").exists());

        assert_eq!(
            read(&out.join("kustomization.yaml")),
            "apiVersion: kustomize.config.k8s.io/v1beta1\nkind: Kustomization\n\nresources:\n- crd\n- db\n- namespace.yaml\n"
        );

        let db = read(&out.join("db/kustomization.yaml"));
        assert!(
            db.contains("secretGenerator:\n- name: shop-db\n  namespace: shop\n  type: Opaque\n")
        );
        assert!(db.contains("  files:\n  - password\n  - username\n"));

        assert!(output.stderr.is_empty(), "quiet run should print nothing");
    }

    #[test]
    fn test_reads_stdin_by_default() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("tree");
        let input = "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n  labels:\n    app: web\n";
        let output = kustomizily_stdin(&["-o", out.to_str().unwrap()], input);

        assert!(output.status.success());
        assert_eq!(read(&out.join("web/service.yaml")), input);
    }

    #[test]
    fn test_input_from_environment() {
        let temp = TempDir::new().unwrap();
        let output = Command::new(env!("CARGO_BIN_EXE_kustomizily"))
            .env("KUSTOMIZILY_INPUT", fixture("app.yaml"))
            .env("KUSTOMIZILY_OUTPUT", temp.path())
            .output()
            .unwrap();

        assert!(output.status.success());
        assert!(temp.path().join("app/index.html").is_file());
    }
}

mod dry_run {
    use super::*;

    #[test]
    fn test_dry_run_reports_and_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let output = kustomizily(&[
            "--dry-run",
            "-i",
            &fixture("app.yaml"),
            "-o",
            out.to_str().unwrap(),
        ]);

        assert!(output.status.success());
        assert!(!out.exists());

        let stdout = String::from_utf8_lossy(&output.stdout);
        let root = out.display().to_string();
        let expected = [
            format!("mkdir {root}"),
            format!("write {root}/kustomization.yaml"),
            format!("mkdir {root}/app"),
            format!("write {root}/app/deployment.yaml"),
            format!("write {root}/app/index.html"),
            format!("write {root}/app/kustomization.yaml"),
        ];
        let lines: Vec<_> = stdout.lines().collect();
        assert_eq!(lines, expected);
    }
}

mod errors {
    use super::*;

    #[test]
    fn test_invalid_base64_fails_and_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let output = kustomizily(&[
            "-i",
            &fixture("bad-base64.yaml"),
            "-o",
            out.to_str().unwrap(),
        ]);

        assert_eq!(output.status.code(), Some(3));
        assert!(!out.exists());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("kustomizily::payload::base64"));
        assert!(stderr.contains("Secret/broken"));
    }

    #[test]
    fn test_malformed_document_exit_code() {
        let temp = TempDir::new().unwrap();
        let output = kustomizily_stdin(
            &["-o", temp.path().to_str().unwrap()],
            "apiVersion: v1\nkind: [oops\n",
        );
        assert_eq!(output.status.code(), Some(3));
        assert!(
            String::from_utf8_lossy(&output.stderr).contains("kustomizily::document::malformed")
        );
    }

    #[test]
    fn test_oversized_document_exit_code() {
        let temp = TempDir::new().unwrap();
        let output = kustomizily(&[
            "--max-document-size",
            "32",
            "-i",
            &fixture("app.yaml"),
            "-o",
            temp.path().to_str().unwrap(),
        ]);
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn test_unresolvable_names_exit_code() {
        let temp = TempDir::new().unwrap();
        let output = kustomizily(&[
            "-i",
            &fixture("duplicates.yaml"),
            "-o",
            temp.path().to_str().unwrap(),
        ]);
        assert_eq!(output.status.code(), Some(4));
    }

    #[test]
    fn test_missing_input_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yaml");
        let output = kustomizily(&[
            "-i",
            missing.to_str().unwrap(),
            "-o",
            temp.path().to_str().unwrap(),
        ]);

        assert_eq!(output.status.code(), Some(5));
        assert!(String::from_utf8_lossy(&output.stderr).contains("kustomizily::cli::input"));
    }

    #[test]
    fn test_unexpected_positional_argument_is_usage_error() {
        let output = kustomizily(&["stray"]);
        assert_eq!(output.status.code(), Some(64));
    }

    #[test]
    fn test_help_succeeds() {
        let output = kustomizily(&["--help"]);
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("--dry-run"));
    }
}
