//! Integration tests for the skynote CLI
//!
//! Every test runs against an isolated settings file, local storage file and
//! vault. The service points at a closed local port, or at a local mockito
//! server when a test counts the requests a run makes, so no test reaches
//! the network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a test environment with isolated settings, storage and vault
struct TestEnv {
    _temp_dir: TempDir,
    config_path: PathBuf,
    storage_path: PathBuf,
    vault_dir: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_service("http://127.0.0.1:9")
    }

    fn with_service(service: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config").join("config.toml");
        let storage_path = temp_dir.path().join("local").join("local-storage.json");
        let vault_dir = temp_dir.path().join("vault");

        fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        fs::create_dir_all(&vault_dir).unwrap();

        fs::write(
            &config_path,
            format!(
                "identifier = \"alice.bsky.social\"\nservice = \"{}\"\n",
                service
            ),
        )
        .unwrap();

        Self {
            _temp_dir: temp_dir,
            config_path,
            storage_path,
            vault_dir,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("skynote").unwrap();
        cmd.env("SKYNOTE_CONFIG", &self.config_path);
        cmd.env("SKYNOTE_LOCAL_STORAGE", &self.storage_path);
        cmd.env("SKYNOTE_VAULT", &self.vault_dir);
        cmd.env_remove("SKYNOTE_LOG_FORMAT");
        cmd.env_remove("SKYNOTE_LOG_LEVEL");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn config(&self) -> String {
        fs::read_to_string(&self.config_path).unwrap()
    }

    fn store_app_password(&self, password: &str) {
        self.cmd()
            .args(["settings", "app-password", "--stdin"])
            .write_stdin(password)
            .assert()
            .success()
            .stderr(predicate::str::contains("Skynote: app password saved"));
    }
}

/// Server rejecting every session request; `expected` is how many may arrive
fn rejecting_server(server: &mut mockito::Server, expected: usize) -> mockito::Mock {
    server
        .mock("POST", "/xrpc/com.atproto.server.createSession")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"AuthenticationRequired","message":"Invalid identifier or password"}"#)
        .expect(expected)
        .create()
}

fn stderr_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

#[test]
fn test_commands_lists_registered_ids() {
    let env = TestEnv::new();

    env.cmd()
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("post-selection-text"))
        .stdout(predicate::str::contains("init-appPassword"))
        .stdout(predicate::str::contains("Add Page of Timeline(experimental)"))
        .stdout(predicate::str::contains("Post selection to Bluesky"));
}

#[test]
fn test_login_without_password_reports_missing_credential() {
    let env = TestEnv::new();

    env.cmd()
        .arg("init-app-password")
        .assert()
        .success()
        .stderr(predicate::str::contains("Skynote: app password initialized"));

    env.cmd()
        .arg("login")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Skynote: identifier or appPassword must be exist",
        ));
}

#[test]
fn test_post_while_unauthenticated() {
    let env = TestEnv::new();

    env.cmd()
        .args(["post-selection-text", "hello"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Skynote: (Error) not authenticated"));
}

#[test]
fn test_post_from_stdin_while_unauthenticated() {
    let env = TestEnv::new();

    env.cmd()
        .arg("post-selection-menu")
        .write_stdin("hello from a pipe\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("(Error) not authenticated"));
}

#[test]
fn test_login_with_rejected_password_attempts_once() {
    let mut server = mockito::Server::new();
    let sessions = rejecting_server(&mut server, 1);
    let env = TestEnv::with_service(&server.url());
    env.store_app_password("wrong-pw\n");

    let stderr = stderr_of(env.cmd().arg("login").assert().success());

    assert_eq!(stderr.matches("Skynote: login failed").count(), 1);
    assert_eq!(stderr.matches("Skynote: ").count(), 1);
    sessions.assert();
}

#[test]
fn test_local_commands_never_send_the_password() {
    let mut server = mockito::Server::new();
    let sessions = rejecting_server(&mut server, 0);
    let env = TestEnv::with_service(&server.url());
    env.store_app_password("abcd-efgh-ijkl-mnop");

    env.cmd()
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app password: set"))
        .stdout(predicate::str::contains("abcd-efgh-ijkl-mnop").not());

    env.cmd()
        .args(["settings", "identifier", "bob.bsky.social"])
        .assert()
        .success();

    let stderr = stderr_of(env.cmd().arg("init-app-password").assert().success());
    let notices: Vec<_> = stderr.lines().filter(|l| l.starts_with("Skynote: ")).collect();
    assert_eq!(notices, vec!["Skynote: app password initialized"]);

    sessions.assert();
}

#[test]
fn test_post_logs_in_once_before_posting() {
    let mut server = mockito::Server::new();
    let sessions = rejecting_server(&mut server, 1);
    let env = TestEnv::with_service(&server.url());
    env.store_app_password("wrong-pw");

    // The failed automatic login is a notification, not an exit code
    let stderr = stderr_of(
        env.cmd()
            .args(["post-selection-text", "hello"])
            .assert()
            .success(),
    );

    assert_eq!(stderr.matches("Skynote: login failed").count(), 1);
    assert!(stderr.contains("Skynote: (Error) not authenticated"));
    sessions.assert();
}

#[test]
fn test_settings_identifier_round_trip() {
    let env = TestEnv::new();
    env.store_app_password("abcd-efgh-ijkl-mnop");

    env.cmd()
        .args(["settings", "identifier", "bob.bsky.social"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Skynote: identifier saved"));

    env.cmd()
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("identifier: bob.bsky.social"));

    let config = env.config();
    assert!(config.contains("bob.bsky.social"));
    assert!(!config.contains("abcd-efgh-ijkl-mnop"));
    assert!(!config.contains("appPassword"));
}

#[test]
fn test_empty_app_password_is_rejected() {
    let env = TestEnv::new();

    env.cmd()
        .args(["settings", "app-password", "--stdin"])
        .write_stdin("\n")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("App password cannot be empty"));
}

#[test]
fn test_timeline_without_session_creates_no_note() {
    let env = TestEnv::new();

    env.cmd()
        .arg("get-timeline-unstable")
        .assert()
        .success()
        .stderr(predicate::str::contains("Skynote: Failed to get Timeline"));

    assert_eq!(fs::read_dir(&env.vault_dir).unwrap().count(), 0);
}

#[test]
fn test_out_of_range_timeline_limit_names_the_field() {
    let env = TestEnv::new();
    fs::write(
        &env.config_path,
        "identifier = \"alice.bsky.social\"\ntimeline_limit = 300\n",
    )
    .unwrap();

    env.cmd()
        .arg("get-timeline-unstable")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid value for timeline_limit"));
}

#[test]
fn test_unparseable_settings_fail_the_adapter() {
    let env = TestEnv::new();
    fs::write(&env.config_path, "identifier = [not toml").unwrap();

    env.cmd()
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
