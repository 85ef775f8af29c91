//! E2E integration tests for the `impersonate` binary.
//!
//! Rows go to stdout as JSON lines; errors and logs go to stderr.

mod common;

use common::{impersonate_cmd, PERSON_QUERY};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

// ─── Successful queries ────────────────────────────────────────────

mod queries {
    use super::*;

    #[test]
    fn restricted_user_does_not_see_salary() {
        impersonate_cmd()
            .args(["--user", "joe", "--param", "name=John", PERSON_QUERY])
            .assert()
            .success()
            .stdout(contains("\"name\":\"John\""))
            .stdout(contains("salary").not());
    }

    #[test]
    fn reader_sees_salary() {
        impersonate_cmd()
            .args(["--user", "ann", "--param", "name=John", PERSON_QUERY])
            .assert()
            .success()
            .stdout(contains("\"salary\":1000"));
    }

    #[test]
    fn one_json_line_per_row() {
        let output = impersonate_cmd()
            .args(["--user", "ann", "MATCH (p:Person) RETURN p.name"])
            .output()
            .expect("run impersonate");
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).expect("utf8");
        let names: Vec<serde_json::Value> = stdout
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|row| row["p.name"].is_string()));
    }

    #[test]
    fn explicit_target() {
        impersonate_cmd()
            .args(["--user", "ann", "--target", "system", "MATCH (u:User) RETURN u.name"])
            .assert()
            .success()
            .stdout(contains("\"u.name\":\"joe\""));
    }

    #[test]
    fn debug_logs_go_to_stderr() {
        impersonate_cmd()
            .args(["-d", "--user", "ann", "--param", "name=John", PERSON_QUERY])
            .assert()
            .success()
            .stderr(contains("opened impersonated session"))
            .stdout(contains("opened impersonated session").not());
    }
}

// ─── Failures ──────────────────────────────────────────────────────

mod failures {
    use super::*;

    #[test]
    fn unknown_user() {
        impersonate_cmd()
            .args(["--user", "ghost", PERSON_QUERY])
            .assert()
            .failure()
            .stderr(contains("invalid user: ghost"));
    }

    #[test]
    fn suspended_user() {
        impersonate_cmd()
            .args(["--user", "mallory", PERSON_QUERY])
            .assert()
            .failure()
            .stderr(contains("cannot impersonate a suspended account: mallory"));
    }

    #[test]
    fn user_without_access() {
        impersonate_cmd()
            .args(["--user", "nobody", PERSON_QUERY])
            .assert()
            .failure()
            .stderr(contains(
                "Target access is not allowed for user 'nobody' with roles [].",
            ));
    }

    #[test]
    fn missing_fixture() {
        let mut cmd: assert_cmd::Command = assert_cmd::cargo::cargo_bin_cmd!("impersonate");
        cmd.args(["--fixture", "/nonexistent/fixture.json", "--user", "ann", PERSON_QUERY])
            .assert()
            .failure()
            .stderr(contains("failed to read fixture"));
    }

    #[test]
    fn invalid_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[supervisor]\nsweep_interval_ms = \"soon\"\n").expect("write");

        impersonate_cmd()
            .arg("--config")
            .arg(&path)
            .args(["--user", "ann", PERSON_QUERY])
            .assert()
            .failure()
            .stderr(contains("Config error"));
    }

    #[test]
    fn malformed_param() {
        impersonate_cmd()
            .args(["--user", "ann", "--param", "oops", PERSON_QUERY])
            .assert()
            .failure()
            .stderr(contains("expected KEY=VALUE"));
    }
}
