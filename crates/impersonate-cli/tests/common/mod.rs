//! Shared E2E test helpers for `impersonate` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

pub const PERSON_QUERY: &str = "MATCH (p:Person{name:$name}) RETURN p";

/// Path of the bundled fixture.
pub fn people_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/people.json")
}

/// Build a Command for the `impersonate` binary against the bundled fixture.
///
/// `IMPERSONATE_*` variables are removed so the host environment cannot
/// change the configuration under test.
pub fn impersonate_cmd() -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("impersonate");
    cmd.timeout(TIMEOUT_BASIC);
    for (key, _) in std::env::vars() {
        if key.starts_with("IMPERSONATE_") {
            cmd.env_remove(key);
        }
    }
    cmd.arg("--fixture").arg(people_fixture());
    cmd.args(["--sweep-interval-ms", "20"]);
    cmd
}
