//! JSON description of an in-memory host.
//!
//! ```json
//! {
//!   "default_target": "neo4j",
//!   "users": { "joe": { "roles": ["restricted"] } },
//!   "roles": {
//!     "restricted": {
//!       "copy_of": "reader",
//!       "privileges": [
//!         { "scope": "all", "action": { "read": { "property": "salary" } }, "sign": "deny" }
//!       ]
//!     }
//!   },
//!   "graph": {
//!     "neo4j": [ { "labels": ["Person"], "properties": { "name": "John", "salary": 1000 } } ]
//!   }
//! }
//! ```

use super::{MemoryDefaultTarget, MemoryDirectory, MemoryGraph, MemoryPrivilegeStore, MemorySessionFactory};
use crate::host::Host;
use impersonate_auth::{Privilege, UserRecord};
use impersonate_types::{ErrorCode, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Failure to load or apply a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("role '{role}' copies unknown role '{source_role}'")]
    UnknownRole { role: String, source_role: String },
}

impl ErrorCode for FixtureError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "FIXTURE_READ_FILE",
            Self::Parse(_) => "FIXTURE_PARSE",
            Self::UnknownRole { .. } => "FIXTURE_UNKNOWN_ROLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleFixture {
    /// Role whose privileges are copied first.
    #[serde(default)]
    pub copy_of: Option<String>,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeFixture {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// Parsed fixture file.
#[derive(Debug, Clone, Deserialize)]
pub struct HostFixture {
    #[serde(default = "default_target_name")]
    pub default_target: String,
    #[serde(default)]
    pub users: BTreeMap<String, UserRecord>,
    #[serde(default)]
    pub roles: BTreeMap<String, RoleFixture>,
    #[serde(default)]
    pub graph: BTreeMap<String, Vec<NodeFixture>>,
}

fn default_target_name() -> String {
    "neo4j".to_string()
}

/// The concrete stores behind a memory [`Host`].
#[derive(Debug, Clone)]
pub struct MemoryHost {
    pub directory: Arc<MemoryDirectory>,
    pub default_target: Arc<MemoryDefaultTarget>,
    pub privileges: Arc<MemoryPrivilegeStore>,
    pub graph: Arc<MemoryGraph>,
    pub sessions: Arc<MemorySessionFactory>,
}

impl MemoryHost {
    /// An empty host with only the built-in `reader` role.
    #[must_use]
    pub fn new(default_target: &str) -> Self {
        let graph = Arc::new(MemoryGraph::new());
        Self {
            directory: Arc::new(MemoryDirectory::new()),
            default_target: Arc::new(MemoryDefaultTarget::new(default_target)),
            privileges: Arc::new(MemoryPrivilegeStore::new()),
            sessions: Arc::new(MemorySessionFactory::new(Arc::clone(&graph))),
            graph,
        }
    }

    /// Type-erased collaborators for an impersonator.
    #[must_use]
    pub fn host(&self) -> Host {
        Host {
            directory: self.directory.clone(),
            default_target: self.default_target.clone(),
            privileges: self.privileges.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl HostFixture {
    /// # Errors
    ///
    /// [`FixtureError::Parse`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// [`FixtureError::ReadFile`] or [`FixtureError::Parse`].
    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path).map_err(|source| FixtureError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Builds the stores this fixture describes.
    ///
    /// Roles are applied in name order; a role may only copy a role that
    /// is built in or sorts before it.
    ///
    /// # Errors
    ///
    /// [`FixtureError::UnknownRole`] if `copy_of` names a missing role.
    pub fn build(&self) -> Result<MemoryHost, FixtureError> {
        let host = MemoryHost::new(&self.default_target);

        for (role, fixture) in &self.roles {
            match &fixture.copy_of {
                Some(source) => host.privileges.copy_role(source, role.clone()).map_err(|_| {
                    FixtureError::UnknownRole {
                        role: role.clone(),
                        source_role: source.clone(),
                    }
                })?,
                None => host.privileges.create_role(role.clone()),
            }
            for privilege in &fixture.privileges {
                host.privileges.grant(role.clone(), privilege.clone());
            }
        }

        for (username, record) in &self.users {
            host.directory.insert_user(username.clone(), record.clone());
        }

        for (target, nodes) in &self.graph {
            for node in nodes {
                let properties = node
                    .properties
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                    .collect();
                host.graph.add_node(target.clone(), node.labels.iter().cloned(), properties);
            }
        }

        Ok(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use impersonate_auth::{PrivilegeStore, UserDirectory};
    use std::collections::BTreeSet;

    const FIXTURE: &str = r#"{
        "default_target": "neo4j",
        "users": {
            "joe": { "roles": ["restricted"] },
            "mallory": { "roles": ["reader"], "suspended": true }
        },
        "roles": {
            "restricted": {
                "copy_of": "reader",
                "privileges": [
                    { "scope": "all", "action": { "read": { "property": "salary" } }, "sign": "deny" }
                ]
            }
        },
        "graph": {
            "neo4j": [
                { "labels": ["Person"], "properties": { "name": "John", "salary": 1000 } }
            ]
        }
    }"#;

    #[test]
    fn builds_stores() {
        let host = HostFixture::from_json(FIXTURE)
            .expect("parse")
            .build()
            .expect("build");

        assert_eq!(host.directory.lookup_user("joe").expect("joe").roles, vec!["restricted"]);
        assert_eq!(host.directory.is_suspended("mallory"), Ok(true));

        let roles = BTreeSet::from(["restricted".to_string()]);
        let privileges = host.privileges.privileges_for(&roles).expect("privileges");
        assert_eq!(privileges.len(), 4);
        assert_eq!(privileges.iter().filter(|p| p.is_deny()).count(), 1);

        assert_eq!(host.graph.node_count("neo4j"), 1);
    }

    #[test]
    fn copy_of_unknown_role_fails() {
        let fixture = HostFixture::from_json(r#"{"roles": {"x": {"copy_of": "nope"}}}"#)
            .expect("parse");
        let err = fixture.build().expect_err("unknown role");
        assert!(matches!(err, FixtureError::UnknownRole { .. }));
        assert_eq!(err.code(), "FIXTURE_UNKNOWN_ROLE");
    }

    #[test]
    fn malformed_fixture() {
        let err = HostFixture::from_json("{ nope").expect_err("malformed");
        assert!(matches!(err, FixtureError::Parse(_)));
    }

    #[test]
    fn empty_fixture_defaults() {
        let fixture = HostFixture::from_json("{}").expect("parse");
        assert_eq!(fixture.default_target, "neo4j");
        let host = fixture.build().expect("build");
        assert!(host.privileges.has_role("reader"));
    }
}
