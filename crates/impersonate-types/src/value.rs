//! Query values and result rows.
//!
//! A [`Row`] maps column names to [`Value`]s. Scalars are plain data and
//! mean the same thing in every session. [`Node`] values are different:
//! they belong to the object space of the session that produced them and
//! must be re-bound (see [`Value::rebind`]) before another session can use
//! them. Re-binding keeps the stable [`NodeId`] and swaps the owning
//! [`SessionId`].

use crate::{NodeId, SessionId};
use serde::Serialize;
use std::collections::BTreeMap;

/// One result row: column name → value.
pub type Row = BTreeMap<String, Value>;

/// Query parameters: parameter name → value.
pub type Params = BTreeMap<String, Value>;

/// A value produced or consumed by a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Graph entity owned by one session.
    Node(Node),
}

impl Value {
    /// Moves every entity inside this value into `session`'s object space.
    ///
    /// Scalars are returned unchanged; lists and maps are re-bound
    /// element-wise.
    ///
    /// # Example
    ///
    /// ```
    /// use impersonate_types::{Node, NodeId, SessionId, Value};
    ///
    /// let inner = SessionId::new();
    /// let outer = SessionId::new();
    /// let node = Node::new(NodeId(1), inner).with_label("Person");
    ///
    /// let rebound = Value::List(vec![Value::Node(node), Value::Int(3)]).rebind(outer);
    /// let Value::List(items) = rebound else { unreachable!() };
    /// assert_eq!(items[0].as_node().map(|n| n.session()), Some(outer));
    /// assert_eq!(items[1], Value::Int(3));
    /// ```
    #[must_use]
    pub fn rebind(self, session: SessionId) -> Self {
        match self {
            Self::Node(node) => Self::Node(node.rebound(session)),
            Self::List(items) => Self::List(items.into_iter().map(|v| v.rebind(session)).collect()),
            Self::Map(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.rebind(session)))
                    .collect(),
            ),
            scalar => scalar,
        }
    }

    /// Returns the node if this value is one.
    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the string if this value is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this value is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// A graph node as seen from one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    id: NodeId,
    labels: Vec<String>,
    properties: BTreeMap<String, Value>,
    #[serde(skip)]
    session: SessionId,
}

impl Node {
    /// Creates a node without labels or properties, owned by `session`.
    #[must_use]
    pub fn new(id: NodeId, session: SessionId) -> Self {
        Self {
            id,
            labels: Vec::new(),
            properties: BTreeMap::new(),
            session,
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Stable entity identity.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Session whose object space this value belongs to.
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Property keys visible in this value, sorted.
    pub fn property_keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Returns the same entity owned by `session`.
    #[must_use]
    pub fn rebound(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }
}
