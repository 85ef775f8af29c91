//! In-memory sessions over a [`MemoryGraph`].
//!
//! Sessions enforce their [`AccessMode`]: without TRAVERSE nothing is
//! found, unreadable properties are hidden from returned nodes and
//! projections, and a filter on an unreadable property never matches.

use super::graph::{MemoryGraph, StoredNode};
use super::query::{Projection, Query};
use crate::host::{RowStream, Session, SessionError, SessionFactory, TerminationReason};
use impersonate_auth::{AccessDecision, AccessMode};
use impersonate_types::{Node, Params, Row, SessionId, Value};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Lifecycle of a memory session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Committed,
    RolledBack,
    Terminated(TerminationReason),
}

#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    closed: bool,
}

/// A session against one target of a [`MemoryGraph`].
#[derive(Debug)]
pub struct MemorySession {
    id: SessionId,
    target: String,
    mode: AccessMode,
    graph: Arc<MemoryGraph>,
    lifecycle: Mutex<Lifecycle>,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    closes: AtomicUsize,
}

impl MemorySession {
    fn new(graph: Arc<MemoryGraph>, target: &str, mode: AccessMode) -> Self {
        Self {
            id: SessionId::new(),
            target: target.to_string(),
            mode,
            graph,
            lifecycle: Mutex::new(Lifecycle {
                state: SessionState::Open,
                closed: false,
            }),
            commits: AtomicUsize::new(0),
            rollbacks: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn mode(&self) -> &AccessMode {
        &self.mode
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lifecycle.lock().state.clone()
    }

    /// Ends the session abnormally, as a kill or timeout would.
    pub fn terminate(&self, reason: TerminationReason) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state == SessionState::Open {
            lifecycle.state = SessionState::Terminated(reason);
        }
    }

    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn rollback_count(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn finish(&self, next: SessionState) -> Result<(), SessionError> {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.closed || lifecycle.state != SessionState::Open {
            return Err(SessionError::Closed(self.id));
        }
        lifecycle.state = next;
        Ok(())
    }
}

impl Session for MemorySession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn is_open(&self) -> bool {
        let lifecycle = self.lifecycle.lock();
        !lifecycle.closed && lifecycle.state == SessionState::Open
    }

    fn termination_reason(&self) -> Option<TerminationReason> {
        match &self.lifecycle.lock().state {
            SessionState::Terminated(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    fn commit(&self) -> Result<(), SessionError> {
        self.finish(SessionState::Committed)?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&self) -> Result<(), SessionError> {
        self.finish(SessionState::RolledBack)?;
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), SessionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.lifecycle.lock().closed = true;
        Ok(())
    }

    fn execute(&self, query: &str, params: &Params) -> Result<RowStream, SessionError> {
        if !self.is_open() {
            return Err(SessionError::Closed(self.id));
        }
        if !self.mode.allows_access() {
            return Err(SessionError::AccessDenied(format!(
                "no access to target '{}'",
                self.target
            )));
        }

        let query = Query::parse(query)?;
        let filters = query
            .filters
            .iter()
            .map(|(key, filter)| Ok((key.clone(), filter.resolve(params)?.clone())))
            .collect::<Result<Vec<(String, Value)>, SessionError>>()?;

        if !self.mode.allows_traverse() {
            return Ok(Box::new(std::iter::empty()));
        }

        let nodes = self.graph.snapshot(&self.target);
        let mode = self.mode.clone();
        let session = self.id;
        debug!(session = %session, nodes = nodes.len(), "executing memory query");

        let rows = (0..nodes.len()).filter_map(move |i| {
            let node = &nodes[i];
            if !matches(node, &query, &filters, &mode) {
                return None;
            }
            Some(Ok(project(node, &query, &mode, session)))
        });
        Ok(Box::new(rows))
    }
}

fn matches(node: &StoredNode, query: &Query, filters: &[(String, Value)], mode: &AccessMode) -> bool {
    if let Some(label) = &query.label {
        if !node.has_label(label) {
            return false;
        }
    }
    filters.iter().all(|(key, expected)| {
        mode.allows_read_property(key) && node.properties.get(key) == Some(expected)
    })
}

fn project(node: &StoredNode, query: &Query, mode: &AccessMode, session: SessionId) -> Row {
    query
        .returns
        .iter()
        .map(|projection| {
            let value = match projection {
                Projection::Node => Value::Node(visible_node(node, mode, session)),
                Projection::Property(key) if mode.allows_read_property(key) => {
                    node.properties.get(key).cloned().unwrap_or(Value::Null)
                }
                Projection::Property(_) => Value::Null,
            };
            (query.column(projection), value)
        })
        .collect()
}

fn visible_node(node: &StoredNode, mode: &AccessMode, session: SessionId) -> Node {
    let labelled = node
        .labels
        .iter()
        .fold(Node::new(node.id, session), |n, label| n.with_label(label.clone()));
    node.properties
        .iter()
        .filter(|(key, _)| mode.allows_read_property(key))
        .fold(labelled, |n, (key, value)| n.with_property(key.clone(), value.clone()))
}

/// Opens [`MemorySession`]s and remembers the impersonated ones.
#[derive(Debug)]
pub struct MemorySessionFactory {
    graph: Arc<MemoryGraph>,
    opened: Mutex<Vec<Arc<MemorySession>>>,
}

impl MemorySessionFactory {
    #[must_use]
    pub fn new(graph: Arc<MemoryGraph>) -> Self {
        Self {
            graph,
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Opens a caller's own session with full rights on `target`.
    #[must_use]
    pub fn open_caller_session(&self, target: &str) -> Arc<MemorySession> {
        Arc::new(MemorySession::new(
            Arc::clone(&self.graph),
            target,
            AccessMode::unrestricted(target),
        ))
    }

    /// Sessions opened through [`SessionFactory::open_session`], oldest first.
    #[must_use]
    pub fn opened_sessions(&self) -> Vec<Arc<MemorySession>> {
        self.opened.lock().clone()
    }

    #[must_use]
    pub fn opened_count(&self) -> usize {
        self.opened.lock().len()
    }
}

impl SessionFactory for MemorySessionFactory {
    fn open_session(
        &self,
        decision: &AccessDecision,
        target: &str,
    ) -> Result<Arc<dyn Session>, SessionError> {
        let session = Arc::new(MemorySession::new(
            Arc::clone(&self.graph),
            target,
            decision.mode().clone(),
        ));
        self.opened.lock().push(Arc::clone(&session));
        Ok(session)
    }
}
