//! In-memory user directory and default-target provider.

use impersonate_auth::{DefaultTargetProvider, DirectoryError, UserDirectory, UserRecord};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Thread-safe user table.
///
/// Counts full lookups and suspension checks separately so tests can
/// assert how often the cache reached the authority.
///
/// # Example
///
/// ```
/// use impersonate_auth::UserDirectory;
/// use impersonate_runtime::memory::MemoryDirectory;
///
/// let directory = MemoryDirectory::new().with_user("joe", ["reader"]);
/// let record = directory.lookup_user("joe").unwrap();
/// assert_eq!(record.roles, vec!["reader"]);
/// assert_eq!(directory.lookup_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
    lookups: AtomicUsize,
    suspension_checks: AtomicUsize,
    unavailable: AtomicBool,
    lookup_delay: Option<Duration>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an active user.
    #[must_use]
    pub fn with_user<I, S>(self, username: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_user(
            username,
            UserRecord {
                roles: roles.into_iter().map(Into::into).collect(),
                suspended: false,
            },
        );
        self
    }

    /// Makes every lookup sleep first, widening race windows in tests.
    #[must_use]
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub fn insert_user(&self, username: impl Into<String>, record: UserRecord) {
        self.users.write().insert(username.into(), record);
    }

    pub fn remove_user(&self, username: &str) -> Option<UserRecord> {
        self.users.write().remove(username)
    }

    /// Returns `false` if the user does not exist.
    pub fn set_suspended(&self, username: &str, suspended: bool) -> bool {
        match self.users.write().get_mut(username) {
            Some(record) => {
                record.suspended = suspended;
                true
            }
            None => false,
        }
    }

    /// Makes every call fail with [`DirectoryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn suspension_check_count(&self) -> usize {
        self.suspension_checks.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), DirectoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("directory offline".into()));
        }
        Ok(())
    }

    fn record(&self, username: &str) -> Result<UserRecord, DirectoryError> {
        self.users
            .read()
            .get(username)
            .cloned()
            .ok_or_else(|| DirectoryError::UnknownIdentity {
                username: username.to_string(),
            })
    }
}

impl UserDirectory for MemoryDirectory {
    fn lookup_user(&self, username: &str) -> Result<UserRecord, DirectoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.lookup_delay {
            std::thread::sleep(delay);
        }
        self.ensure_available()?;
        self.record(username)
    }

    fn is_suspended(&self, username: &str) -> Result<bool, DirectoryError> {
        self.suspension_checks.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        self.record(username).map(|r| r.suspended)
    }
}

/// Settable default target name.
#[derive(Debug)]
pub struct MemoryDefaultTarget {
    name: RwLock<String>,
    reads: AtomicUsize,
}

impl MemoryDefaultTarget {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: RwLock::new(name.into()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl DefaultTargetProvider for MemoryDefaultTarget {
    fn current_default_target(&self) -> Result<String, DirectoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.name.read().clone())
    }
}
