//! Authentication subjects.
//!
//! Session hosts ask the subject of a session who it is and whether it
//! still needs to complete authentication. An impersonated subject never
//! authenticated at all, so it answers with a fixed, already-successful
//! state and holds nothing mutable.

use std::fmt::Debug;

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationResult {
    Success,
    Failure,
    PasswordChangeRequired,
}

/// Identity capability of a session's subject.
pub trait AuthSubject: Send + Sync + Debug {
    fn username(&self) -> &str;

    fn has_username(&self, username: &str) -> bool {
        self.username() == username
    }

    fn authentication_result(&self) -> AuthenticationResult;

    fn password_change_required(&self) -> bool {
        self.authentication_result() == AuthenticationResult::PasswordChangeRequired
    }

    /// Ends the subject's login, if it has one.
    fn logout(&self) {}
}

/// Subject of an impersonated session.
///
/// # Example
///
/// ```
/// use impersonate_auth::{AuthSubject, AuthenticationResult, ImpersonatedSubject};
///
/// let subject = ImpersonatedSubject::new("joe");
/// assert_eq!(subject.authentication_result(), AuthenticationResult::Success);
/// assert!(!subject.password_change_required());
/// assert!(subject.has_username("joe"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonatedSubject {
    username: String,
}

impl ImpersonatedSubject {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl AuthSubject for ImpersonatedSubject {
    fn username(&self) -> &str {
        &self.username
    }

    fn authentication_result(&self) -> AuthenticationResult {
        AuthenticationResult::Success
    }

    fn password_change_required(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impersonated_subject_is_authenticated() {
        let subject = ImpersonatedSubject::new("joe");
        assert_eq!(subject.username(), "joe");
        assert!(!subject.has_username("john"));
        assert_eq!(
            subject.authentication_result(),
            AuthenticationResult::Success
        );
        subject.logout();
        assert_eq!(
            subject.authentication_result(),
            AuthenticationResult::Success
        );
    }
}
