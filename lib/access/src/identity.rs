//! The identity an identity provider vouches for.

use serde::{Deserialize, Serialize};

use crate::error::MissingIdentityField;

/// A user identity returned by an identity provider after login.
///
/// Only the email takes part in authorization. The display name and
/// avatar are presentation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Verified email address. `None` when the provider did not return
    /// one or did not verify it.
    email: Option<String>,
    /// Name shown in the UI.
    display_name: String,
    /// Profile picture URL.
    avatar_url: Option<String>,
}

impl Identity {
    /// Creates an identity with the given display name and no email.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            email: None,
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_avatar_url(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url;
        self
    }

    /// Returns the email, if present.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the email or the error the gate reports when it is absent.
    ///
    /// # Errors
    ///
    /// Returns `MissingIdentityField` when no email is present.
    pub fn require_email(&self) -> Result<&str, MissingIdentityField> {
        self.email().ok_or(MissingIdentityField { field: "email" })
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the avatar URL, if present.
    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_identity_has_no_email() {
        let identity = Identity::new("Alice");
        assert_eq!(identity.display_name(), "Alice");
        assert!(identity.email().is_none());
        assert!(identity.avatar_url().is_none());
    }

    #[test]
    fn builder_sets_optional_fields() {
        let identity = Identity::new("Alice")
            .with_email(Some("alice@example.com".to_string()))
            .with_avatar_url(Some("https://example.com/a.png".to_string()));

        assert_eq!(identity.email(), Some("alice@example.com"));
        assert_eq!(identity.avatar_url(), Some("https://example.com/a.png"));
    }

    #[test]
    fn require_email_reports_missing_field() {
        let err = Identity::new("Nobody")
            .require_email()
            .expect_err("no email set");
        assert_eq!(err.field, "email");
    }
}
