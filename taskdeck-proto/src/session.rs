//! The opaque identifier of the signed-in user.

use std::fmt;

/// Opaque token naming "the current user".
///
/// Handed out by the identity provider on login and cached locally. Every
/// remote task operation is scoped to one of these. An identifier is never
/// empty: blank input yields `None` from [`SessionIdentifier::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentifier(String);

impl SessionIdentifier {
    /// Wraps a raw identifier, rejecting empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self(raw))
    }

    /// Returns the raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
