//! Sign-in and registration in front of an external identity provider.
//!
//! Credentials are checked locally before the provider is contacted. A
//! successful sign-in yields the [`SessionIdentifier`] that is written to the
//! [`SessionCache`]; nothing past this module ever sees a password.

use std::sync::LazyLock;

use regex::Regex;
use taskdeck_proto::SessionIdentifier;

use crate::session::{KeyValueStore, SessionCache, SessionError};

/// Shortest password the provider accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[allow(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Email and password as typed by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Locally detected credential problems. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
    #[error("Passwords should match with each other")]
    PasswordMismatch,
}

/// Checks credentials for sign-in.
///
/// # Errors
///
/// Returns the first [`CredentialError`] found.
pub fn validate_login(creds: &Credentials) -> Result<(), CredentialError> {
    if !EMAIL_PATTERN.is_match(&creds.email) {
        return Err(CredentialError::InvalidEmail);
    }
    if creds.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CredentialError::PasswordTooShort);
    }
    Ok(())
}

/// Checks credentials for registration, including the confirmation field.
///
/// # Errors
///
/// Returns the first [`CredentialError`] found.
pub fn validate_registration(creds: &Credentials, confirm: &str) -> Result<(), CredentialError> {
    validate_login(creds)?;
    if creds.password != confirm {
        return Err(CredentialError::PasswordMismatch);
    }
    Ok(())
}

/// User-facing text for a provider error code.
#[must_use]
pub fn provider_message(code: &str) -> &'static str {
    match code {
        "auth/email-already-in-use" => "A user with that email already exists",
        "auth/weak-password" => "Please check your password. It should be 6+ characters",
        "auth/user-not-found" | "auth/wrong-password" => "Invalid email or password",
        "auth/invalid-credential" => "Invalid credentials please register",
        _ => "Something went wrong, please try again",
    }
}

/// Errors from the sign-in and registration flows.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Rejected locally; the provider was not contacted.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// The provider refused the request.
    #[error("{}", provider_message(code))]
    Provider {
        /// Provider error code, e.g. `auth/wrong-password`.
        code: String,
    },

    /// Signed in, but the identifier could not be stored.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// External account provider.
pub trait IdentityService: Send + Sync {
    /// Authenticates and returns the user's identifier.
    fn sign_in(
        &self,
        creds: &Credentials,
    ) -> impl std::future::Future<Output = Result<SessionIdentifier, IdentityError>> + Send;

    /// Creates an account. The new user still has to sign in.
    fn register(
        &self,
        creds: &Credentials,
    ) -> impl std::future::Future<Output = Result<(), IdentityError>> + Send;
}

/// Validates, signs in and stores the resulting identifier.
///
/// # Errors
///
/// See [`IdentityError`]. The session is untouched on failure.
pub async fn login<I, K>(
    service: &I,
    session: &SessionCache<K>,
    creds: &Credentials,
) -> Result<SessionIdentifier, IdentityError>
where
    I: IdentityService,
    K: KeyValueStore,
{
    validate_login(creds)?;
    let id = service
        .sign_in(creds)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "sign-in rejected"))?;
    session.set(&id).await?;
    tracing::info!(user = %id, "signed in");
    Ok(id)
}

/// Validates and creates an account, signing out any current user first.
///
/// # Errors
///
/// See [`IdentityError`].
pub async fn register<I, K>(
    service: &I,
    session: &SessionCache<K>,
    creds: &Credentials,
    confirm: &str,
) -> Result<(), IdentityError>
where
    I: IdentityService,
    K: KeyValueStore,
{
    validate_registration(creds, confirm)?;
    session.clear().await?;
    service
        .register(creds)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "registration rejected"))?;
    tracing::info!("account registered");
    Ok(())
}

/// Forgets the signed-in user.
///
/// # Errors
///
/// Returns [`IdentityError::Session`] if the stored identifier could not be
/// removed.
pub async fn logout<K: KeyValueStore>(session: &SessionCache<K>) -> Result<(), IdentityError> {
    session.clear().await?;
    tracing::info!("signed out");
    Ok(())
}
