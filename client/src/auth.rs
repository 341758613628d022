//! Sign-in, account creation and sign-out.

use crate::error::{ClientError, Result};
use crate::gateway::{ApiClient, HttpTransport};
use crate::session::SessionStore;
use crate::types::Identity;

/// Message returned when the server does not send one after registering.
pub const REGISTRATION_FALLBACK_MESSAGE: &str = "Registration succeeded";

/// Account creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Password typed a second time
    pub confirm_password: String,
}

impl Registration {
    /// Check the form before it is sent.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank field or mismatched passwords.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("Name", self.name.as_str()),
            ("Email", self.email.as_str()),
            ("Password", self.password.as_str()),
            ("Password confirmation", self.confirm_password.as_str()),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ClientError::validation(format!("{field} is required")));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::validation("Passwords do not match"));
        }
        Ok(())
    }
}

/// Authentication operations over the gateway and the session store.
pub struct AuthService<T> {
    api: ApiClient<T>,
}

impl<T> Clone for AuthService<T> {
    fn clone(&self) -> Self {
        Self { api: self.api.clone() }
    }
}

impl<T> std::fmt::Debug for AuthService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

impl<T: HttpTransport> AuthService<T> {
    /// Create the service.
    #[must_use]
    pub const fn new(api: ApiClient<T>) -> Self {
        Self { api }
    }

    fn session(&self) -> &SessionStore {
        self.api.session()
    }

    /// Sign in and persist the session.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for blank input (nothing is sent), the
    /// server's rejection, a response without `token` and `user`, or a
    /// storage failure.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::validation("Email and password are required"));
        }

        let response = self.api.login(email, password).await?;
        let identity = response.user.clone();
        self.session().login(response.token, response.user)?;

        tracing::info!(role = %identity.role, "Signed in");
        Ok(identity)
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for an invalid form (nothing is sent);
    /// the server's rejection otherwise.
    #[tracing::instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<String> {
        registration.validate()?;
        let message = self
            .api
            .register(
                registration.name.trim(),
                registration.email.trim(),
                &registration.password,
            )
            .await?;
        tracing::info!("Account registered");
        Ok(message.unwrap_or_else(|| REGISTRATION_FALLBACK_MESSAGE.to_string()))
    }

    /// Sign out. Always succeeds and may be called repeatedly.
    pub fn logout(&self) {
        self.session().logout();
    }
}
