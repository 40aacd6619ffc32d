// Authentication
//
// Bearer-token login, local logout, and a classifier that turns a
// failed login into the message an operator should see.

use std::fmt;

use secrecy::SecretString;
use tracing::{debug, info};

use crate::client::MobiusClient;
use crate::error::Error;
use crate::models::{LoginRequest, LoginResponse};
use crate::session::SessionEvent;

impl MobiusClient {
    /// Exchange credentials for a bearer token.
    ///
    /// `POST /auth/login`
    ///
    /// The token is stored in the session before this returns. On failure
    /// the session is left as it was and the transport error propagates.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, Error> {
        debug!(email = %credentials.email, "logging in");

        let response: LoginResponse = self.post(&["auth", "login"], credentials).await?;
        self.session()
            .store_token(SecretString::from(response.token.clone()));
        self.session().emit(SessionEvent::LoggedIn);

        info!(user_id = %response.user.id, role = %response.user.role, "login successful");
        Ok(response)
    }

    /// Forget the local token.
    ///
    /// Does not contact the server; tokens stay valid server-side until
    /// they expire.
    pub fn logout(&self) {
        self.session().clear();
        self.session().emit(SessionEvent::LoggedOut);
    }

    /// `true` iff a token is present. Contents and expiry are not checked.
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }
}

// ── Login failure classification ────────────────────────────────────

/// What went wrong with a login attempt, from the operator's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// HTTP 401.
    InvalidCredentials,
    /// HTTP 429.
    RateLimited,
    /// Anything else, including no response at all.
    Connectivity,
}

impl LoginFailure {
    pub fn classify(err: &Error) -> Self {
        match err.status() {
            Some(401) => Self::InvalidCredentials,
            Some(429) => Self::RateLimited,
            _ => Self::Connectivity,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid email or password",
            Self::RateLimited => "Too many login attempts. Please try again later.",
            Self::Connectivity => "Login failed. Please check your connection and try again.",
        }
    }
}

impl From<&Error> for LoginFailure {
    fn from(err: &Error) -> Self {
        Self::classify(err)
    }
}

impl fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
