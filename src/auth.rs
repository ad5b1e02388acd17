//! Authentication boundary.
//!
//! The identity provider is reached through [`AuthBackend`]. Once a session exists, the user's
//! profile and role are loaded with bounded waits: if either does not arrive in time the session
//! carries on with a stand-in profile that holds no permissions, so a slow backend can delay the
//! UI but never grant access.
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AuthError;
use crate::types::TimeStamp;
use crate::user::{Actor, Role, User, UserProfile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<TimeStamp<Utc>>,
}

pub trait AuthBackend {
    fn sign_in(&self, email: &str, password: &str) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn get_session(&self) -> impl Future<Output = Option<Session>> + Send;

    fn load_profile(&self, user_id: &str) -> impl Future<Output = Result<User, AuthError>> + Send;

    fn load_role(&self, role_id: &str) -> impl Future<Output = Result<Role, AuthError>> + Send;

    /// Trades a recovery token for a session and sets the new password.
    fn reset_password(
        &self,
        token: &RecoveryToken,
        new_password: &str,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;
}

/// Tokens carried in the fragment of a password recovery link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryToken {
    pub access_token: String,
    pub refresh_token: String,
}

impl RecoveryToken {
    /// Parses `#access_token=..&refresh_token=..&type=recovery`.
    pub fn from_fragment(fragment: &str) -> Result<Self, AuthError> {
        let mut access_token = None;
        let mut refresh_token = None;
        let mut kind = None;
        let mut error_code = None;

        for pair in fragment.trim().trim_start_matches('#').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "access_token" if !value.is_empty() => access_token = Some(value.to_string()),
                "refresh_token" if !value.is_empty() => refresh_token = Some(value.to_string()),
                "type" => kind = Some(value.to_string()),
                "error_code" => error_code = Some(value.to_string()),
                _ => {}
            }
        }

        if error_code.as_deref() == Some("otp_expired") {
            return Err(AuthError::ExpiredRecoveryToken);
        }
        if let Some(code) = error_code {
            return Err(AuthError::InvalidRecoveryToken(code));
        }
        if kind.as_deref() != Some("recovery") {
            return Err(AuthError::InvalidRecoveryToken("not a recovery link".into()));
        }

        match (access_token, refresh_token) {
            (Some(access_token), Some(refresh_token)) => Ok(Self {
                access_token,
                refresh_token,
            }),
            (None, _) => Err(AuthError::InvalidRecoveryToken("missing access_token".into())),
            (_, None) => Err(AuthError::InvalidRecoveryToken("missing refresh_token".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user_id: String },
    SignedOut,
    TokenRefreshed { user_id: String },
}

/// Session change notifications. Lagging subscribers get `RecvError::Lagged` and should re-read
/// the session.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Dropped silently when nobody listens.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Resolves a session into an [`Actor`], waiting a bounded time for each lookup.
pub struct SessionBootstrap<B> {
    backend: B,
    profile_timeout: Duration,
    role_timeout: Duration,
}

impl<B: AuthBackend> SessionBootstrap<B> {
    pub fn new(backend: B, config: &Config) -> Self {
        Self::with_timeouts(backend, config.profile_timeout, config.role_timeout)
    }

    pub fn with_timeouts(backend: B, profile_timeout: Duration, role_timeout: Duration) -> Self {
        Self {
            backend,
            profile_timeout,
            role_timeout,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn bootstrap(&self, session: &Session) -> Actor {
        let user = match timeout(self.profile_timeout, self.backend.load_profile(&session.user_id)).await {
            Ok(Ok(user)) => user,
            Ok(Err(err)) => {
                warn!(user_id = %session.user_id, error = %err, "profile lookup failed, using fallback profile");
                return Actor::without_permissions(User::fallback(&session.user_id, &session.email));
            }
            Err(_) => {
                warn!(user_id = %session.user_id, timeout = ?self.profile_timeout, "profile lookup timed out, using fallback profile");
                return Actor::without_permissions(User::fallback(&session.user_id, &session.email));
            }
        };

        match timeout(self.role_timeout, self.backend.load_role(&user.role_id)).await {
            Ok(Ok(role)) => Actor::new(user, &role),
            Ok(Err(err)) => {
                warn!(user_id = %user.id, role_id = %user.role_id, error = %err, "role lookup failed, no permissions granted");
                Actor::without_permissions(user)
            }
            Err(_) => {
                warn!(user_id = %user.id, timeout = ?self.role_timeout, "role lookup timed out, no permissions granted");
                Actor::without_permissions(user)
            }
        }
    }
}

/// Sign in, sign out and recovery, publishing session changes as they happen.
pub struct Authenticator<B> {
    bootstrap: SessionBootstrap<B>,
    events: SessionEvents,
}

impl<B: AuthBackend> Authenticator<B> {
    pub fn new(bootstrap: SessionBootstrap<B>, events: SessionEvents) -> Self {
        Self { bootstrap, events }
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Actor, AuthError> {
        let session = self.bootstrap.backend().sign_in(email.trim(), password).await?;
        let actor = self.bootstrap.bootstrap(&session).await;

        info!(user_id = %session.user_id, "signed in");
        self.events.publish(SessionEvent::SignedIn {
            user_id: session.user_id,
        });
        Ok(actor)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.bootstrap.backend().sign_out().await?;
        self.events.publish(SessionEvent::SignedOut);
        Ok(())
    }

    /// The actor behind the current session, if any.
    pub async fn current(&self) -> Result<Actor, AuthError> {
        let session = self.bootstrap.backend().get_session().await.ok_or(AuthError::NoSession)?;
        Ok(self.bootstrap.bootstrap(&session).await)
    }

    pub async fn recover(&self, fragment: &str, new_password: &str) -> Result<Actor, AuthError> {
        let token = RecoveryToken::from_fragment(fragment)?;
        let session = self.bootstrap.backend().reset_password(&token, new_password).await?;
        let actor = self.bootstrap.bootstrap(&session).await;

        info!(user_id = %session.user_id, "password reset");
        self.events.publish(SessionEvent::TokenRefreshed {
            user_id: session.user_id,
        });
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_fragment_is_parsed() {
        let token = RecoveryToken::from_fragment("#access_token=abc&expires_in=3600&refresh_token=def&type=recovery")
            .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.refresh_token, "def");
    }

    #[test]
    fn non_recovery_links_are_rejected() {
        let err = RecoveryToken::from_fragment("#access_token=abc&refresh_token=def&type=signup").unwrap_err();
        assert_eq!(err, AuthError::InvalidRecoveryToken("not a recovery link".into()));

        let err = RecoveryToken::from_fragment("#refresh_token=def&type=recovery").unwrap_err();
        assert_eq!(err, AuthError::InvalidRecoveryToken("missing access_token".into()));

        assert!(RecoveryToken::from_fragment("").is_err());
    }

    #[test]
    fn expired_links_are_reported_as_such() {
        let err = RecoveryToken::from_fragment("#error=access_denied&error_code=otp_expired&error_description=expired")
            .unwrap_err();
        assert_eq!(err, AuthError::ExpiredRecoveryToken);
    }

    #[tokio::test]
    async fn events_reach_subscribers() {
        let events = SessionEvents::default();
        let mut rx = events.subscribe();

        events.publish(SessionEvent::SignedOut);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::SignedOut);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        SessionEvents::new(0).publish(SessionEvent::SignedOut);
    }
}
