//! Session bootstrap against a scripted identity backend.
//!
//! Delays are real but short, so the timeout paths are exercised without a paused clock.
use std::time::Duration;

use grant_ledger::auth::{AuthBackend, Authenticator, RecoveryToken, Session, SessionBootstrap, SessionEvent, SessionEvents};
use grant_ledger::error::AuthError;
use grant_ledger::permission::{Permission, actions, modules};
use grant_ledger::user::{ACCOUNTANT, Profession, Role, User, UserProfile};
use tokio::time::sleep;

const FAST: Duration = Duration::from_millis(5);
const SLOW: Duration = Duration::from_millis(300);
const BUDGET: Duration = Duration::from_millis(100);

struct ScriptedBackend {
    profile_delay: Duration,
    role_delay: Duration,
    role_missing: bool,
    signed_in: bool,
}

impl ScriptedBackend {
    fn responsive() -> Self {
        Self {
            profile_delay: FAST,
            role_delay: FAST,
            role_missing: false,
            signed_in: true,
        }
    }

    fn user() -> User {
        let profile = UserProfile {
            first_name: "Ibrahim".into(),
            last_name: "Sow".into(),
            profession: ACCOUNTANT.into(),
            employee_id: None,
        };
        let mut user = User::new("ibrahim@example.org", profile, "role_finance");
        user.id = "user_ibrahim".into();
        user
    }

    fn role() -> Role {
        let mut role = Role::new(
            "Finance",
            "FIN",
            vec![Permission::new(modules::PAYMENTS, [actions::VIEW, actions::SIGN])],
        );
        role.id = "role_finance".into();
        role
    }

    fn session() -> Session {
        Session {
            user_id: "user_ibrahim".into(),
            email: "ibrahim@example.org".into(),
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: None,
        }
    }
}

impl AuthBackend for ScriptedBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email != "ibrahim@example.org" || password != "correct horse" {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Self::session())
    }

    async fn sign_up(&self, _email: &str, _password: &str, _profile: &UserProfile) -> Result<Session, AuthError> {
        Err(AuthError::Backend("sign up disabled".into()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn get_session(&self) -> Option<Session> {
        self.signed_in.then(Self::session)
    }

    async fn load_profile(&self, user_id: &str) -> Result<User, AuthError> {
        sleep(self.profile_delay).await;
        if user_id != "user_ibrahim" {
            return Err(AuthError::Backend(format!("no profile for {user_id}")));
        }
        Ok(Self::user())
    }

    async fn load_role(&self, _role_id: &str) -> Result<Role, AuthError> {
        sleep(self.role_delay).await;
        if self.role_missing {
            return Err(AuthError::Backend("role not found".into()));
        }
        Ok(Self::role())
    }

    async fn reset_password(&self, token: &RecoveryToken, new_password: &str) -> Result<Session, AuthError> {
        if token.access_token != "abc" || new_password.len() < 8 {
            return Err(AuthError::InvalidRecoveryToken("rejected".into()));
        }
        Ok(Self::session())
    }
}

fn bootstrap(backend: ScriptedBackend) -> SessionBootstrap<ScriptedBackend> {
    SessionBootstrap::with_timeouts(backend, BUDGET, BUDGET)
}

#[tokio::test]
async fn responsive_backend_resolves_the_role() {
    let actor = bootstrap(ScriptedBackend::responsive())
        .bootstrap(&ScriptedBackend::session())
        .await;

    assert_eq!(actor.profession(), Profession::Accountant);
    assert!(actor.can(modules::PAYMENTS, actions::SIGN));
}

#[tokio::test]
async fn slow_profile_falls_back_without_permissions() {
    let backend = ScriptedBackend {
        profile_delay: SLOW,
        ..ScriptedBackend::responsive()
    };

    let actor = bootstrap(backend).bootstrap(&ScriptedBackend::session()).await;

    assert_eq!(actor.id(), "user_ibrahim");
    assert_eq!(actor.user.full_name(), "ibrahim@example.org");
    assert!(actor.permissions().accessible_modules().is_empty());
    assert!(matches!(actor.profession(), Profession::Other(_)));
}

#[tokio::test]
async fn slow_role_keeps_the_profile_but_grants_nothing() {
    let backend = ScriptedBackend {
        role_delay: SLOW,
        ..ScriptedBackend::responsive()
    };

    let actor = bootstrap(backend).bootstrap(&ScriptedBackend::session()).await;

    assert_eq!(actor.profession(), Profession::Accountant);
    assert!(!actor.can(modules::PAYMENTS, actions::VIEW));
}

#[tokio::test]
async fn missing_role_grants_nothing() {
    let backend = ScriptedBackend {
        role_missing: true,
        ..ScriptedBackend::responsive()
    };

    let actor = bootstrap(backend).bootstrap(&ScriptedBackend::session()).await;
    assert!(!actor.can(modules::PAYMENTS, actions::SIGN));
}

#[tokio::test]
async fn sign_in_publishes_an_event() {
    let auth = Authenticator::new(bootstrap(ScriptedBackend::responsive()), SessionEvents::default());
    let mut events = auth.events().subscribe();

    let actor = auth.sign_in(" ibrahim@example.org ", "correct horse").await.unwrap();
    assert_eq!(actor.user.full_name(), "Ibrahim Sow");
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::SignedIn {
            user_id: "user_ibrahim".into()
        }
    );

    auth.sign_out().await.unwrap();
    assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedOut);
}

#[tokio::test]
async fn bad_credentials_publish_nothing() {
    let auth = Authenticator::new(bootstrap(ScriptedBackend::responsive()), SessionEvents::default());
    let mut events = auth.events().subscribe();

    let err = auth.sign_in("ibrahim@example.org", "wrong").await.unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn current_needs_a_session() {
    let backend = ScriptedBackend {
        signed_in: false,
        ..ScriptedBackend::responsive()
    };
    let auth = Authenticator::new(bootstrap(backend), SessionEvents::default());

    assert_eq!(auth.current().await.unwrap_err(), AuthError::NoSession);
}

#[tokio::test]
async fn recovery_link_resets_the_password() {
    let auth = Authenticator::new(bootstrap(ScriptedBackend::responsive()), SessionEvents::default());

    let actor = auth
        .recover("#access_token=abc&refresh_token=def&type=recovery", "new password")
        .await
        .unwrap();
    assert_eq!(actor.id(), "user_ibrahim");

    let err = auth
        .recover("#error=access_denied&error_code=otp_expired", "new password")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::ExpiredRecoveryToken);
}
