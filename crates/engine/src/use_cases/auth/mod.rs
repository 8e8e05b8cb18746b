//! E-mail one-time-code sign-in, account linking and bearer sessions.

use std::sync::Arc;

use chrono::Duration;
use grupa_domain::{
    DomainError, Email, PendingVerification, Session, SessionId, User, UserId, UserProfile,
    VerificationCode,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::infrastructure::ports::{
    pick_index, AuthRepo, ClockPort, MailerError, MailerPort, RandomPort, RepoError, UserRepo,
};

/// Address that never receives mail; its codes only appear in the log.
pub const MOCK_EMAIL: &str = "test@gmail.com";

/// How long a sign-in code stays valid.
const CODE_TTL_MINUTES: i64 = 15;

/// Wrong guesses tolerated before a pending code is discarded.
pub const MAX_FAILED_CODE_ATTEMPTS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid or expired code")]
    InvalidCode,
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    #[error("Could not send e-mail: {0}")]
    Mail(#[from] MailerError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl From<DomainError> for AuthError {
    fn from(e: DomainError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

/// A freshly issued bearer token and the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

pub struct AuthUseCases {
    users: Arc<dyn UserRepo>,
    auth: Arc<dyn AuthRepo>,
    mailer: Arc<dyn MailerPort>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    session_ttl: Duration,
}

impl AuthUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        auth: Arc<dyn AuthRepo>,
        mailer: Arc<dyn MailerPort>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            auth,
            mailer,
            clock,
            random,
            session_ttl,
        }
    }

    /// Send a fresh sign-in code, invalidating earlier ones for the address.
    pub async fn request_code(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::new(email)?;
        let code = VerificationCode::generate(pick_index(self.random.as_ref()));

        let pending = PendingVerification {
            code_hash: code_hash(&email, code.as_str()),
            expires_at: self.clock.now() + Duration::minutes(CODE_TTL_MINUTES),
            email,
        };
        self.auth.replace_verification(&pending).await?;

        if pending.email.as_str() == MOCK_EMAIL {
            tracing::info!(email = %pending.email, code = %code, "Mock sign-in code");
            return Ok(());
        }
        self.mailer
            .send_verification_code(&pending.email, &code)
            .await?;
        tracing::info!(email = %pending.email, "Sign-in code sent");
        Ok(())
    }

    /// Consume a sign-in code and open a session.
    pub async fn verify_code(
        &self,
        email: &str,
        code: &str,
        name: Option<String>,
    ) -> Result<AuthSession, AuthError> {
        let email = Email::new(email)?;
        let code = VerificationCode::parse(code).map_err(|_| AuthError::InvalidCode)?;
        let now = self.clock.now();

        let pending = self
            .auth
            .take_verification(
                &email,
                &code_hash(&email, code.as_str()),
                MAX_FAILED_CODE_ATTEMPTS,
            )
            .await?
            .ok_or(AuthError::InvalidCode)?;
        if pending.is_expired(now) {
            tracing::debug!(email = %email, "Expired sign-in code");
            return Err(AuthError::InvalidCode);
        }

        let profile = UserProfile {
            email: Some(email),
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            image: None,
            email_verified: true,
        };
        let user_id = self.create_or_update_user(None, Some(profile)).await?;
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(AuthError::UserNotFound(user_id))?;

        let token = self.new_token();
        let session = Session {
            id: SessionId::new(),
            user_id,
            token_hash: token_hash(&token),
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.auth.save_session(&session).await?;
        tracing::info!(user_id = %user_id, "User signed in");
        Ok(AuthSession { token, user })
    }

    /// Resolve the user a sign-in belongs to.
    ///
    /// With an existing user, the profile overwrites the fields it carries.
    /// Otherwise a user with the same e-mail is linked (only missing fields
    /// are filled in), and failing that a new user is created.
    pub async fn create_or_update_user(
        &self,
        existing_user_id: Option<UserId>,
        profile: Option<UserProfile>,
    ) -> Result<UserId, AuthError> {
        let now = self.clock.now();

        if let Some(user_id) = existing_user_id {
            let mut user = self
                .users
                .get(user_id)
                .await?
                .ok_or(AuthError::UserNotFound(user_id))?;
            if let Some(profile) = profile {
                if user.apply_profile(&profile, now) {
                    self.users.save(&user).await?;
                }
            }
            return Ok(user_id);
        }

        let profile = profile
            .ok_or_else(|| AuthError::InvalidInput("A profile is required".to_string()))?;

        if let Some(email) = &profile.email {
            if let Some(mut user) = self.users.find_by_email(email).await? {
                if user.link_profile(&profile, now) {
                    self.users.save(&user).await?;
                }
                tracing::debug!(user_id = %user.id, "Linked sign-in to existing user");
                return Ok(user.id);
            }
        }

        let user = User::from_profile(profile, now);
        self.users.save(&user).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user.id)
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        let hash = token_hash(token);
        let session = self
            .auth
            .find_session(&hash)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if session.is_expired(self.clock.now()) {
            self.auth.delete_session(&hash).await?;
            return Err(AuthError::Unauthenticated);
        }
        Ok(session.user_id)
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.auth.delete_session(&token_hash(token)).await?;
        Ok(())
    }

    pub async fn current_user(&self, user_id: Option<UserId>) -> Result<Option<User>, AuthError> {
        match user_id {
            Some(id) => Ok(self.users.get(id).await?),
            None => Ok(None),
        }
    }

    fn new_token(&self) -> String {
        format!(
            "{}{}",
            self.random.gen_uuid().simple(),
            self.random.gen_uuid().simple()
        )
    }
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

fn code_hash(email: &Email, code: &str) -> String {
    sha256_hex(&format!("{}:{}", email, code))
}

fn token_hash(token: &str) -> String {
    sha256_hex(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::ports::{MockAuthRepo, MockMailerPort, MockUserRepo};
    use chrono::{DateTime, TimeZone, Utc};
    use mockall::predicate::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 4, 9, 0, 0).unwrap()
    }

    fn auth_use_cases(
        users: MockUserRepo,
        auth: MockAuthRepo,
        mailer: MockMailerPort,
    ) -> AuthUseCases {
        AuthUseCases::new(
            Arc::new(users),
            Arc::new(auth),
            Arc::new(mailer),
            Arc::new(FixedClock(now())),
            Arc::new(FixedRandom(7)),
            Duration::hours(1),
        )
    }

    fn email(raw: &str) -> Email {
        Email::new(raw).unwrap()
    }

    #[tokio::test]
    async fn request_code_stores_hash_and_sends_mail() {
        let mut auth = MockAuthRepo::new();
        auth.expect_replace_verification()
            .withf(|pending| {
                pending.email.as_str() == "ann@example.com"
                    && pending.code_hash == code_hash(&pending.email, "7777")
                    && pending.expires_at == now() + Duration::minutes(15)
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut mailer = MockMailerPort::new();
        mailer
            .expect_send_verification_code()
            .withf(|to, code| to.as_str() == "ann@example.com" && code.as_str() == "7777")
            .times(1)
            .returning(|_, _| Ok(()));

        auth_use_cases(MockUserRepo::new(), auth, mailer)
            .request_code("  Ann@Example.com ")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mock_address_is_never_mailed() {
        let mut auth = MockAuthRepo::new();
        auth.expect_replace_verification().returning(|_| Ok(()));
        let mut mailer = MockMailerPort::new();
        mailer.expect_send_verification_code().never();

        auth_use_cases(MockUserRepo::new(), auth, mailer)
            .request_code(MOCK_EMAIL)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn verify_code_creates_user_and_session() {
        let mut auth = MockAuthRepo::new();
        auth.expect_take_verification()
            .withf(|email, hash, max| {
                hash == code_hash(email, "1234") && *max == MAX_FAILED_CODE_ATTEMPTS
            })
            .returning(|email, hash, _| {
                Ok(Some(PendingVerification {
                    email: email.clone(),
                    code_hash: hash.to_string(),
                    expires_at: now() + Duration::minutes(5),
                }))
            });
        auth.expect_save_session()
            .withf(|s| s.expires_at == now() + Duration::hours(1))
            .times(1)
            .returning(|_| Ok(()));

        let saved: Arc<std::sync::Mutex<Option<User>>> = Arc::default();
        let mut users = MockUserRepo::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let sink = saved.clone();
        users.expect_save().times(1).returning(move |u| {
            *sink.lock().unwrap() = Some(u.clone());
            Ok(())
        });
        let source = saved.clone();
        users
            .expect_get()
            .returning(move |_| Ok(source.lock().unwrap().clone()));

        let session = auth_use_cases(users, auth, MockMailerPort::new())
            .verify_code("ann@example.com", "1234", Some(" Ann ".into()))
            .await
            .unwrap();
        assert_eq!(session.token.len(), 64);
        assert_eq!(session.user.name.as_deref(), Some("Ann"));
        assert_eq!(session.user.email_verification_time, Some(now()));
    }

    #[tokio::test]
    async fn verify_code_rejects_unknown_and_expired_codes() {
        let mut auth = MockAuthRepo::new();
        auth.expect_take_verification().returning(|_, _, _| Ok(None));
        let err = auth_use_cases(MockUserRepo::new(), auth, MockMailerPort::new())
            .verify_code("ann@example.com", "1234", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCode));

        let mut auth = MockAuthRepo::new();
        auth.expect_take_verification().returning(|email, hash, _| {
            Ok(Some(PendingVerification {
                email: email.clone(),
                code_hash: hash.to_string(),
                expires_at: now(),
            }))
        });
        let err = auth_use_cases(MockUserRepo::new(), auth, MockMailerPort::new())
            .verify_code("ann@example.com", "1234", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCode));
    }

    #[tokio::test]
    async fn linking_by_email_fills_only_missing_fields() {
        let existing = User {
            id: UserId::new(),
            name: Some("Original".into()),
            email: Some(email("ann@example.com")),
            image: None,
            email_verification_time: None,
            created_at: now(),
        };
        let existing_id = existing.id;
        let mut users = MockUserRepo::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        users
            .expect_save()
            .withf(|u| {
                u.name.as_deref() == Some("Original")
                    && u.image.as_deref() == Some("pic.png")
                    && u.email_verification_time == Some(now())
            })
            .times(1)
            .returning(|_| Ok(()));

        let profile = UserProfile {
            email: Some(email("ann@example.com")),
            name: Some("Other".into()),
            image: Some("pic.png".into()),
            email_verified: true,
        };
        let id = auth_use_cases(users, MockAuthRepo::new(), MockMailerPort::new())
            .create_or_update_user(None, Some(profile))
            .await
            .unwrap();
        assert_eq!(id, existing_id);
    }

    #[tokio::test]
    async fn existing_user_profile_overwrites_fields() {
        let existing = User {
            id: UserId::new(),
            name: Some("Old".into()),
            email: None,
            image: None,
            email_verification_time: None,
            created_at: now(),
        };
        let existing_id = existing.id;
        let mut users = MockUserRepo::new();
        users
            .expect_get()
            .with(eq(existing_id))
            .returning(move |_| Ok(Some(existing.clone())));
        users
            .expect_save()
            .withf(|u| u.name.as_deref() == Some("New"))
            .times(1)
            .returning(|_| Ok(()));

        let profile = UserProfile {
            name: Some("New".into()),
            ..UserProfile::default()
        };
        let id = auth_use_cases(users, MockAuthRepo::new(), MockMailerPort::new())
            .create_or_update_user(Some(existing_id), Some(profile))
            .await
            .unwrap();
        assert_eq!(id, existing_id);
    }

    #[tokio::test]
    async fn authenticate_rejects_expired_sessions() {
        let user_id = UserId::new();
        let mut auth = MockAuthRepo::new();
        auth.expect_find_session()
            .withf(|hash| hash == token_hash("tok"))
            .returning(move |hash| {
                Ok(Some(Session {
                    id: SessionId::new(),
                    user_id,
                    token_hash: hash.to_string(),
                    created_at: now() - Duration::hours(2),
                    expires_at: now() - Duration::hours(1),
                }))
            });
        auth.expect_delete_session().times(1).returning(|_| Ok(()));

        let err = auth_use_cases(MockUserRepo::new(), auth, MockMailerPort::new())
            .authenticate("tok")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[test]
    fn hashes_are_hex_sha256() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
