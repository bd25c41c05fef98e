/// Identity service
///
/// Registers users, authenticates them with username and password, and turns
/// a bearer token back into the [`User`] it was issued for.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::Duration;
/// use tasklane_shared::auth::{jwt::TokenService, password::HashParams};
/// use tasklane_shared::db::memory::MemoryStore;
/// use tasklane_shared::services::identity::IdentityService;
/// use tasklane_shared::validation::{Credentials, Registration};
///
/// # async fn example() -> Result<(), tasklane_shared::error::AppError> {
/// let identity = IdentityService::new(
///     Arc::new(MemoryStore::new()),
///     TokenService::new("a-secret-that-is-at-least-32-bytes!", Duration::minutes(30)),
///     HashParams::default(),
/// );
///
/// identity
///     .register(Registration {
///         username: "alice".to_string(),
///         email: "alice@x.com".to_string(),
///         password: "pw123456".to_string(),
///     })
///     .await?;
///
/// let session = identity
///     .authenticate(Credentials {
///         username: "alice".to_string(),
///         password: "pw123456".to_string(),
///     })
///     .await?;
///
/// let user = identity.resolve_identity(&session.access_token).await?;
/// assert_eq!(user.username, "alice");
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use super::{storage_error, StoreResultExt};
use crate::auth::{
    bearer::AuthError,
    jwt::TokenService,
    password::{self, HashParams},
};
use crate::db::store::{Store, StoreError};
use crate::error::{AppError, AppResult};
use crate::models::user::{CreateUser, User, UserView};
use crate::validation::{Credentials, Registration};

/// Message for every failed login, whatever the cause
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Token type reported to clients
pub const TOKEN_TYPE: &str = "bearer";

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub user: UserView,
}

const DUMMY_PASSWORD: &str = "tasklane-unknown-user";

/// Registration, login and token resolution
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    hash_params: HashParams,
    dummy_hash: Arc<OnceCell<String>>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, hash_params: HashParams) -> Self {
        Self {
            store,
            tokens,
            hash_params,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates an account
    ///
    /// The password is hashed before the transaction opens. The username
    /// check runs before the email check, so a request that collides on both
    /// reports the username. The unique constraints in the store back both
    /// checks up against concurrent registrations.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the username or email is taken
    /// - `Database` if the store fails; nothing is persisted
    pub async fn register(&self, registration: Registration) -> AppResult<UserView> {
        let Registration {
            username,
            email,
            password,
        } = registration;

        let password_hash = self.hash(password).await?;

        let mut tx = self.store.begin().await.or_db("Failed to create user")?;

        if tx
            .find_user_by_username(&username)
            .await
            .or_db("Failed to create user")?
            .is_some()
        {
            debug!(username = %username, "Registration rejected: username taken");
            return Err(AppError::already_exists("Username").with_detail("field", "username"));
        }

        if tx
            .find_user_by_email(&email)
            .await
            .or_db("Failed to create user")?
            .is_some()
        {
            debug!("Registration rejected: email taken");
            return Err(AppError::already_exists("Email").with_detail("field", "email"));
        }

        let user = tx
            .insert_user(CreateUser {
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation { field } => duplicate(&field),
                other => storage_error("Failed to create user", other),
            })?;

        tx.commit().await.or_db("Failed to create user")?;

        info!(user_id = user.id, "User registered");
        Ok(UserView::from(user))
    }

    /// Checks a username and password and issues an access token
    ///
    /// # Errors
    ///
    /// `Authentication` with the same message whether the user is unknown or
    /// the password is wrong
    pub async fn authenticate(&self, credentials: Credentials) -> AppResult<Session> {
        let user = {
            let mut tx = self.store.begin().await.or_db("Failed to load user")?;
            tx.find_user_by_username(&credentials.username)
                .await
                .or_db("Failed to load user")?
        };

        let Some(user) = user else {
            // Same argon2 work as a wrong password
            let dummy = self.dummy_hash().await?;
            self.verify(credentials.password, dummy).await?;

            debug!("Login rejected: unknown username");
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        };

        if !self.verify(credentials.password, user.password_hash.clone()).await? {
            debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        }

        let access_token = self.tokens.issue(user.id).map_err(|e| {
            error!(error = %e, "Failed to issue access token");
            AppError::internal()
        })?;

        info!(user_id = user.id, "User logged in");

        Ok(Session {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            user: UserView::from(user),
        })
    }

    /// Resolves a bearer token to the user it was issued for
    ///
    /// # Errors
    ///
    /// - `Authentication` if the token is invalid or expired
    /// - `NotFound` if the user no longer exists
    pub async fn resolve_identity(&self, token: &str) -> AppResult<User> {
        let claims = self.tokens.verify(token).map_err(AuthError::from)?;
        let user_id = claims.user_id().map_err(AuthError::from)?;

        let mut tx = self.store.begin().await.or_db("Failed to load user")?;
        let user = tx
            .find_user_by_id(user_id)
            .await
            .or_db("Failed to load user")?;

        user.ok_or_else(|| AppError::not_found("User").with_detail("user_id", user_id))
    }

    /// Digest verified against when the username is unknown
    ///
    /// Built once with the configured cost so a miss takes as long as a
    /// wrong password.
    async fn dummy_hash(&self) -> AppResult<String> {
        self.dummy_hash
            .get_or_try_init(|| self.hash(DUMMY_PASSWORD.to_string()))
            .await
            .cloned()
    }

    async fn hash(&self, password: String) -> AppResult<String> {
        let params = self.hash_params;

        tokio::task::spawn_blocking(move || password::hash_password(&password, &params))
            .await
            .map_err(|e| {
                error!(error = %e, "Password hashing task failed");
                AppError::internal()
            })?
            .map_err(|e| {
                error!(error = %e, "Password hashing failed");
                AppError::internal()
            })
    }

    async fn verify(&self, password: String, hash: String) -> AppResult<bool> {
        tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .map_err(|e| {
                error!(error = %e, "Password verification task failed");
                AppError::internal()
            })?
            .map_err(|e| {
                error!(error = %e, "Password verification failed");
                AppError::internal()
            })
    }
}

fn duplicate(field: &str) -> AppError {
    let resource = match field {
        "email" => "Email",
        _ => "Username",
    };
    AppError::already_exists(resource).with_detail("field", field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_the_field() {
        let err = duplicate("email");
        assert_eq!(err.message(), "Email already exists");
        assert_eq!(err.details()["field"], "email");

        let err = duplicate("username");
        assert_eq!(err.message(), "Username already exists");
    }

    #[tokio::test]
    async fn test_dummy_hash_is_built_once_and_never_matches() {
        let service = IdentityService::new(
            Arc::new(crate::db::memory::MemoryStore::new()),
            TokenService::new("a-secret-that-is-at-least-32-bytes!", chrono::Duration::minutes(30)),
            HashParams {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
        );

        let first = service.dummy_hash().await.unwrap();
        let second = service.clone().dummy_hash().await.unwrap();

        assert_eq!(first, second);
        assert!(first.contains("m=1024,t=1,p=1"));
        assert!(!service.verify("pw123456".to_string(), first).await.unwrap());
    }

    #[test]
    fn test_session_serializes_token_type() {
        let session = Session {
            access_token: "t".to_string(),
            token_type: TOKEN_TYPE.to_string(),
            user: UserView {
                id: 1,
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                created_at: chrono::Utc::now(),
            },
        };

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["user"]["username"], "alice");
    }
}
