/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Bearer token issuance and verification
/// - [`bearer`]: `Authorization` header parsing
///
/// # Example
///
/// ```
/// use tasklane_shared::auth::password::{hash_password, verify_password, HashParams};
/// use tasklane_shared::auth::jwt::TokenService;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password", &HashParams::default())?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = TokenService::new("your-secret-key-at-least-32-bytes!", Duration::minutes(30));
/// let token = tokens.issue(1)?;
/// assert_eq!(tokens.verify(&token)?.user_id()?, 1);
/// # Ok(())
/// # }
/// ```

pub mod bearer;
pub mod jwt;
pub mod password;
