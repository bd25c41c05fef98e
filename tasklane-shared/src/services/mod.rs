/// Business services
///
/// - [`identity::IdentityService`]: registration, login, token → user
/// - [`tasks::TaskService`]: owner-scoped task CRUD
///
/// Both services run each operation inside a single store transaction and
/// report failures as [`AppError`]. Storage failures are logged here, where
/// the cause is still known, and surface as `DatabaseError` after the
/// transaction has been dropped (rolled back).

pub mod identity;
pub mod tasks;

use tracing::error;

use crate::db::store::StoreError;
use crate::error::AppError;

/// Logs a storage failure and converts it into `AppError::Database`
pub(crate) fn storage_error(context: &str, err: StoreError) -> AppError {
    error!(error = %err, "{}", context);
    AppError::database(context, err)
}

/// Shorthand for `map_err(|e| storage_error(context, e))`
pub(crate) trait StoreResultExt<T> {
    fn or_db(self, context: &str) -> Result<T, AppError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn or_db(self, context: &str) -> Result<T, AppError> {
        self.map_err(|e| storage_error(context, e))
    }
}
