/// Middleware modules for the API server
///
/// - `rate_limit`: optional per-client token bucket
/// - `security`: security response headers
pub mod rate_limit;
pub mod security;
