/// Rate limiting middleware
///
/// Optional per-client request budget, off unless `RATELIMIT_ENABLED=true`.
/// Clients are keyed by remote IP address; requests without connection info
/// (tests, in-process callers) share one bucket.
///
/// # Algorithm
///
/// Token bucket per client:
/// - Bucket holds at most `requests` tokens and starts full
/// - Tokens refill continuously at `requests / period`
/// - Each request consumes 1 token
/// - Request rejected with 429 if the bucket is empty
///
/// State lives in process memory and is lost on restart.
///
/// # Headers
///
/// - `X-RateLimit-Limit`: Requests allowed per period
/// - `X-RateLimit-Remaining`: Tokens left after this request
/// - `Retry-After`: Seconds to wait (429 responses only)
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, Router};
/// use tasklane_api::middleware::rate_limit::{rate_limit, RateLimiter, RateRule};
///
/// let limiter = RateLimiter::new("100 per hour".parse::<RateRule>().unwrap());
/// let app: Router = Router::new()
///     .layer(middleware::from_fn_with_state(limiter, rate_limit));
/// ```

use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    net::SocketAddr,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};
use tasklane_shared::error::AppError;
use tokio::time::Instant;

/// Buckets kept before full ones are evicted
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Key shared by requests that carry no remote address
const UNKNOWN_CLIENT: &str = "unknown";

/// Request budget, written as `"<n> per <unit>"`
///
/// Units: `second`, `minute`, `hour`, `day` (plural forms accepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRule {
    /// Requests allowed per period
    pub requests: u32,

    /// Period length in seconds
    pub period_seconds: u64,
}

impl Default for RateRule {
    fn default() -> Self {
        Self {
            requests: 100,
            period_seconds: 3600,
        }
    }
}

impl FromStr for RateRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();

        let [count, "per", unit] = parts.as_slice() else {
            return Err(format!("expected \"<n> per <unit>\", got \"{}\"", s));
        };

        let requests: u32 = count
            .parse()
            .map_err(|e| format!("invalid request count \"{}\": {}", count, e))?;
        if requests == 0 {
            return Err("request count must be positive".to_string());
        }

        let period_seconds = match unit.to_ascii_lowercase().trim_end_matches('s') {
            "second" => 1,
            "minute" => 60,
            "hour" => 3600,
            "day" => 86400,
            other => return Err(format!("unknown period \"{}\"", other)),
        };

        Ok(Self {
            requests,
            period_seconds,
        })
    }
}

impl fmt::Display for RateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.period_seconds {
            1 => "second",
            60 => "minute",
            3600 => "hour",
            86400 => "day",
            _ => return write!(f, "{} per {} seconds", self.requests, self.period_seconds),
        };
        write!(f, "{} per {}", self.requests, unit)
    }
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: capacity as f64,
            last_refill: now,
        }
    }

    fn refill(&mut self, rule: &RateRule, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        let refilled = elapsed * rule.requests as f64 / rule.period_seconds as f64;
        self.tokens = (self.tokens + refilled).min(rule.requests as f64);
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn seconds_until_available(&self, rule: &RateRule) -> u64 {
        let deficit = 1.0 - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            (deficit * rule.period_seconds as f64 / rule.requests as f64).ceil() as u64
        }
    }

    fn is_full(&self, rule: &RateRule) -> bool {
        self.tokens >= rule.requests as f64
    }
}

/// Outcome of one budget check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: u64 },
}

/// In-memory per-client limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    rule: RateRule,
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(rule: RateRule) -> Self {
        Self {
            rule,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn rule(&self) -> RateRule {
        self.rule
    }

    /// Consumes one token from `client`'s bucket
    pub fn check(&self, client: &str) -> Decision {
        let now = Instant::now();
        let rule = &self.rule;
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

        if buckets.len() >= MAX_TRACKED_CLIENTS && !buckets.contains_key(client) {
            buckets.retain(|_, bucket| {
                bucket.refill(rule, now);
                !bucket.is_full(rule)
            });
        }

        let bucket = buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::new(rule.requests, now));
        bucket.refill(rule, now);

        if bucket.try_consume() {
            Decision::Allowed {
                remaining: bucket.tokens.floor() as u32,
            }
        } else {
            Decision::Limited {
                retry_after: bucket.seconds_until_available(rule).max(1),
            }
        }
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware function; install with `axum::middleware::from_fn_with_state`
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    let limit = HeaderValue::from(limiter.rule().requests);

    match limiter.check(&client) {
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", limit);
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        Decision::Limited { retry_after } => {
            tracing::warn!(client = %client, retry_after, "Rate limit exceeded");

            let mut response = ApiError::from(AppError::rate_limited(retry_after)).into_response();
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", limit);
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn rule(requests: u32, period_seconds: u64) -> RateRule {
        RateRule {
            requests,
            period_seconds,
        }
    }

    #[test]
    fn test_parse_rule() {
        assert_eq!("100 per hour".parse::<RateRule>().unwrap(), rule(100, 3600));
        assert_eq!("5 per second".parse::<RateRule>().unwrap(), rule(5, 1));
        assert_eq!("10 per Minutes".parse::<RateRule>().unwrap(), rule(10, 60));
        assert_eq!("1 per day".parse::<RateRule>().unwrap(), rule(1, 86400));
    }

    #[test]
    fn test_parse_rule_rejects_garbage() {
        assert!("100/hour".parse::<RateRule>().is_err());
        assert!("0 per hour".parse::<RateRule>().is_err());
        assert!("ten per hour".parse::<RateRule>().is_err());
        assert!("10 per fortnight".parse::<RateRule>().is_err());
    }

    #[test]
    fn test_display_round_trips_default() {
        let default = RateRule::default();
        assert_eq!(default.to_string(), "100 per hour");
        assert_eq!(default.to_string().parse::<RateRule>().unwrap(), default);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_is_per_client() {
        let limiter = RateLimiter::new(rule(2, 60));

        assert_eq!(limiter.check("a"), Decision::Allowed { remaining: 1 });
        assert_eq!(limiter.check("a"), Decision::Allowed { remaining: 0 });
        assert_eq!(limiter.check("a"), Decision::Limited { retry_after: 30 });

        assert_eq!(limiter.check("b"), Decision::Allowed { remaining: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_refill_over_time() {
        let limiter = RateLimiter::new(rule(2, 60));
        limiter.check("a");
        limiter.check("a");
        assert!(matches!(limiter.check("a"), Decision::Limited { .. }));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(limiter.check("a"), Decision::Allowed { remaining: 0 });

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(limiter.check("a"), Decision::Allowed { remaining: 1 });
    }

    #[tokio::test]
    async fn test_token_bucket_refill_capped() {
        let start = Instant::now();
        let rule = rule(10, 10);
        let mut bucket = TokenBucket {
            tokens: 9.0,
            last_refill: start,
        };

        bucket.refill(&rule, start + Duration::from_secs(100));
        assert_eq!(bucket.tokens, 10.0);
        assert!(bucket.is_full(&rule));
    }
}
