use subtle::ConstantTimeEq;

/// Header carrying the shared secret on staging-write events.
pub const WEBHOOK_SECRET_HEADER: &str = "X-Webhook-Secret";

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a request's secret against the configured one.
///
/// With no secret configured every request is accepted; otherwise the
/// header must be present and match.
pub fn secret_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (None, _) => true,
        (Some(expected), Some(provided)) => constant_time_compare(expected, provided),
        (Some(_), None) => false,
    }
}
