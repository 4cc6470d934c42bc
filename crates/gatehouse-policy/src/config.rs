//! Policy configuration.

/// Configuration for the policy engine. Threaded into the gates and
/// services at construction, never read from ambient state.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Idle time after which a session is destroyed
    /// (default: 1_800_000 = 30 minutes).
    pub idle_timeout_ms: u64,
    /// Default invitation lifetime when the issuer gives no explicit
    /// TTL (default: 604_800 = 7 days).
    pub invitation_ttl_secs: u64,
    /// Minimum password length accepted when an invitation is
    /// redeemed (default: 12).
    pub min_password_length: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 1_800_000,
            invitation_ttl_secs: 604_800,
            min_password_length: 12,
        }
    }
}
