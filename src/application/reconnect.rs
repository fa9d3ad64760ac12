// Reconnect policy for dropped observation streams
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReconnectPolicy {
    /// A dropped stream stays down until the endpoint changes.
    #[default]
    Never,

    /// Exponential backoff, capped at `max_ms`, giving up after `max_attempts`.
    Exponential {
        base_ms: u64,
        max_ms: u64,
        max_attempts: usize,
    },
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (zero based), `None` to give up.
    pub fn delay_for(&self, attempt: usize) -> Option<Duration> {
        match self {
            ReconnectPolicy::Never => None,
            ReconnectPolicy::Exponential {
                base_ms,
                max_ms,
                max_attempts,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let factor = 1u64.checked_shl(attempt as u32).unwrap_or(u64::MAX);
                let delay_ms = base_ms.saturating_mul(factor).min(*max_ms);
                Some(Duration::from_millis(delay_ms))
            }
        }
    }
}
