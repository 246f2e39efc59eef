use std::fmt;

use thiserror::Error;

/// Rate-limit diagnostics reported alongside a throttled write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitInfo {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// Seconds until the bucket resets.
    pub reset_after: Option<f64>,
    /// Seconds the remote asked us to wait (`retry_after`).
    pub retry_after: Option<f64>,
    pub global: bool,
    pub bucket: Option<String>,
}

impl fmt::Display for RateLimitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string())
        }

        write!(
            f,
            "limit {}, remaining {}, resets in {}s",
            opt(&self.limit),
            opt(&self.remaining),
            opt(&self.reset_after.or(self.retry_after))
        )?;
        if self.global {
            write!(f, " (global)")?;
        }
        Ok(())
    }
}

/// A rejected remote mutation, classified by the status the remote reported.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WriteError {
    #[error("throttled: {0}")]
    Throttled(RateLimitInfo),
    #[error("forbidden: {message}")]
    Forbidden { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("server error (HTTP {status})")]
    Server { status: u16 },
    #[error("HTTP {status}: {message}")]
    Unclassified { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
}

impl WriteError {
    /// Maps a non-success status to its class. `rate_limit` is only used for 429.
    pub fn from_status(status: u16, message: impl Into<String>, rate_limit: RateLimitInfo) -> Self {
        let message = message.into();
        match status {
            429 => Self::Throttled(rate_limit),
            401 | 403 => Self::Forbidden { message },
            404 => Self::NotFound { message },
            500..=599 => Self::Server { status },
            _ => Self::Unclassified { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        let rl = RateLimitInfo::default();
        assert!(matches!(
            WriteError::from_status(429, "", rl.clone()),
            WriteError::Throttled(_)
        ));
        assert!(matches!(
            WriteError::from_status(403, "Missing Permissions", rl.clone()),
            WriteError::Forbidden { .. }
        ));
        assert!(matches!(
            WriteError::from_status(404, "Unknown Channel", rl.clone()),
            WriteError::NotFound { .. }
        ));
        assert_eq!(
            WriteError::from_status(502, "", rl.clone()),
            WriteError::Server { status: 502 }
        );
        assert_eq!(
            WriteError::from_status(400, "Invalid Form Body", rl),
            WriteError::Unclassified {
                status: 400,
                message: "Invalid Form Body".into()
            }
        );
    }

    #[test]
    fn rate_limit_display_shows_known_and_unknown_fields() {
        let info = RateLimitInfo {
            limit: Some(5),
            remaining: Some(0),
            reset_after: Some(2.5),
            ..Default::default()
        };
        assert_eq!(info.to_string(), "limit 5, remaining 0, resets in 2.5s");

        let sparse = RateLimitInfo {
            retry_after: Some(1.0),
            global: true,
            ..Default::default()
        };
        assert_eq!(sparse.to_string(), "limit ?, remaining ?, resets in 1s (global)");
    }
}
