use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Tokens this close to expiry are treated as expired.
pub const REFRESH_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// `None` when the identity provider did not say; such a token is kept
    /// until it is invalidated.
    pub expires_at: Option<NaiveDateTime>,
}

impl AccessToken {
    pub fn is_fresh(&self, now: NaiveDateTime) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now + Duration::seconds(REFRESH_SKEW_SECONDS),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn token(expires_at: Option<NaiveDateTime>) -> AccessToken {
        AccessToken {
            access_token: "abc".to_string(),
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_fresh_until_skew() {
        let t = token(Some(dt("2025-06-16 10:00:00")));
        assert!(t.is_fresh(dt("2025-06-16 09:58:00")));
        assert!(!t.is_fresh(dt("2025-06-16 09:59:00")));
        assert!(!t.is_fresh(dt("2025-06-16 10:30:00")));
    }

    #[test]
    fn test_no_expiry_is_always_fresh() {
        assert!(token(None).is_fresh(dt("2099-01-01 00:00:00")));
    }
}
