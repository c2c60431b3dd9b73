//! Temporary access credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A short-lived access credential: key pair, optional security token and expiration.
///
/// Values handed out by an [`Updater`](crate::Updater) are independent copies;
/// mutating one never changes what the cache serves.
///
/// The key secret and security token are zeroized on drop, and redacted in the
/// `Debug` output.
///
/// Field names follow the STS / instance metadata JSON shape, so a fetcher can
/// deserialize a response body directly:
///
/// ```rust
/// use credential_updater::Credentials;
///
/// let body = r#"{
///     "AccessKeyId": "STS.id",
///     "AccessKeySecret": "secret",
///     "SecurityToken": "token",
///     "Expiration": "2024-01-01T00:00:00Z"
/// }"#;
/// let credentials: Credentials = serde_json::from_str(body).unwrap();
/// assert_eq!(credentials.access_key_id, "STS.id");
/// ```
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    /// Access key id.
    pub access_key_id: String,
    /// Access key secret.
    pub access_key_secret: String,
    /// Security token, present for temporary (STS) credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_token: Option<String>,
    /// Point in time after which the credential is no longer valid.
    #[serde(with = "time::serde::rfc3339")]
    #[zeroize(skip)]
    pub expiration: OffsetDateTime,
}

impl Credentials {
    /// Creates a new credential.
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        security_token: Option<String>,
        expiration: OffsetDateTime,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            security_token,
            expiration,
        }
    }

    /// Returns `true` if the credential is expired as of `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expiration
    }

    /// Returns the expiration formatted as RFC 3339.
    pub(crate) fn expiration_rfc3339(&self) -> String {
        format_timestamp(self.expiration)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Converts a timestamp to UTC and drops its sub-second part.
///
/// Stored expirations are normalized this way before any window is applied.
pub(crate) fn normalize_expiration(ts: OffsetDateTime) -> OffsetDateTime {
    let utc = ts.to_offset(UtcOffset::UTC);
    utc.replace_nanosecond(0).unwrap_or(utc)
}

pub(crate) fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn sample() -> Credentials {
        Credentials::new(
            "id",
            "secret",
            Some("token".to_string()),
            OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        )
    }

    #[test]
    fn test_debug_redacts_secret_material() {
        let output = format!("{:?}", sample());
        assert!(output.contains("id"));
        assert!(!output.contains("secret\""));
        assert!(!output.contains("token\""));
        assert!(output.contains("<redacted>"));
    }

    #[test]
    fn test_is_expired_at_boundary() {
        let credentials = sample();
        let exp = credentials.expiration;
        assert!(!credentials.is_expired_at(exp - Duration::seconds(1)));
        assert!(credentials.is_expired_at(exp));
        assert!(credentials.is_expired_at(exp + Duration::seconds(1)));
    }

    #[test]
    fn test_normalize_expiration_strips_subseconds_and_offset() {
        let ts = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
            + Duration::milliseconds(750);
        let shifted = ts.to_offset(UtcOffset::from_hms(8, 0, 0).unwrap());

        let normalized = normalize_expiration(shifted);
        assert_eq!(normalized.offset(), UtcOffset::UTC);
        assert_eq!(normalized.nanosecond(), 0);
        assert_eq!(normalized.unix_timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_deserialize_without_security_token() {
        let body = r#"{
            "AccessKeyId": "LTAI.id",
            "AccessKeySecret": "secret",
            "Expiration": "2024-01-01T00:00:00Z"
        }"#;
        let credentials: Credentials = serde_json::from_str(body).unwrap();
        assert_eq!(credentials.access_key_id, "LTAI.id");
        assert_eq!(credentials.security_token, None);
        assert_eq!(credentials.expiration.unix_timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_serialize_uses_pascal_case_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["AccessKeyId"], "id");
        assert_eq!(json["SecurityToken"], "token");
        assert_eq!(json["Expiration"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        copy.access_key_id.push_str("-mutated");
        assert_eq!(original.access_key_id, "id");
    }
}
