//! Decoded claims of the issued bearer token. The token is a compact JWS;
//! only the claims segment is read here and the signature is left to the
//! server. The client never trusts these claims for enforcement, it only
//! derives display state from them.

use crate::app_lib::AppError;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

/// Expiry stamp as the server may encode it: epoch seconds, epoch
/// milliseconds, or an ISO-8601 string. Integer magnitude below 10^12
/// distinguishes seconds from milliseconds.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExpiryStamp {
    Epoch(i64),
    Text(String),
}

impl ExpiryStamp {
    /// Normalizes the stamp to epoch milliseconds, `None` when unparseable.
    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            ExpiryStamp::Epoch(value) => {
                if value.abs() < 1_000_000_000_000 {
                    Some(value.checked_mul(1000)?)
                } else {
                    Some(*value)
                }
            }
            ExpiryStamp::Text(value) => chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|stamp| stamp.timestamp_millis()),
        }
    }
}

/// What the session credential may be used for.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum UatPurpose {
    ReadOnly,
    ReadWrite { expiry: Option<ExpiryStamp> },
}

/// The claims this client cares about.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Uat {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub displayname: Option<String>,
    pub purpose: UatPurpose,
}

/// Decodes the claims segment of a compact JWS bearer token.
pub fn decode_bearer(token: &str) -> Result<Uat, AppError> {
    let claims = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AppError::Parse("Malformed bearer token".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(claims)
        .map_err(|e| AppError::Parse(format!("Bearer claims are not base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::Parse(format!("Bearer claims are not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::{ExpiryStamp, Uat, UatPurpose, decode_bearer};
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::json;

    fn bearer_with_claims(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn readonly_purpose_parses_from_unit_tag() {
        let uat: Uat = serde_json::from_value(json!({
            "uuid": "00000000-0000-0000-0000-000000000001",
            "name": "alice",
            "purpose": "readonly"
        }))
        .expect("deserialize");
        assert_eq!(uat.purpose, UatPurpose::ReadOnly);
    }

    #[test]
    fn readwrite_purpose_accepts_all_expiry_encodings() {
        for (expiry, millis) in [
            (json!(1_700_000_000), Some(1_700_000_000_000)),
            (json!(1_700_000_000_000_i64), Some(1_700_000_000_000)),
            (json!("2023-11-14T22:13:20Z"), Some(1_700_000_000_000)),
            (json!("not a timestamp"), None),
        ] {
            let uat: Uat = serde_json::from_value(json!({
                "uuid": "00000000-0000-0000-0000-000000000001",
                "purpose": {"readwrite": {"expiry": expiry}}
            }))
            .expect("deserialize");
            match uat.purpose {
                UatPurpose::ReadWrite {
                    expiry: Some(stamp),
                } => assert_eq!(stamp.epoch_millis(), millis),
                other => panic!("expected readwrite with expiry, got {other:?}"),
            }
        }
    }

    #[test]
    fn decode_bearer_reads_the_claims_segment() {
        let token = bearer_with_claims(json!({
            "uuid": "00000000-0000-0000-0000-000000000001",
            "displayname": "Alice Example",
            "purpose": {"readwrite": {"expiry": 1_700_000_000}}
        }));
        let uat = decode_bearer(&token).expect("decode");
        assert_eq!(uat.displayname.as_deref(), Some("Alice Example"));
        assert!(matches!(uat.purpose, UatPurpose::ReadWrite { .. }));
    }

    #[test]
    fn decode_bearer_rejects_malformed_tokens() {
        assert!(decode_bearer("no-dots-here").is_err());
        assert!(decode_bearer("a.!!!.c").is_err());
    }

    #[test]
    fn expiry_stamp_distinguishes_seconds_from_millis_by_magnitude() {
        assert_eq!(
            ExpiryStamp::Epoch(999_999_999_999).epoch_millis(),
            Some(999_999_999_999_000)
        );
        assert_eq!(
            ExpiryStamp::Epoch(1_000_000_000_000).epoch_millis(),
            Some(1_000_000_000_000)
        );
    }
}
