//! Wire types for the credential-update protocol: the intent payloads the
//! client may send and the status snapshot every response carries.

use crate::features::{credential_update::totp::TotpSecret, me::types::PasskeyDetail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One intent sent to the update endpoint. Tuple payloads serialize as
/// arrays, e.g. `{"totpverify": [123456, "phone"]}`.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CURequest {
    PrimaryRemove,
    Password(String),
    TotpGenerate,
    TotpVerify(u32, String),
    TotpAcceptSha1,
    CancelMfaReg,
    PasskeyInit,
    PasskeyFinish(String, Value),
    PasskeyRemove(String),
}

/// Opaque server-held session for one credential-update negotiation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CUSessionToken {
    pub token: String,
}

/// Outstanding conditions the server wants resolved before commit.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub enum CURegWarning {
    MfaRequired,
    PasskeyRequired,
    Unsatisfiable,
}

/// In-progress sub-enrollment, as reported by the server.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub enum CURegState {
    #[default]
    None,
    TotpCheck(TotpSecret),
    TotpTryAgain,
    TotpInvalidSha1,
    TotpNameTryAgain(String),
    Passkey(Value),
}

/// Descriptor of the primary credential.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CredentialDetail {
    pub uuid: String,
    #[serde(rename = "type_")]
    pub detail: CredentialDetailType,
}

/// Shape of the primary credential. The MFA composite carries the TOTP
/// labels, security-key labels, and remaining backup codes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub enum CredentialDetailType {
    Password,
    GeneratedPassword,
    Passkey(Vec<String>),
    PasswordMfa(Vec<String>, Vec<String>, usize),
}

/// Full status snapshot; every successful intent exchange replaces the
/// previous one. Failed exchanges leave the previous snapshot authoritative.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CUStatus {
    #[serde(default)]
    pub displayname: String,
    pub can_commit: bool,
    #[serde(default)]
    pub primary: Option<CredentialDetail>,
    #[serde(default)]
    pub passkeys: Vec<PasskeyDetail>,
    #[serde(default)]
    pub warnings: Vec<CURegWarning>,
    #[serde(default)]
    pub mfaregstate: CURegState,
}

impl CUStatus {
    /// True when the primary credential contains a password in any form.
    pub fn has_password(&self) -> bool {
        matches!(
            self.primary.as_ref().map(|detail| &detail.detail),
            Some(
                CredentialDetailType::Password
                    | CredentialDetailType::GeneratedPassword
                    | CredentialDetailType::PasswordMfa(..)
            )
        )
    }

    /// TOTP labels of the MFA composite, empty for every other shape.
    pub fn totp_labels(&self) -> &[String] {
        match self.primary.as_ref().map(|detail| &detail.detail) {
            Some(CredentialDetailType::PasswordMfa(labels, _, _)) => labels,
            _ => &[],
        }
    }

    pub fn has_warning(&self, warning: &CURegWarning) -> bool {
        self.warnings.contains(warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intents_serialize_to_their_lowercase_tags() {
        assert_eq!(
            serde_json::to_value(&CURequest::PrimaryRemove).expect("serialize"),
            json!("primaryremove")
        );
        assert_eq!(
            serde_json::to_value(&CURequest::Password("Abc123!!".to_string()))
                .expect("serialize"),
            json!({"password": "Abc123!!"})
        );
        assert_eq!(
            serde_json::to_value(&CURequest::TotpGenerate).expect("serialize"),
            json!("totpgenerate")
        );
        assert_eq!(
            serde_json::to_value(&CURequest::TotpVerify(123_456, "phone".to_string()))
                .expect("serialize"),
            json!({"totpverify": [123_456, "phone"]})
        );
        assert_eq!(
            serde_json::to_value(&CURequest::TotpAcceptSha1).expect("serialize"),
            json!("totpacceptsha1")
        );
        assert_eq!(
            serde_json::to_value(&CURequest::CancelMfaReg).expect("serialize"),
            json!("cancelmfareg")
        );
        assert_eq!(
            serde_json::to_value(&CURequest::PasskeyInit).expect("serialize"),
            json!("passkeyinit")
        );
        assert_eq!(
            serde_json::to_value(&CURequest::PasskeyFinish(
                "laptop".to_string(),
                json!({"id": "abc"})
            ))
            .expect("serialize"),
            json!({"passkeyfinish": ["laptop", {"id": "abc"}]})
        );
        assert_eq!(
            serde_json::to_value(&CURequest::PasskeyRemove(
                "11111111-0000-0000-0000-000000000001".to_string()
            ))
            .expect("serialize"),
            json!({"passkeyremove": "11111111-0000-0000-0000-000000000001"})
        );
    }

    #[test]
    fn status_parses_registration_states() {
        let status: CUStatus = serde_json::from_value(json!({
            "displayname": "Alice Example",
            "can_commit": false,
            "primary": null,
            "passkeys": [],
            "warnings": ["MfaRequired"],
            "mfaregstate": "TotpTryAgain"
        }))
        .expect("deserialize");
        assert_eq!(status.mfaregstate, CURegState::TotpTryAgain);
        assert!(status.has_warning(&CURegWarning::MfaRequired));

        let status: CUStatus = serde_json::from_value(json!({
            "can_commit": true,
            "mfaregstate": {"TotpNameTryAgain": "phone"}
        }))
        .expect("deserialize");
        assert_eq!(
            status.mfaregstate,
            CURegState::TotpNameTryAgain("phone".to_string())
        );

        let status: CUStatus = serde_json::from_value(json!({
            "can_commit": false,
            "mfaregstate": {"Passkey": {"publicKey": {"challenge": "abc"}}}
        }))
        .expect("deserialize");
        assert!(matches!(status.mfaregstate, CURegState::Passkey(_)));
    }

    #[test]
    fn has_password_covers_every_password_shape() {
        for detail in [
            CredentialDetailType::Password,
            CredentialDetailType::GeneratedPassword,
            CredentialDetailType::PasswordMfa(vec!["phone".to_string()], vec![], 0),
        ] {
            let status = CUStatus {
                displayname: String::new(),
                can_commit: true,
                primary: Some(CredentialDetail {
                    uuid: "11111111-0000-0000-0000-000000000001".to_string(),
                    detail,
                }),
                passkeys: vec![],
                warnings: vec![],
                mfaregstate: CURegState::None,
            };
            assert!(status.has_password());
        }

        let passkey_only = CUStatus {
            displayname: String::new(),
            can_commit: true,
            primary: Some(CredentialDetail {
                uuid: "11111111-0000-0000-0000-000000000001".to_string(),
                detail: CredentialDetailType::Passkey(vec!["laptop".to_string()]),
            }),
            passkeys: vec![],
            warnings: vec![],
            mfaregstate: CURegState::None,
        };
        assert!(!passkey_only.has_password());
        assert!(passkey_only.totp_labels().is_empty());
    }

    #[test]
    fn totp_labels_come_from_the_mfa_composite() {
        let status = CUStatus {
            displayname: String::new(),
            can_commit: true,
            primary: Some(CredentialDetail {
                uuid: "11111111-0000-0000-0000-000000000001".to_string(),
                detail: CredentialDetailType::PasswordMfa(
                    vec!["phone".to_string(), "tablet".to_string()],
                    vec![],
                    3,
                ),
            }),
            passkeys: vec![],
            warnings: vec![],
            mfaregstate: CURegState::None,
        };
        assert_eq!(status.totp_labels(), ["phone", "tablet"]);
    }
}
