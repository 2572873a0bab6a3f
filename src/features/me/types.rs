//! Types for the identity-profile API responses.

use serde::{Deserialize, Serialize};

/// One enrolled passkey as listed on a profile or a credential-update
/// snapshot.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasskeyDetail {
    pub uuid: String,
    pub tag: String,
}

/// The authenticated identity's profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub member_of: Vec<String>,
    #[serde(default)]
    pub passkeys: Vec<PasskeyDetail>,
    #[serde(default)]
    pub attested_passkeys: Vec<PasskeyDetail>,
}
