//! Wire types for the authentication negotiation protocol. Every step is a
//! discriminated payload and every response is interpreted as one of three
//! outcomes, so call sites can match exhaustively instead of probing strings.
//! These payloads carry credentials and must never be logged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response header correlating the steps of one negotiation. The server may
/// replace the value on any response; the new value supersedes the old.
pub const AUTH_SESSION_HEADER: &str = "X-KANIDM-AUTH-SESSION-ID";

/// How the issued session credential should be delivered.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthIssueSession {
    Token,
    Cookie,
}

/// Mechanisms the server can advertise for a negotiation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMech {
    Anonymous,
    Password,
    PasswordMfa,
    Passkey,
}

/// One credential answer for an advertised factor. The passkey variant
/// carries the assertion produced by the browser ceremony as an opaque
/// payload; this crate never inspects it.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AuthCredential {
    Anonymous,
    Password(String),
    Totp(u32),
    BackupCode(String),
    Passkey(Value),
}

/// One step of the negotiation, wrapped in [`AuthRequest`] on the wire.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AuthStep {
    Init2 {
        username: String,
        issue: AuthIssueSession,
        privileged: bool,
    },
    Begin(AuthMech),
    Cred(AuthCredential),
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AuthRequest {
    pub step: AuthStep,
}

/// A factor the server will accept next. `Passkey` carries the assertion
/// challenge for the local ceremony.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AuthAllowed {
    Anonymous,
    BackupCode,
    Password,
    Totp,
    Passkey(Value),
}

/// Outcome of one negotiation step.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    /// Negotiation finished; the payload is the issued bearer credential.
    Success(String),
    /// The server rejected the attempt with a reason.
    Denied(String),
    /// More factors are required; the payload lists what is acceptable now.
    Continue(Vec<AuthAllowed>),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub state: AuthState,
}
