//! Credential update session (CUS): client-side driver for the server-side
//! interactive credential-update protocol. Every mutating call sends one
//! intent value and receives a fresh status snapshot; this module never
//! judges credential validity itself; it only reflects the server-reported
//! warnings, registration state, and commit readiness. Intent payloads carry
//! secrets and must never be logged.

#[cfg(target_arch = "wasm32")]
pub mod client;
#[cfg(target_arch = "wasm32")]
pub mod context;
pub mod state;
pub mod totp;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub use context::{
    CredentialUpdateContext, CredentialUpdateProvider, SessionEnd, use_credential_update,
};
pub use state::{CredentialUpdateState, PasskeyEnrollment, TotpFeedback, TotpModal};
pub use totp::{TotpAlgo, TotpSecret};
pub use types::{
    CURegState, CURegWarning, CURequest, CUSessionToken, CUStatus, CredentialDetail,
    CredentialDetailType,
};
