//! Auth feature module covering the step-wise login and reauthentication
//! negotiation against the identity service. It keeps protocol logic out of
//! the UI and must stay aligned with the server's step/state payloads. This
//! module touches security boundaries and must avoid logging secrets or
//! token material.
//!
//! Flow Overview: `init` starts a negotiation and the server answers with an
//! outcome: immediate success for trivial paths, or a list of allowed
//! mechanisms. `select_mechanism` commits to one of them and
//! `submit_credential` answers each advertised factor until the server issues
//! a bearer credential or denies the attempt. `reauth_begin` runs the same
//! algebra for an already-authenticated identity to open a read-write window.
//! Session correlation travels in a response header, never in the body.

#[cfg(target_arch = "wasm32")]
pub mod client;
pub mod session;
pub mod types;
#[cfg(target_arch = "wasm32")]
pub mod webauthn;

pub use session::{SessionContext, SessionProvider, SessionState, use_session};
pub use types::{AuthAllowed, AuthCredential, AuthIssueSession, AuthMech, AuthState};
