//! Access evaluation: category permissions derived from group membership and
//! the time-boxed read-write window granted after reauthentication. The
//! evaluator never decides authorization itself; the backend enforces it.
//! These derivations only gate UI affordances.

pub mod permissions;
pub mod reauth;
#[cfg(target_arch = "wasm32")]
pub mod state;
pub mod uat;
pub mod window;

pub use permissions::{Permissions, permissions_for};
pub use reauth::{FactorInput, NextStep, ReauthFlow};
#[cfg(target_arch = "wasm32")]
pub use state::{AccessContext, AccessProvider, use_access};
pub use uat::{Uat, UatPurpose};
pub use window::compute_window;

/// Authentication state as derived on mount: no credential resolves
/// immediately to `Unauthenticated`; otherwise the profile fetch decides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthStatus {
    #[default]
    Checking,
    Authenticated,
    Unauthenticated,
}
