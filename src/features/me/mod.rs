//! Identity profile feature: the whoami-style fetch that access evaluation
//! and the people views read from.

#[cfg(target_arch = "wasm32")]
pub mod client;
pub mod types;

pub use types::{PasskeyDetail, Profile};
