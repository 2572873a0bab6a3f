//! Core library for the identity console frontend. It holds the step-wise
//! authentication negotiation, the time-boxed privilege-elevation window, and
//! the interactive credential-update session driver. View code stays thin:
//! routes call the operations exposed here and render the reactive state.
//!
//! Protocol types and state machines compile on every target so they stay
//! testable with plain `cargo test`; everything that touches the network or
//! the browser credential API is gated to `wasm32`, mirroring how the app
//! binary mounts this crate.

pub mod app_lib;
pub mod features;
