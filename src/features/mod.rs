//! Domain-level frontend features (auth negotiation, access evaluation,
//! credential updates, identity profile) and their shared logic. Routes import
//! these modules to keep view code focused while keeping security and API
//! handling in dedicated feature areas.

pub mod access;
pub mod auth;
pub mod credential_update;
pub mod me;
