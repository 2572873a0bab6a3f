//! Client helpers for current-identity endpoints. These functions keep
//! endpoint paths centralized and assume the backend enforces authorization.

use crate::{
    app_lib::{AppError, get_json_with_headers},
    features::{auth::session::SessionContext, me::types::Profile},
};

/// Fetches the authenticated identity's profile. Any failure, including an
/// expired or invalid bearer, is reported to the caller unchanged; access
/// evaluation treats all of them as unauthenticated.
pub async fn fetch_profile(session: &SessionContext) -> Result<Profile, AppError> {
    get_json_with_headers("/v1/self", &session.bearer_headers()).await
}
