//! Client wrappers for the credential-update endpoints. One status endpoint
//! accepts every intent payload and always returns a full snapshot; opening
//! a session goes through either the authenticated per-person begin or the
//! intent-token exchange.

use crate::{
    app_lib::{AppError, get_json_with_headers, post_json_with_headers_response},
    features::{
        auth::session::SessionContext,
        credential_update::types::{CURequest, CUSessionToken, CUStatus},
    },
};

/// Opens a session for `id` using the caller's bearer credential.
pub async fn begin_for(
    session: &SessionContext,
    id: &str,
) -> Result<(CUSessionToken, CUStatus), AppError> {
    get_json_with_headers(
        &format!("/v1/person/{id}/_credential/_update"),
        &session.bearer_headers(),
    )
    .await
}

/// Exchanges an intent token (handed out by an operator) for a session.
/// No bearer credential is required; the token itself authorizes the update.
pub async fn exchange_intent(intent_token: &str) -> Result<(CUSessionToken, CUStatus), AppError> {
    post_json_with_headers_response("/v1/credential/_exchange_intent", &intent_token, &[]).await
}

/// Sends one intent and returns the fresh status snapshot.
pub async fn update(token: &CUSessionToken, request: &CURequest) -> Result<CUStatus, AppError> {
    post_json_with_headers_response("/v1/credential/_update", &(request, token), &[]).await
}

/// Commits the staged changes, consuming the session. A 401 here does not
/// mean the commit failed: the session used to confirm it expired, so the
/// caller must offer a "please sign in again" path instead of an error.
pub async fn commit(token: &CUSessionToken) -> Result<(), AppError> {
    let result: Result<serde_json::Value, AppError> =
        post_json_with_headers_response("/v1/credential/_commit", token, &[]).await;
    match result {
        Ok(_) => Ok(()),
        Err(AppError::Http { status: 401, .. }) => Err(AppError::SessionExpired(
            "Your changes were saved, but the session expired. Please sign in again.".to_string(),
        )),
        Err(err) => Err(err),
    }
}

/// Abandons the session and every staged change.
pub async fn cancel(token: &CUSessionToken) -> Result<(), AppError> {
    let _: serde_json::Value =
        post_json_with_headers_response("/v1/credential/_cancel", token, &[]).await?;
    Ok(())
}
