//! Client wrappers for the step-wise negotiation endpoints. These helpers
//! centralize header handling and session-handle correlation, keeping auth
//! flows consistent and preventing token leakage in route code.
//!
//! A failed transport call (non-2xx) mutates neither the bearer nor the
//! negotiation handle; only a parsed outcome is absorbed into the session.

use crate::{
    app_lib::{AppError, get_empty_with_headers, post_json_capturing_header},
    features::auth::{
        session::SessionContext,
        types::{
            AUTH_SESSION_HEADER, AuthCredential, AuthIssueSession, AuthMech, AuthRequest,
            AuthResponse, AuthState, AuthStep,
        },
    },
};

const AUTH_PATH: &str = "/v1/auth";
const REAUTH_PATH: &str = "/v1/reauth";
const LOGOUT_PATH: &str = "/v1/logout";

/// Begins a fresh negotiation for `username`. The server replies either with
/// the allowed first-factor mechanisms or, for the anonymous path, immediate
/// success.
pub async fn init(
    session: &SessionContext,
    username: &str,
    issue: AuthIssueSession,
    privileged: bool,
) -> Result<AuthState, AppError> {
    step(
        session,
        AuthStep::Init2 {
            username: username.to_string(),
            issue,
            privileged,
        },
    )
    .await
}

/// Commits to one advertised mechanism when several were offered.
pub async fn select_mechanism(
    session: &SessionContext,
    mech: AuthMech,
) -> Result<AuthState, AppError> {
    step(session, AuthStep::Begin(mech)).await
}

/// Answers one advertised factor.
pub async fn submit_credential(
    session: &SessionContext,
    credential: AuthCredential,
) -> Result<AuthState, AppError> {
    step(session, AuthStep::Cred(credential)).await
}

/// Starts a privilege-elevation negotiation for the already-authenticated
/// identity. Same outcome algebra as the login flow.
pub async fn reauth_begin(
    session: &SessionContext,
    issue: AuthIssueSession,
) -> Result<AuthState, AppError> {
    let (bearer, handle) = session.snapshot();
    let (response, header): (AuthResponse, Option<String>) = post_json_capturing_header(
        REAUTH_PATH,
        &issue,
        &negotiation_headers(bearer.as_deref(), handle.as_deref()),
        AUTH_SESSION_HEADER,
    )
    .await?;

    session.absorb(header, &response.state);
    Ok(response.state)
}

/// Invalidates the session server-side and clears local state. The local
/// clear is unconditional: sign-out must succeed even when the server call
/// fails, so any transport error is swallowed here.
pub async fn logout(session: &SessionContext) {
    let bearer = session.bearer();
    let _ = get_empty_with_headers(LOGOUT_PATH, &negotiation_headers(bearer.as_deref(), None)).await;
    session.clear();
}

async fn step(session: &SessionContext, step: AuthStep) -> Result<AuthState, AppError> {
    let (bearer, handle) = session.snapshot();
    let (response, header): (AuthResponse, Option<String>) = post_json_capturing_header(
        AUTH_PATH,
        &AuthRequest { step },
        &negotiation_headers(bearer.as_deref(), handle.as_deref()),
        AUTH_SESSION_HEADER,
    )
    .await?;

    session.absorb(header, &response.state);
    Ok(response.state)
}

/// Builds the headers every negotiation request must carry: the previously
/// issued bearer (when present) and the previously returned handle (when
/// present).
fn negotiation_headers(bearer: Option<&str>, handle: Option<&str>) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    if let Some(token) = bearer {
        headers.push(("Authorization".to_string(), format!("Bearer {token}")));
    }
    if let Some(id) = handle {
        headers.push((AUTH_SESSION_HEADER.to_string(), id.to_string()));
    }
    headers
}
