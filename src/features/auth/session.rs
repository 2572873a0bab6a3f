//! Session store: the bearer credential and the in-flight negotiation handle.
//! Both live in one injectable context passed explicitly to the negotiator,
//! so tests can run isolated instances and no module-level mutable state
//! exists. Only non-sensitive metadata is derived from it for display; the
//! bearer itself must never be logged.

use crate::features::auth::types::AuthState;
use leptos::prelude::*;

/// Plain session state, separated from the reactive wrapper so the outcome
/// rules stay testable without a reactive runtime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Opaque bearer token; present iff some identity is authenticated.
    pub bearer: Option<String>,
    /// Correlation id for the negotiation in flight, if any. At most one
    /// negotiation is live at a time; steps must not run concurrently.
    pub auth_session_id: Option<String>,
}

impl SessionState {
    /// Replaces the negotiation handle when the server returned a new one.
    /// A response without the header leaves the current handle in place.
    pub fn apply_session_header(&mut self, header: Option<String>) {
        if let Some(value) = header {
            self.auth_session_id = Some(value);
        }
    }

    /// Applies the outcome rules of one negotiation step: success installs
    /// the issued bearer and ends the negotiation; denial ends the
    /// negotiation but leaves any existing bearer untouched, so a denied
    /// reauth cannot sign the user out; continue changes nothing here.
    pub fn apply_outcome(&mut self, outcome: &AuthState) {
        match outcome {
            AuthState::Success(bearer) => {
                self.bearer = Some(bearer.clone());
                self.auth_session_id = None;
            }
            AuthState::Denied(_) => {
                self.auth_session_id = None;
            }
            AuthState::Continue(_) => {}
        }
    }

    /// Unconditional local sign-out.
    pub fn clear(&mut self) {
        self.bearer = None;
        self.auth_session_id = None;
    }
}

/// Reactive session context shared through Leptos. Copyable so closures and
/// async tasks can capture it freely.
#[derive(Clone, Copy)]
pub struct SessionContext {
    state: RwSignal<SessionState>,
    /// True iff a bearer credential is held.
    pub is_authenticated: Signal<bool>,
}

impl SessionContext {
    pub fn new() -> Self {
        let state = RwSignal::new(SessionState::default());
        let is_authenticated = Signal::derive(move || state.with(|s| s.bearer.is_some()));
        Self {
            state,
            is_authenticated,
        }
    }

    /// Snapshot of the bearer and handle for attaching to one request.
    pub fn snapshot(&self) -> (Option<String>, Option<String>) {
        self.state
            .with_untracked(|s| (s.bearer.clone(), s.auth_session_id.clone()))
    }

    pub fn bearer(&self) -> Option<String> {
        self.state.with_untracked(|s| s.bearer.clone())
    }

    /// `Authorization` header for authenticated requests; empty when no
    /// bearer is held, which the server reads as unauthenticated.
    pub fn bearer_headers(&self) -> Vec<(String, String)> {
        match self.bearer() {
            Some(token) => vec![("Authorization".to_string(), format!("Bearer {token}"))],
            None => Vec::new(),
        }
    }

    /// Applies one step response: header first (handles may be refreshed on
    /// any response), then the outcome rules.
    pub fn absorb(&self, header: Option<String>, outcome: &AuthState) {
        self.state.update(|s| {
            s.apply_session_header(header);
            s.apply_outcome(outcome);
        });
    }

    /// Drops the bearer after a downstream call reported it expired.
    pub fn expire(&self) {
        self.state.update(SessionState::clear);
    }

    pub fn clear(&self) {
        self.state.update(SessionState::clear);
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Provides a fresh session context to the subtree.
#[component]
pub fn SessionProvider(children: Children) -> impl IntoView {
    provide_context(SessionContext::new());
    view! { {children()} }
}

/// Returns the current session context or a fallback empty context.
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::SessionState;
    use crate::features::auth::types::{AuthAllowed, AuthState};

    fn mid_negotiation() -> SessionState {
        SessionState {
            bearer: Some("old-bearer".to_string()),
            auth_session_id: Some("handle-1".to_string()),
        }
    }

    #[test]
    fn success_installs_bearer_and_ends_negotiation() {
        let mut state = mid_negotiation();
        state.apply_outcome(&AuthState::Success("new-bearer".to_string()));
        assert_eq!(state.bearer.as_deref(), Some("new-bearer"));
        assert_eq!(state.auth_session_id, None);
    }

    #[test]
    fn denied_clears_handle_but_keeps_existing_bearer() {
        let mut state = mid_negotiation();
        state.apply_outcome(&AuthState::Denied("wrong password".to_string()));
        assert_eq!(state.bearer.as_deref(), Some("old-bearer"));
        assert_eq!(state.auth_session_id, None);
    }

    #[test]
    fn continue_changes_neither_bearer_nor_handle() {
        let mut state = mid_negotiation();
        state.apply_outcome(&AuthState::Continue(vec![AuthAllowed::Totp]));
        assert_eq!(state, mid_negotiation());
    }

    #[test]
    fn server_header_replaces_handle_and_absence_keeps_it() {
        let mut state = mid_negotiation();
        state.apply_session_header(Some("handle-2".to_string()));
        assert_eq!(state.auth_session_id.as_deref(), Some("handle-2"));
        state.apply_session_header(None);
        assert_eq!(state.auth_session_id.as_deref(), Some("handle-2"));
    }

    #[test]
    fn clear_is_unconditional() {
        let mut state = mid_negotiation();
        state.clear();
        assert_eq!(state, SessionState::default());
    }
}
