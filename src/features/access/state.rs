//! Reactive access-evaluation context: authentication status, identity
//! profile, derived permissions, the privilege window with its recompute
//! tick, and the reauthentication dialog flow. The provider hydrates state
//! once on mount; stale responses arriving after unmount are discarded via
//! a liveness flag before any signal is written.

use crate::{
    app_lib::AppError,
    features::{
        access::{
            AuthStatus, Permissions, compute_window, permissions_for,
            reauth::{FactorInput, NextStep, ReauthFlow, next_step},
            uat::{self, Uat},
            window::WINDOW_RECHECK_MS,
        },
        auth::{
            client as auth_client,
            session::{SessionContext, use_session},
            types::{AuthAllowed, AuthCredential, AuthIssueSession, AuthState},
            webauthn,
        },
        me::{client as me_client, types::Profile},
    },
};
use gloo_timers::callback::{Interval, Timeout};
use leptos::{prelude::*, task::spawn_local};

/// Access context shared through Leptos. Copyable so async tasks and timer
/// callbacks can capture it freely.
#[derive(Clone, Copy)]
pub struct AccessContext {
    session: SessionContext,
    pub status: RwSignal<AuthStatus>,
    pub profile: RwSignal<Option<Profile>>,
    pub uat: RwSignal<Option<Uat>>,
    /// Whole minutes left on the read-write window, `None` when closed.
    pub unlocked_minutes: RwSignal<Option<u32>>,
    pub reauth: RwSignal<ReauthFlow>,
    /// Error message scoped to the reauthentication dialog.
    pub reauth_error: RwSignal<Option<String>>,
    pub can_edit: Signal<bool>,
    pub permissions: Signal<Permissions>,
    ticker: StoredValue<Option<Interval>, LocalStorage>,
    alive: StoredValue<bool>,
}

impl AccessContext {
    pub fn new(session: SessionContext) -> Self {
        let status = RwSignal::new(AuthStatus::Checking);
        let profile = RwSignal::new(None::<Profile>);
        let uat = RwSignal::new(None::<Uat>);
        let unlocked_minutes = RwSignal::new(None::<u32>);
        let reauth = RwSignal::new(ReauthFlow::Closed);
        let reauth_error = RwSignal::new(None::<String>);
        let can_edit = Signal::derive(move || unlocked_minutes.get().is_some());
        let permissions = Signal::derive(move || {
            profile.with(|profile| {
                profile
                    .as_ref()
                    .map(|p| permissions_for(&p.member_of))
                    .unwrap_or_default()
            })
        });

        Self {
            session,
            status,
            profile,
            uat,
            unlocked_minutes,
            reauth,
            reauth_error,
            can_edit,
            permissions,
            ticker: StoredValue::new_local(None),
            alive: StoredValue::new(true),
        }
    }

    /// Group list of the current identity, empty when unauthenticated.
    pub fn member_of(&self) -> Vec<String> {
        self.profile.with(|profile| {
            profile
                .as_ref()
                .map(|p| p.member_of.clone())
                .unwrap_or_default()
        })
    }

    /// Derives the authentication status on mount. No credential resolves
    /// immediately; otherwise the profile fetch decides, treating an expired
    /// or invalid bearer the same as an absent one.
    pub fn hydrate(&self) {
        if self.session.bearer().is_none() {
            self.status.set(AuthStatus::Unauthenticated);
            return;
        }

        let ctx = *self;
        spawn_local(async move {
            let fetched = me_client::fetch_profile(&ctx.session).await;
            if !ctx.is_alive() {
                return;
            }
            match fetched {
                Ok(profile) => {
                    let _ = ctx.profile.try_set(Some(profile));
                    let _ = ctx.status.try_set(AuthStatus::Authenticated);
                    ctx.refresh_token_state();
                }
                Err(err) => {
                    // An expired bearer is indistinguishable from an absent
                    // one for status purposes, but it must also be dropped.
                    if matches!(err, AppError::Http { status: 401, .. }) {
                        ctx.session.expire();
                    }
                    let _ = ctx.status.try_set(AuthStatus::Unauthenticated);
                }
            }
        });
    }

    /// Opens the reauthentication dialog and begins the elevation
    /// negotiation. Idempotent: a second call while a flow is open or in
    /// flight is a no-op.
    pub fn request_reauth(&self) {
        if self.reauth.with_untracked(ReauthFlow::is_open) {
            return;
        }
        self.reauth.set(ReauthFlow::Opening);
        self.reauth_error.set(None);

        let ctx = *self;
        spawn_local(async move {
            let outcome = auth_client::reauth_begin(&ctx.session, AuthIssueSession::Token).await;
            if !ctx.is_alive() {
                return;
            }
            match outcome {
                Ok(AuthState::Continue(allowed)) => {
                    let _ = ctx.reauth.try_set(ReauthFlow::AwaitingFactors(allowed));
                }
                Ok(AuthState::Success(_)) => ctx.finish_elevation(),
                Ok(AuthState::Denied(reason)) => {
                    ctx.close_reauth(Some(AppError::Denied(reason).to_string()));
                }
                Err(err) => ctx.close_reauth(Some(err.to_string())),
            }
        });
    }

    /// Submits the supplied factors, resubmitting with the other factor when
    /// the server keeps the negotiation open, and running the passkey
    /// ceremony when one is advertised.
    pub fn submit_factors(&self, input: FactorInput) {
        let allowed = match self.reauth.get_untracked() {
            ReauthFlow::AwaitingFactors(allowed) => allowed,
            _ => {
                self.reauth_error.set(Some(
                    AppError::state_conflict("factors submitted with no reauth in flight")
                        .to_string(),
                ));
                return;
            }
        };
        self.reauth.set(ReauthFlow::Submitting);

        let ctx = *self;
        spawn_local(async move {
            let mut allowed = allowed;
            loop {
                let step = match next_step(&allowed, &input) {
                    Ok(step) => step,
                    Err(err) => {
                        ctx.reopen_with_error(allowed, err);
                        return;
                    }
                };
                let credential = match step {
                    NextStep::Submit(credential) => credential,
                    NextStep::PasskeyCeremony(challenge) => {
                        match webauthn::authenticate_key(&challenge).await {
                            Ok(assertion) => AuthCredential::Passkey(assertion),
                            Err(err) => {
                                ctx.reopen_with_error(allowed, err);
                                return;
                            }
                        }
                    }
                };

                match auth_client::submit_credential(&ctx.session, credential).await {
                    Ok(AuthState::Success(_)) => {
                        if ctx.is_alive() {
                            ctx.finish_elevation();
                        }
                        return;
                    }
                    Ok(AuthState::Continue(next_allowed)) => {
                        allowed = next_allowed;
                    }
                    Ok(AuthState::Denied(reason)) => {
                        if ctx.is_alive() {
                            ctx.close_reauth(Some(AppError::Denied(reason).to_string()));
                        }
                        return;
                    }
                    Err(err) => {
                        ctx.reopen_with_error(allowed, err);
                        return;
                    }
                }
            }
        });
    }

    /// Signs out: best-effort server invalidation, unconditional local clear.
    pub fn sign_out(&self) {
        let ctx = *self;
        spawn_local(async move {
            auth_client::logout(&ctx.session).await;
            if !ctx.is_alive() {
                return;
            }
            let _ = ctx.profile.try_set(None);
            let _ = ctx.uat.try_set(None);
            let _ = ctx.unlocked_minutes.try_set(None);
            let _ = ctx.status.try_set(AuthStatus::Unauthenticated);
            let _ = ctx.reauth.try_set(ReauthFlow::Closed);
            ctx.stop_ticker();
        });
    }

    /// Recomputes the privilege window from the decoded token claims.
    pub fn recompute_window(&self) {
        let now = js_sys::Date::now() as i64;
        let minutes = self
            .uat
            .try_with_untracked(|uat| uat.as_ref().and_then(|u| compute_window(u, now)))
            .flatten();
        let _ = self.unlocked_minutes.try_set(minutes);
    }

    /// Decodes the current bearer, recomputes the window, and starts or
    /// stops the recompute tick accordingly.
    fn refresh_token_state(&self) {
        let decoded = self
            .session
            .bearer()
            .and_then(|bearer| uat::decode_bearer(&bearer).ok());
        let _ = self.uat.try_set(decoded);
        self.recompute_window();
        if self
            .unlocked_minutes
            .try_get_untracked()
            .flatten()
            .is_some()
        {
            self.start_ticker();
        } else {
            self.stop_ticker();
        }
    }

    /// Terminal success: close the dialog, refresh the identity, recompute
    /// the window from the newly issued token.
    fn finish_elevation(&self) {
        let _ = self.reauth.try_set(ReauthFlow::Closed);
        let _ = self.reauth_error.try_set(None);
        self.refresh_token_state();

        let ctx = *self;
        spawn_local(async move {
            if let Ok(profile) = me_client::fetch_profile(&ctx.session).await {
                if ctx.is_alive() {
                    let _ = ctx.profile.try_set(Some(profile));
                }
            }
        });
    }

    fn close_reauth(&self, error: Option<String>) {
        let _ = self.reauth.try_set(ReauthFlow::Closed);
        let _ = self.reauth_error.try_set(error);
    }

    fn reopen_with_error(&self, allowed: Vec<AuthAllowed>, err: AppError) {
        if !self.is_alive() {
            return;
        }
        let _ = self.reauth.try_set(ReauthFlow::AwaitingFactors(allowed));
        let _ = self.reauth_error.try_set(Some(err.to_string()));
    }

    fn start_ticker(&self) {
        let ctx = *self;
        self.ticker.update_value(|slot| {
            if slot.is_none() {
                *slot = Some(Interval::new(WINDOW_RECHECK_MS, move || ctx.tick()));
            }
        });
    }

    fn stop_ticker(&self) {
        let _ = self.ticker.try_update_value(|slot| {
            *slot = None;
        });
    }

    fn tick(&self) {
        self.recompute_window();
        if self
            .unlocked_minutes
            .try_get_untracked()
            .flatten()
            .is_none()
        {
            // An interval cannot drop itself from inside its own callback;
            // defer the cancellation to a fresh task.
            let ctx = *self;
            Timeout::new(0, move || ctx.stop_ticker()).forget();
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.try_get_value().unwrap_or(false)
    }

    fn retire(&self) {
        let _ = self.alive.try_update_value(|alive| *alive = false);
        self.stop_ticker();
    }
}

/// Provides the access context and hydrates it once on mount.
#[component]
pub fn AccessProvider(children: Children) -> impl IntoView {
    let access = AccessContext::new(use_session());
    provide_context(access);
    access.hydrate();
    on_cleanup(move || access.retire());

    view! { {children()} }
}

/// Returns the current access context or a fallback empty context.
pub fn use_access() -> AccessContext {
    use_context::<AccessContext>().unwrap_or_else(|| AccessContext::new(SessionContext::new()))
}
