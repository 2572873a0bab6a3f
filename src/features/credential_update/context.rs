//! Reactive driver for one credential-update session. Owned by whichever
//! view opened it; commit, cancel, or navigation away always clears the
//! local snapshot together with the server-side intent. A `loading` gate
//! keeps the UI from issuing a second mutation while one is outstanding.

use crate::{
    app_lib::AppError,
    features::{
        auth::{session::SessionContext, webauthn},
        credential_update::{
            client,
            state::{
                CredentialUpdateState, parse_totp_code, password_stage_follow_up,
                validate_passkey_label, validate_password_change,
            },
            types::{CURequest, CUSessionToken, CUStatus},
        },
    },
};
use leptos::{prelude::*, task::spawn_local};

/// How a finished session ended, for the view to route on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Committed,
    Cancelled,
    /// The commit was saved but the confirming session expired; show the
    /// sign-in-again path, not a failure.
    ExpiredSignInAgain,
}

/// Which sub-flow an error message belongs to.
#[derive(Clone, Copy, Debug)]
enum ErrorScope {
    Session,
    Password,
    Passkey,
    Totp,
}

#[derive(Clone, Copy)]
pub struct CredentialUpdateContext {
    pub state: RwSignal<CredentialUpdateState>,
    pub loading: RwSignal<bool>,
    /// Error scoped to opening, committing, or cancelling the session.
    pub error: RwSignal<Option<String>>,
    pub finished: RwSignal<Option<SessionEnd>>,
    token: StoredValue<Option<CUSessionToken>>,
    alive: StoredValue<bool>,
}

impl CredentialUpdateContext {
    pub fn new() -> Self {
        Self {
            state: RwSignal::new(CredentialUpdateState::default()),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
            finished: RwSignal::new(None),
            token: StoredValue::new(None),
            alive: StoredValue::new(true),
        }
    }

    /// Opens a session for `id` with the caller's bearer credential.
    pub fn open_for(&self, session: SessionContext, id: String) {
        let ctx = *self;
        self.run(move || async move {
            match client::begin_for(&session, &id).await {
                Ok((token, status)) => ctx.install(token, status),
                Err(err) => ctx.report(ErrorScope::Session, err),
            }
        });
    }

    /// Opens a session from an operator-issued intent token.
    pub fn open_with_intent(&self, intent_token: String) {
        let ctx = *self;
        self.run(move || async move {
            match client::exchange_intent(&intent_token).await {
                Ok((token, status)) => ctx.install(token, status),
                Err(err) => ctx.report(ErrorScope::Session, err),
            }
        });
    }

    /// Requests a creation challenge and runs the browser ceremony; on
    /// success the state waits for a label before finalizing.
    pub fn begin_passkey_enrollment(&self) {
        let ctx = *self;
        self.run(move || async move {
            let status = match ctx.exchange(CURequest::PasskeyInit).await {
                Ok(status) => status,
                Err(err) => return ctx.report(ErrorScope::Passkey, err),
            };
            ctx.absorb(status);

            let challenge = match ctx
                .state
                .try_with_untracked(CredentialUpdateState::passkey_challenge)
            {
                Some(Ok(challenge)) => challenge,
                Some(Err(err)) => return ctx.report(ErrorScope::Passkey, err),
                None => return,
            };
            match webauthn::register_key(&challenge).await {
                Ok(credential) => {
                    let _ = ctx.state.try_update(|s| s.passkey_created(credential));
                }
                Err(err) => ctx.report(ErrorScope::Passkey, err),
            }
        });
    }

    /// Finalizes the pending enrollment under `label`.
    pub fn finish_passkey_enrollment(&self, label: String) {
        // The pending attestation is consumed below; bail before taking it
        // when the gate would drop the task anyway.
        if self.loading.get_untracked() {
            return;
        }
        if let Err(err) = validate_passkey_label(&label) {
            self.report(ErrorScope::Passkey, err);
            return;
        }
        let credential = self
            .state
            .try_update(|s| s.take_pending_passkey())
            .unwrap_or_else(|| Err(AppError::state_conflict("context already disposed")));
        let credential = match credential {
            Ok(credential) => credential,
            Err(err) => {
                self.report(ErrorScope::Passkey, err);
                return;
            }
        };

        let ctx = *self;
        self.run(move || async move {
            match ctx.exchange(CURequest::PasskeyFinish(label, credential)).await {
                Ok(status) => ctx.absorb(status),
                Err(err) => ctx.report(ErrorScope::Passkey, err),
            }
        });
    }

    pub fn remove_passkey(&self, uuid: String) {
        let ctx = *self;
        self.run(move || async move {
            match ctx.exchange(CURequest::PasskeyRemove(uuid)).await {
                Ok(status) => ctx.absorb(status),
                Err(err) => ctx.report(ErrorScope::Passkey, err),
            }
        });
    }

    /// Stages a new password. When the resulting snapshot warns that MFA is
    /// required, TOTP enrollment opens automatically.
    pub fn stage_password_change(&self, password: String, confirm: String) {
        if let Err(err) = validate_password_change(&password, &confirm) {
            self.report(ErrorScope::Password, err);
            return;
        }

        let ctx = *self;
        self.run(move || async move {
            let status = match ctx.exchange(CURequest::Password(password)).await {
                Ok(status) => status,
                Err(err) => return ctx.report(ErrorScope::Password, err),
            };
            let follow_up = password_stage_follow_up(&status);
            ctx.absorb(status);

            if let Some(request) = follow_up {
                match ctx.exchange(request).await {
                    Ok(status) => ctx.absorb(status),
                    Err(err) => ctx.report(ErrorScope::Totp, err),
                }
            }
        });
    }

    pub fn begin_totp_enrollment(&self) {
        let ctx = *self;
        self.run(move || async move {
            match ctx.exchange(CURequest::TotpGenerate).await {
                Ok(status) => ctx.absorb(status),
                Err(err) => ctx.report(ErrorScope::Totp, err),
            }
        });
    }

    /// Verifies the first code under `label`; the returned registration
    /// state decides whether the dialog retries, offers accept-anyway, or
    /// closes.
    pub fn verify_totp(&self, code: String, label: String) {
        let code = match parse_totp_code(&code) {
            Ok(code) => code,
            Err(err) => {
                self.report(ErrorScope::Totp, err);
                return;
            }
        };

        let ctx = *self;
        self.run(move || async move {
            match ctx.exchange(CURequest::TotpVerify(code, label)).await {
                Ok(status) => ctx.absorb(status),
                Err(err) => ctx.report(ErrorScope::Totp, err),
            }
        });
    }

    /// Accepts the SHA1-only authenticator after the server flagged it.
    pub fn accept_totp_sha1(&self) {
        let ctx = *self;
        self.run(move || async move {
            match ctx.exchange(CURequest::TotpAcceptSha1).await {
                Ok(status) => ctx.absorb(status),
                Err(err) => ctx.report(ErrorScope::Totp, err),
            }
        });
    }

    pub fn cancel_totp_enrollment(&self) {
        let ctx = *self;
        self.run(move || async move {
            match ctx.exchange(CURequest::CancelMfaReg).await {
                Ok(status) => {
                    let _ = ctx.state.try_update(|s| {
                        s.apply_status(status);
                        s.mark_totp_cancelled();
                    });
                }
                Err(err) => ctx.report(ErrorScope::Totp, err),
            }
        });
    }

    pub fn remove_primary_credential(&self) {
        let ctx = *self;
        self.run(move || async move {
            match ctx.exchange(CURequest::PrimaryRemove).await {
                Ok(status) => ctx.absorb(status),
                Err(err) => ctx.report(ErrorScope::Password, err),
            }
        });
    }

    /// Commits the session. The local snapshot is cleared whenever the
    /// server consumed the session, including the expired-confirmation
    /// case, which the view must present as "please sign in again".
    pub fn commit(&self) {
        let ctx = *self;
        self.run(move || async move {
            let Some(token) = ctx.take_token() else {
                return ctx.report(
                    ErrorScope::Session,
                    AppError::state_conflict("commit with no open session"),
                );
            };
            match client::commit(&token).await {
                Ok(()) => ctx.close(SessionEnd::Committed),
                Err(AppError::SessionExpired(_)) => ctx.close(SessionEnd::ExpiredSignInAgain),
                Err(err) => {
                    // Commit failed; the session and snapshot stay live so
                    // the user can fix and retry.
                    let _ = ctx.token.try_update_value(|slot| *slot = Some(token));
                    ctx.report(ErrorScope::Session, err);
                }
            }
        });
    }

    /// Abandons the session: best-effort server cancel, unconditional local
    /// clear.
    pub fn cancel(&self) {
        let ctx = *self;
        self.run(move || async move {
            if let Some(token) = ctx.take_token() {
                let _ = client::cancel(&token).await;
            }
            ctx.close(SessionEnd::Cancelled);
        });
    }

    async fn exchange(&self, request: CURequest) -> Result<CUStatus, AppError> {
        let token = self
            .token
            .try_with_value(Clone::clone)
            .flatten()
            .ok_or_else(|| AppError::state_conflict("intent sent with no open session"))?;
        client::update(&token, &request).await
    }

    fn install(&self, token: CUSessionToken, status: CUStatus) {
        if !self.is_alive() {
            return;
        }
        let _ = self.token.try_update_value(|slot| *slot = Some(token));
        self.absorb(status);
    }

    fn absorb(&self, status: CUStatus) {
        if self.is_alive() {
            let _ = self.state.try_update(|s| s.apply_status(status));
        }
    }

    fn close(&self, end: SessionEnd) {
        if !self.is_alive() {
            return;
        }
        let _ = self.state.try_update(CredentialUpdateState::reset);
        let _ = self.finished.try_set(Some(end));
    }

    fn take_token(&self) -> Option<CUSessionToken> {
        self.token.try_update_value(Option::take).flatten()
    }

    fn report(&self, scope: ErrorScope, err: AppError) {
        if !self.is_alive() {
            return;
        }
        let message = Some(err.to_string());
        match scope {
            ErrorScope::Session => {
                let _ = self.error.try_set(message);
            }
            ErrorScope::Password => {
                let _ = self.state.try_update(|s| s.password_error = message);
            }
            ErrorScope::Passkey => {
                let _ = self.state.try_update(|s| s.passkey_error = message);
            }
            ErrorScope::Totp => {
                let _ = self.state.try_update(|s| s.totp_error = message);
            }
        }
    }

    /// Serializes mutations: drops the call when one is already in flight,
    /// and releases the gate when the task finishes.
    fn run<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + 'static,
        Fut: std::future::Future<Output = ()> + 'static,
    {
        if self.loading.get_untracked() {
            return;
        }
        self.loading.set(true);
        let ctx = *self;
        spawn_local(async move {
            task().await;
            let _ = ctx.loading.try_set(false);
        });
    }

    fn is_alive(&self) -> bool {
        self.alive.try_get_value().unwrap_or(false)
    }

    fn retire(&self) {
        let _ = self.alive.try_update_value(|alive| *alive = false);
    }
}

impl Default for CredentialUpdateContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Provides a fresh credential-update context to the owning view. Leaving
/// the subtree cancels the session so it never outlives its owner.
#[component]
pub fn CredentialUpdateProvider(children: Children) -> impl IntoView {
    let context = CredentialUpdateContext::new();
    provide_context(context);
    on_cleanup(move || {
        if let Some(token) = context.take_token() {
            spawn_local(async move {
                let _ = client::cancel(&token).await;
            });
        }
        context.retire();
    });

    view! { {children()} }
}

/// Returns the current credential-update context or a fallback empty one.
pub fn use_credential_update() -> CredentialUpdateContext {
    use_context::<CredentialUpdateContext>().unwrap_or_default()
}
