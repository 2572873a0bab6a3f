//! Local snapshot and dialog state for one credential-update session. The
//! reducer only reflects what the server reported; a failed exchange leaves
//! the previous snapshot authoritative and nothing is rolled back
//! speculatively. All input validation lives here so it can short-circuit
//! before any network call.

use crate::{
    app_lib::AppError,
    features::credential_update::{
        totp::TotpSecret,
        types::{CURegState, CURegWarning, CURequest, CUStatus},
    },
};
use serde_json::Value;

/// Passkey enrollment sub-state. The challenge arrives from the server, the
/// created credential from the browser ceremony; only then may the label be
/// collected and the enrollment finished.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PasskeyEnrollment {
    #[default]
    Idle,
    /// Server issued a creation challenge; the ceremony has not run yet.
    Challenge(Value),
    /// Ceremony succeeded; holding the attestation until a label is given.
    AwaitingLabel(Value),
}

/// Feedback the TOTP dialog must show for the last verification attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TotpFeedback {
    /// Wrong code; ask for a fresh one against the unchanged secret.
    TryAgain,
    /// The authenticator only supports SHA1; offer accept-anyway.
    InvalidSha1,
    /// The label was rejected; echoes the rejected name.
    NameTryAgain(String),
}

/// TOTP enrollment dialog state.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TotpModal {
    #[default]
    Closed,
    Pending {
        secret: TotpSecret,
        uri: String,
        feedback: Option<TotpFeedback>,
    },
}

/// Client-side view of one credential-update session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CredentialUpdateState {
    /// Last snapshot the server returned; authoritative until replaced.
    pub status: Option<CUStatus>,
    pub passkey: PasskeyEnrollment,
    pub totp: TotpModal,
    /// Set after the user cancelled an MFA enrollment, so the view can offer
    /// retry or password removal.
    pub totp_cancelled: bool,
    pub password_error: Option<String>,
    pub passkey_error: Option<String>,
    pub totp_error: Option<String>,
}

impl CredentialUpdateState {
    /// Absorbs one status snapshot, driving the sub-enrollment dialogs from
    /// the reported registration state.
    pub fn apply_status(&mut self, status: CUStatus) {
        // A successful exchange makes this snapshot authoritative; errors
        // left over from an earlier failed attempt are stale now.
        self.password_error = None;
        self.passkey_error = None;
        self.totp_error = None;
        match &status.mfaregstate {
            CURegState::TotpCheck(secret) => {
                self.totp = TotpModal::Pending {
                    secret: secret.clone(),
                    uri: secret.to_uri(),
                    feedback: None,
                };
            }
            CURegState::TotpTryAgain => self.set_totp_feedback(TotpFeedback::TryAgain),
            CURegState::TotpInvalidSha1 => self.set_totp_feedback(TotpFeedback::InvalidSha1),
            CURegState::TotpNameTryAgain(name) => {
                self.set_totp_feedback(TotpFeedback::NameTryAgain(name.clone()));
            }
            CURegState::Passkey(challenge) => {
                self.passkey = PasskeyEnrollment::Challenge(challenge.clone());
            }
            CURegState::None => {
                self.totp = TotpModal::Closed;
                self.passkey = PasskeyEnrollment::Idle;
            }
        }
        self.status = Some(status);
    }

    /// Marks the ceremony result so the view can collect a label.
    pub fn passkey_created(&mut self, credential: Value) {
        self.passkey = PasskeyEnrollment::AwaitingLabel(credential);
    }

    /// Challenge for the creation ceremony. A passkey-init exchange must
    /// leave the registration state holding one; anything else is reported
    /// rather than silently dropped.
    pub fn passkey_challenge(&self) -> Result<Value, AppError> {
        match &self.passkey {
            PasskeyEnrollment::Challenge(challenge) => Ok(challenge.clone()),
            _ => Err(AppError::State(
                "The server did not issue a passkey challenge.".to_string(),
            )),
        }
    }

    /// Takes the pending attestation for finishing, or reports the
    /// invariant violation when no ceremony completed.
    pub fn take_pending_passkey(&mut self) -> Result<Value, AppError> {
        match std::mem::take(&mut self.passkey) {
            PasskeyEnrollment::AwaitingLabel(credential) => Ok(credential),
            other => {
                self.passkey = other;
                Err(AppError::state_conflict(
                    "passkey finish with no completed ceremony",
                ))
            }
        }
    }

    pub fn mark_totp_cancelled(&mut self) {
        self.totp = TotpModal::Closed;
        self.totp_error = None;
        self.totp_cancelled = true;
    }

    /// Resets everything local; used when the session is committed,
    /// cancelled, or abandoned.
    pub fn reset(&mut self) {
        *self = CredentialUpdateState::default();
    }

    fn set_totp_feedback(&mut self, feedback: TotpFeedback) {
        // Feedback without an open dialog (e.g. a snapshot replayed after
        // reload) has nothing to attach to; the secret stays untouched.
        if let TotpModal::Pending {
            feedback: slot, ..
        } = &mut self.totp
        {
            *slot = Some(feedback);
        }
    }
}

/// Follow-up intent after staging a password. A snapshot still warning that
/// MFA is required chains straight into TOTP enrollment so the user is not
/// left with an uncommittable session.
pub fn password_stage_follow_up(status: &CUStatus) -> Option<CURequest> {
    status
        .has_warning(&CURegWarning::MfaRequired)
        .then_some(CURequest::TotpGenerate)
}

/// Rejects a password change before any network call: both fields required,
/// both identical.
pub fn validate_password_change(password: &str, confirm: &str) -> Result<(), AppError> {
    if password.trim().is_empty() {
        return Err(AppError::Validation("A password is required.".to_string()));
    }
    if password != confirm {
        return Err(AppError::Validation("Passwords do not match.".to_string()));
    }
    Ok(())
}

/// A passkey must carry a non-empty label.
pub fn validate_passkey_label(label: &str) -> Result<(), AppError> {
    if label.trim().is_empty() {
        return Err(AppError::Validation(
            "A passkey label is required.".to_string(),
        ));
    }
    Ok(())
}

/// Parses the six-or-so digit code typed into the TOTP dialog.
pub fn parse_totp_code(code: &str) -> Result<u32, AppError> {
    code.trim()
        .parse()
        .map_err(|_| AppError::Validation("The code must be numeric.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::{
        CredentialUpdateState, PasskeyEnrollment, TotpFeedback, TotpModal, parse_totp_code,
        password_stage_follow_up, validate_passkey_label, validate_password_change,
    };
    use crate::{
        app_lib::AppError,
        features::credential_update::{
            totp::{TotpAlgo, TotpSecret},
            types::{CURegState, CURegWarning, CURequest, CUStatus},
        },
    };
    use serde_json::json;

    fn secret() -> TotpSecret {
        TotpSecret {
            accountname: "alice".to_string(),
            issuer: "idm".to_string(),
            secret: "JBSWY3DPEHPK3PXP".to_string(),
            algo: TotpAlgo::Sha256,
            step: 30,
            digits: 6,
        }
    }

    fn status_with(mfaregstate: CURegState) -> CUStatus {
        CUStatus {
            displayname: "Alice".to_string(),
            can_commit: false,
            primary: None,
            passkeys: vec![],
            warnings: vec![CURegWarning::MfaRequired],
            mfaregstate,
        }
    }

    #[test]
    fn totp_check_opens_the_dialog_with_derived_uri() {
        let mut state = CredentialUpdateState::default();
        state.apply_status(status_with(CURegState::TotpCheck(secret())));
        match &state.totp {
            TotpModal::Pending { uri, feedback, .. } => {
                assert!(uri.starts_with("otpauth://totp/"));
                assert_eq!(*feedback, None);
            }
            TotpModal::Closed => panic!("dialog should be open"),
        }
    }

    #[test]
    fn try_again_keeps_the_dialog_and_previous_secret() {
        let mut state = CredentialUpdateState::default();
        state.apply_status(status_with(CURegState::TotpCheck(secret())));
        state.apply_status(status_with(CURegState::TotpTryAgain));
        match &state.totp {
            TotpModal::Pending {
                secret: kept,
                feedback,
                ..
            } => {
                assert_eq!(*kept, secret());
                assert_eq!(*feedback, Some(TotpFeedback::TryAgain));
            }
            TotpModal::Closed => panic!("dialog should stay open"),
        }
    }

    #[test]
    fn name_try_again_echoes_the_rejected_label() {
        let mut state = CredentialUpdateState::default();
        state.apply_status(status_with(CURegState::TotpCheck(secret())));
        state.apply_status(status_with(CURegState::TotpNameTryAgain(
            "phone".to_string(),
        )));
        match &state.totp {
            TotpModal::Pending { feedback, .. } => {
                assert_eq!(*feedback, Some(TotpFeedback::NameTryAgain("phone".to_string())));
            }
            TotpModal::Closed => panic!("dialog should stay open"),
        }
    }

    #[test]
    fn any_other_registration_state_closes_the_dialog() {
        let mut state = CredentialUpdateState::default();
        state.apply_status(status_with(CURegState::TotpCheck(secret())));
        state.apply_status(status_with(CURegState::None));
        assert_eq!(state.totp, TotpModal::Closed);
        assert_eq!(state.totp_error, None);
    }

    #[test]
    fn passkey_challenge_then_ceremony_then_finish() {
        let mut state = CredentialUpdateState::default();
        state.apply_status(status_with(CURegState::Passkey(json!({"challenge": "abc"}))));
        assert!(matches!(state.passkey, PasskeyEnrollment::Challenge(_)));

        state.passkey_created(json!({"id": "cred"}));
        let credential = state.take_pending_passkey().expect("pending credential");
        assert_eq!(credential, json!({"id": "cred"}));
        assert_eq!(state.passkey, PasskeyEnrollment::Idle);
    }

    #[test]
    fn cancelling_marks_the_flag_for_the_view() {
        let mut state = CredentialUpdateState::default();
        state.apply_status(status_with(CURegState::TotpCheck(secret())));
        state.mark_totp_cancelled();
        assert_eq!(state.totp, TotpModal::Closed);
        assert!(state.totp_cancelled);
    }

    #[test]
    fn password_validation_short_circuits_locally() {
        assert!(matches!(
            validate_password_change("", ""),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_password_change("Abc123!!", "Abc123!"),
            Err(AppError::Validation(_))
        ));
        assert!(validate_password_change("Abc123!!", "Abc123!!").is_ok());
    }

    #[test]
    fn labels_and_codes_are_validated_before_any_network_call() {
        assert!(validate_passkey_label("  ").is_err());
        assert!(validate_passkey_label("laptop").is_ok());
        assert!(parse_totp_code("12a456").is_err());
        assert_eq!(parse_totp_code(" 123456 ").expect("numeric"), 123_456);
    }

    #[test]
    fn successful_exchange_clears_stale_scoped_errors() {
        let mut state = CredentialUpdateState::default();
        state.password_error = Some("Passwords do not match.".to_string());
        state.passkey_error = Some("Operation timed out or was cancelled.".to_string());
        state.totp_error = Some("The code must be numeric.".to_string());

        state.apply_status(status_with(CURegState::None));

        assert_eq!(state.password_error, None);
        assert_eq!(state.passkey_error, None);
        assert_eq!(state.totp_error, None);
    }

    #[test]
    fn staging_a_password_under_mfa_required_chains_into_totp() {
        // status_with carries the MfaRequired warning.
        let warned = status_with(CURegState::None);
        assert_eq!(
            password_stage_follow_up(&warned),
            Some(CURequest::TotpGenerate)
        );

        let mut satisfied = status_with(CURegState::None);
        satisfied.warnings.clear();
        assert_eq!(password_stage_follow_up(&satisfied), None);

        // The chained generate opens the dialog when its snapshot arrives.
        let mut state = CredentialUpdateState::default();
        state.apply_status(status_with(CURegState::TotpCheck(secret())));
        assert!(matches!(state.totp, TotpModal::Pending { .. }));
    }

    #[test]
    fn passkey_init_without_a_challenge_is_reported() {
        let mut state = CredentialUpdateState::default();
        state.apply_status(status_with(CURegState::None));
        assert!(matches!(state.passkey_challenge(), Err(AppError::State(_))));

        state.apply_status(status_with(CURegState::Passkey(json!({"challenge": "abc"}))));
        assert_eq!(
            state.passkey_challenge().expect("challenge"),
            json!({"challenge": "abc"})
        );
    }

    #[test]
    fn reset_clears_the_whole_local_snapshot() {
        let mut state = CredentialUpdateState::default();
        state.apply_status(status_with(CURegState::TotpCheck(secret())));
        state.mark_totp_cancelled();
        state.reset();
        assert_eq!(state, CredentialUpdateState::default());
    }
}
