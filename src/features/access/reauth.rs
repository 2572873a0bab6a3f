//! Reauthentication sub-flow: the state machine behind the elevation dialog
//! and the pure factor-composition rules. The server decides the order of
//! factors by what each `Continue` advertises; the client only answers with
//! whatever it has been given, one factor at a time.

use crate::{
    app_lib::AppError,
    features::auth::types::{AuthAllowed, AuthCredential},
};
use serde_json::Value;

/// Dialog state: `closed → opening → awaiting-factor(s) → submitting`, with
/// terminal transitions back to closed. Terminal states always close the UI
/// and clear transient factor inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ReauthFlow {
    #[default]
    Closed,
    Opening,
    AwaitingFactors(Vec<AuthAllowed>),
    Submitting,
}

impl ReauthFlow {
    /// A flow is open from the moment it starts opening until it reaches a
    /// terminal state; `request_reauth` is a no-op while this holds.
    pub fn is_open(&self) -> bool {
        !matches!(self, ReauthFlow::Closed)
    }
}

/// Factors supplied by the user in a single combined submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FactorInput {
    pub password: Option<String>,
    pub totp: Option<u32>,
    pub backup_code: Option<String>,
}

impl FactorInput {
    fn has(&self, factor: &AuthAllowed) -> bool {
        match factor {
            AuthAllowed::Password => self.password.is_some(),
            AuthAllowed::Totp => self.totp.is_some(),
            AuthAllowed::BackupCode => self.backup_code.is_some(),
            AuthAllowed::Anonymous | AuthAllowed::Passkey(_) => true,
        }
    }
}

/// What the flow should do next for one `Continue` response.
#[derive(Clone, Debug, PartialEq)]
pub enum NextStep {
    /// Submit this credential directly.
    Submit(AuthCredential),
    /// Run the local assertion ceremony with this challenge, then submit the
    /// resulting assertion.
    PasskeyCeremony(Value),
}

/// Picks the next factor to answer from what the server advertised. Prefers
/// factors the user already supplied; falls back to the passkey ceremony when
/// one is advertised; otherwise reports which supplied factor is missing.
pub fn next_step(allowed: &[AuthAllowed], input: &FactorInput) -> Result<NextStep, AppError> {
    for factor in allowed {
        if !input.has(factor) {
            continue;
        }
        match factor {
            AuthAllowed::Password => {
                let password = input.password.clone().unwrap_or_default();
                return Ok(NextStep::Submit(AuthCredential::Password(password)));
            }
            AuthAllowed::Totp => {
                let code = input.totp.unwrap_or_default();
                return Ok(NextStep::Submit(AuthCredential::Totp(code)));
            }
            AuthAllowed::BackupCode => {
                let code = input.backup_code.clone().unwrap_or_default();
                return Ok(NextStep::Submit(AuthCredential::BackupCode(code)));
            }
            AuthAllowed::Passkey(challenge) => {
                return Ok(NextStep::PasskeyCeremony(challenge.clone()));
            }
            AuthAllowed::Anonymous => {
                return Ok(NextStep::Submit(AuthCredential::Anonymous));
            }
        }
    }

    let missing = allowed
        .iter()
        .map(factor_name)
        .collect::<Vec<_>>()
        .join(" or ");
    if missing.is_empty() {
        Err(AppError::Validation(
            "The server advertised no usable factor.".to_string(),
        ))
    } else {
        Err(AppError::Validation(format!("{missing} factor required.")))
    }
}

fn factor_name(factor: &AuthAllowed) -> &'static str {
    match factor {
        AuthAllowed::Anonymous => "Anonymous",
        AuthAllowed::BackupCode => "Backup code",
        AuthAllowed::Password => "Password",
        AuthAllowed::Totp => "TOTP",
        AuthAllowed::Passkey(_) => "Passkey",
    }
}
