//! TOTP provisioning material: the secret the server generated and its
//! derived `otpauth://` URI and QR rendering for the enrollment dialog. The
//! secret is display-only here; verification happens server-side.

use crate::app_lib::AppError;
use qrcode::{QrCode, render::svg};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TotpAlgo {
    Sha1,
    Sha256,
    Sha512,
}

impl TotpAlgo {
    fn uri_name(self) -> &'static str {
        match self {
            TotpAlgo::Sha1 => "SHA1",
            TotpAlgo::Sha256 => "SHA256",
            TotpAlgo::Sha512 => "SHA512",
        }
    }
}

/// Secret as returned inside the `TotpCheck` registration state.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TotpSecret {
    pub accountname: String,
    pub issuer: String,
    /// Base32-encoded shared secret.
    pub secret: String,
    pub algo: TotpAlgo,
    pub step: u64,
    pub digits: u8,
}

impl TotpSecret {
    /// Provisioning URI in the form authenticator apps import.
    pub fn to_uri(&self) -> String {
        let issuer = urlencoding::encode(&self.issuer);
        let account = urlencoding::encode(&self.accountname);
        format!(
            "otpauth://totp/{issuer}:{account}?secret={secret}&issuer={issuer}&algorithm={algo}&digits={digits}&period={step}",
            secret = self.secret,
            algo = self.algo.uri_name(),
            digits = self.digits,
            step = self.step,
        )
    }

    /// Renders the provisioning URI as an inline SVG for the dialog.
    pub fn to_qr_svg(&self) -> Result<String, AppError> {
        let code = QrCode::new(self.to_uri().as_bytes())
            .map_err(|e| AppError::Parse(format!("Failed to encode QR: {e}")))?;
        Ok(code
            .render::<svg::Color>()
            .min_dimensions(200, 200)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::{TotpAlgo, TotpSecret};

    fn secret() -> TotpSecret {
        TotpSecret {
            accountname: "alice".to_string(),
            issuer: "idm example".to_string(),
            secret: "JBSWY3DPEHPK3PXP".to_string(),
            algo: TotpAlgo::Sha256,
            step: 30,
            digits: 6,
        }
    }

    #[test]
    fn provisioning_uri_carries_every_parameter() {
        let uri = secret().to_uri();
        assert!(uri.starts_with("otpauth://totp/idm%20example:alice?"));
        assert!(uri.contains("secret=JBSWY3DPEHPK3PXP"));
        assert!(uri.contains("issuer=idm%20example"));
        assert!(uri.contains("algorithm=SHA256"));
        assert!(uri.contains("digits=6"));
        assert!(uri.contains("period=30"));
    }

    #[test]
    fn qr_rendering_produces_svg() {
        let svg = secret().to_qr_svg().expect("render");
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn wire_algo_names_are_lowercase() {
        let parsed: TotpSecret = serde_json::from_value(serde_json::json!({
            "accountname": "alice",
            "issuer": "idm example",
            "secret": "JBSWY3DPEHPK3PXP",
            "algo": "sha1",
            "step": 30,
            "digits": 6
        }))
        .expect("deserialize");
        assert_eq!(parsed.algo, TotpAlgo::Sha1);
    }
}
