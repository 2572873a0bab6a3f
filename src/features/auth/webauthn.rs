//! Browser credential-API boundary for passkeys. The negotiation and
//! credential-update flows only pass opaque challenge/response payloads
//! through; this module is the single place that converts between the
//! server's JSON challenge options and the binary-oriented WebAuthn types.
//!
//! ### Flow Overview
//! 1. **Preparation**: Unwraps the server's `publicKey` options and decodes
//!    Base64URL fields (challenges, user IDs, credential IDs) into binary
//!    buffers.
//! 2. **Interaction**: Calls `navigator.credentials.create` (enrollment) or
//!    `.get` (assertion), triggering the browser's passkey dialog.
//! 3. **Finalization**: Encodes the authenticator's binary response back to
//!    Base64URL as a JSON-serializable structure for the server.

use crate::app_lib::AppError;
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use js_sys::{Array, Object, Reflect, Uint8Array};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AuthenticatorAssertionResponse, AuthenticatorAttestationResponse, CredentialCreationOptions,
    CredentialRequestOptions, PublicKeyCredential,
};

/// Runs the key-creation ceremony for passkey enrollment and returns the
/// attestation as an opaque JSON payload.
pub async fn register_key(challenge: &Value) -> Result<Value, AppError> {
    let options = public_key_options(challenge);
    let js_options = Object::new();

    set_buffer(&js_options, "challenge", required_str(options, "challenge")?)?;
    if let Some(user) = options.get("user") {
        let js_user = Object::new();
        set_str(&js_user, "name", user["name"].as_str());
        set_str(&js_user, "displayName", user["displayName"].as_str());
        if let Some(id) = user["id"].as_str() {
            set_buffer(&js_user, "id", id)?;
        }
        set_value(&js_options, "user", &js_user);
    }
    if let Some(rp) = options.get("rp") {
        let js_rp = Object::new();
        set_str(&js_rp, "name", rp["name"].as_str());
        set_str(&js_rp, "id", rp["id"].as_str());
        set_value(&js_options, "rp", &js_rp);
    }
    if let Some(params) = options["pubKeyCredParams"].as_array() {
        let js_params = Array::new();
        for param in params {
            let js_param = Object::new();
            if let Some(alg) = param["alg"].as_i64() {
                set_value(&js_param, "alg", &JsValue::from_f64(alg as f64));
            }
            set_str(&js_param, "type", param["type"].as_str());
            js_params.push(&js_param);
        }
        set_value(&js_options, "pubKeyCredParams", &js_params);
    }
    if let Some(timeout) = options["timeout"].as_u64() {
        set_value(&js_options, "timeout", &JsValue::from_f64(timeout as f64));
    }
    set_str(&js_options, "attestation", options["attestation"].as_str());
    if let Some(selection) = options.get("authenticatorSelection") {
        let js_selection = Object::new();
        set_str(
            &js_selection,
            "authenticatorAttachment",
            selection["authenticatorAttachment"].as_str(),
        );
        if let Some(flag) = selection["requireResidentKey"].as_bool() {
            set_value(&js_selection, "requireResidentKey", &JsValue::from_bool(flag));
        }
        set_str(&js_selection, "residentKey", selection["residentKey"].as_str());
        set_str(
            &js_selection,
            "userVerification",
            selection["userVerification"].as_str(),
        );
        set_value(&js_options, "authenticatorSelection", &js_selection);
    }
    if let Some(excludes) = options["excludeCredentials"].as_array() {
        set_value(
            &js_options,
            "excludeCredentials",
            &descriptor_list(excludes)?,
        );
    }
    if let Some(extensions) = options.get("extensions") {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        if let Ok(js_ext) = extensions.serialize(&serializer) {
            set_value(&js_options, "extensions", &js_ext);
        }
    }

    let create_options = wrap_public_key(&js_options)?.unchecked_into::<CredentialCreationOptions>();
    let promise = credentials_container()?
        .create_with_options(&create_options)
        .map_err(|e| AppError::Config(format!("Passkey creation failed: {e:?}")))?;

    let result = JsFuture::from(promise).await.map_err(|e| {
        let err_str = format!("{e:?}");
        if err_str.contains("InvalidStateError") {
            AppError::Config("This passkey is already registered.".to_string())
        } else {
            ceremony_error("Passkey registration failed", &err_str)
        }
    })?;

    let credential = cast_credential(result)?;
    let raw_id = encode_buffer(credential.raw_id());
    let response = credential
        .response()
        .dyn_into::<AuthenticatorAttestationResponse>()
        .map_err(|_| AppError::Config("Invalid response type".into()))?;

    Ok(serde_json::json!({
        "id": credential.id(),
        "rawId": raw_id,
        "type": credential.type_(),
        "response": {
            "attestationObject": encode_buffer(response.attestation_object()),
            "clientDataJSON": encode_buffer(response.client_data_json()),
        }
    }))
}

/// Runs the assertion ceremony against an existing passkey and returns the
/// assertion as an opaque JSON payload.
pub async fn authenticate_key(challenge: &Value) -> Result<Value, AppError> {
    let options = public_key_options(challenge);
    let js_options = Object::new();

    set_buffer(&js_options, "challenge", required_str(options, "challenge")?)?;
    if let Some(timeout) = options["timeout"].as_u64() {
        set_value(&js_options, "timeout", &JsValue::from_f64(timeout as f64));
    }
    set_str(&js_options, "rpId", options["rpId"].as_str());
    if let Some(allow) = options["allowCredentials"].as_array() {
        set_value(&js_options, "allowCredentials", &descriptor_list(allow)?);
    }
    set_str(
        &js_options,
        "userVerification",
        options["userVerification"].as_str(),
    );

    let get_options = wrap_public_key(&js_options)?.unchecked_into::<CredentialRequestOptions>();
    let promise = credentials_container()?
        .get_with_options(&get_options)
        .map_err(|e| AppError::Config(format!("Passkey assertion failed: {e:?}")))?;

    let result = JsFuture::from(promise)
        .await
        .map_err(|e| ceremony_error("Passkey authentication failed", &format!("{e:?}")))?;

    let credential = cast_credential(result)?;
    let raw_id = encode_buffer(credential.raw_id());
    let response = credential
        .response()
        .dyn_into::<AuthenticatorAssertionResponse>()
        .map_err(|_| AppError::Config("Invalid response type".into()))?;

    Ok(serde_json::json!({
        "id": credential.id(),
        "rawId": raw_id,
        "type": credential.type_(),
        "response": {
            "authenticatorData": encode_buffer(response.authenticator_data()),
            "clientDataJSON": encode_buffer(response.client_data_json()),
            "signature": encode_buffer(response.signature()),
            "userHandle": response.user_handle().map(encode_buffer),
        }
    }))
}

/// Some servers wrap the options in `publicKey`, some send them bare.
fn public_key_options(challenge: &Value) -> &Value {
    challenge.get("publicKey").unwrap_or(challenge)
}

fn credentials_container() -> Result<web_sys::CredentialsContainer, AppError> {
    let window = web_sys::window().ok_or_else(|| AppError::Config("Window not found".into()))?;
    Ok(window.navigator().credentials())
}

fn wrap_public_key(js_options: &Object) -> Result<Object, AppError> {
    let wrapper = Object::new();
    Reflect::set(&wrapper, &"publicKey".into(), js_options)
        .map_err(|_| AppError::Config("Failed to set publicKey".into()))?;
    Ok(wrapper)
}

fn cast_credential(result: JsValue) -> Result<PublicKeyCredential, AppError> {
    result
        .dyn_into::<PublicKeyCredential>()
        .map_err(|_| AppError::Config("Invalid credential type".into()))
}

fn ceremony_error(prefix: &str, detail: &str) -> AppError {
    if detail.contains("NotAllowedError") {
        AppError::Config("Operation timed out or was cancelled.".to_string())
    } else {
        AppError::Config(format!("{prefix}: {detail}"))
    }
}

fn required_str<'a>(options: &'a Value, key: &str) -> Result<&'a str, AppError> {
    options[key]
        .as_str()
        .ok_or_else(|| AppError::Config(format!("Missing {key}")))
}

fn set_str(target: &Object, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        Reflect::set(target, &key.into(), &value.into()).ok();
    }
}

fn set_value(target: &Object, key: &str, value: &JsValue) {
    Reflect::set(target, &key.into(), value).ok();
}

fn set_buffer(target: &Object, key: &str, b64: &str) -> Result<(), AppError> {
    let buffer = decode_base64(b64)?;
    Reflect::set(target, &key.into(), &buffer)
        .map_err(|_| AppError::Config(format!("Failed to set {key}")))?;
    Ok(())
}

/// Converts a credential descriptor list (`allowCredentials` /
/// `excludeCredentials`), decoding each id into a buffer.
fn descriptor_list(descriptors: &[Value]) -> Result<Array, AppError> {
    let js_list = Array::new();
    for descriptor in descriptors {
        let js_descriptor = Object::new();
        set_str(&js_descriptor, "type", descriptor["type"].as_str());
        if let Some(id) = descriptor["id"].as_str() {
            set_buffer(&js_descriptor, "id", id)?;
        }
        if let Some(transports) = descriptor["transports"].as_array() {
            let js_transports = Array::new();
            for transport in transports {
                if let Some(name) = transport.as_str() {
                    js_transports.push(&name.into());
                }
            }
            set_value(&js_descriptor, "transports", &js_transports);
        }
        js_list.push(&js_descriptor);
    }
    Ok(js_list)
}

fn decode_base64(b64: &str) -> Result<Uint8Array, AppError> {
    // URL-safe first, then standard; servers commonly emit unpadded URL-safe.
    let bytes = URL_SAFE_NO_PAD
        .decode(b64)
        .or_else(|_| STANDARD.decode(b64))
        .map_err(|e| AppError::Config(format!("Invalid base64: {e}")))?;
    Ok(Uint8Array::from(&bytes[..]))
}

fn encode_buffer(buffer: js_sys::ArrayBuffer) -> String {
    let bytes = Uint8Array::new(&buffer).to_vec();
    URL_SAFE_NO_PAD.encode(&bytes)
}
