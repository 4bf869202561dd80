//! Endpoint client for the MySodexo card service.
//!
//! Every operation is one JSON POST against `{base_url}/{lang}/{endpoint}`.
//! The server wraps all payloads in a `{code, msg, response}` envelope; a
//! call only succeeds when the envelope carries the OK sentinel.

use std::sync::Arc;
use std::time::Duration;

use cookie_store::{Cookie, CookieStore};
use reqwest::blocking::Client;
use reqwest::header;
use reqwest_cookie_store::CookieStoreMutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::models::{AccountInfo, Card, CardDetail};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Envelope code the server sends on success.
const JSON_RESPONSE_OK_CODE: i64 = 100;

/// Envelope msg the server sends on success.
const JSON_RESPONSE_OK_MSG: &str = "OK";

const LOGIN_ENDPOINT: &str = "v3/connect/login";
const LOGIN_FROM_SESSION_ENDPOINT: &str = "v3/connect/loginFromSession";
const GET_CARDS_ENDPOINT: &str = "v3/card/getCards";
const GET_DETAIL_CARD_ENDPOINT: &str = "v2/card/getDetailCard";
const GET_CLEAR_PIN_ENDPOINT: &str = "v1/card/getClearPin";

/// Uniform success/failure wrapper the server puts around every payload.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    msg: String,
    #[serde(default)]
    response: Option<Value>,
}

/// Build the fully-qualified URL for an endpoint.
/// Leading slashes on the endpoint are stripped so both `"v3/x"` and
/// `"/v3/x"` resolve to the same URL.
pub(crate) fn full_endpoint_url(base_url: &str, lang: &str, endpoint: &str) -> String {
    format!("{}/{}/{}", base_url, lang, endpoint.trim_start_matches('/'))
}

/// Validate the response envelope against the success sentinel.
/// Anything other than (100, "OK") is a contract violation; the server's
/// pair is preserved in the error.
fn check_envelope(envelope: &Envelope) -> Result<(), ApiError> {
    if envelope.code != JSON_RESPONSE_OK_CODE || envelope.msg != JSON_RESPONSE_OK_MSG {
        return Err(ApiError::Contract {
            code: envelope.code,
            msg: envelope.msg.clone(),
        });
    }
    Ok(())
}

/// API client for the card service.
/// Owns the cookie store so a login's session cookies can be exported for
/// caching and restored on later invocations.
pub struct ApiClient {
    client: Client,
    cookies: Arc<CookieStoreMutex>,
    base_url: String,
    lang: String,
    device_uid: String,
    os: i64,
}

impl ApiClient {
    /// Create a client with an empty cookie jar (fresh-login path).
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Self::with_cookie_store(config, CookieStore::default())
    }

    /// Create a client seeded with previously cached cookies.
    pub fn with_cookies(config: &Config, cookies: Vec<Cookie<'static>>) -> Result<Self, ApiError> {
        let store =
            CookieStore::from_cookies(cookies.into_iter().map(Ok::<_, serde_json::Error>), false)?;
        Self::with_cookie_store(config, store)
    }

    fn with_cookie_store(config: &Config, store: CookieStore) -> Result<Self, ApiError> {
        let cookies = Arc::new(CookieStoreMutex::new(store));

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_provider(Arc::clone(&cookies));

        // The service requires a client certificate on every call; attach it
        // when the config points at one.
        if let (Some(cert), Some(key)) = (&config.client_cert, &config.client_key) {
            let mut pem = std::fs::read(cert)
                .map_err(|e| ApiError::Identity(format!("{}: {}", cert.display(), e)))?;
            pem.extend(
                std::fs::read(key)
                    .map_err(|e| ApiError::Identity(format!("{}: {}", key.display(), e)))?,
            );
            builder = builder.identity(reqwest::Identity::from_pem(&pem)?);
        }

        Ok(Self {
            client: builder.build()?,
            cookies,
            base_url: config.base_url.clone(),
            lang: config.lang.clone(),
            device_uid: config.device_uid.clone(),
            os: config.os,
        })
    }

    /// Snapshot the unexpired cookies for persistence.
    pub fn export_cookies(&self) -> Result<Vec<Cookie<'static>>, ApiError> {
        let store = self.cookies.lock().map_err(|_| ApiError::CookieJar)?;
        Ok(store.iter_unexpired().cloned().collect())
    }

    /// POST `body` to `endpoint` and return the envelope's `response` object.
    fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        let url = full_endpoint_url(&self.base_url, &self.lang, endpoint);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()?;

        let envelope: Envelope = response.json()?;
        check_envelope(&envelope)?;

        envelope
            .response
            .ok_or_else(|| ApiError::MissingField("response".to_string()))
    }

    /// Take `key` out of a `response` object, erroring if it is absent.
    fn take_field(mut response: Value, key: &str) -> Result<Value, ApiError> {
        response
            .get_mut(key)
            .map(Value::take)
            .ok_or_else(|| ApiError::MissingField(key.to_string()))
    }

    // ===== Operations =====

    /// Login with credentials. Session cookies land in the cookie store as a
    /// side effect; the returned account info carries the DNI that keys all
    /// card listings.
    pub fn login(&self, email: &str, password: &str) -> Result<AccountInfo, ApiError> {
        let body = json!({
            "username": email,
            "pass": password,
            "deviceUid": self.device_uid,
            "os": self.os,
        });
        let response = self.post(LOGIN_ENDPOINT, &body)?;
        Ok(serde_json::from_value(response)?)
    }

    /// Re-login using the cookies already in the store.
    #[allow(dead_code)] // not wired to a CLI action yet
    pub fn login_from_session(&self) -> Result<AccountInfo, ApiError> {
        let response = self.post(LOGIN_FROM_SESSION_ENDPOINT, &json!({}))?;
        Ok(serde_json::from_value(response)?)
    }

    /// List the cards registered for `dni`.
    pub fn get_cards(&self, dni: &str) -> Result<Vec<Card>, ApiError> {
        let response = self.post(GET_CARDS_ENDPOINT, &json!({ "dni": dni }))?;
        let list = Self::take_field(response, "listCard")?;
        Ok(serde_json::from_value(list)?)
    }

    /// Fetch balance and other details for one card.
    pub fn get_detail_card(&self, card_number: &str) -> Result<CardDetail, ApiError> {
        let response = self.post(GET_DETAIL_CARD_ENDPOINT, &json!({ "cardNumber": card_number }))?;
        let detail = Self::take_field(response, "cardDetail")?;
        Ok(serde_json::from_value(detail)?)
    }

    /// Fetch the unmasked PIN for one card. Never persisted.
    #[allow(dead_code)] // not wired to a CLI action yet
    pub fn get_clear_pin(&self, card_number: &str) -> Result<String, ApiError> {
        let response = self.post(GET_CLEAR_PIN_ENDPOINT, &json!({ "cardNumber": card_number }))?;
        let clear_pin = Self::take_field(response, "clearPin")?;
        let pin = Self::take_field(clear_pin, "pin")
            .map_err(|_| ApiError::MissingField("clearPin.pin".to_string()))?;
        Ok(serde_json::from_value(pin)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
