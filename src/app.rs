//! Driver flows behind the CLI actions.
//!
//! Composes the endpoint client and the session cache: a fresh login
//! overwrites the cache, the balance flow restores the cached session when
//! one exists and only falls back to an interactive login on a cache miss.
//! Every other error surfaces to `main` and ends the run.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::{Card, CardDetail};
use crate::session::{CacheError, CachedSession, SessionCache};

/// Prompt email on stdin and password without echo.
pub fn prompt_credentials() -> Result<(String, String)> {
    print!("email: ");
    io::stdout().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email)?;

    let password = rpassword::prompt_password("password: ")?;
    Ok((email.trim().to_string(), password))
}

/// Fresh login: authenticate, then overwrite the cached session with the
/// new cookies and DNI.
pub fn process_login<F>(config: &Config, cache: &SessionCache, prompt: F) -> Result<(ApiClient, String)>
where
    F: FnOnce() -> Result<(String, String)>,
{
    let (email, password) = prompt()?;

    let client = ApiClient::new(config)?;
    let account = client.login(&email, &password).context("Login failed")?;
    info!("Authenticated");

    cache
        .store(&CachedSession {
            cookies: client.export_cookies()?,
            dni: account.dni.clone(),
        })
        .context("Failed to cache session")?;

    Ok((client, account.dni))
}

/// Restore the cached session, or fall back to a fresh login when no cache
/// file exists. Any other cache failure aborts; a cached-but-stale session
/// is not detected here and will fail at the first API call instead.
pub fn get_session_or_login<F>(
    config: &Config,
    cache: &SessionCache,
    prompt: F,
) -> Result<(ApiClient, String)>
where
    F: FnOnce() -> Result<(String, String)>,
{
    match cache.load() {
        Ok(session) => {
            let client = ApiClient::with_cookies(config, session.cookies)?;
            Ok((client, session.dni))
        }
        Err(CacheError::NotFound) => process_login(config, cache, prompt),
        Err(e) => Err(e).context("Failed to load cached session"),
    }
}

/// One `"{pan}: {balance}"` line per card.
fn render_balance(cards: &[(Card, CardDetail)]) -> String {
    let mut out = String::new();
    for (card, detail) in cards {
        out.push_str(&format!("{}: {}\n", card.pan, detail.card_balance));
    }
    out
}

/// Fetch every card and its detail, and build the balance report.
fn collect_balance(client: &ApiClient, dni: &str) -> Result<String> {
    let cards = client.get_cards(dni).context("Failed to list cards")?;
    let mut detailed = Vec::with_capacity(cards.len());
    for card in cards {
        let detail = client
            .get_detail_card(&card.card_number)
            .with_context(|| format!("Failed to fetch detail for card {}", card.pan))?;
        detailed.push((card, detail));
    }
    Ok(render_balance(&detailed))
}

/// The `--balance` action: session-or-login, then print per-card balances.
pub fn process_balance<F>(config: &Config, cache: &SessionCache, prompt: F) -> Result<()>
where
    F: FnOnce() -> Result<(String, String)>,
{
    let (client, dni) = get_session_or_login(config, cache, prompt)?;
    let report = collect_balance(&client, &dni)?;
    print!("{}", report);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config(base_url: &str) -> Config {
        Config {
            base_url: base_url.to_string(),
            ..Config::default()
        }
    }

    fn ok_envelope(response: serde_json::Value) -> String {
        json!({"code": 100, "msg": "OK", "response": response}).to_string()
    }

    fn login_mock(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("POST", "/en/v3/connect/login")
            .with_header("set-cookie", "JSESSIONID=abc123; Path=/")
            .with_body(ok_envelope(json!({"dni": "123456789"})))
            .expect(1)
            .create()
    }

    #[test]
    fn test_process_login_stores_session() {
        let mut server = mockito::Server::new();
        let mock = login_mock(&mut server);
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().to_path_buf());

        let (_, dni) = process_login(&test_config(&server.url()), &cache, || {
            Ok(("foo@bar.com".to_string(), "password".to_string()))
        })
        .unwrap();

        mock.assert();
        assert_eq!(dni, "123456789");
        let cached = cache.load().unwrap();
        assert_eq!(cached.dni, "123456789");
        assert!(!cached.cookies.is_empty());
    }

    #[test]
    fn test_session_or_login_falls_back_once_then_hits_cache() {
        let mut server = mockito::Server::new();
        let mock = login_mock(&mut server);
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().to_path_buf());
        let config = test_config(&server.url());

        // Cache miss: login exactly once
        let mut prompted = 0;
        let (_, dni) = get_session_or_login(&config, &cache, || {
            prompted += 1;
            Ok(("foo@bar.com".to_string(), "password".to_string()))
        })
        .unwrap();
        assert_eq!(prompted, 1);
        assert_eq!(dni, "123456789");
        mock.assert();

        // Cache hit: no prompt, no further login request
        let (_, dni) = get_session_or_login(&config, &cache, || {
            panic!("prompt must not run on cache hit")
        })
        .unwrap();
        assert_eq!(dni, "123456789");
        mock.assert();
    }

    #[test]
    fn test_session_or_login_corrupt_cache_aborts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session.json"), "not json").unwrap();
        let cache = SessionCache::new(dir.path().to_path_buf());

        let result = get_session_or_login(&Config::default(), &cache, || {
            panic!("prompt must not run on corrupt cache")
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_render_balance_format() {
        let card: Card = serde_json::from_value(json!({
            "pan": "123456******1234",
            "cardNumber": "0123456789012345",
        }))
        .unwrap();
        let detail: CardDetail = serde_json::from_value(json!({"cardBalance": 12.34})).unwrap();

        assert_eq!(render_balance(&[(card, detail)]), "123456******1234: 12.34\n");
        assert_eq!(render_balance(&[]), "");
    }

    #[test]
    fn test_balance_end_to_end() {
        let mut server = mockito::Server::new();
        login_mock(&mut server);
        server
            .mock("POST", "/en/v3/card/getCards")
            .with_body(ok_envelope(json!({
                "listCard": [
                    {"pan": "123456******1234", "cardNumber": "0123456789012345"}
                ]
            })))
            .create();
        server
            .mock("POST", "/en/v2/card/getDetailCard")
            .with_body(ok_envelope(json!({"cardDetail": {"cardBalance": 12.34}})))
            .create();

        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().to_path_buf());
        let config = test_config(&server.url());

        let (client, dni) = get_session_or_login(&config, &cache, || {
            Ok(("foo@bar.com".to_string(), "password".to_string()))
        })
        .unwrap();

        let report = collect_balance(&client, &dni).unwrap();
        assert_eq!(report, "123456******1234: 12.34\n");
    }
}
