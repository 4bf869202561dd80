use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered, but the envelope is not the success sentinel.
    /// Carries the server's own (code, msg) pair for diagnostics.
    #[error("server rejected request: code {code}, msg {msg:?}")]
    Contract { code: i64, msg: String },

    #[error("missing field in response: {0}")]
    MissingField(String),

    #[error("invalid response payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("client certificate error: {0}")]
    Identity(String),

    #[error("cookie store lock poisoned")]
    CookieJar,
}
