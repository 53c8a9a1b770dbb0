use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::config::CONNECT_TIMEOUT;
use crate::error::RemixError;

/// Shared blocking client. Only the connect phase is bounded here; callers add a
/// total timeout per request where the body is known to be small.
pub fn build_client() -> Result<Client, RemixError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("evremixes/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| RemixError::ClientBuild(err.to_string()))?,
    );
    Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|err| RemixError::ClientBuild(err.to_string()))
}

pub fn handle_status(response: Response) -> Result<Response, RemixError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response
        .status()
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    Err(RemixError::HttpStatus { status, message })
}
