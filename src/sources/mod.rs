pub mod error;
pub mod historical;
pub mod live;

use crate::sources::error::ConnectionError;
use log::warn;
use reqwest::{RequestBuilder, Response};

/// Sends `request` once and turns transport failures and non-success statuses
/// into [`ConnectionError`]s. `url` is only used for reporting.
pub(crate) async fn send_checked(
    request: RequestBuilder,
    url: &str,
) -> Result<Response, ConnectionError> {
    let response = request
        .send()
        .await
        .map_err(|e| ConnectionError::NetworkRequest(url.to_string(), e))?;

    match response.error_for_status() {
        Ok(resp) => Ok(resp),
        Err(e) => {
            warn!("HTTP error for {}: {:?}", url, e);
            Err(if let Some(status) = e.status() {
                ConnectionError::HttpStatus {
                    url: url.to_string(),
                    status,
                    source: e,
                }
            } else {
                ConnectionError::NetworkRequest(url.to_string(), e)
            })
        }
    }
}
