//! Server metadata endpoints

use log::debug;

use crate::SonarError;
use crate::client::Transport;

/// Fetch the server version string from `api/server/version`.
///
/// The endpoint answers with plain text such as `8.0.0.46315`; surrounding whitespace
/// is trimmed.
///
/// # Errors
///
/// Returns the transport error for a failed request, or
/// [`SonarError::InvalidResponse`] if the body is blank or spans several lines.
pub async fn server_version<T: Transport>(transport: &T) -> Result<String, SonarError> {
    let body = transport.get_text("server/version").await?;
    let version = body.trim();

    if version.is_empty() {
        return Err(SonarError::InvalidResponse(
            "server/version returned an empty body".to_string(),
        ));
    }
    if version.contains(['\n', '\r']) {
        return Err(SonarError::InvalidResponse(format!(
            "server/version returned more than a version string: {}",
            crate::truncate_response(version)
        )));
    }

    debug!("Server version: {version}");
    Ok(version.to_string())
}
