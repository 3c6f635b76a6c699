//! Canned HTML error responses.
//!
//! # Responsibilities
//! - Render complete error responses for the status codes the worker can
//!   emit: 400, 403, 404, 500, 501, 505
//! - Write them to the client channel

use std::time::SystemTime;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::HttpError;

fn reason_phrase(status: u16) -> Result<&'static str, HttpError> {
    match status {
        400 => Ok("Bad Request"),
        403 => Ok("Forbidden"),
        404 => Ok("Not Found"),
        500 => Ok("Internal Server Error"),
        501 => Ok("Not Implemented"),
        505 => Ok("HTTP Version Not Supported"),
        other => Err(HttpError::UnsupportedStatus(other)),
    }
}

/// Render a complete HTTP error response for a supported status code.
pub fn render(status: u16) -> Result<Vec<u8>, HttpError> {
    let reason = reason_phrase(status)?;
    let body = format!(
        "<HTML><HEAD><TITLE>{status} {reason}</TITLE></HEAD>\n\
         <BODY><H1>{status} {reason}</H1>\n</BODY></HTML>"
    );
    let date = httpdate::fmt_http_date(SystemTime::now());
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Length: {}\r\n\
         Connection: keep-alive\r\n\
         Content-Type: text/html\r\n\
         Date: {date}\r\n\r\n{body}",
        body.len()
    );
    Ok(response.into_bytes())
}

/// Render and send an error response, best effort.
///
/// Write failures are logged and swallowed; the connection is about to be
/// closed either way.
pub async fn send<W>(client: &mut W, status: u16)
where
    W: AsyncWrite + Unpin,
{
    match render(status) {
        Ok(response) => {
            if let Err(e) = client.write_all(&response).await {
                tracing::debug!(status, error = %e, "Failed to deliver error response");
            }
        }
        Err(e) => {
            tracing::error!(status, error = %e, "Refusing to render error response");
        }
    }
}
