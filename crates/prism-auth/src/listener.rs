//! One-shot authorization redirect listener
//!
//! Serves exactly one request on the redirect port, answers the browser,
//! and hands the `code` query parameter back to the authenticator.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use tokio::sync::oneshot;
use url::Url;

use crate::{AuthError, Result};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const READ_TIMEOUT: Duration = Duration::from_secs(5);

const SUCCESS_BODY: &str = "Authorization successful. You can close this window.";
const FAILURE_BODY: &str = "Authorization failed. Please close this window and try again.";

/// Block until the provider redirects back with a `code` parameter, or the
/// timeout elapses. The accept loop runs on a blocking thread and exits as
/// soon as the caller gives up.
pub(crate) async fn wait_for_code(port: u16, timeout: Duration) -> Result<String> {
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    listener.set_nonblocking(true)?;

    let (tx, rx) = oneshot::channel();
    tokio::task::spawn_blocking(move || serve_one(listener, tx));

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(code)) => Ok(code),
        // The request arrived but carried no code.
        Ok(Err(_)) => Err(AuthError::NoCode),
        Err(_) => Err(AuthError::ListenerTimeout),
    }
}

fn serve_one(listener: TcpListener, tx: oneshot::Sender<String>) {
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                handle_request(stream, tx);
                return;
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if tx.is_closed() {
                    // Caller timed out; stop listening.
                    return;
                }
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redirect listener accept failed");
                return;
            }
        }
    }
}

fn handle_request(mut stream: TcpStream, tx: oneshot::Sender<String>) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(READ_TIMEOUT));

    let mut buf = [0u8; 4096];
    let read = stream.read(&mut buf).unwrap_or(0);
    let request = String::from_utf8_lossy(&buf[..read]);

    match extract_code(&request) {
        Some(code) => {
            let _ = write_response(&mut stream, "200 OK", SUCCESS_BODY);
            let _ = tx.send(code);
        }
        None => {
            // Dropping tx reports the missing code to the caller.
            let _ = write_response(&mut stream, "400 Bad Request", FAILURE_BODY);
        }
    }
}

fn write_response(stream: &mut TcpStream, status: &str, body: &str) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes())
}

/// Pull the `code` query parameter out of a raw HTTP request.
fn extract_code(request: &str) -> Option<String> {
    let request_line = request.lines().next()?;
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let path = parts.next()?;

    let full = format!("http://localhost{path}");
    let parsed = Url::parse(&full).ok()?;
    parsed
        .query_pairs()
        .find_map(|(key, value)| (key == "code").then(|| value.into_owned()))
}
