//! Shared HTTP agent and bounded response helpers.

use std::io::Read;
use std::time::Duration;

use crate::error::LlmError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest body accepted from any remote endpoint.
pub(crate) const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Build an agent with a fixed connect timeout and the given read timeout.
pub(crate) fn agent(read_timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout_read(read_timeout)
        .timeout_write(read_timeout)
        .build()
}

/// Download a resource as text, mapping failures onto [`LlmError`] kinds.
pub(crate) fn fetch_text(agent: &ureq::Agent, url: &str) -> Result<String, LlmError> {
    log::debug!("GET {url}");
    match agent.get(url).call() {
        Ok(response) => read_body_limited(response, MAX_RESPONSE_BYTES),
        Err(ureq::Error::Status(code, response)) => {
            let body = read_body_limited(response, 64 * 1024).unwrap_or_default();
            Err(map_status(code, body))
        }
        Err(ureq::Error::Transport(err)) => Err(LlmError::Transport(err.to_string())),
    }
}

pub(crate) fn map_status(code: u16, body: String) -> LlmError {
    match code {
        401 | 403 => LlmError::Unauthorized(code),
        429 => LlmError::RateLimited,
        _ => LlmError::Server { status: code, body },
    }
}

/// Read a response body as UTF-8, refusing bodies over `max_bytes`.
pub(crate) fn read_body_limited(response: ureq::Response, max_bytes: usize) -> Result<String, LlmError> {
    let mut limited = response.into_reader().take(max_bytes as u64 + 1);
    let mut bytes = Vec::new();
    limited
        .read_to_end(&mut bytes)
        .map_err(|e| LlmError::Transport(e.to_string()))?;
    if bytes.len() > max_bytes {
        return Err(LlmError::MalformedResponse(format!(
            "Response exceeded {max_bytes} bytes"
        )));
    }
    String::from_utf8(bytes).map_err(|e| LlmError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve one canned HTTP response; the raw request is sent on the channel.
    pub(crate) fn serve_once(response: String) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 8192];
                loop {
                    let n = stream.read(&mut buf).unwrap_or(0);
                    request.extend_from_slice(&buf[..n]);
                    if n == 0 || request_complete(&request) {
                        break;
                    }
                }
                let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (format!("http://{}", addr), rx)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..split]
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case("content-length")
                    .then(|| v.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= split + 4 + length
    }

    pub(crate) fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }
}
