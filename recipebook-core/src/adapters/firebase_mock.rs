//! Mock Firebase server for testing
//!
//! Simulates the two remote collaborators so the clients can be exercised
//! end to end without real credentials:
//! - POST /accounts:signUp?key=... and POST /accounts:signInWithPassword?key=...
//!   return an auth response, or `{ error: { code, message } }`
//! - GET /recipes.json?auth=... returns the stored document (`null` when empty)
//! - PUT /recipes.json?auth=... overwrites the stored document
//!
//! API keys must start with `test_`; recipe requests need an `auth` token
//! starting with `mock_`.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;

/// Mock Firebase server for testing
pub struct MockFirebaseServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<MockState>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for mock behaviour
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Provider error code returned by both auth endpoints
    pub auth_error: Option<String>,
    /// Token lifetime reported in `expiresIn`
    pub expires_in_secs: u64,
    /// Whether PUT requests fail with HTTP 500
    pub fail_store: bool,
    /// Initial recipe document
    pub document: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            auth_error: None,
            expires_in_secs: 3600,
            fail_store: false,
            document: None,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    document: Mutex<Option<String>>,
    last_auth: Mutex<Option<String>>,
    requests: AtomicUsize,
}

struct MockRequest {
    method: String,
    path: String,
    query: Vec<(String, String)>,
    body: String,
}

impl MockRequest {
    fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl MockFirebaseServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(MockState {
            document: Mutex::new(config.document.clone()),
            ..MockState::default()
        });

        // Non-blocking so the accept loop can notice shutdown
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let state_clone = state.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let state = state_clone.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &cfg, &state);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    /// Base URL of the identity endpoints
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// URL of the recipe document
    pub fn recipes_url(&self) -> String {
        format!("http://127.0.0.1:{}/recipes.json", self.port)
    }

    /// Raw stored document
    pub fn document(&self) -> Option<String> {
        self.state.document.lock().ok().and_then(|d| d.clone())
    }

    /// `auth` query parameter of the last recipe request
    pub fn last_auth_param(&self) -> Option<String> {
        self.state.last_auth.lock().ok().and_then(|a| a.clone())
    }

    /// Number of requests handled so far
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockFirebaseServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_request(stream: &TcpStream) -> Option<MockRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;

    let url = url::Url::parse(&format!("http://localhost{}", target)).ok()?;
    Some(MockRequest {
        method,
        path: url.path().to_string(),
        query: url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, state: &MockState) {
    let _ = stream.set_nonblocking(false);
    let request = match read_request(&stream) {
        Some(r) => r,
        None => {
            send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
            return;
        }
    };
    state.requests.fetch_add(1, Ordering::SeqCst);

    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/accounts:signUp") | ("POST", "/accounts:signInWithPassword") => {
            handle_auth(&mut stream, &request, config)
        }
        ("GET", "/recipes.json") | ("PUT", "/recipes.json") => {
            handle_recipes(&mut stream, &request, config, state)
        }
        _ => send_response(&mut stream, 404, "Not Found", r#"{"error": "Not found"}"#),
    }
}

fn handle_auth(stream: &mut TcpStream, request: &MockRequest, config: &MockConfig) {
    let key_valid = request.param("key").is_some_and(|k| k.starts_with("test_"));
    if !key_valid {
        let body = json!({"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}});
        send_response(stream, 400, "Bad Request", &body.to_string());
        return;
    }

    if let Some(code) = &config.auth_error {
        let body = json!({"error": {"code": 400, "message": code, "errors": [{"message": code}]}});
        send_response(stream, 400, "Bad Request", &body.to_string());
        return;
    }

    let payload: serde_json::Value = serde_json::from_str(&request.body).unwrap_or_default();
    let email = payload["email"].as_str().unwrap_or_default();
    let local_id = format!("uid-{}", email.split('@').next().unwrap_or("user"));

    let mut body = json!({
        "idToken": format!("mock_{}", local_id),
        "email": email,
        "refreshToken": "refresh-token",
        "expiresIn": config.expires_in_secs.to_string(),
        "localId": local_id,
    });
    if request.path.ends_with("signInWithPassword") {
        body["registered"] = json!(true);
    }
    send_response(stream, 200, "OK", &body.to_string());
}

fn handle_recipes(stream: &mut TcpStream, request: &MockRequest, config: &MockConfig, state: &MockState) {
    let auth = request.param("auth").map(str::to_string);
    if let Ok(mut last) = state.last_auth.lock() {
        *last = auth.clone();
    }
    if !auth.is_some_and(|a| a.starts_with("mock_")) {
        send_response(stream, 401, "Unauthorized", r#"{"error": "Permission denied"}"#);
        return;
    }

    if request.method == "PUT" {
        if config.fail_store {
            send_response(stream, 500, "Internal Server Error", r#"{"error": "Internal error"}"#);
            return;
        }
        if let Ok(mut document) = state.document.lock() {
            *document = Some(request.body.clone());
        }
        send_response(stream, 200, "OK", &request.body);
    } else {
        let document = state
            .document
            .lock()
            .ok()
            .and_then(|d| d.clone())
            .unwrap_or_else(|| "null".to_string());
        send_response(stream, 200, "OK", &document);
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_starts_and_stops() {
        let mut server = MockFirebaseServer::start(MockConfig::default()).unwrap();
        assert!(server.base_url().starts_with("http://127.0.0.1:"));
        assert!(server.document().is_none());
        server.stop();
    }
}
