//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves fixed bodies by path and 404 for anything else. A route can also
//! advertise more bytes than it sends and then drop the connection. Counts requests per
//! path, records request headers, can delay every response, and tracks the
//! peak number of requests being handled at the same time.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct State {
    routes: Mutex<HashMap<String, Vec<u8>>>,
    /// path -> (advertised Content-Length, bytes actually sent)
    truncated: Mutex<HashMap<String, (usize, Vec<u8>)>>,
    hits: Mutex<HashMap<String, usize>>,
    headers: Mutex<Vec<Vec<(String, String)>>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

/// Handle to a running server. The server lives until the process exits.
#[derive(Clone)]
pub struct ArchiveServer {
    base: String,
    delay: Duration,
    state: Arc<State>,
}

impl ArchiveServer {
    pub fn start() -> Self {
        Self::start_with_delay(Duration::ZERO)
    }

    /// Every response is held back by `delay` before it is written.
    pub fn start_with_delay(delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(State::default());
        let server = ArchiveServer {
            base: format!("http://127.0.0.1:{}", port),
            delay,
            state,
        };
        let accept = server.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let conn = accept.clone();
                thread::spawn(move || conn.handle(stream));
            }
        });
        server
    }

    /// Serves `body` at `path` (must start with '/'); returns the full URL.
    pub fn serve(&self, path: &str, body: Vec<u8>) -> String {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), body);
        self.url(path)
    }

    /// Advertises `advertised` bytes at `path`, sends only `body`, then closes.
    pub fn serve_truncated(&self, path: &str, advertised: usize, body: Vec<u8>) -> String {
        self.state
            .truncated
            .lock()
            .unwrap()
            .insert(path.to_string(), (advertised, body));
        self.url(path)
    }

    /// URL for a path without serving anything there (requests get 404).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.state.total.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    /// Value of header `name` on every request received so far.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.state
            .headers
            .lock()
            .unwrap()
            .iter()
            .filter_map(|req| {
                req.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v.clone())
            })
            .collect()
    }

    fn handle(&self, mut stream: TcpStream) {
        let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
        let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
        let Some(request) = read_head(&mut stream) else {
            return;
        };
        let (path, headers) = parse_request(&request);

        self.state.total.fetch_add(1, Ordering::SeqCst);
        *self
            .state
            .hits
            .lock()
            .unwrap()
            .entry(path.clone())
            .or_insert(0) += 1;
        self.state.headers.lock().unwrap().push(headers);

        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let truncated = self.state.truncated.lock().unwrap().get(&path).cloned();
        if let Some((advertised, body)) = truncated {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/zip\r\nConnection: close\r\n\r\n",
                advertised
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
            let _ = stream.shutdown(std::net::Shutdown::Both);
            self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
            return;
        }

        let body = self.state.routes.lock().unwrap().get(&path).cloned();
        match body {
            Some(body) => {
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/zip\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
            }
            None => {
                let _ = stream.write_all(
                    b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
                );
            }
        }
        let _ = stream.flush();
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Reads until the end of the request head.
fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    }
    String::from_utf8(data).ok()
}

/// Returns (path without query, headers).
fn parse_request(request: &str) -> (String, Vec<(String, String)>) {
    let mut lines = request.lines();
    let target = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target).to_string();
    let headers = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    (path, headers)
}
