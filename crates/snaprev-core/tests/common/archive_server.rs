//! Minimal HTTP/1.1 server standing in for the snapshot bucket in integration tests.
//!
//! Request targets (path plus query, exactly as sent) map to fixed bodies;
//! anything unregistered is a 404. Targets can also be marked as failing with
//! a 500. Every request target is recorded in arrival order.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Default, Clone)]
pub struct Routes {
    bodies: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with 200 at `target` (e.g. `/o/Linux_x64%2F997%2Fchrome-linux.zip?alt=media`).
    pub fn serve(mut self, target: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(target.to_string(), body.into());
        self
    }

    /// Answer `target` with 500 Internal Server Error.
    pub fn fail(mut self, target: &str) -> Self {
        self.failing.insert(target.to_string());
        self
    }
}

pub struct ArchiveServer {
    /// e.g. "http://127.0.0.1:12345/"
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ArchiveServer {
    /// CDN base the locator should use: archives are served under `/o/`.
    pub fn cdn_base(&self) -> String {
        format!("{}o/", self.base_url)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, needle: &str) -> usize {
        self.requests().iter().filter(|r| r.contains(needle)).count()
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(routes: Routes) -> ArchiveServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &routes, &log));
        }
    });
    ArchiveServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        requests,
    }
}

/// Path of an archive under `/o/`, matching the locator's layout.
pub fn archive_target(dir: &str, revision: u64, name: &str) -> String {
    format!("/o/{}%2F{}%2F{}.zip?alt=media", dir, revision, name)
}

fn handle(mut stream: std::net::TcpStream, routes: &Routes, log: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("").to_string();
    log.lock().unwrap().push(target.clone());

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }
    let (status, body): (&str, &[u8]) = if routes.failing.contains(&target) {
        ("500 Internal Server Error", &b"boom"[..])
    } else if let Some(body) = routes.bodies.get(&target) {
        ("200 OK", body.as_slice())
    } else {
        ("404 Not Found", &b"<Error><Code>NoSuchKey</Code></Error>"[..])
    };
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}
