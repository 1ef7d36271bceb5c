//! Minimal HTTP/1.1 server that answers oEmbed lookups for integration tests.
//!
//! Every GET is answered from the video id found in the request target, so
//! the same server works as the oEmbed endpoint (direct) or as a relay
//! (passthrough / wrapped), where the id is percent-encoded twice.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Body is the oEmbed JSON (direct endpoint or passthrough relay).
    Plain,
    /// Body is `{"contents": "<oEmbed JSON>", "status": {"http_code": N}}`, always 200.
    Wrapped,
}

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub shape: Shape,
    /// Ids answered with the given status instead of a payload.
    pub failures: HashMap<String, u16>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            shape: Shape::Plain,
            failures: HashMap::new(),
        }
    }
}

pub struct OEmbedServer {
    /// e.g. "http://127.0.0.1:12345"
    pub base: String,
    hits: Arc<AtomicUsize>,
}

impl OEmbedServer {
    /// URL to use as the oEmbed endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/oembed", self.base)
    }

    /// URL to use as a relay prefix.
    pub fn relay_prefix(&self) -> String {
        format!("{}/relay?url=", self.base)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn start(opts: ServerOptions) -> OEmbedServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = Arc::clone(&opts);
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &opts, &counter));
        }
    });
    OEmbedServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, opts: &ServerOptions, hits: &AtomicUsize) {
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
    let target = parts.next().unwrap_or("");
    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", "text/plain", b"");
        return;
    }
    hits.fetch_add(1, Ordering::SeqCst);

    let Some(id) = video_id_in(target) else {
        respond(&mut stream, "400 Bad Request", "text/plain", b"Bad Request");
        return;
    };
    let failure = opts.failures.get(&id).copied();

    match (opts.shape, failure) {
        (Shape::Plain, None) => {
            respond(&mut stream, "200 OK", "application/json", payload(&id).as_bytes())
        }
        (Shape::Plain, Some(code)) => {
            let status = format!("{} {}", code, reason(code));
            respond(&mut stream, &status, "text/plain", reason(code).as_bytes())
        }
        (Shape::Wrapped, failure) => {
            let (contents, code) = match failure {
                None => (serde_json::Value::String(payload(&id)), 200),
                Some(code) => (serde_json::Value::Null, code),
            };
            let envelope = serde_json::json!({
                "contents": contents,
                "status": { "url": "upstream", "http_code": code },
            });
            respond(&mut stream, "200 OK", "application/json", envelope.to_string().as_bytes())
        }
    }
}

fn payload(id: &str) -> String {
    serde_json::json!({
        "title": format!("Video {id}"),
        "author_name": format!("Channel {id}"),
        "author_url": format!("https://www.youtube.com/channel/{id}"),
        "type": "video",
    })
    .to_string()
}

/// Id after `v=` in the (possibly double) percent-encoded watch URL.
fn video_id_in(target: &str) -> Option<String> {
    for marker in ["v%253D", "v%3D"] {
        if let Some(pos) = target.find(marker) {
            let id: String = target[pos + marker.len()..].chars().take(11).collect();
            if id.len() == 11 {
                return Some(id);
            }
        }
    }
    None
}

fn reason(code: u16) -> &'static str {
    match code {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        _ => "Error",
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}
