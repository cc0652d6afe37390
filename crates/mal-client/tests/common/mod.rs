//! In-process HTTP server answering canned responses per route.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use shared::MalConfig;

/// A request as the server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Decoded value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<String> {
        decode_pairs(&self.query).remove(key)
    }
}

/// A canned response for one method/path (and optionally a query fragment)
#[derive(Debug, Clone)]
pub struct MockRoute {
    method: &'static str,
    path: String,
    query_contains: Option<String>,
    status: u16,
    body: String,
    /// Advertise more bytes than are sent, then close
    truncated: bool,
}

impl MockRoute {
    pub fn get(path: &str, status: u16, body: &str) -> Self {
        Self::new("GET", path, status, body)
    }

    pub fn post(path: &str, status: u16, body: &str) -> Self {
        Self::new("POST", path, status, body)
    }

    fn new(method: &'static str, path: &str, status: u16, body: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query_contains: None,
            status,
            body: body.to_string(),
            truncated: false,
        }
    }

    pub fn with_query(mut self, fragment: &str) -> Self {
        self.query_contains = Some(fragment.to_string());
        self
    }

    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    fn matches(&self, request: &RecordedRequest) -> bool {
        self.method == request.method
            && self.path == request.path
            && self
                .query_contains
                .as_ref()
                .map_or(true, |q| request.query.contains(q.as_str()))
    }
}

pub struct MockServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    /// Bind an ephemeral port and serve `routes` on a background thread.
    /// Unmatched requests get an empty 404.
    pub fn start(routes: Vec<MockRoute>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let _ = serve(stream, &routes, &recorded);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    /// Endpoint settings pointing at this server
    pub fn config(&self) -> MalConfig {
        MalConfig {
            api_url: format!("{}/api/", self.base_url),
            profile_url: format!("{}/malappinfo.php", self.base_url),
            user_agent: "mal-client-tests/1.0".to_string(),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests to a given path, in arrival order
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

fn serve(
    stream: TcpStream,
    routes: &[MockRoute],
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target, String::new()),
    };

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;

    let request = RecordedRequest {
        method,
        path,
        query,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    let (status, body, truncated) = routes
        .iter()
        .find(|route| route.matches(&request))
        .map(|route| (route.status, route.body.clone(), route.truncated))
        .unwrap_or((404, String::new(), false));
    let declared = if truncated { body.len() + 64 } else { body.len() };

    // Record before answering so the client never observes a missing request
    recorded.lock().unwrap().push(request);

    let response = format!(
        "HTTP/1.1 {status} Mock\r\nContent-Type: text/xml; charset=utf-8\r\n\
         Content-Length: {declared}\r\nConnection: close\r\n\r\n{body}"
    );
    writer.write_all(response.as_bytes())?;
    writer.flush()
}

fn decode_pairs(encoded: &str) -> HashMap<String, String> {
    encoded
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (form_decode(k), form_decode(v)))
        .collect()
}

fn form_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}
