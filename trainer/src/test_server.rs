use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use reqwest::blocking::Client;
use crate::client::ReleaseClient;

/// Minimal HTTP/1.1 server for tests. Serves fixed bodies by path, 404 for anything else,
/// and records the requested paths in order
pub struct TestServer {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub fn start(routes: Vec<(&'static str, u16, Vec<u8>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = match stream {
                    Ok(stream) => stream,
                    Err(_) => break,
                };

                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                // Drain the headers
                let mut line = String::new();
                while reader.read_line(&mut line).map(|o| o > 2).unwrap_or(false) {
                    line.clear();
                }

                let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_owned();
                recorded.lock().unwrap().push(path.clone());

                let (status, body) = routes.iter()
                    .find(|(route, _, _)| *route == path)
                    .map(|(_, status, body)| (*status, body.clone()))
                    .unwrap_or((404, b"not found".to_vec()));
                let reason = match status {
                    200 => "OK",
                    203 => "Non-Authoritative Information",
                    404 => "Not Found",
                    _ => "Internal Server Error",
                };

                let head = format!("HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                                   status, reason, body.len());
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
                let _ = stream.flush();
            }
        });

        Self { port, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Client that talks to the test server directly, whatever proxy the environment sets
pub fn local_client() -> ReleaseClient {
    ReleaseClient::with_client(Client::builder().no_proxy().build().unwrap())
}
