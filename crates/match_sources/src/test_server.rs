//! Lokální HTTP server pro testy adapterů. Každé spojení = jeden request,
//! odpověď určuje closure podle cesty a pořadí hitu na té cestě.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct TestServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// `respond(path, nth_hit_on_path) -> (status, body)`
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, usize) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let req = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = req.split_whitespace().nth(1).unwrap_or("").to_string();

                let nth = {
                    let mut log = log.lock().unwrap();
                    let nth = log.iter().filter(|p| **p == path).count();
                    log.push(path.clone());
                    nth
                };

                let (status, body) = respond(&path, nth);
                let reason = if status == 200 { "OK" } else { "Error" };
                let resp = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(resp.as_bytes()).await;
            }
        });

        Self { base_url: format!("http://{addr}"), hits }
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

/// Adresa, na které nic neposlouchá.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}
