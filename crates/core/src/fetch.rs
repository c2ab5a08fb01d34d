//! Remote document and asset retrieval.

use reqwest::blocking::Client;

use crate::{
    config::AppConfig,
    error::{ExportError, Result},
};

/// Downloads a URL into memory.
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, failing on transport errors and non-success statuses.
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`Fetcher`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client using the configured user agent and timeout.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.http_timeout())
            .build()
            .map_err(ExportError::HttpClient)?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let to_error = |source| ExportError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(to_error)?;
        let body = response.bytes().map_err(to_error)?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    use anyhow::Result;

    use super::*;

    /// Serve a single canned HTTP response and return the base URL.
    fn serve_once(status: &'static str, body: &'static [u8]) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let address = listener.local_addr()?;

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0_u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&buf[..read]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body);
            }
        });

        Ok(format!("http://{address}"))
    }

    #[test]
    fn returns_body_on_success() -> Result<()> {
        let base = serve_once("200 OK", b"sprite-bytes")?;
        let fetcher = HttpFetcher::new(&AppConfig::default())?;
        assert_eq!(fetcher.get(&format!("{base}/assets/frame.png"))?, b"sprite-bytes");
        Ok(())
    }

    #[test]
    fn non_success_status_is_an_error() -> Result<()> {
        let base = serve_once("404 Not Found", b"missing")?;
        let fetcher = HttpFetcher::new(&AppConfig::default())?;
        let url = format!("{base}/data.json");

        let err = fetcher.get(&url).expect_err("404 must fail");
        assert!(matches!(&err, ExportError::Http { url: failed, .. } if *failed == url));
        Ok(())
    }
}
