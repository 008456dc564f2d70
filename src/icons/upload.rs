//! Blocking client for the avatar-candidates API.
//!
//! One POST announces every icon and returns a signed upload URL per file;
//! each file is then PUT to its URL. Every request is retried a fixed number
//! of times with a fixed pause in between.

use super::with_sizes;
use crate::models::Icon;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("{operation} failed after {attempts} attempts: {message}")]
    Exhausted {
        operation: String,
        attempts: u32,
        message: String,
    },

    #[error("No upload URL returned for {0}")]
    MissingUploadUrl(String),

    #[error("Failed to read icon {path}: {source}")]
    ReadIcon {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
struct FileDescriptor {
    filename: String,
    filesize: u64,
}

#[derive(Debug, Serialize)]
struct CandidatesRequest {
    files: Vec<FileDescriptor>,
}

#[derive(Debug, Deserialize)]
struct UploadTarget {
    filename: String,
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct CandidatesResponse {
    data: Vec<UploadTarget>,
}

pub struct IconUploader {
    client: Client,
    endpoint: String,
    token: String,
    attempts: u32,
    backoff: Duration,
}

impl IconUploader {
    pub fn new(api_url: &str, app_slug: &str, token: &str) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v0.1/apps/{}/avatar-candidates",
                api_url.trim_end_matches('/'),
                app_slug
            ),
            token: token.to_string(),
            attempts: MAX_ATTEMPTS,
            backoff: RETRY_BACKOFF,
        })
    }

    pub fn with_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Uploads every icon whose file exists; returns how many were sent.
    pub fn upload(&self, icons: &[Icon]) -> Result<usize, UploadError> {
        let candidates = with_sizes(icons);
        if candidates.is_empty() {
            return Ok(0);
        }

        let request = CandidatesRequest {
            files: candidates
                .iter()
                .map(|(icon, size)| FileDescriptor {
                    filename: icon.filename.clone(),
                    filesize: *size,
                })
                .collect(),
        };
        let response: CandidatesResponse = self.retry("Requesting icon upload URLs", || {
            self.client
                .post(&self.endpoint)
                .header(AUTHORIZATION, &self.token)
                .json(&request)
                .send()?
                .error_for_status()?
                .json()
        })?;
        let targets: HashMap<String, String> = response
            .data
            .into_iter()
            .map(|t| (t.filename, t.upload_url))
            .collect();

        for (icon, _) in &candidates {
            let url = targets
                .get(&icon.filename)
                .ok_or_else(|| UploadError::MissingUploadUrl(icon.filename.clone()))?;
            let bytes = fs::read(&icon.path).map_err(|source| UploadError::ReadIcon {
                path: icon.path.clone(),
                source,
            })?;
            self.retry("Uploading icon", || {
                self.client
                    .put(url)
                    .body(bytes.clone())
                    .send()?
                    .error_for_status()
                    .map(|_| ())
            })?;
        }

        info!(icons = candidates.len(), "Icons uploaded");
        Ok(candidates.len())
    }

    fn retry<T>(
        &self,
        operation: &str,
        mut request: impl FnMut() -> reqwest::Result<T>,
    ) -> Result<T, UploadError> {
        let mut message = String::new();
        for attempt in 1..=self.attempts {
            match request() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(attempt, error = %err, "{} failed", operation);
                    message = err.to_string();
                    if attempt < self.attempts {
                        thread::sleep(self.backoff);
                    }
                }
            }
        }
        Err(UploadError::Exhausted {
            operation: operation.to_string(),
            attempts: self.attempts,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        (listener, base)
    }

    /// Answers one connection per response, in order, and reports each
    /// request line.
    fn serve(listener: TcpListener, responses: Vec<(u16, String)>) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut buffer = Vec::new();
                let mut chunk = [0u8; 4096];
                let header_end = loop {
                    let n = stream.read(&mut chunk).unwrap();
                    buffer.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                };
                let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
                let length = head
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                while buffer.len() < header_end + length {
                    let n = stream.read(&mut chunk).unwrap();
                    buffer.extend_from_slice(&chunk[..n]);
                }
                let _ = tx.send(head.lines().next().unwrap_or_default().to_string());
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(reply.as_bytes()).unwrap();
            }
        });
        rx
    }

    fn icon_file(dir: &TempDir) -> Icon {
        let path = dir.path().join("icon.png");
        fs::write(&path, b"png-bytes").unwrap();
        Icon::from_path(path)
    }

    #[test]
    fn test_endpoint() {
        let uploader = IconUploader::new("https://api.example.com/", "app123", "token").unwrap();
        assert_eq!(
            uploader.endpoint(),
            "https://api.example.com/v0.1/apps/app123/avatar-candidates"
        );
    }

    #[test]
    fn test_no_icons_makes_no_requests() {
        let uploader = IconUploader::new("http://127.0.0.1:9", "app", "token").unwrap();
        assert_eq!(uploader.upload(&[]).unwrap(), 0);
    }

    #[test]
    fn test_uploads_each_icon_to_its_url() {
        let dir = TempDir::new().unwrap();
        let icon = icon_file(&dir);
        let (listener, base) = bind();
        let candidates = format!(
            r#"{{"data":[{{"filename":"{}","upload_url":"{}/upload/icon"}}]}}"#,
            icon.filename, base
        );
        let rx = serve(listener, vec![(200, candidates), (200, String::new())]);

        let uploader = IconUploader::new(&base, "app", "token")
            .unwrap()
            .with_retry(MAX_ATTEMPTS, Duration::ZERO);
        assert_eq!(uploader.upload(&[icon]).unwrap(), 1);
        assert_eq!(
            rx.recv().unwrap(),
            "POST /v0.1/apps/app/avatar-candidates HTTP/1.1"
        );
        assert_eq!(rx.recv().unwrap(), "PUT /upload/icon HTTP/1.1");
    }

    #[test]
    fn test_retries_then_gives_up() {
        let dir = TempDir::new().unwrap();
        let icon = icon_file(&dir);
        let (listener, base) = bind();
        let rx = serve(
            listener,
            vec![(500, String::new()), (500, String::new()), (500, String::new())],
        );
        let uploader = IconUploader::new(&base, "app", "token")
            .unwrap()
            .with_retry(MAX_ATTEMPTS, Duration::ZERO);

        let err = uploader.upload(&[icon]).unwrap_err();
        assert!(matches!(err, UploadError::Exhausted { attempts: 3, .. }));
        assert_eq!(rx.iter().count(), 3);
    }
}
