//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the external services the
//! pipeline degrades gracefully without: the text-classification service,
//! the audio transcription service, and the calendar source.

pub mod google;
pub mod openai;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::CalendarEvent;

pub use google::GoogleCalendar;
pub use openai::OpenAiClient;

/// Chat-style text classification service.
///
/// Request = system instructions + user content; response = the raw message
/// content, which callers parse as JSON. Implementations must bound their
/// network calls with a timeout.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Human-readable service name
    fn name(&self) -> &str;

    /// Submit a prompt and return the response content, requesting strict
    /// JSON output
    async fn complete_json(&self, system: &str, user: &str) -> Result<String>;
}

/// Audio transcription service: audio file in, transcript text out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Read-only source of today's calendar events.
///
/// Implementations return events already filtered to `end > now`, ordered by
/// start time.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn today_events(&self) -> Result<Vec<CalendarEvent>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::thread::JoinHandle;

    /// Serve one canned JSON response on an ephemeral port and hand back the
    /// raw request that arrived.
    pub fn serve_once(body: String) -> (SocketAddr, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });

        (addr, handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);

            if let Some(header_end) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&raw[..header_end]).to_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + body_len {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&raw).to_string()
    }
}
