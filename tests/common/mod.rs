//! Shared helpers for integration tests: a scripted HTTP backend and
//! in-memory PDFs.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ── Scripted backend ─────────────────────────────────────────────────────────

/// A one-shot HTTP server answering each accepted connection with the next
/// canned response, recording every JSON request body it receives.
pub struct ScriptedServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl ScriptedServer {
    pub async fn start(responses: Vec<String>) -> Self {
        Self::spawn(responses, false).await
    }

    /// Like [`ScriptedServer::start`] with a single response, but the
    /// connection is held open after writing it, so a body that promises more
    /// bytes than it carries never finishes.
    pub async fn start_stalled(response: String) -> Self {
        Self::spawn(vec![response], true).await
    }

    async fn spawn(responses: Vec<String>, stall: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let body = read_request_body(&mut socket).await;
                let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
                seen.lock().unwrap().push(json);
                socket.write_all(response.as_bytes()).await.ok();
                if stall {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                socket.shutdown().await.ok();
            }
        });

        Self { addr, requests }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/api/chat", self.addr)
    }

    /// Request bodies received so far, in arrival order.
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request_body(socket: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut tmp).await.unwrap_or(0);
        if n == 0 {
            return Vec::new();
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = socket.read(&mut tmp).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
    }

    buf[body_start..].to_vec()
}

/// 200 response whose body is `lines`, one per line.
pub fn ndjson_response(lines: &[&str]) -> String {
    let mut body = lines.join("\n");
    body.push('\n');
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// 200 response that promises more body than it delivers.
pub fn truncated_response(lines: &[&str]) -> String {
    let mut body = lines.join("\n");
    body.push('\n');
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len() + 1000,
        body
    )
}

/// Non-success response with a plain-text body.
pub fn status_response(code: u16, reason: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {code} {reason}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// A chat-API record carrying `content`.
pub fn chat_line(content: &str) -> String {
    serde_json::json!({
        "model": "llama3.2",
        "message": {"role": "assistant", "content": content},
        "done": false
    })
    .to_string()
}

/// A record reporting that the backend gave up.
pub fn error_line(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// The closing record of a chat stream.
pub fn done_line() -> String {
    serde_json::json!({
        "model": "llama3.2",
        "message": {"role": "assistant", "content": ""},
        "done": true,
        "prompt_eval_count": 26,
        "eval_count": 3
    })
    .to_string()
}

// ── PDFs ─────────────────────────────────────────────────────────────────────

/// Build a PDF with one line of Courier text per page.
pub fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
    build_pdf_with(page_texts, None)
}

/// Like [`build_pdf`], but page `broken` (0-based) gets a content stream that
/// claims to be deflated and is not.
pub fn build_pdf_with_broken_page(page_texts: &[&str], broken: usize) -> Vec<u8> {
    build_pdf_with(page_texts, Some(broken))
}

fn build_pdf_with(page_texts: &[&str], broken: Option<usize>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (i, text) in page_texts.iter().enumerate() {
        if broken == Some(i) {
            let garbage = Stream::new(
                dictionary! { "Filter" => "FlateDecode" },
                b"definitely not zlib data".to_vec(),
            );
            let content_id = doc.add_object(garbage);
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
            continue;
        }

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_texts.len() as i64,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
