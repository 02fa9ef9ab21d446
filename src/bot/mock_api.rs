//! Local Bot API stand-in for handler tests.
//!
//! Records the method of every request. Methods listed as succeeding answer
//! `true`; every other method fails with a 400.

use std::sync::{Arc, Mutex};

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use super::dispatcher::ThrottledBot;

const OK_TRUE: &str = r#"{"ok":true,"result":true}"#;
const BAD_REQUEST: &str = r#"{"ok":false,"error_code":400,"description":"Bad Request: rejected by mock"}"#;

type Calls = Arc<Mutex<Vec<String>>>;

pub struct MockApi {
    calls: Calls,
}

impl MockApi {
    /// Start the server and return a bot pointed at it.
    pub async fn start(succeed: &'static [&'static str]) -> (ThrottledBot, MockApi) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let calls = Calls::default();

        tokio::spawn(serve(listener, calls.clone(), succeed));

        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let bot = Bot::new("123:mock").set_api_url(url).throttle(Limits::default());
        (bot, MockApi { calls })
    }

    /// Methods called so far, lowercased, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

async fn serve(listener: TcpListener, calls: Calls, succeed: &'static [&'static str]) {
    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(respond(stream, calls.clone(), succeed));
    }
}

async fn respond(mut stream: TcpStream, calls: Calls, succeed: &'static [&'static str]) {
    let Some(method) = read_method(&mut stream).await else {
        return;
    };

    let body = if succeed.iter().any(|m| m.eq_ignore_ascii_case(&method)) {
        OK_TRUE
    } else {
        BAD_REQUEST
    };
    calls.lock().unwrap().push(method.to_ascii_lowercase());

    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Read one full request and return the last segment of its path.
async fn read_method(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let path = head.lines().next()?.split_whitespace().nth(1)?;
    path.rsplit('/').next().map(str::to_string)
}
