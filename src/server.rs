use crate::bot::Bot;
use crate::config::now_utc;
use crate::db::TransactionStore;
use crate::locale::Locale;
use crate::telegram::{Messenger, Update};
use anyhow::{Context, Result, anyhow};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

const MAX_BODY_BYTES: usize = 1024 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Reads one HTTP/1.1 request: request line, headers and a `Content-Length` body.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<HttpRequest> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return Err(anyhow!("Malformed request line: {:?}", line.trim_end()));
    };
    let method = method.to_string();
    let path = path.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(anyhow!("Malformed header line: {line:?}"));
        };
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let mut req = HttpRequest {
        method,
        path,
        headers,
        body: Vec::new(),
    };

    let len = match req.header("content-length") {
        None => 0,
        Some(v) => v
            .parse::<usize>()
            .with_context(|| format!("Invalid Content-Length: {v}"))?,
    };
    if len > MAX_BODY_BYTES {
        return Err(anyhow!("Request body too large ({len} bytes)"));
    }
    req.body.resize(len, 0);
    reader
        .read_exact(&mut req.body)
        .context("Request body shorter than Content-Length")?;
    Ok(req)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        405 => "Method Not Allowed",
        502 => "Bad Gateway",
        _ => "Unknown",
    }
}

pub fn write_response<W: Write>(w: &mut W, status: u16, body: &str) -> Result<()> {
    write!(
        w,
        "HTTP/1.1 {status} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        reason(status),
        body.len()
    )?;
    w.flush()?;
    Ok(())
}

/// Handles one webhook connection. Any POST that parses as HTTP is answered
/// with 200 so the chat platform does not redeliver it.
pub fn handle_connection<S, L, M>(
    stream: TcpStream,
    bot: &mut Bot<S, L>,
    messenger: &M,
) -> Result<()>
where
    S: TransactionStore,
    L: Locale,
    M: Messenger + ?Sized,
{
    stream.set_read_timeout(Some(READ_TIMEOUT)).ok();
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    let req = match read_request(&mut reader) {
        Ok(req) => req,
        Err(err) => {
            let _ = write_response(&mut writer, 400, "bad request");
            return Err(err);
        }
    };

    if req.method != "POST" {
        return write_response(&mut writer, 405, "method not allowed");
    }

    match serde_json::from_slice::<Update>(&req.body) {
        Ok(update) => bot.handle_update(&update, messenger, now_utc()),
        Err(err) => tracing::warn!(path = %req.path, "ignoring unparseable update: {err}"),
    }

    write_response(&mut writer, 200, "ok")
}

/// Accept loop. Connections are handled one at a time; `once` stops after
/// the first.
pub fn serve<S, L, M>(
    listener: TcpListener,
    bot: &mut Bot<S, L>,
    messenger: &M,
    once: bool,
) -> Result<()>
where
    S: TransactionStore,
    L: Locale,
    M: Messenger + ?Sized,
{
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!("accept failed: {err}");
                continue;
            }
        };

        let peer = stream.peer_addr().ok();
        if let Err(err) = handle_connection(stream, bot, messenger) {
            tracing::warn!(?peer, "webhook request failed: {err:#}");
        }

        if once {
            break;
        }
    }
    Ok(())
}
