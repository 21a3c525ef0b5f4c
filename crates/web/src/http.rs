#![forbid(unsafe_code)]

use std::io::{Read, Write};

const MAX_HEADER_BYTES: usize = 8192;
pub(crate) const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Debug)]
pub(crate) struct HttpRequest {
    pub(crate) method: String,
    pub(crate) target: String,
    pub(crate) body: Vec<u8>,
}

impl HttpRequest {
    /// Request path without the query string; `None` for targets that name no route.
    pub(crate) fn path(&self) -> Option<String> {
        normalize_path(&self.target)
    }

    pub(crate) fn query_param(&self, key: &str) -> Option<String> {
        let query = self.target.split_once('?')?.1;
        lookup_pair(query, key).ok().flatten()
    }

    /// `Err` when the field is present but its percent-encoding does not decode to UTF-8.
    pub(crate) fn form_value(&self, key: &str) -> Result<Option<String>, MalformedField> {
        let body = String::from_utf8_lossy(&self.body);
        lookup_pair(&body, key)
    }

    pub(crate) fn request_line(&self) -> String {
        format!("{} {}", self.method, self.target)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MalformedField;

/// A timed-out read ends the request instead of failing it.
fn read_some<R: Read>(stream: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    match stream.read(buf) {
        Err(err)
            if matches!(
                err.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ) =>
        {
            Ok(0)
        }
        other => other,
    }
}

fn head_len(data: &[u8]) -> Option<usize> {
    data.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

pub(crate) fn read_request<R: Read>(stream: &mut R) -> std::io::Result<Option<HttpRequest>> {
    let mut buf = [0u8; 4096];
    let mut data = Vec::<u8>::new();
    let head_end = loop {
        if let Some(end) = head_len(&data) {
            break end;
        }
        if data.len() > MAX_HEADER_BYTES {
            break data.len();
        }
        let read = read_some(stream, &mut buf)?;
        if read == 0 {
            break data.len();
        }
        data.extend_from_slice(&buf[..read]);
    };
    if data.is_empty() {
        return Ok(None);
    }

    let head = String::from_utf8_lossy(&data[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut start_line = lines.next().unwrap_or_default().split_whitespace();
    let Some(method) = start_line.next() else {
        return Ok(None);
    };
    let method = method.to_ascii_uppercase();
    let target = start_line.next().unwrap_or("/").to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0)
        .min(MAX_BODY_BYTES);

    let mut body = data.split_off(head_end);
    body.truncate(content_length);
    while body.len() < content_length {
        let read = read_some(stream, &mut buf)?;
        if read == 0 {
            break;
        }
        let take = read.min(content_length - body.len());
        body.extend_from_slice(&buf[..take]);
    }

    Ok(Some(HttpRequest {
        method,
        target,
        body,
    }))
}

fn normalize_path(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.split('?').next().unwrap_or(raw).trim();
    if !raw.starts_with('/') || raw.len() > 256 || raw.contains("..") || raw.contains('\\') {
        return None;
    }
    if raw.len() > 1 {
        return Some(raw.trim_end_matches('/').to_string());
    }
    Some(raw.to_string())
}

/// First value for `key` in an `a=1&b=2` string, percent-decoded. Empty values read as absent.
fn lookup_pair(encoded: &str, key: &str) -> Result<Option<String>, MalformedField> {
    for pair in encoded.split('&') {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if decode_component(name).as_deref() != Some(key) {
            continue;
        }
        let value = decode_component(value).ok_or(MalformedField)?;
        return Ok(Some(value).filter(|value| !value.is_empty()));
    }
    Ok(None)
}

pub(crate) fn decode_component(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut idx = 0usize;
    while idx < bytes.len() {
        match bytes[idx] {
            b'+' => {
                out.push(b' ');
                idx += 1;
            }
            b'%' if idx + 2 < bytes.len() => {
                let hi = hex_value(bytes[idx + 1])?;
                let lo = hex_value(bytes[idx + 2])?;
                out.push((hi << 4) | lo);
                idx += 3;
            }
            b'%' => return None,
            byte => {
                out.push(byte);
                idx += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Response {
    pub(crate) status: &'static str,
    pub(crate) content_type: &'static str,
    pub(crate) location: Option<String>,
    pub(crate) allow: Option<&'static str>,
    pub(crate) body: Vec<u8>,
}

impl Response {
    pub(crate) fn html(status: &'static str, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            location: None,
            allow: None,
            body: body.into_bytes(),
        }
    }

    pub(crate) fn text(status: &'static str, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            location: None,
            allow: None,
            body: body.as_bytes().to_vec(),
        }
    }

    pub(crate) fn json(body: String) -> Self {
        Self {
            status: "200 OK",
            content_type: "application/json; charset=utf-8",
            location: None,
            allow: None,
            body: body.into_bytes(),
        }
    }

    pub(crate) fn css(body: &'static str) -> Self {
        Self {
            status: "200 OK",
            content_type: "text/css; charset=utf-8",
            location: None,
            allow: None,
            body: body.as_bytes().to_vec(),
        }
    }

    pub(crate) fn method_not_allowed(allow: &'static str) -> Self {
        Self {
            allow: Some(allow),
            ..Self::text("405 Method Not Allowed", "Method not allowed.")
        }
    }

    /// 302 to `location`, the post/redirect/get target.
    pub(crate) fn redirect(location: &str) -> Self {
        Self {
            status: "302 Found",
            content_type: "text/plain; charset=utf-8",
            location: Some(location.to_string()),
            allow: None,
            body: format!("Redirecting to {location}").into_bytes(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_status(&self, code: u16) -> bool {
        self.status
            .split_whitespace()
            .next()
            .and_then(|raw| raw.parse::<u16>().ok())
            == Some(code)
    }
}

pub(crate) fn write_response<W: Write>(
    stream: &mut W,
    response: &Response,
    head_only: bool,
) -> std::io::Result<()> {
    let mut headers = String::new();
    headers.push_str("HTTP/1.1 ");
    headers.push_str(response.status);
    headers.push_str("\r\n");
    headers.push_str("Content-Type: ");
    headers.push_str(response.content_type);
    headers.push_str("\r\n");
    if let Some(location) = &response.location {
        headers.push_str("Location: ");
        headers.push_str(location);
        headers.push_str("\r\n");
    }
    if let Some(allow) = response.allow {
        headers.push_str("Allow: ");
        headers.push_str(allow);
        headers.push_str("\r\n");
    }
    headers.push_str("Cache-Control: no-store\r\n");
    headers.push_str("X-Content-Type-Options: nosniff\r\n");
    headers.push_str("Connection: close\r\n");
    headers.push_str("Content-Length: ");
    headers.push_str(&response.body.len().to_string());
    headers.push_str("\r\n\r\n");

    stream.write_all(headers.as_bytes())?;
    if !head_only {
        stream.write_all(&response.body)?;
    }
    stream.flush()
}
