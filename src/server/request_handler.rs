use log::{debug, error, info, warn};
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use super::http_status::{HttpStatus, ok_headers};

static MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("ts", "application/typescript"),
    ("svelte", "text/plain; charset=utf-8"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("webmanifest", "application/manifest+json"),
    ("md", "text/markdown; charset=utf-8"),
    ("txt", "text/plain; charset=utf-8"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("wasm", "application/wasm"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
];

pub fn handle_client(mut stream: TcpStream, document_root: &Path, max_file_size: u64) {
    let peer_addr = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(_) => "unknown".to_string(),
    };

    debug!("Handling request from {}", peer_addr);

    let mut buffer = [0u8; 8192];
    let bytes_read = match stream.read(&mut buffer) {
        Ok(0) => {
            debug!("Connection closed by client {}", peer_addr);
            return;
        }
        Ok(n) => n,
        Err(e) => {
            error!("Error reading from {}: {}", peer_addr, e);
            return;
        }
    };

    let request = String::from_utf8_lossy(&buffer[..bytes_read]);
    let first_line: Vec<&str> = match request.lines().next() {
        Some(line) => line.split_whitespace().collect(),
        None => {
            send_error(&mut stream, HttpStatus::BadRequest);
            return;
        }
    };

    if first_line.len() < 2 {
        send_error(&mut stream, HttpStatus::BadRequest);
        return;
    }

    let method = first_line[0];
    let target = first_line[1];

    if method != "GET" && method != "HEAD" {
        warn!("Unsupported method from {}: {}", peer_addr, method);
        send_error(&mut stream, HttpStatus::MethodNotAllowed);
        return;
    }

    match resolve_target(document_root, target) {
        Ok(file_path) => handle_file_request(
            &mut stream,
            &file_path,
            method == "HEAD",
            &peer_addr,
            max_file_size,
        ),
        Err(status) => {
            warn!("Rejected {} {} from {}: {}", method, target, peer_addr, status.code());
            send_error(&mut stream, status);
        }
    }
}

/// Maps a request target onto a path under `document_root`.
///
/// Directory targets resolve to their `index.html`.
pub fn resolve_target(document_root: &Path, target: &str) -> Result<PathBuf, HttpStatus> {
    let path = target
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    if !path.starts_with('/') {
        return Err(HttpStatus::BadRequest);
    }

    let decoded = percent_decode(path).ok_or(HttpStatus::BadRequest)?;
    if decoded.contains("..") {
        return Err(HttpStatus::Forbidden);
    }

    let mut file_path = document_root.join(decoded.trim_start_matches('/'));
    if file_path.is_dir() {
        file_path.push("index.html");
    }

    Ok(file_path)
}

pub fn content_type(file_path: &Path) -> &'static str {
    let ext = file_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    MIME_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).ok()
}

fn handle_file_request(
    stream: &mut TcpStream,
    file_path: &Path,
    is_head: bool,
    client_addr: &str,
    max_file_size: u64,
) {
    if !file_path.exists() {
        info!("File not found for {}: {:?}", client_addr, file_path);
        send_error(stream, HttpStatus::NotFound);
        return;
    }

    if !file_path.is_file() {
        warn!("Attempt to access directory from {}: {:?}", client_addr, file_path);
        send_error(stream, HttpStatus::Forbidden);
        return;
    }

    let metadata = match fs::metadata(file_path) {
        Ok(meta) => meta,
        Err(e) => {
            error!("Error getting metadata for {:?}: {}", file_path, e);
            send_error(stream, HttpStatus::InternalServerError);
            return;
        }
    };

    if metadata.len() > max_file_size {
        warn!(
            "File too large for {}: {:?} ({} bytes)",
            client_addr,
            file_path,
            metadata.len()
        );
        send_error(stream, HttpStatus::PayloadTooLarge);
        return;
    }

    let headers = ok_headers(content_type(file_path), metadata.len());

    if is_head {
        if let Err(e) = stream.write_all(headers.as_bytes()) {
            error!("Error sending HEAD response to {}: {}", client_addr, e);
        }
        return;
    }

    let file = match fs::File::open(file_path) {
        Ok(file) => file,
        Err(e) => {
            error!("Error opening file {:?} for {}: {}", file_path, client_addr, e);
            send_error(stream, HttpStatus::InternalServerError);
            return;
        }
    };

    let mut reader = BufReader::new(file);
    let mut writer = BufWriter::new(stream);

    if let Err(e) = writer.write_all(headers.as_bytes()) {
        error!("Error sending headers to {}: {}", client_addr, e);
        return;
    }

    let mut buffer = [0u8; 8192];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = writer.write_all(&buffer[..n]) {
                    error!("Error sending file data to {}: {}", client_addr, e);
                    return;
                }
            }
            Err(e) => {
                error!("Error reading file for {}: {}", client_addr, e);
                return;
            }
        }
    }

    if let Err(e) = writer.flush() {
        error!("Error flushing stream for {}: {}", client_addr, e);
        return;
    }

    info!(
        "Served file to {}: {:?} ({} bytes)",
        client_addr,
        file_path,
        metadata.len()
    );
}

fn send_error(stream: &mut TcpStream, status: HttpStatus) {
    if let Err(e) = stream.write_all(status.error_response().as_bytes()) {
        error!("Error sending response: {}", e);
    }
}
