#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpStatus {
    Ok,
    BadRequest,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    InternalServerError,
}

impl HttpStatus {
    fn parts(&self) -> (u16, &'static str) {
        match self {
            Self::Ok => (200, "OK"),
            Self::BadRequest => (400, "Bad Request"),
            Self::Forbidden => (403, "Forbidden"),
            Self::NotFound => (404, "Not Found"),
            Self::MethodNotAllowed => (405, "Method Not Allowed"),
            Self::PayloadTooLarge => (413, "Payload Too Large"),
            Self::InternalServerError => (500, "Internal Server Error"),
        }
    }

    pub fn code(&self) -> u16 {
        self.parts().0
    }

    pub fn as_response_line(&self) -> String {
        let (code, reason) = self.parts();
        format!("HTTP/1.1 {} {}\r\n", code, reason)
    }

    /// Complete reply with a small HTML page naming the status.
    pub fn error_response(&self) -> String {
        let (code, reason) = self.parts();
        let body = format!("<html><body><h1>{} {}</h1></body></html>", code, reason);

        format!(
            "{}Content-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.as_response_line(),
            body.len(),
            body
        )
    }
}

/// Header block for a successful file reply, always uncached.
pub fn ok_headers(content_type: &str, content_length: u64) -> String {
    format!(
        "{}Content-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n",
        HttpStatus::Ok.as_response_line(),
        content_type,
        content_length
    )
}
