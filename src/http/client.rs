use super::debug::{HttpDebugConfig, Redactor, clip};
use crate::trace::{SessionTrace, TraceKind};
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// JSON POST client shared by the completion providers. Every exchange is
/// written to the session trace with secrets masked; `--verbose` also echoes
/// it to stderr.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    debug: HttpDebugConfig,
    echo: Echo,
    trace: SessionTrace,
}

#[derive(Clone)]
enum Echo {
    Stderr,
    #[cfg(test)]
    Capture(Arc<Mutex<Vec<String>>>),
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(inner: Client, debug: HttpDebugConfig) -> Self {
        Self {
            inner,
            debug,
            echo: Echo::Stderr,
            trace: SessionTrace::disabled(),
        }
    }

    pub fn with_trace(mut self, trace: SessionTrace) -> Self {
        self.trace = trace;
        self
    }

    #[cfg(test)]
    fn capturing(debug: HttpDebugConfig) -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut client = Self::new(Client::new(), debug);
        client.echo = Echo::Capture(Arc::clone(&lines));
        (client, lines)
    }

    /// Sends `payload` as JSON and returns the status and body whatever the
    /// status. Only transport failures are errors.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
        payload: &T,
    ) -> Result<HttpResponseData, reqwest::Error> {
        let sent_body = serde_json::to_string(payload)
            .unwrap_or_else(|err| format!("<unserializable body: {err}>"));
        let request = headers
            .iter()
            .fold(
                self.inner.post(url).query(query).json(payload),
                |builder, (name, value)| builder.header(*name, *value),
            )
            .build()?;

        self.log(|redactor| Message::request(redactor, &request, &sent_body));

        let response = self
            .inner
            .execute(request)
            .await
            .inspect_err(|err| self.trace.record(TraceKind::HttpError, &err.to_string()))?;
        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let body = response
            .text()
            .await
            .inspect_err(|err| self.trace.record(TraceKind::HttpError, &err.to_string()))?;

        self.log(|redactor| Message::response(redactor, status, &response_headers, &body));

        Ok(HttpResponseData { status, body })
    }

    /// The trace always gets a masked copy; stderr gets one rendered with the
    /// configured redactor.
    fn log(&self, render: impl Fn(Redactor) -> Message) {
        let traced = render(Redactor::MASKING);
        traced.write_to(&self.trace);

        if !self.debug.enabled {
            return;
        }
        let shown = if self.debug.redactor == Redactor::MASKING {
            traced
        } else {
            render(self.debug.redactor)
        };
        for line in shown.debug_lines(self.debug.max_body_chars) {
            self.echo_line(line);
        }
    }

    fn echo_line(&self, line: String) {
        match &self.echo {
            Echo::Stderr => {
                let _ = writeln!(io::stderr().lock(), "{line}");
            }
            #[cfg(test)]
            Echo::Capture(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(line);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Outgoing,
    Incoming,
}

/// One side of an exchange, already masked.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Message {
    direction: Direction,
    start_line: String,
    headers: Vec<String>,
    body: String,
}

impl Message {
    fn request(redactor: Redactor, request: &reqwest::Request, body: &str) -> Self {
        Self {
            direction: Direction::Outgoing,
            start_line: format!("{} {}", request.method(), redactor.url(request.url())),
            headers: header_lines(redactor, request.headers()),
            body: redactor.body(body),
        }
    }

    fn response(redactor: Redactor, status: u16, headers: &HeaderMap, body: &str) -> Self {
        Self {
            direction: Direction::Incoming,
            start_line: format!("HTTP {status}"),
            headers: header_lines(redactor, headers),
            body: redactor.body(body),
        }
    }

    fn write_to(&self, trace: &SessionTrace) {
        let kind = match self.direction {
            Direction::Outgoing => TraceKind::HttpRequest,
            Direction::Incoming => TraceKind::HttpResponse,
        };
        trace.record(kind, &self.start_line);
        for header in &self.headers {
            trace.record(kind, header);
        }
        trace.record(kind, &self.body);
    }

    fn debug_lines(&self, max_body_chars: usize) -> Vec<String> {
        let marker = match self.direction {
            Direction::Outgoing => '>',
            Direction::Incoming => '<',
        };
        let prefixed = |text: &str| format!("[http-debug] {marker} {text}");

        let mut lines = vec![prefixed(&self.start_line)];
        lines.extend(self.headers.iter().map(|header| prefixed(header)));
        lines.push(format!("[http-debug] {marker}"));

        let body = clip(&self.body, max_body_chars);
        if body.is_empty() {
            lines.push(prefixed("<empty body>"));
        } else {
            lines.extend(body.lines().map(prefixed));
        }
        lines
    }
}

fn header_lines(redactor: Redactor, headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {}", redactor.header(name.as_str(), value)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseData {
    pub status: u16,
    pub body: String,
}

impl HttpResponseData {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
