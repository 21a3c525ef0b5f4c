#![forbid(unsafe_code)]

use crate::csrf::CsrfSigner;
use crate::handlers::Listing;
use crate::http::{HttpRequest, Response, read_request, write_response};
use crate::render;
use crate::session_log::SessionLog;
use bubbles_storage::{SqliteStore, StoreError};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const ACCEPT_IDLE: Duration = Duration::from_millis(25);
const ACCEPT_BACKOFF: Duration = Duration::from_millis(250);

const LISTING_METHODS: &str = "GET, HEAD, POST";
const READ_METHODS: &str = "GET, HEAD";

#[derive(Debug)]
pub(crate) enum HandlerError {
    NotFound(&'static str),
    Store(StoreError),
    Encode(serde_json::Error),
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::Store(err) => write!(f, "store: {err}"),
            Self::Encode(err) => write!(f, "encode: {err}"),
        }
    }
}

impl std::error::Error for HandlerError {}

impl From<StoreError> for HandlerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UnknownId => Self::NotFound("No bubble with that id."),
            other => Self::Store(other),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Owns the store for the lifetime of the process; requests are served one at a time.
#[derive(Debug)]
pub(crate) struct Server {
    pub(crate) store: SqliteStore,
    pub(crate) csrf: CsrfSigner,
    pub(crate) log: SessionLog,
}

impl Server {
    pub(crate) fn new(store: SqliteStore, csrf: CsrfSigner, log: SessionLog) -> Self {
        Self { store, csrf, log }
    }

    pub(crate) fn run(&mut self, listener: TcpListener, shutdown: &AtomicBool) -> std::io::Result<()> {
        listener.set_nonblocking(true)?;
        while !shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, _)) => {
                    if let Err(err) = self.handle_connection(stream) {
                        self.log.note_error(&format!("connection: {err}"));
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_IDLE);
                }
                Err(err) => {
                    self.note_accept_error(&err);
                    std::thread::sleep(ACCEPT_BACKOFF);
                }
            }
        }
        Ok(())
    }

    /// Failed accepts (fd exhaustion, aborted handshakes) are logged and retried after a pause.
    pub(crate) fn note_accept_error(&mut self, err: &std::io::Error) {
        let line = format!("accept: {err}");
        eprintln!("bubbles: {line}");
        self.log.note_error(&line);
    }

    fn handle_connection(&mut self, mut stream: TcpStream) -> std::io::Result<()> {
        stream.set_nonblocking(false)?;
        let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
        let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
        let Some(request) = read_request(&mut stream)? else {
            return Ok(());
        };
        let response = self.respond(&request);
        write_response(&mut stream, &response, request.method == "HEAD")
    }

    pub(crate) fn respond(&mut self, request: &HttpRequest) -> Response {
        self.log.note_request(&request.request_line());
        match self.route(request) {
            Ok(response) => response,
            Err(HandlerError::NotFound(message)) => {
                Response::html("404 Not Found", render::not_found_page(message))
            }
            Err(err) => {
                let line = format!("{} failed: {err}", request.request_line());
                eprintln!("bubbles: {line}");
                self.log.note_error(&line);
                Response::html("500 Internal Server Error", render::server_error_page())
            }
        }
    }

    fn route(&mut self, request: &HttpRequest) -> Result<Response, HandlerError> {
        let Some(path) = request.path() else {
            return Err(HandlerError::NotFound("Page not found."));
        };
        let method = request.method.as_str();
        let read_only = matches!(method, "GET" | "HEAD");

        match path.as_str() {
            "/" | "/popped" => {
                let listing = if path == "/" {
                    Listing::Active
                } else {
                    Listing::Popped
                };
                match method {
                    "GET" | "HEAD" => self.show_listing(listing),
                    "POST" => self.submit_bubble(request, listing),
                    _ => Ok(Response::method_not_allowed(LISTING_METHODS)),
                }
            }
            "/pop" if read_only => self.pop_bubble(request),
            "/api/bubbles" if read_only => self.list_bubbles_json(),
            "/app.css" if read_only => Ok(Response::css(crate::assets::APP_CSS)),
            "/pop" | "/api/bubbles" | "/app.css" => Ok(Response::method_not_allowed(READ_METHODS)),
            _ => Err(HandlerError::NotFound("Page not found.")),
        }
    }
}
