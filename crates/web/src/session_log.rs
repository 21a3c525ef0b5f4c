#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

pub(crate) const SESSION_LOG_FILE: &str = "bubbles_last_session.txt";
pub(crate) const CRASH_FILE: &str = "bubbles_last_crash.txt";

/// Small key=value record of the running server, rewritten in place on every update.
#[derive(Clone, Debug)]
pub(crate) struct SessionLog {
    path: Option<PathBuf>,
    start_rfc3339: String,
    pid: u32,
    version: String,
    args: Vec<String>,
    listen: Option<String>,
    requests: u64,
    last_request: Option<String>,
    last_error: Option<String>,
}

impl SessionLog {
    pub(crate) fn new(storage_dir: &Path) -> Self {
        Self::with_path(Some(storage_dir.join(SESSION_LOG_FILE)))
    }

    #[cfg(test)]
    /// Keeps the record in memory only.
    pub(crate) fn detached() -> Self {
        Self::with_path(None)
    }

    fn with_path(path: Option<PathBuf>) -> Self {
        let this = Self {
            path,
            start_rfc3339: crate::time::rfc3339(crate::time::unix_ms()),
            pid: std::process::id(),
            version: crate::version_line(),
            args: std::env::args().collect(),
            listen: None,
            requests: 0,
            last_request: None,
            last_error: None,
        };
        this.flush();
        this
    }

    pub(crate) fn note_listen(&mut self, addr: &str) {
        self.listen = Some(addr.to_string());
        self.flush();
    }

    pub(crate) fn note_request(&mut self, request_line: &str) {
        self.requests = self.requests.saturating_add(1);
        self.last_request = Some(truncate(request_line.trim(), 160));
        self.flush();
    }

    pub(crate) fn note_error(&mut self, error: &str) {
        let error = error.trim();
        if error.is_empty() {
            return;
        }
        self.last_error = Some(truncate(error, 300));
        self.flush();
    }

    #[cfg(test)]
    pub(crate) fn requests(&self) -> u64 {
        self.requests
    }

    #[cfg(test)]
    pub(crate) fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        push_kv(&mut out, "ts_start", &self.start_rfc3339);
        push_kv(&mut out, "pid", &self.pid.to_string());
        push_kv(&mut out, "version", &self.version);
        push_kv(&mut out, "args", &format!("{:?}", self.args));
        if let Some(listen) = &self.listen {
            push_kv(&mut out, "listen", listen);
        }
        push_kv(&mut out, "requests", &self.requests.to_string());
        if let Some(line) = &self.last_request {
            push_kv(&mut out, "last_request", line);
        }
        if let Some(err) = &self.last_error {
            push_kv(&mut out, "last_error", err);
        }
        out
    }

    fn flush(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let _ = std::fs::write(path, self.render());
    }
}

pub(crate) fn install_crash_reporter(storage_dir: PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        let mut out = String::new();
        push_kv(&mut out, "ts", &crate::time::rfc3339(crate::time::unix_ms()));
        push_kv(&mut out, "pid", &std::process::id().to_string());
        push_kv(&mut out, "version", &crate::version_line());
        push_kv(&mut out, "detail", &info.to_string());
        out.push_str("backtrace:\n");
        out.push_str(&backtrace.to_string());
        let _ = std::fs::create_dir_all(&storage_dir);
        let _ = std::fs::write(storage_dir.join(CRASH_FILE), out);
        default_hook(info);
    }));
}

fn push_kv(out: &mut String, key: &str, value: &str) {
    use std::fmt::Write as _;
    let _ = writeln!(out, "{key}={value}");
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
