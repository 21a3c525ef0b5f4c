#![forbid(unsafe_code)]

mod assets;
mod config;
mod csrf;
mod handlers;
mod http;
mod render;
mod server;
mod session_log;
mod time;


use bubbles_storage::SqliteStore;
use config::ServerConfig;
use csrf::CsrfSigner;
use server::Server;
use session_log::{SessionLog, install_crash_reporter};
use std::net::TcpListener;
use std::sync::atomic::AtomicBool;

const SERVER_NAME: &str = "bubbles";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() -> &'static str {
    "bubbles: pop-able to-do bubbles, served over HTTP\n\n\
USAGE:\n\
  bubbles [--storage-dir DIR] [--host ADDR] [--port N]\n\
\n\
FLAGS:\n\
  -h, --help       Print this help and exit\n\
  -V, --version    Print version and exit\n\
\n\
ENVIRONMENT:\n\
  SECRET_KEY           Form signing key (required)\n\
  BUBBLES_STORAGE_DIR  Directory holding bubbles.db (default: .)\n\
  BUBBLES_HOST         Listen address (default: 127.0.0.1)\n\
  BUBBLES_PORT         Listen port (default: 5000)\n"
}

pub(crate) fn version_line() -> String {
    format!("{SERVER_NAME} {SERVER_VERSION}")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = std::env::args().collect::<Vec<_>>();
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print!("{}", usage());
        return Ok(());
    }
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        println!("{}", version_line());
        return Ok(());
    }

    let config = match ServerConfig::from_process() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{SERVER_NAME}: {err}");
            std::process::exit(2);
        }
    };
    install_crash_reporter(config.storage_dir.clone());

    // Schema exists before the first connection is accepted.
    let store = SqliteStore::open(&config.storage_dir)?;
    let listener = TcpListener::bind(config.listen_addr())?;
    let addr = listener.local_addr()?;

    let mut log = SessionLog::new(&config.storage_dir);
    log.note_listen(&addr.to_string());
    eprintln!(
        "{SERVER_NAME}: {} bubbles in {}; listening on http://{addr}",
        store.count()?,
        config.storage_dir.display()
    );

    let shutdown = AtomicBool::new(false);
    let mut server = Server::new(store, CsrfSigner::new(&config.secret_key), log);
    server.run(listener, &shutdown)?;
    Ok(())
}
