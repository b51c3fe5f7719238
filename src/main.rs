use axum::extract::DefaultBodyLimit;
use axum::{Extension, Router, routing::get, routing::post};
use journaldb::ingest::handlers::{handle_health, handle_import};
use journaldb::journal::JournalFactory;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

// Multipart bodies carry whole table files; the framework default of 2 MB
// would reject most uploads.
const MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --bind <addr:port> --data-dir <path>",
            args[0]
        );
        eprintln!("Example: {} --bind 127.0.0.1:9000 --data-dir ./db", args[0]);
        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut data_dir: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--data-dir" => {
                data_dir = Some(args[i + 1].clone().into());
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.expect("--bind is required");
    let data_dir = data_dir.expect("--data-dir is required");

    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("journal root: {}", data_dir.display());

    let factory = Arc::new(JournalFactory::new(data_dir));

    let app = Router::new()
        .route("/import", post(handle_import))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(Extension(factory));

    tracing::info!("import endpoint listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
