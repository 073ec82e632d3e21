use tower_lsp::Server;
use tracing_subscriber::EnvFilter;
use xmltools::create_service;

/// Log filter variable; stdout carries the protocol, so logs go to stderr.
const LOG_ENV: &str = "XMLTOOLS_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = create_service();
    Server::new(stdin, stdout, socket).serve(service).await;
}
