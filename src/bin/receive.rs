// Prints every message received from a tubeq server, one per line.

use std::process::ExitCode;

use tokio::io::{AsyncWriteExt, BufWriter};
use tubeq::Client;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let addr = std::env::var("TUBEQ_ADDR").unwrap_or_else(|_| "127.0.0.1:7878".to_string());
    match receive_forever(&addr).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn receive_forever(addr: &str) -> tubeq::Result<()> {
    let mut client = Client::connect(addr).await?;
    tracing::info!("connected to {}", addr);

    let mut out = BufWriter::new(tokio::io::stdout());
    loop {
        let message = client.receive().await?;
        out.write_all(message.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
}
