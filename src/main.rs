use std::process::ExitCode;

use tubeq::{Config, Server};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    match serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve() -> tubeq::Result<()> {
    let config = Config::from_env()?;
    let queue = config.build_queue().await?;
    Server::run(&config.server, queue).await
}
