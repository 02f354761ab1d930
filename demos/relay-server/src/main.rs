use watchlink::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let server = RelayServerBuilder::new()
        .bind("0.0.0.0:9160")
        .build()
        .await?;

    server.run().await?;
    Ok(())
}
