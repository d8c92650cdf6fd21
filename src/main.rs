use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    review_rag::cli::run().await
}
