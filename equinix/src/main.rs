use equinix::EquinixProvider;
use tfplug::context::Context;
use tfplug::provider::schema_document;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    // TODO: serve the plugin protocol over gRPC once tfplug grows a server
    let provider = EquinixProvider::new();
    let document = schema_document(&provider, Context::new()).await;
    println!("{}", serde_json::to_string_pretty(&document)?);

    Ok(())
}
