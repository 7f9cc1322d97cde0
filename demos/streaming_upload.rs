use std::time::Duration;

use pooled_fetch::observability::logging::init_logging;
use pooled_fetch::{Client, ClientConfig, Context, Request};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("pooled_fetch=debug");

    let path = std::env::args().nth(1).unwrap_or_else(|| "./bigfile.bin".to_string());
    let file = tokio::fs::File::open(&path).await?;

    let client = Client::new(ClientConfig::new().timeout(Duration::from_secs(60)), []);

    let mut request = Request::post("https://httpbin.org/post")?;
    request
        .set_header("Content-Type", "application/octet-stream")
        .set_body_reader(file);

    let response = client.fetch(&Context::background(), &mut request).await?;
    println!("uploaded {}: {}", path, response.status_text());

    Ok(())
}
