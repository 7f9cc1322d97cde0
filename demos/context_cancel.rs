use std::time::Duration;

use pooled_fetch::observability::logging::init_logging;
use pooled_fetch::{Client, ClientConfig, Context, Request};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("pooled_fetch=debug");

    let client = Client::new(ClientConfig::new().timeout(Duration::from_secs(10)), []);

    // The context gives up long before the server answers.
    let ctx = Context::background().with_timeout(Duration::from_millis(300));

    let mut request = Request::get("https://httpbin.org/delay/2")?;
    match client.fetch(&ctx, &mut request).await {
        Ok(response) => println!("status: {}", response.status_text()),
        Err(e) => println!("err: {} (timeout: {})", e, e.is_timeout()),
    }

    Ok(())
}
