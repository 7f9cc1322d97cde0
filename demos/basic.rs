use std::time::Duration;

use pooled_fetch::observability::logging::init_logging;
use pooled_fetch::{Client, ClientConfig, ClientOption, Context, Request};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("pooled_fetch=debug");

    let client = Client::new(
        ClientConfig::new().timeout(Duration::from_secs(5)),
        [ClientOption::MaxConns(100)],
    );

    let mut request = Request::get("https://httpbin.org/get")?;
    request
        .add_query("q", "ping")
        .set_header("Accept", "application/json");

    let response = client.fetch(&Context::background(), &mut request).await?;

    println!("status: {}", response.status_text());
    println!("body: {}", response.text());

    Ok(())
}
