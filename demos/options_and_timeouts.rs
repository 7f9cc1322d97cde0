use std::time::{Duration, Instant};

use pooled_fetch::observability::logging::init_logging;
use pooled_fetch::{Client, ClientConfig, ClientOption, Context, Request};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("pooled_fetch=debug");

    let client = Client::new(
        ClientConfig::new().timeout(Duration::from_secs(3)),
        [
            ClientOption::ConnTimeout(Duration::from_millis(500)),
            ClientOption::ResponseHeaderTimeout(Duration::from_secs(2)),
            ClientOption::IdleConnTimeout(Duration::from_secs(30)),
            ClientOption::MaxConns(50),
        ],
    );
    println!("config: {:?}", client.config());

    let mut request = Request::get("https://httpbin.org/delay/1")?;
    let start = Instant::now();
    let result = client.fetch(&Context::background(), &mut request).await;
    let elapsed = start.elapsed();

    match result {
        Ok(response) => println!("status: {}", response.status_text()),
        Err(e) => println!("err: {}", e),
    }
    println!("elapsed: {:?}", elapsed);

    Ok(())
}
