#[tokio::main]
async fn main() {
    if let Err(err) = http_requests::mcp::server::run_stdio().await {
        eprintln!("{}: {}", http_requests::constants::server::NAME, err);
        std::process::exit(1);
    }
}
