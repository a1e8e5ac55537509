#[tokio::main]
async fn main() -> std::io::Result<()> {
    session_server::run_with_config().await
}
