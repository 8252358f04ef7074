use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let defaults = MockConfig::default();
    let config = MockConfig {
        read_token: std::env::var("YUPDATES_READ_TOKEN").unwrap_or(defaults.read_token),
        write_token: std::env::var("YUPDATES_WRITE_TOKEN").unwrap_or(defaults.write_token),
        write_feed_id: std::env::var("YUPDATES_WRITE_FEED").unwrap_or(defaults.write_feed_id),
    };

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, write_feed = %config.write_feed_id, "listening");
    mock_server::run_with(listener, config).await
}
