#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let config = citypulse_server::config::Config::from_env()?;
    citypulse_server::web::start_web_server(config).await
}
