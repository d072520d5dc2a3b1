use tracing_subscriber::EnvFilter;

use taskdeck::api::routes;
use taskdeck::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taskdeck=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    routes::serve(config).await
}
