use anyhow::Context;
use cueclub::domain::{PermissionOverrides, Role};
use cueclub::{api, config::Config, db::init_db, BroadcastNotifier, Notifier, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("configuration error")?;
    let port = config.port;

    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("failed to initialize database at {}", config.database_path))?;
    let repo = Arc::new(Repository::new(pool));

    // An empty staff table would lock everyone out.
    if repo.count_staff().await? == 0 {
        let admin = repo
            .insert_staff(&config.bootstrap_admin, Role::Admin, &PermissionOverrides::new())
            .await
            .context("failed to create bootstrap admin")?;
        tracing::warn!(staff_id = %admin.id, name = %admin.name, "created bootstrap admin");
    }

    let notifier: Arc<dyn Notifier> = Arc::new(BroadcastNotifier::default());
    let app = api::create_router(api::AppState::new(repo, config, notifier));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
