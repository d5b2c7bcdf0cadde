use axum::extract::DefaultBodyLimit;
use recruitment_api::{
    config::Config,
    database::{
        pool::{create_pool, run_migrations},
        Repositories,
    },
    middleware::cors::cors_layer,
    routes, AppState, Collaborators,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.json_logs);

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    info!("database migrations applied");

    let collaborators = Collaborators::from_config(&config)?;
    let app_state = AppState::new(config, Repositories::postgres(pool), collaborators);
    let config = app_state.config.clone();

    {
        let worker = app_state.task_worker.clone();
        let idle = Duration::from_millis(config.worker_poll_ms);
        tokio::spawn(async move {
            loop {
                match worker.run_once().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(idle).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "task worker error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
    }

    {
        let worker = app_state.task_worker.clone();
        let timeout = Duration::from_secs(config.task_timeout_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(60));
            loop {
                ticker.tick().await;
                if let Err(e) = worker.reap_stale(timeout).await {
                    tracing::error!(error = ?e, "stale task reaper error");
                }
            }
        });
    }

    let app = routes::router(app_state)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
