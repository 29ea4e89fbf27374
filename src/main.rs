use std::sync::Arc;

use anyhow::Context;
use tokio::{signal, sync::mpsc};
use tracing::{error, info};

use storefront_checkout as checkout;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = checkout::config::load_config().context("failed to load configuration")?;
    checkout::config::init_tracing(&cfg.log_level, cfg.log_json);

    let db = checkout::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_create_schema {
        checkout::entities::ensure_schema(&db).await.map_err(|e| {
            error!("Failed creating schema: {}", e);
            e
        })?;
    }
    let db = Arc::new(db);

    // Init events
    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = Arc::new(checkout::events::EventSender::new(event_tx));
    tokio::spawn(checkout::events::process_events(event_rx));

    let store: Arc<dyn checkout::repositories::CheckoutStore> =
        Arc::new(checkout::repositories::SeaOrmCheckoutStore::new(db.clone()));
    let services = checkout::handlers::AppServices::new(
        store,
        Arc::new(checkout::clock::SystemClock),
        &cfg,
        Some(event_sender),
    );

    let app = checkout::app_router(checkout::AppState {
        config: cfg.clone(),
        services,
        db: Some(db),
    });

    let addr = cfg.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Carts are stored under {}", cfg.cart_storage_dir);
    info!("storefront-checkout listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
