use std::{path::Path, process, sync::Arc};

use isupipe::{
    application::{
        error::AppError,
        repos::CacheSource,
        reset::{ResetService, StoreReset},
    },
    cache::{CacheLoader, EntityCaches, Icon, LoadReport},
    config,
    infra::{
        db::MysqlRepositories,
        error::InfraError,
        http::{self, HttpState},
        reset::ScriptStoreReset,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Load(_) => run_load(settings).await,
    }
}

struct ApplicationContext {
    caches: Arc<EntityCaches>,
    store: Arc<dyn CacheSource>,
    reset: Arc<ResetService>,
}

async fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let pool = MysqlRepositories::connect(
        &settings.database.url,
        settings.database.max_connections.get(),
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let store: Arc<dyn CacheSource> = Arc::new(MysqlRepositories::new(pool));
    let caches = Arc::new(EntityCaches::new());
    let loader = Arc::new(CacheLoader::new(caches.clone(), store.clone()));
    let store_reset: Arc<dyn StoreReset> =
        Arc::new(ScriptStoreReset::new(settings.reset.init_script.clone()));
    let reset = Arc::new(ResetService::new(store_reset, loader));

    Ok(ApplicationContext {
        caches,
        store,
        reset,
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;

    // Requests are only accepted once every cache holds store contents.
    let report = app.reset.reload().await?;
    log_report("startup", &report);

    let fallback_icon = read_fallback_icon(&settings.icons.fallback_path).await;

    let state = HttpState {
        caches: app.caches,
        reset: app.reset,
        store: app.store,
        fallback_icon,
    };
    let router = http::build_router(state);

    let addr = settings.server.addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::from(InfraError::Bind { addr, source }))?;

    info!(target = "isupipe::main", %addr, "Listening");

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn run_load(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;
    let report = app.reset.reload().await?;
    log_report("load", &report);

    for (entity, rows) in &report.rows {
        println!("{entity}\t{rows}");
    }
    Ok(())
}

fn log_report(phase: &'static str, report: &LoadReport) {
    let total_rows: usize = report.rows.iter().map(|(_, rows)| rows).sum();
    info!(
        target = "isupipe::main",
        phase,
        generation = report.generation,
        elapsed_ms = report.elapsed.as_millis() as u64,
        total_rows,
        "Caches loaded"
    );
}

async fn read_fallback_icon(path: &Path) -> Option<Arc<Icon>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(Arc::new(Icon::new(bytes))),
        Err(err) => {
            warn!(
                target = "isupipe::main",
                path = %path.display(),
                error = %err,
                "Fallback icon unavailable; users without an icon will get 404"
            );
            None
        }
    }
}
