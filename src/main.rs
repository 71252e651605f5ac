use std::{future::IntoFuture, process, sync::Arc};

use jester::{
    application::{error::AppError, jokes::JokeService, users::UserService},
    cache::{CacheAside, CacheClient},
    config,
    infra::{
        cache::connect_store,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        jokes::HttpJokeSource,
        telemetry,
    },
};
use tokio::sync::Notify;
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
        config::Command::Cache(args) => run_cache(settings, args.command).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings.database.url.as_deref().ok_or_else(|| {
        AppError::validation("database.url must be set (JESTER__DATABASE__URL or --database-url)")
    })?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    let repositories = Arc::new(PostgresRepositories::new(pool));

    let store = connect_store(&settings.cache).await?;
    let client = CacheClient::new(store);
    let aside = CacheAside::new(client.clone());

    let joke_source = HttpJokeSource::new(
        settings.jokes.upstream_url.clone(),
        settings.jokes.timeout,
    )?;

    let state = HttpState {
        users: Arc::new(UserService::new(
            repositories.clone(),
            aside.clone(),
            settings.cache.ttls,
            settings.cache.collection_policy,
        )),
        jokes: Arc::new(JokeService::new(
            Arc::new(joke_source),
            aside,
            settings.cache.ttls.joke,
        )),
        cache: client,
    };

    let result = serve_http(&settings, state).await;

    repositories.close().await;
    info!(target = "jester::serve", "Database pool closed");

    result
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "jester::serve",
        addr = %settings.server.addr,
        backend = %settings.cache.backend,
        "Listening"
    );

    let drain = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown({
            let drain = drain.clone();
            async move { drain.notified().await }
        })
        .into_future();
    tokio::pin!(server);

    let outcome = tokio::select! {
        result = &mut server => result,
        () = shutdown_signal() => {
            info!(
                target = "jester::serve",
                grace_secs = settings.server.graceful_shutdown.as_secs(),
                "Shutdown requested; draining in-flight requests"
            );
            drain.notify_one();
            match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        target = "jester::serve",
                        "Graceful shutdown timed out; dropping remaining connections"
                    );
                    Ok(())
                }
            }
        }
    };

    outcome.map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "jester::serve", error = %err, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "jester::serve", error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

async fn run_cache(
    settings: config::Settings,
    command: config::CacheCommand,
) -> Result<(), AppError> {
    let client = CacheClient::new(connect_store(&settings.cache).await?);
    run_cache_command(&client, command).await
}

async fn run_cache_command(
    client: &CacheClient,
    command: config::CacheCommand,
) -> Result<(), AppError> {
    match command {
        config::CacheCommand::Ttl { key } => {
            println!("{}", client.ttl(&key).await.as_seconds());
        }
        config::CacheCommand::Keys { pattern } => {
            for key in client.keys(&pattern).await {
                println!("{key}");
            }
        }
        config::CacheCommand::Flush => {
            client
                .flushall()
                .await
                .map_err(|err| AppError::unexpected(err.to_string()))?;
            info!(target = "jester::cache", "Cache flushed");
        }
    }
    Ok(())
}
