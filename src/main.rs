use std::{
    io::{self, Write},
    process::ExitCode,
    sync::Arc,
};

use catalog::{
    application::{
        catalog::{CatalogService, SearchParams, SortParams, parse_product_id},
        error::AppError,
        pagination::PageRequest,
        repos::{ProductsRepo, ProductsWriteRepo},
    },
    cache::{CacheConfig, build_cache},
    config::{self, Command, GetArgs, ListArgs, SearchArgs, Settings},
    infra::{db::PostgresRepositories, error::InfraError, telemetry},
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %report.chain(), source = report.source, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report.chain(), source = report.source, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        Command::Migrate(_) => run_migrate(&settings).await,
        Command::List(args) => run_list(&settings, args).await,
        Command::Get(args) => run_get(&settings, args).await,
        Command::Search(args) => run_search(&settings, *args).await,
    }
}

async fn run_migrate(settings: &Settings) -> Result<(), AppError> {
    let repositories = init_repositories(settings).await?;
    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!("database migrations applied");
    Ok(())
}

async fn run_list(settings: &Settings, args: ListArgs) -> Result<(), AppError> {
    let request = PageRequest::from_raw(args.page, args.limit)
        .ok_or_else(|| AppError::validation("--page and --limit must be positive integers"))?;

    let service = build_service(settings).await?;
    let page = service.list(request).await?;
    print_json(&page)
}

async fn run_get(settings: &Settings, args: GetArgs) -> Result<(), AppError> {
    let id = parse_product_id(&args.id)?;

    let service = build_service(settings).await?;
    let product = service.get(id).await?;
    print_json(&product)
}

async fn run_search(settings: &Settings, args: SearchArgs) -> Result<(), AppError> {
    let SearchArgs {
        database: _,
        q,
        category,
        subcategory,
        min_price,
        max_price,
        min_likes,
        sort_by,
        order,
    } = args;
    let params = SearchParams {
        q,
        category,
        subcategory,
        min_price,
        max_price,
        min_likes,
    };
    let sort = SortParams { sort_by, order };

    let service = build_service(settings).await?;
    let products = service.search(&params, &sort).await?;
    print_json(&products)
}

async fn init_repositories(settings: &Settings) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn build_service(settings: &Settings) -> Result<CatalogService, AppError> {
    let repositories = init_repositories(settings).await?;
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let reader: Arc<dyn ProductsRepo> = repositories.clone();
    let writer: Arc<dyn ProductsWriteRepo> = repositories;
    let cache_config = CacheConfig::from(&settings.cache);
    let cache = build_cache(&cache_config);

    Ok(CatalogService::new(
        reader,
        writer,
        cache,
        cache_config.listing_ttl,
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)
        .map_err(|err| AppError::from(InfraError::output(err.to_string())))?;
    writeln!(handle).map_err(|err| AppError::from(InfraError::output(err.to_string())))?;
    Ok(())
}
