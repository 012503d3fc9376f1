mod archive;

use chrono::Local;
use content_engine::{
    build_sources, create_http_client, init_logging, ContentGenerator, EngineConfig, EngineError,
    GenerationHistory, PageFetcher, RandomPicker, ResourceCatalog, TemplateRegistry,
};
use std::time::Duration;
use tracing::{error, info, warn};

// --- Main ---

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = EngineConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    info!(
        history = %config.history_path.display(),
        catalog_cache = %config.catalog_cache_path.display(),
        output = %config.output_dir.display(),
        "Starting Content Agent"
    );

    // 1. Sources (shared HTTP client for connection pooling)
    let http_client = create_http_client(config.http_timeout_secs)?;
    let fetcher = PageFetcher::new(http_client, Duration::from_secs(config.fetch_retry_elapsed_secs));
    let source_configs = config.source_configs()?;
    info!(count = source_configs.len(), "Loaded source configuration");
    let sources = build_sources(&source_configs, &fetcher)?;

    // 2. Catalog and history
    let mut catalog = ResourceCatalog::new(sources).with_cache_path(&config.catalog_cache_path);
    let mut history = GenerationHistory::load(&config.history_path);
    info!(previous_posts = history.seen_count(), "History loaded");

    // 3. Generate
    let mut generator = ContentGenerator::new(TemplateRegistry::builtin(), RandomPicker::thread())
        .with_footer(config.footer.clone())
        .with_retry_budget(config.retry_budget);

    let post = match generator
        .generate(&mut catalog, &mut history, config.catalog_max_age_hours)
        .await
    {
        Ok(post) => post,
        Err(EngineError::NoResourcesAvailable) => {
            warn!("No resources available from any source, try again later");
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, "Content generation failed");
            return Err(e.into());
        }
    };

    info!(title = %post.title, template = %post.template, "Content generated");

    // 4. Archive
    let post_path = archive::archive_post(&config.output_dir, &post, Local::now().date_naive())?;

    println!("TITLE: {}\n\n{}", post.title, post.body);
    info!(path = %post_path.display(), "Content Agent completed successfully");

    Ok(())
}
