use std::{process, sync::Arc};

use librarise::{
    application::{
        browse::{CatalogQuery, SortOrder, genre_counts},
        catalog::CatalogLoader,
        error::AppError,
        repos::CatalogSource,
        taxonomy::TaxonomyLoader,
        theme::{ThemeResolver, Variant, VariantQuery},
    },
    cache::{CacheConfig, CacheService, DurableStore, FileStore, MemoryStore},
    config::{self, CatalogArgs, Command, RememberArgs, ResolveArgs, Settings, TaxonomyArgs},
    domain::{catalog::CatalogItem, taxonomy::TaxonomyNode},
    infra::{
        fallback::load_fallback_items,
        remote::{OfflineCatalogSource, RestCatalogSource},
        telemetry,
    },
};
use serde::Serialize;
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
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;
    let cache = build_cache_service(&settings);

    match cli_args.command {
        Command::Catalog(args) => run_catalog(&settings, cache, args).await,
        Command::Taxonomy(args) => run_taxonomy(&settings, cache, args).await,
        Command::Resolve(args) => run_resolve(&settings, cache, args).await,
        Command::Remember(args) => run_remember(cache, args),
        Command::Purge => run_purge(cache),
    }
}

fn build_cache_service(settings: &Settings) -> Arc<CacheService> {
    let config = CacheConfig::from(&settings.cache);
    let store: Arc<dyn DurableStore> = if settings.store.enabled {
        match FileStore::open(&settings.store.directory) {
            Ok(store) => Arc::new(store),
            Err(err) => {
                warn!(
                    error = %err,
                    directory = %settings.store.directory.display(),
                    "Durable store unavailable; caching in memory"
                );
                Arc::new(MemoryStore::new())
            }
        }
    } else {
        Arc::new(MemoryStore::new())
    };
    Arc::new(CacheService::init(store, config))
}

fn build_source(settings: &Settings, offline: bool) -> Result<Arc<dyn CatalogSource>, AppError> {
    if offline || settings.remote.base_url.is_none() {
        info!("Remote catalog disabled; serving cached data only");
        return Ok(Arc::new(OfflineCatalogSource));
    }
    Ok(Arc::new(RestCatalogSource::new(&settings.remote)?))
}

#[derive(Serialize)]
struct CatalogOutput<'a> {
    genre: Option<&'a str>,
    sort: String,
    is_empty: bool,
    items: Vec<ItemOutput<'a>>,
    featured: Vec<ItemOutput<'a>>,
}

#[derive(Serialize)]
struct ItemOutput<'a> {
    #[serde(flatten)]
    item: &'a CatalogItem,
    discounted_price: f64,
}

impl<'a> From<&'a CatalogItem> for ItemOutput<'a> {
    fn from(item: &'a CatalogItem) -> Self {
        Self {
            item,
            discounted_price: item.discounted_price(),
        }
    }
}

async fn run_catalog(
    settings: &Settings,
    cache: Arc<CacheService>,
    args: CatalogArgs,
) -> Result<(), AppError> {
    let source = build_source(settings, args.offline)?;
    let fallback = match settings.catalog.fallback_file.as_deref() {
        Some(path) => load_fallback_items(path).await.unwrap_or_else(|err| {
            warn!(error = %err, "Fallback catalog unavailable");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let loader = CatalogLoader::mount(source, cache).with_fallback(fallback);
    let state = loader.revalidate().await;

    let query = CatalogQuery {
        genre: args.genre.clone(),
        sort: args.sort,
    };
    let selected = query.apply(&state.items);
    print_json(&CatalogOutput {
        genre: args.genre.as_deref(),
        sort: args.sort.to_string(),
        is_empty: selected.is_empty(),
        items: selected.iter().map(ItemOutput::from).collect(),
        featured: if args.sort == SortOrder::Default && args.genre.is_none() {
            state.featured_items.iter().map(ItemOutput::from).collect()
        } else {
            Vec::new()
        },
    })
}

#[derive(Serialize)]
struct TaxonomyOutput<'a> {
    names: &'a [String],
    counts: Vec<(String, usize)>,
    tree: &'a [TaxonomyNode],
}

async fn run_taxonomy(
    settings: &Settings,
    cache: Arc<CacheService>,
    args: TaxonomyArgs,
) -> Result<(), AppError> {
    let source = build_source(settings, args.offline)?;
    let items = cache
        .catalog()
        .read()
        .map(|listing| listing.items)
        .unwrap_or_default();

    let loader = TaxonomyLoader::mount(source, cache);
    let state = if args.offline {
        loader.state()
    } else {
        loader.revalidate().await
    };

    print_json(&TaxonomyOutput {
        names: &state.names,
        counts: genre_counts(&items, &state.names),
        tree: &state.tree,
    })
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    taxonomy: Option<&'a str>,
    item: Option<&'a str>,
    variant: Variant,
}

async fn run_resolve(
    settings: &Settings,
    cache: Arc<CacheService>,
    args: ResolveArgs,
) -> Result<(), AppError> {
    if args.taxonomy.is_none() && args.item.is_none() {
        return Err(AppError::validation("pass --taxonomy, --item or both"));
    }

    let source = build_source(settings, !args.refresh)?;
    let loader = Arc::new(TaxonomyLoader::mount(source, cache.clone()));
    if args.refresh {
        loader.revalidate().await;
    }

    let resolver = ThemeResolver::new(cache).with_live_taxonomy(loader);
    let query = VariantQuery {
        taxonomy_name: args.taxonomy.clone(),
        item_id: args.item.clone(),
    };
    print_json(&ResolveOutput {
        taxonomy: args.taxonomy.as_deref(),
        item: args.item.as_deref(),
        variant: resolver.variant(&query),
    })
}

fn run_remember(cache: Arc<CacheService>, args: RememberArgs) -> Result<(), AppError> {
    if args.item.trim().is_empty() || args.name.trim().is_empty() {
        return Err(AppError::validation("item and name must not be blank"));
    }
    cache.remember_association(&args.item, &args.name);
    info!(item = %args.item, taxonomy = %args.name, "Association remembered");
    print_json(&serde_json::json!({
        "item": args.item,
        "taxonomy": args.name,
        "remembered": cache.associations().len(),
    }))
}

fn run_purge(cache: Arc<CacheService>) -> Result<(), AppError> {
    cache.purge_all();
    print_json(&serde_json::json!({ "purged": true }))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
