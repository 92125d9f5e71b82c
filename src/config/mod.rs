//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::browse::SortOrder;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "librarise";
const ENV_PREFIX: &str = "LIBRARISE";
const DEFAULT_STORE_DIR: &str = ".librarise";
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;
const DEFAULT_TAXONOMY_TTL_SECS: u64 = 600;
const DEFAULT_ASSOCIATION_CAPACITY: usize = 50;
const DEFAULT_FEATURED_FALLBACK_COUNT: usize = 4;

/// Command-line arguments for the librarise binary.
#[derive(Debug, Parser)]
#[command(
    name = "librarise",
    version,
    about = "Storefront catalog cache and theme resolver"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "LIBRARISE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the durable store directory.
    #[arg(
        long = "store-directory",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub store_directory: Option<PathBuf>,

    /// Keep cached data in memory only for this invocation.
    #[arg(long = "ephemeral", action = clap::ArgAction::SetTrue, global = true)]
    pub ephemeral: bool,

    /// Override the remote catalog base URL.
    #[arg(long = "remote-url", value_name = "URL", global = true)]
    pub remote_url: Option<String>,

    /// Override the remote request timeout.
    #[arg(long = "remote-timeout-seconds", value_name = "SECONDS", global = true)]
    pub remote_timeout_seconds: Option<u64>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the catalog: cached state first, then revalidated against the remote.
    Catalog(CatalogArgs),
    /// Print the two-level genre taxonomy.
    Taxonomy(TaxonomyArgs),
    /// Resolve the presentation variant for a genre name or item.
    Resolve(ResolveArgs),
    /// Record which genre an item was viewed under.
    Remember(RememberArgs),
    /// Remove every cached entry from the durable store.
    Purge,
}

#[derive(Debug, Args, Clone, Default)]
pub struct CatalogArgs {
    /// Only show items of this genre.
    #[arg(long, value_name = "GENRE")]
    pub genre: Option<String>,

    /// Sort order (default|price-asc|price-desc|rating).
    #[arg(long, value_name = "ORDER", default_value_t = SortOrder::Default)]
    pub sort: SortOrder,

    /// Skip the network and print cached (or fallback) data only.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub offline: bool,
}

#[derive(Debug, Args, Clone, Default)]
pub struct TaxonomyArgs {
    /// Skip the network and print cached data only.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub offline: bool,
}

#[derive(Debug, Args, Clone, Default)]
pub struct ResolveArgs {
    /// Genre or subgroup name.
    #[arg(long = "taxonomy", value_name = "NAME")]
    pub taxonomy: Option<String>,

    /// Item identifier, resolved through its remembered genre.
    #[arg(long = "item", value_name = "ID")]
    pub item: Option<String>,

    /// Revalidate the taxonomy before resolving.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub refresh: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RememberArgs {
    /// Item identifier.
    #[arg(value_name = "ITEM")]
    pub item: String,

    /// Genre or subgroup name the item belongs to.
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub store: StoreSettings,
    pub remote: RemoteSettings,
    pub cache: CacheSettings,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub directory: PathBuf,
    /// When false, cached data lives in memory for the lifetime of the process.
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    /// `None` leaves the binary offline: every refresh reports the source unavailable.
    pub base_url: Option<Url>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub catalog_ttl: Duration,
    pub taxonomy_ttl: Duration,
    pub association_capacity: NonZeroUsize,
    pub featured_fallback_count: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// JSON array of item records shown when the remote is unreachable and nothing is cached.
    pub fallback_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    store: RawStoreSettings,
    remote: RawRemoteSettings,
    cache: RawCacheSettings,
    catalog: RawCatalogSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(directory) = overrides.store_directory.as_ref() {
            self.store.directory = Some(directory.clone());
        }
        if overrides.ephemeral {
            self.store.enabled = Some(false);
        }
        if let Some(url) = overrides.remote_url.as_ref() {
            self.remote.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.remote_timeout_seconds {
            self.remote.timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            logging: build_logging_settings(raw.logging)?,
            store: build_store_settings(raw.store),
            remote: build_remote_settings(raw.remote)?,
            cache: build_cache_settings(raw.cache)?,
            catalog: build_catalog_settings(raw.catalog),
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_store_settings(store: RawStoreSettings) -> StoreSettings {
    StoreSettings {
        directory: store
            .directory
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
        enabled: store.enabled.unwrap_or(true),
    }
}

fn build_remote_settings(remote: RawRemoteSettings) -> Result<RemoteSettings, LoadError> {
    let base_url = match non_blank(remote.base_url) {
        Some(value) => {
            let url = Url::parse(&value)
                .map_err(|err| LoadError::invalid("remote.base_url", err.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "remote.base_url",
                    format!("unsupported scheme `{}`", url.scheme()),
                ));
            }
            Some(url)
        }
        None => None,
    };

    let timeout = seconds(
        remote.timeout_seconds.unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS),
        "remote.timeout_seconds",
    )?;

    Ok(RemoteSettings {
        base_url,
        api_key: non_blank(remote.api_key),
        timeout,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    Ok(CacheSettings {
        catalog_ttl: seconds(
            cache.catalog_ttl_seconds.unwrap_or(DEFAULT_CATALOG_TTL_SECS),
            "cache.catalog_ttl_seconds",
        )?,
        taxonomy_ttl: seconds(
            cache
                .taxonomy_ttl_seconds
                .unwrap_or(DEFAULT_TAXONOMY_TTL_SECS),
            "cache.taxonomy_ttl_seconds",
        )?,
        association_capacity: non_zero_usize(
            cache
                .association_capacity
                .unwrap_or(DEFAULT_ASSOCIATION_CAPACITY),
            "cache.association_capacity",
        )?,
        featured_fallback_count: non_zero_usize(
            cache
                .featured_fallback_count
                .unwrap_or(DEFAULT_FEATURED_FALLBACK_COUNT),
            "cache.featured_fallback_count",
        )?,
    })
}

fn build_catalog_settings(catalog: RawCatalogSettings) -> CatalogSettings {
    CatalogSettings {
        fallback_file: catalog.fallback_file,
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    directory: Option<PathBuf>,
    enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRemoteSettings {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    catalog_ttl_seconds: Option<u64>,
    taxonomy_ttl_seconds: Option<u64>,
    association_capacity: Option<usize>,
    featured_fallback_count: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCatalogSettings {
    fallback_file: Option<PathBuf>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn non_zero_usize(value: usize, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
