//! Resolves the client of an authentication payload against a JSON fixture store.
//!
//! Useful to check client fixtures and cache behavior outside a host service:
//!
//! ```text
//! tenant-lookup --clients clients.json --auth '{"clientCode":"acme"}' --repeat 3
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use api_session::{
    AuthenticationData, ClientCacheConfig, ClientModelSettings, ClientStore, ClientStoreRegistry,
    InMemoryClientStore, SessionManager, StoreLocation,
};
use clap::Parser;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "tenant-lookup", about = "Resolve the client of an authentication payload")]
struct Cli {
    /// JSON file holding an array of client records.
    #[arg(long)]
    clients: PathBuf,

    /// Service settings document; its `clients` section configures the client model.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Authentication payload as JSON.
    #[arg(long, default_value = "{}")]
    auth: String,

    /// Service sub-directory under the working directory.
    #[arg(long, env = "MS_PATH")]
    ms_path: Option<String>,

    /// Number of lookups to run with the same payload.
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// Bypass the client cache for every lookup.
    #[arg(long)]
    no_cache: bool,

    /// Lifetime of cached clients in seconds.
    #[arg(long, default_value_t = 600)]
    ttl_secs: u64,

    /// Abort a single store lookup after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api_session=debug,tenant_lookup=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let auth = AuthenticationData::from_json(&cli.auth).context("parsing --auth payload")?;

    let mut location = StoreLocation::from_env().context("reading working directory")?;
    location.ms_path = cli.ms_path.filter(|p| !p.is_empty());

    let settings = match &cli.settings {
        Some(path) => ClientModelSettings::from_settings_file(path).await?,
        None => ClientModelSettings::default(),
    };
    let store = Arc::new(InMemoryClientStore::with_settings(settings));
    let loaded = store.load_json_file(&cli.clients).await?;
    info!(
        clients = loaded,
        table = store.table(),
        database = store.database_key(),
        "client fixtures loaded"
    );

    let registry = ClientStoreRegistry::new();
    registry.register_store(&location, Arc::clone(&store) as Arc<dyn ClientStore>);
    info!(locations = ?registry.locations(), "client stores registered");

    let mut config = ClientCacheConfig::default().with_ttl(Duration::from_secs(cli.ttl_secs));
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_fetch_timeout(Duration::from_millis(timeout_ms));
    }
    let manager = SessionManager::from_registry(&registry, &location, config);

    for attempt in 1..=cli.repeat {
        let session = manager.session(auth.clone());
        session.set_use_cache(!cli.no_cache);

        match session.client().await? {
            Some(client) => println!("{}", serde_json::to_string_pretty(&*client)?),
            None => println!("null"),
        }
        info!(attempt, store_calls = store.fetch_count(), "lookup complete");
    }

    Ok(())
}
