//! Tile Relay - A caching reverse proxy for raster map tiles.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_relay::{
    config::Config,
    server::{create_router, RouterConfig},
    source::SourceRegistry,
    tile::TileService,
    HttpTileFetcher, MemoryTileCache, ReverseGeocoder,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    run_serve(config).await
}

// =============================================================================
// Serve
// =============================================================================

async fn run_serve(config: Config) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    // Print startup banner and info
    print_banner();

    let registry = SourceRegistry::builtin();
    let source_ids: Vec<&str> = registry.all().iter().map(|s| s.source.id()).collect();

    info!("Configuration:");
    info!("  Sources: {}", source_ids.join(", "));
    info!(
        "  Cache: {}MB capacity, {}s TTL",
        config.cache_capacity / (1024 * 1024),
        config.cache_ttl_secs
    );
    info!(
        "  Geocoder: {} ({}s timeout)",
        config.geocode_url, config.geocode_timeout_secs
    );

    // Create the cache and upstream client
    let cache = MemoryTileCache::new(config.cache_capacity, config.cache_ttl());

    let fetcher = match HttpTileFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to build the upstream HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Create tile service
    let tile_service = TileService::new(registry, cache, fetcher);

    // Create the reverse-geocoding client
    let geocoder = match ReverseGeocoder::new(&config.geocode_url, config.geocode_timeout()) {
        Ok(geocoder) => geocoder,
        Err(e) => {
            error!("Geocoder configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Build router configuration
    let router_config = RouterConfig::new().with_tracing(!config.no_tracing);

    // Create router
    let router = create_router(tile_service, geocoder, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/sources", addr);
    info!("");
    info!("  Fetch a tile directly:");
    info!("    curl http://{}/tiles/streets/3/4/2 -o tile.png", addr);
    info!("");
    info!("  Reverse geocode a location:");
    info!("    curl 'http://{}/geocode/reverse?lat=48.858&lon=2.294'", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("████████╗██╗██╗     ███████╗                 ");
    info!("╚══██╔══╝██║██║     ██╔════╝                 ");
    info!("   ██║   ██║██║     █████╗                   ");
    info!("   ██║   ██║██║     ██╔══╝                   ");
    info!("   ██║   ██║███████╗███████╗                 ");
    info!("   ╚═╝   ╚═╝╚══════╝╚══════╝                 ");
    info!("");
    info!("██████╗ ███████╗██╗      █████╗ ██╗   ██╗    ");
    info!("██╔══██╗██╔════╝██║     ██╔══██╗╚██╗ ██╔╝    ");
    info!("██████╔╝█████╗  ██║     ███████║ ╚████╔╝     ");
    info!("██╔══██╗██╔══╝  ██║     ██╔══██║  ╚██╔╝      ");
    info!("██║  ██║███████╗███████╗██║  ██║   ██║       ");
    info!("╚═╝  ╚═╝╚══════╝╚══════╝╚═╝  ╚═╝   ╚═╝       ");
    info!("");
    info!("                 v{}", version);
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_relay=debug,tower_http=debug"
    } else {
        "tile_relay=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
