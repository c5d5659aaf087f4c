use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use bus_planner::engine::{EngineConfig, EngineHandle, load_engine};
use bus_planner::places::{NominatimClient, PlaceBackend, PlacesConfig};
use bus_planner::walking::{OsrmClient, WalkingBackend, WalkingConfig};
use bus_planner::web::{AppState, create_router};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Default feed reload interval (24 hours).
const DEFAULT_RELOAD_SECS: u64 = 24 * 60 * 60;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Everything needed to (re)load the engine.
#[derive(Clone)]
struct Loader {
    feed_dir: PathBuf,
    config: EngineConfig,
    walker: WalkingBackend,
    places: PlaceBackend,
}

impl Loader {
    /// Load the feed off the async executor and install it.
    async fn load_into(&self, handle: &EngineHandle) -> bool {
        let loader = self.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            load_engine(&loader.feed_dir, loader.config, loader.walker, loader.places)
        })
        .await;

        match loaded {
            Ok(Ok(engine)) => {
                let status = engine.status();
                handle.replace(engine).await;
                info!(
                    stops = status.stops,
                    routes = status.routes,
                    trips = status.trips,
                    "Feed loaded"
                );
                true
            }
            Ok(Err(e)) => {
                error!(error = %e, path = %self.feed_dir.display(), "Failed to load feed");
                false
            }
            Err(e) => {
                error!(error = %e, "Feed loading task failed");
                false
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let Ok(feed_dir) = std::env::var("FEED_DIR") else {
        error!("FEED_DIR must point at a feed directory");
        std::process::exit(1);
    };

    let walker = match std::env::var("WALK_ROUTER_URL") {
        Ok(url) => {
            let config = WalkingConfig::default().with_base_url(url);
            WalkingBackend::Osrm(OsrmClient::new(config).expect("Failed to create walking client"))
        }
        Err(_) => {
            info!("WALK_ROUTER_URL not set, walks will be straight lines");
            WalkingBackend::StraightLine
        }
    };

    let places = match std::env::var("GEOCODER_URL") {
        Ok(url) => {
            let config = PlacesConfig::default().with_base_url(url);
            PlaceBackend::Nominatim(NominatimClient::new(config).expect("Failed to create geocoder"))
        }
        Err(_) => PlaceBackend::Disabled,
    };

    let reload_interval = std::env::var("FEED_RELOAD_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(Duration::from_secs(DEFAULT_RELOAD_SECS), Duration::from_secs);

    let loader = Loader {
        feed_dir: PathBuf::from(feed_dir),
        config: EngineConfig::default(),
        walker,
        places,
    };

    // Serve even when the first load fails; requests get 503 until a reload succeeds
    let handle = EngineHandle::new();
    loader.load_into(&handle).await;

    let reload_handle = handle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(reload_interval);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            if !loader.load_into(&reload_handle).await {
                warn!("Keeping previous feed version");
            }
        }
    });

    let app = create_router(AppState::new(handle));

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .expect("BIND_ADDR must be a socket address");

    info!(%addr, "Bus itinerary engine listening");
    info!("  GET  /health            - Health check");
    info!("  GET  /feed/status       - Loaded feed counts");
    info!("  POST /itineraries/plan  - Plan itineraries");
    info!("  GET  /stops/nearby      - Stops around a point");
    info!("  GET  /calendar/day      - Services running on a date");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
