//! The itinerary engine: one loaded feed version plus the services that
//! turn searches into itineraries.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{DirectMemo, MemoConfig};
use crate::calendar::{ActiveServices, DayClassification};
use crate::domain::{DAY_SECS, DomainError, LatLon, SearchMode, TimeWindow, parse_clock};
use crate::feed::{Feed, FeedError, FeedIndex};
use crate::itinerary::{Assembler, AssemblerConfig, Itinerary};
use crate::places::{PlaceBackend, PlaceResolver};
use crate::planner::{
    CancelToken, Planner, SearchConfig, SearchError, SearchRequest, SupersedeRegistry,
};
use crate::stops::{LookupStage, NearbyQuery, NearbyResult, nearby};
use crate::walking::{WalkingBackend, WalkingProvider};

/// Errors returned by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// No feed loaded, or the loaded feed has no stops or trips
    #[error("engine not ready")]
    NotReady,

    /// A newer request from the same session replaced this one
    #[error("request superseded by a newer one")]
    Cancelled,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<SearchError> for EngineError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Cancelled => Self::Cancelled,
            SearchError::InvalidRequest(msg) => Self::InvalidRequest(msg),
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(e: DomainError) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}

/// Tunables for every stage of the engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub assembly: AssemblerConfig,
    pub memo: MemoConfig,
}

/// A door-to-door planning request.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub origin: LatLon,
    pub destination: LatLon,
    pub date: NaiveDate,
    /// Clock time, `HH:MM` or `HH:MM:SS`.
    pub time: String,
    pub mode: SearchMode,
    /// Search window in minutes; the configured default when absent.
    pub window_mins: Option<i64>,
    pub origin_stop_ids: Vec<String>,
    pub destination_stop_ids: Vec<String>,
    pub origin_label: Option<String>,
    pub destination_label: Option<String>,
    /// Enables supersession: a newer request with the same id cancels this one.
    pub session_id: Option<String>,
}

impl PlanRequest {
    pub fn new(origin: LatLon, destination: LatLon, date: NaiveDate, time: impl Into<String>) -> Self {
        Self {
            origin,
            destination,
            date,
            time: time.into(),
            mode: SearchMode::Depart,
            window_mins: None,
            origin_stop_ids: Vec::new(),
            destination_stop_ids: Vec::new(),
            origin_label: None,
            destination_label: None,
            session_id: None,
        }
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Ranked itineraries for a [`PlanRequest`].
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub itineraries: Vec<Itinerary>,
    /// Strategies that produced the origin stops.
    pub origin_stages: Vec<LookupStage>,
    pub destination_stages: Vec<LookupStage>,
    pub hubs_explored: usize,
}

/// Counts describing the loaded feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedStatus {
    pub stops: usize,
    pub routes: usize,
    pub trips: usize,
    pub calendar_rules: usize,
    pub calendar_exceptions: usize,
    pub memo_entries: u64,
    pub active_sessions: usize,
}

/// Everything needed to answer requests against one feed version.
///
/// The index is immutable; a new feed version gets a new engine.
pub struct Engine<W = WalkingBackend, P = PlaceBackend> {
    index: Arc<FeedIndex>,
    memo: DirectMemo,
    config: EngineConfig,
    walker: W,
    places: P,
    sessions: SupersedeRegistry,
}

impl<W: WalkingProvider, P: PlaceResolver> Engine<W, P> {
    pub fn new(index: FeedIndex, config: EngineConfig, walker: W, places: P) -> Self {
        Self {
            index: Arc::new(index),
            memo: DirectMemo::new(&config.memo),
            config,
            walker,
            places,
            sessions: SupersedeRegistry::new(),
        }
    }

    pub fn index(&self) -> &FeedIndex {
        &self.index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn ready(&self) -> Result<&FeedIndex, EngineError> {
        if self.index.is_empty() {
            return Err(EngineError::NotReady);
        }
        Ok(&self.index)
    }

    /// Plan itineraries between two coordinates.
    ///
    /// Finding nothing is a successful, empty outcome.
    pub async fn plan(&self, request: PlanRequest) -> Result<PlanOutcome, EngineError> {
        let index = self.ready()?;
        let search = &self.config.search;

        if !request.origin.is_valid() || !request.destination.is_valid() {
            return Err(EngineError::InvalidRequest(
                "coordinates out of range".to_string(),
            ));
        }
        let anchor = parse_clock(&request.time)?;
        let span = match request.window_mins {
            Some(mins) if mins <= 0 => {
                return Err(EngineError::InvalidRequest(format!(
                    "window must be positive, got {mins} minutes"
                )));
            }
            Some(mins) => mins
                .checked_mul(60)
                .filter(|secs| *secs <= DAY_SECS)
                .ok_or_else(|| {
                    EngineError::InvalidRequest(format!(
                        "window must be at most one day, got {mins} minutes"
                    ))
                })?,
            None => search.default_window_secs(),
        };
        let window = TimeWindow::for_mode(anchor, span, request.mode);

        let origin_stops = nearby(
            index,
            &NearbyQuery::new(request.origin)
                .with_radius(search.nearby_radius_m)
                .with_limit(search.nearby_limit)
                .with_forced(request.origin_stop_ids.clone())
                .with_label(request.origin_label.clone())
                .without_sample(),
        );
        let destination_stops = nearby(
            index,
            &NearbyQuery::new(request.destination)
                .with_radius(search.nearby_radius_m)
                .with_limit(search.nearby_limit)
                .with_forced(request.destination_stop_ids.clone())
                .with_label(request.destination_label.clone())
                .without_sample(),
        );

        let search_request = SearchRequest {
            start_ids: origin_stops.stop_ids().map(str::to_string).collect(),
            end_ids: destination_stops.stop_ids().map(str::to_string).collect(),
            date: request.date,
            window,
            mode: request.mode,
        };

        let token = match &request.session_id {
            Some(session) => self.sessions.begin(session),
            None => CancelToken::new(),
        };

        let outcome = self
            .run(&search_request, &token, &request, origin_stops, destination_stops)
            .await;

        if let Some(session) = &request.session_id {
            self.sessions.finish(session, &token);
        }
        let outcome = outcome?;
        if token.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        info!(
            itineraries = outcome.itineraries.len(),
            hubs = outcome.hubs_explored,
            "Planned itineraries"
        );
        Ok(outcome)
    }

    async fn run(
        &self,
        search_request: &SearchRequest,
        token: &CancelToken,
        request: &PlanRequest,
        origin_stops: NearbyResult,
        destination_stops: NearbyResult,
    ) -> Result<PlanOutcome, EngineError> {
        let result = Planner::new(&self.index, &self.memo, &self.config.search)
            .search(search_request, token)?;
        debug!(candidates = result.candidates.len(), "Search finished");

        let assembler = Assembler::new(&self.index, &self.walker, &self.places, &self.config.assembly);
        let itineraries = assembler
            .assemble_all(request.origin, request.destination, &result.candidates)
            .await
            .into_iter()
            .map(|itinerary| Itinerary {
                origin_label: itinerary.origin_label.or_else(|| request.origin_label.clone()),
                destination_label: itinerary
                    .destination_label
                    .or_else(|| request.destination_label.clone()),
                ..itinerary
            })
            .collect();

        Ok(PlanOutcome {
            itineraries,
            origin_stages: origin_stops.stages,
            destination_stages: destination_stops.stages,
            hubs_explored: result.hubs_explored,
        })
    }

    /// Stops around a point.
    pub fn nearby(&self, query: &NearbyQuery) -> Result<NearbyResult, EngineError> {
        Ok(nearby(self.ready()?, query))
    }

    /// Services running on `date`.
    pub fn active_services(&self, date: NaiveDate) -> Result<ActiveServices, EngineError> {
        Ok(self.ready()?.calendar().active_services(date))
    }

    /// Schedule-day classification of `date`.
    pub fn classify(&self, date: NaiveDate) -> Result<DayClassification, EngineError> {
        Ok(self.ready()?.calendar().classify(date))
    }

    pub fn status(&self) -> FeedStatus {
        FeedStatus {
            stops: self.index.stop_count(),
            routes: self.index.route_count(),
            trips: self.index.trip_count(),
            calendar_rules: self.index.calendar().rule_count(),
            calendar_exceptions: self.index.calendar().exception_count(),
            memo_entries: self.memo.entry_count(),
            active_sessions: self.sessions.active_sessions(),
        }
    }
}

/// Load a feed directory and build an engine over it.
///
/// Blocking; run it off the async executor.
pub fn load_engine<W: WalkingProvider, P: PlaceResolver>(
    dir: &Path,
    config: EngineConfig,
    walker: W,
    places: P,
) -> Result<Engine<W, P>, FeedError> {
    let index = FeedIndex::build(Feed::from_dir(dir)?);
    Ok(Engine::new(index, config, walker, places))
}

/// The current engine, swapped wholesale when a new feed version loads.
pub struct EngineHandle<W = WalkingBackend, P = PlaceBackend> {
    current: Arc<RwLock<Option<Arc<Engine<W, P>>>>>,
}

impl<W, P> Clone for EngineHandle<W, P> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<W, P> Default for EngineHandle<W, P> {
    fn default() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
        }
    }
}

impl<W, P> EngineHandle<W, P> {
    /// An empty handle; requests fail with [`EngineError::NotReady`] until
    /// the first [`replace`](Self::replace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new engine. In-flight requests keep the one they started with.
    pub async fn replace(&self, engine: Engine<W, P>) {
        *self.current.write().await = Some(Arc::new(engine));
    }

    pub async fn current(&self) -> Result<Arc<Engine<W, P>>, EngineError> {
        self.current.read().await.clone().ok_or(EngineError::NotReady)
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }
}
