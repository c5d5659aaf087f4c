//! Itinerary search: direct trips first, one transfer as a fallback.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::cache::{DirectKey, DirectMemo};
use crate::domain::{DAY_SECS, SearchMode, TimeWindow};
use crate::feed::FeedIndex;
use crate::stops::expand_all;

use super::cancel::CancelToken;
use super::config::SearchConfig;
use super::direct::{DayContext, DirectTrip, day_contexts, find_direct_trips};
use super::transfer::{TransferCandidate, TransferQuery, find_hubs, find_transfers};

/// Error from itinerary search.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// A newer request replaced this one
    #[error("search cancelled")]
    Cancelled,

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
}

/// Request for itinerary search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Stops near the origin, before expansion.
    pub start_ids: Vec<String>,

    /// Stops near the destination, before expansion.
    pub end_ids: Vec<String>,

    /// The requested service date.
    pub date: NaiveDate,

    /// Timeline range the departure (or arrival) must fall in.
    pub window: TimeWindow,

    pub mode: SearchMode,
}

impl SearchRequest {
    /// Validate the search request.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.window.end() - self.window.start() > DAY_SECS {
            return Err(SearchError::InvalidRequest(
                "search window longer than one day".to_string(),
            ));
        }
        if self.window.start() < -DAY_SECS || self.window.end() > 2 * DAY_SECS {
            return Err(SearchError::InvalidRequest(
                "search window too far from the requested date".to_string(),
            ));
        }
        Ok(())
    }
}

/// A ride found by the search.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Direct(DirectTrip),
    Transfer(TransferCandidate),
}

impl Candidate {
    pub fn departure(&self) -> i64 {
        match self {
            Self::Direct(trip) => trip.departure,
            Self::Transfer(t) => t.first.departure,
        }
    }

    pub fn arrival(&self) -> i64 {
        match self {
            Self::Direct(trip) => trip.arrival,
            Self::Transfer(t) => t.second.arrival,
        }
    }

    pub fn transfers(&self) -> usize {
        match self {
            Self::Direct(_) => 0,
            Self::Transfer(_) => 1,
        }
    }
}

/// Result of itinerary search.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Found rides, ranked best-first.
    pub candidates: Vec<Candidate>,

    /// Number of hubs explored by the transfer fallback.
    pub hubs_explored: usize,
}

impl SearchResult {
    /// Create an empty result.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Itinerary planner over one feed version.
pub struct Planner<'a> {
    index: &'a FeedIndex,
    memo: &'a DirectMemo,
    config: &'a SearchConfig,
}

impl<'a> Planner<'a> {
    /// Create a new planner.
    pub fn new(index: &'a FeedIndex, memo: &'a DirectMemo, config: &'a SearchConfig) -> Self {
        Self {
            index,
            memo,
            config,
        }
    }

    /// Search for rides from the start stops to the end stops.
    ///
    /// Direct trips are returned when any exist. Only otherwise does the
    /// transfer search run; it polls `cancel` and may return
    /// [`SearchError::Cancelled`].
    pub fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancelToken,
    ) -> Result<SearchResult, SearchError> {
        request.validate()?;

        let start = expand_all(self.index, request.start_ids.iter().map(String::as_str));
        let end = expand_all(self.index, request.end_ids.iter().map(String::as_str));
        if start.is_empty() || end.is_empty() {
            debug!("No stops near origin or destination");
            return Ok(SearchResult::empty());
        }

        let contexts = day_contexts(
            self.index,
            request.date,
            &request.window,
            self.config.early_morning_cutoff_secs,
        );

        let direct = self.direct_trips(&start, &end, request, &contexts);
        if !direct.is_empty() {
            let candidates = direct
                .iter()
                .take(self.config.max_results)
                .cloned()
                .map(Candidate::Direct)
                .collect();
            return Ok(SearchResult {
                candidates,
                hubs_explored: 0,
            });
        }

        let hubs = find_hubs(self.index, &start, &end, self.config);
        let query = TransferQuery {
            start: &start,
            end: &end,
            contexts: &contexts,
            window: &request.window,
            mode: request.mode,
        };
        let transfers = find_transfers(self.index, &hubs, query, self.config, cancel)?;

        debug!(
            hubs = hubs.len(),
            transfers = transfers.len(),
            "Transfer search finished"
        );

        Ok(SearchResult {
            candidates: transfers.into_iter().map(Candidate::Transfer).collect(),
            hubs_explored: hubs.len(),
        })
    }

    fn direct_trips(
        &self,
        start: &BTreeSet<String>,
        end: &BTreeSet<String>,
        request: &SearchRequest,
        contexts: &[DayContext],
    ) -> Arc<Vec<DirectTrip>> {
        let key = DirectKey::new(start, end, request.date, &request.window, request.mode);
        self.memo.get_or_insert_with(key, || {
            find_direct_trips(self.index, start, end, contexts, &request.window, request.mode)
        })
    }
}
