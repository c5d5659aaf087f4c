//! Bus itinerary engine.
//!
//! Loads a static transit feed and answers: "which buses take me from this
//! point to that one, around this time?" Direct trips are preferred; one
//! transfer is tried when none exist.

pub mod cache;
pub mod calendar;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod itinerary;
pub mod places;
pub mod planner;
pub mod stops;
pub mod walking;
pub mod web;
