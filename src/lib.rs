//! Build-time USACE reservoir snapshot for the fishing-conditions guide.
//!
//! Scrapes USACE district reservoir pages (SWL tabular pages and the MVK
//! reservoir bulletin), normalizes them into one record per lake with
//! latest level, release, 24h/7d trends and 7-day daily series, and writes
//! the result as a static JSON document for the front end.

pub mod analysis;
pub mod assemble;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod parse;
pub mod snapshot;
pub mod sources;
