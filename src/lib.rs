//! Library crate for the `covid-riskmap` backend service.
//!
//! The service ingests several independently-sourced public-health tables
//! (county census population, hospital bed utilization, daily county case
//! counts, per-state testing/hospitalization snapshots, per-state daily case
//! increments, and shelter-in-place schedule dates) and produces one
//! county-indexed table of derived risk indicators plus one state-indexed
//! table of categorical status labels, for downstream map rendering.
//!
//! Module boundaries follow the Explicit Module Boundary Pattern (EMBP):
//! - `config`   – runtime configuration (source URLs, fetch limits)
//! - `models`   – source rows, joined records, status labels, output rows
//! - `sources`  – dataset loading: CSV fetch + lenient decode
//! - `pipeline` – the pure merge-and-derive core
//! - `routes`   – HTTP surface consumed by the map frontend

pub mod config;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod sources;

pub use config::Config;
