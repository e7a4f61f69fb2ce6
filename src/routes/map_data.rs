use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::models::RiskDataset;
use crate::pipeline::{self, ReferenceDates};
use crate::sources;

// ---

pub fn router() -> Router<Config> {
    // ---
    Router::new().route("/map/data", get(handler))
}

async fn handler(
    Query(params): Query<MapDataQuery>,
    State(config): State<Config>,
) -> impl IntoResponse {
    // ---
    info!("GET /map/data - Starting pipeline");

    // Step 1: Fetch the source tables
    debug!("GET /map/data - Step 1");

    let tables = match sources::load_tables(&config).await {
        Ok(tables) => tables,
        Err(e) => {
            error!("Failed to fetch source tables: {e:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to fetch data"),
            )
                .into_response();
        }
    };

    // Step 2: Join, derive, classify
    debug!("GET /map/data - Step 2");

    let dates = ReferenceDates::anchored_to(Utc::now().date_naive());
    let dataset = pipeline::run(&tables, &dates);

    // Step 3: Apply filters and return data
    let dataset = apply_filters(dataset, &params);
    info!(
        "Pipeline complete, returning {} counties / {} states",
        dataset.counties.len(),
        dataset.states.len()
    );
    debug!("GET /map/data - Returning OK");
    (StatusCode::OK, Json(dataset)).into_response()
}

// ---

/// Query parameters for narrowing the map dataset.
#[derive(Debug, Deserialize)]
pub struct MapDataQuery {
    /// Restrict both tables to one state code (e.g. "NY").
    state: Option<String>,
    /// Cap the number of county rows returned.
    limit: Option<u32>,
}

/// Apply query filters to a computed dataset.
fn apply_filters(dataset: RiskDataset, params: &MapDataQuery) -> RiskDataset {
    // ---
    info!("Apply filter: {:?}", params);
    let RiskDataset { counties, states } = dataset;

    let counties = counties
        .into_iter()
        .filter(|c| params.state.as_ref().map_or(true, |s| &c.state_code == s))
        .take(params.limit.map_or(usize::MAX, |l| l as usize))
        .collect();

    let states = states
        .into_iter()
        .filter(|r| params.state.as_ref().map_or(true, |s| &r.state_code == s))
        .collect();

    RiskDataset { counties, states }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{CountyRiskRow, SipStatus, StateStatusRow};

    fn dataset() -> RiskDataset {
        // ---
        let county = |id: &str, state: &str| CountyRiskRow {
            county_id: id.to_string(),
            state_code: state.to_string(),
            case_growth_absolute: 1.0,
            per_capita_case_growth: None,
            bed_load: None,
        };
        let state = |code: &str| StateStatusRow {
            state_code: code.to_string(),
            peak_ratio: 0.0,
            peak_status: None,
            sip_status: SipStatus::Open,
        };
        RiskDataset {
            counties: vec![county("01001", "AL"), county("01003", "AL"), county("36061", "NY")],
            states: vec![state("AL"), state("NY")],
        }
    }

    #[test]
    fn state_filter_narrows_both_tables() {
        // ---
        let params = MapDataQuery {
            state: Some("AL".to_string()),
            limit: None,
        };
        let filtered = apply_filters(dataset(), &params);
        assert_eq!(filtered.counties.len(), 2);
        assert_eq!(filtered.states.len(), 1);
        assert!(filtered.counties.iter().all(|c| c.state_code == "AL"));
    }

    #[test]
    fn limit_caps_county_rows_only() {
        // ---
        let params = MapDataQuery {
            state: None,
            limit: Some(1),
        };
        let filtered = apply_filters(dataset(), &params);
        assert_eq!(filtered.counties.len(), 1);
        assert_eq!(filtered.states.len(), 2);
    }
}
