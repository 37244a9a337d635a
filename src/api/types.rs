//! API request and error types. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::optimize::types::Constraints;

/// Body of `POST /optimizations`.
///
/// Names are kept as strings so unknown values are reported with the
/// accepted set instead of a generic decode error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeBody {
    pub objective: Option<String>,
    pub time_horizon: Option<String>,
    pub location: Option<String>,
    pub constraints: Option<Constraints>,
    pub seed: Option<u64>,
    pub start_time: Option<DateTime<Utc>>,
}

/// Query parameters for `GET /optimizations`.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
    pub objective: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_accepts_partial_constraints() {
        let body: OptimizeBody = serde_json::from_str(
            r#"{"objective":"co2","timeHorizon":"weekly","constraints":{"maxLoad":500}}"#,
        )
        .unwrap();
        let constraints = body.constraints.unwrap();
        assert_eq!(constraints.max_load, 500.0);
        assert!(constraints.demand_response);
        assert_eq!(body.time_horizon.as_deref(), Some("weekly"));
        assert!(body.location.is_none());
    }
}
