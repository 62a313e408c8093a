use axum::routing::get;
use axum::{Json, Router};

use crate::range::{RangeToken, AGG_UNIT_TOKENS, RANGE_TOKENS};
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct RangeOption {
    pub(crate) token: String,
    pub(crate) label: String,
    /// Bucket width applied when no explicit unit is requested; absent
    /// for ranges that render raw samples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) auto_bucket_hours: Option<i64>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct RangesResponse {
    pub(crate) ranges: Vec<RangeOption>,
    pub(crate) agg_units: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/ranges",
    tag = "ranges",
    responses((status = 200, description = "Supported range and aggregation tokens", body = RangesResponse))
)]
pub(crate) async fn list_ranges() -> Json<RangesResponse> {
    let ranges = RANGE_TOKENS
        .iter()
        .map(|token| RangeOption {
            token: token.as_str().to_string(),
            label: token.label().to_string(),
            auto_bucket_hours: token.auto_bucket_hours(),
        })
        .collect();
    Json(RangesResponse {
        ranges,
        agg_units: AGG_UNIT_TOKENS.iter().map(|t| t.to_string()).collect(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ranges", get(list_ranges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_token_round_trips() {
        let Json(response) = list_ranges().await;
        assert_eq!(response.ranges.len(), RANGE_TOKENS.len());
        for option in &response.ranges {
            assert_eq!(RangeToken::parse(&option.token).as_str(), option.token);
        }
    }
}
