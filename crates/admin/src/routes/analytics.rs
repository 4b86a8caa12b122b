//! Sales dashboard.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;

use marigold_core::analytics::{SalesSummary, summarize};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const DEFAULT_TOP: usize = 5;
const MAX_TOP: usize = 50;

/// Dashboard options. Dates are inclusive and compared against the
/// order's UTC creation date.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub top: Option<usize>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(summary))
}

/// GET /api/analytics?top=&from=&to=
async fn summary(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<SalesSummary>> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && from > to
    {
        return Err(AppError::BadRequest("from is after to".to_owned()));
    }

    let mut orders = OrderRepository::new(state.pool()).all().await?;
    orders.retain(|o| {
        let day = o.created_at.date_naive();
        query.from.is_none_or(|from| day >= from) && query.to.is_none_or(|to| day <= to)
    });

    let top = query.top.unwrap_or(DEFAULT_TOP).min(MAX_TOP);
    Ok(Json(summarize(&orders, top)))
}
