use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use coinbox_core::week::current_week_number;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeek {
    pub week_number: u32,
}

/// Suggested week number for today's collection form.
pub async fn current_week(State(state): State<Arc<AppState>>) -> Json<CurrentWeek> {
    Json(CurrentWeek {
        week_number: current_week_number(state.clock.as_ref()),
    })
}
