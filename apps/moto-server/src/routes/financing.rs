//! Standalone amortization calculator.

use axum::routing::post;
use axum::{Json, Router};
use moto_core::financing::{amortize, effective_total_cost, AmortizationSchedule, LoanTerms};
use moto_core::Rate;
use serde::Serialize;
use tracing::debug;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub terms: LoanTerms,
    pub schedule: AmortizationSchedule,
    /// Total interest over the principal (CFT).
    pub effective_total_cost: Rate,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/financing/schedule", post(schedule))
}

async fn schedule(_auth: AuthUser, Json(terms): Json<LoanTerms>) -> ApiResult<Json<ScheduleResponse>> {
    terms.validate()?;

    let schedule = amortize(&terms);
    let effective_total_cost = effective_total_cost(&schedule, terms.principal);
    debug!(
        installments = terms.installments,
        frequency = %terms.frequency,
        payment = schedule.installment_amount.cents(),
        "Amortization schedule computed"
    );

    Ok(Json(ScheduleResponse {
        terms,
        schedule,
        effective_total_cost,
    }))
}
