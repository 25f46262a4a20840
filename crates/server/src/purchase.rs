//! Purchase API endpoints

use std::sync::Arc;

use api_types::{purchase::Purchase, response::ResponseId};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use engine::PurchaseRequest;

use crate::{ServerError, server::ServerState};

/// Handle `POST /purchase`.
///
/// The booking runs on its own task: if the client goes away the request
/// future is dropped, but a commit already under way still completes and
/// releases its contract guard.
pub async fn book(
    State(state): State<ServerState>,
    payload: Result<Json<Purchase>, JsonRejection>,
) -> Result<(StatusCode, Json<ResponseId>), ServerError> {
    let Json(payload) = payload?;
    let request = PurchaseRequest {
        contract_id: payload.contract_id,
        datetime: payload.datetime,
        amount: payload.amount,
    };

    let workflow = Arc::clone(&state.workflow);
    let id = tokio::spawn(async move { workflow.book(&request).await })
        .await
        .map_err(|err| ServerError::Internal(format!("booking task failed: {err}")))??;

    Ok((StatusCode::CREATED, Json(ResponseId { id })))
}

/// Handle `GET /contract/{id}/purchase`: the purchases of a contract, oldest
/// first.
pub async fn history(
    State(state): State<ServerState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Purchase>>, ServerError> {
    let Path(contract_id) = id?;
    let purchases = state.engine.purchase_history(contract_id).await?;

    Ok(Json(
        purchases
            .into_iter()
            .map(|purchase| Purchase {
                id: purchase.id,
                contract_id: purchase.contract_id,
                datetime: purchase.purchased_at,
                amount: purchase.credit_spent,
            })
            .collect(),
    ))
}
