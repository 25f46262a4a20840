//! Contract API endpoints
//!
//! Creating or amending a contract requires both the seller and the client
//! company to exist.

use api_types::{contract::Contract, response::ResponseId};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};

fn to_wire(contract: engine::Contract) -> Contract {
    Contract {
        id: contract.id,
        seller_id: contract.seller_id,
        client_id: contract.client_id,
        valid_from: contract.valid_from,
        valid_to: contract.valid_to,
        amount: contract.credit_amount,
    }
}

fn from_wire(contract: Contract) -> engine::Contract {
    engine::Contract {
        id: contract.id,
        seller_id: contract.seller_id,
        client_id: contract.client_id,
        valid_from: contract.valid_from,
        valid_to: contract.valid_to,
        credit_amount: contract.amount,
    }
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Contract>>, ServerError> {
    let contracts = state.engine.contract_list().await?;
    Ok(Json(contracts.into_iter().map(to_wire).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Contract>, ServerError> {
    let Path(id) = id?;
    Ok(Json(to_wire(state.engine.contract(id).await?)))
}

pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<Contract>, JsonRejection>,
) -> Result<(StatusCode, Json<ResponseId>), ServerError> {
    let Json(payload) = payload?;
    let id = state
        .engine
        .register_contract(&engine::NewContract {
            seller_id: payload.seller_id,
            client_id: payload.client_id,
            valid_from: payload.valid_from,
            valid_to: payload.valid_to,
            credit_amount: payload.amount,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ResponseId { id })))
}

pub async fn upsert(
    State(state): State<ServerState>,
    payload: Result<Json<Contract>, JsonRejection>,
) -> Result<(StatusCode, Json<Contract>), ServerError> {
    let Json(payload) = payload?;
    let mut contract = from_wire(payload);
    let saved = state.engine.save_contract(&contract).await?;
    contract.id = saved.id();

    let status = if saved.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(to_wire(contract))))
}

pub async fn delete(
    State(state): State<ServerState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<&'static str>, ServerError> {
    let Path(id) = id?;
    state.engine.delete_contract(id).await?;
    Ok(Json("OK"))
}
