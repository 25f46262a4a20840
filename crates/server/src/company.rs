//! Company API endpoints

use api_types::{company::Company, response::ResponseId};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};

fn to_wire(company: engine::Company) -> Company {
    Company {
        id: company.id,
        name: company.name,
        reg_code: company.reg_code,
    }
}

fn from_wire(company: Company) -> engine::Company {
    engine::Company {
        id: company.id,
        name: company.name,
        reg_code: company.reg_code,
    }
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Company>>, ServerError> {
    let companies = state.engine.company_list().await?;
    Ok(Json(companies.into_iter().map(to_wire).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Company>, ServerError> {
    let Path(id) = id?;
    Ok(Json(to_wire(state.engine.company(id).await?)))
}

/// Handle requests for creating a new company. Any `ID` in the body is
/// ignored.
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<Company>, JsonRejection>,
) -> Result<(StatusCode, Json<ResponseId>), ServerError> {
    let Json(payload) = payload?;
    let id = state
        .engine
        .create_company(&engine::NewCompany {
            name: payload.name,
            reg_code: payload.reg_code,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ResponseId { id })))
}

/// Create the company when `ID` is 0 or absent, overwrite it otherwise.
pub async fn upsert(
    State(state): State<ServerState>,
    payload: Result<Json<Company>, JsonRejection>,
) -> Result<(StatusCode, Json<Company>), ServerError> {
    let Json(payload) = payload?;
    let mut company = from_wire(payload);
    let saved = state.engine.save_company(&company).await?;
    company.id = saved.id();

    let status = if saved.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(to_wire(company))))
}

pub async fn delete(
    State(state): State<ServerState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<&'static str>, ServerError> {
    let Path(id) = id?;
    state.engine.delete_company(id).await?;
    Ok(Json("OK"))
}
