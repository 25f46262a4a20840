use axum::{
    Router, middleware,
    routing::{get, post},
};

use std::{future::Future, sync::Arc};

use crate::{auth, company, contract, purchase};
use engine::{Engine, PurchaseWorkflow};

#[derive(Clone, Debug)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub workflow: Arc<PurchaseWorkflow>,
    pub tokens: Arc<auth::TokenIssuer>,
}

impl ServerState {
    pub fn new(workflow: PurchaseWorkflow, tokens: auth::TokenIssuer) -> Self {
        Self {
            engine: Arc::clone(workflow.engine()),
            workflow: Arc::new(workflow),
            tokens: Arc::new(tokens),
        }
    }
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route(
            "/company",
            get(company::list)
                .post(company::create)
                .put(company::upsert),
        )
        .route(
            "/company/{id}",
            get(company::get).delete(company::delete),
        )
        .route(
            "/contract",
            get(contract::list)
                .post(contract::create)
                .put(contract::upsert),
        )
        .route(
            "/contract/{id}",
            get(contract::get).delete(contract::delete),
        )
        .route("/contract/{id}/purchase", get(purchase::history))
        .route("/purchase", post(purchase::book))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/get-token", get(auth::get_token))
        .merge(protected)
        .with_state(state)
}

/// Serve until `shutdown` resolves, then let in-flight requests finish.
pub async fn serve<F>(
    state: ServerState,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
