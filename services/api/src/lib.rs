//! HTTP surface for the medication administration core.
//!
//! Caller identity arrives in `x-actor-id` / `x-actor-role` headers;
//! authentication itself happens upstream.

/// Identity header parsing
pub mod actor;

/// Error-to-response mapping
pub mod error;

/// Router and handlers
pub mod routes;

use std::sync::Arc;

use domain::inventory::InventoryLedger;
use domain::orders::{self, OrderCqrs, OrderViewRepository, Services};
use domain::policy::{AccessPolicy, Assignments};

#[derive(Clone)]
pub struct AppState {
    pub orders_repo: Arc<OrderViewRepository>,
    pub orders_cqrs: Arc<OrderCqrs>,
    pub inventory: Arc<InventoryLedger>,
    pub assignments: Arc<Assignments>,
    pub policy: AccessPolicy,
}

impl AppState {
    pub fn new() -> Self {
        let inventory = Arc::new(InventoryLedger::new());
        let assignments = Arc::new(Assignments::new());
        let policy = AccessPolicy::new(Arc::clone(&assignments));

        let orders_repo = orders::cqrs::init_repo();
        let orders_cqrs = orders::cqrs::init(
            Arc::clone(&orders_repo),
            Services::new(Arc::clone(&inventory)),
        );

        Self {
            orders_repo,
            orders_cqrs,
            inventory,
            assignments,
            policy,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn app(state: AppState) -> axum::Router {
    routes::router(state)
}
