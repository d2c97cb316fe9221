use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::Utc;
use cqrs_es::persist::ViewRepository;
use domain::orders::inputs::{
    AdjustInventoryInput, AssignmentInput, CreateItemInput, CreateOrderInput, SetQuantityInput,
    TransitionInput, UpdateOrderInput,
};
use domain::orders::{self, Command, DoseStatus, MedicationOrder, View};
use domain::policy::Actor;
use domain::schedule::{IntakeStatus, Schedule};
use domain::Error;
use serde::{Deserialize, Serialize};
use serde_json::json;
use ulid::Ulid;

use crate::actor::require_actor;
use crate::error::ApiError;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/residents/:resident_id/orders",
            post(create_order).get(list_resident_orders),
        )
        .route("/orders/:id", patch(update_order).delete(delete_order))
        .route("/orders/:id/status", post(transition_status))
        .route("/inventory", post(create_item).get(list_inventory))
        .route("/inventory/:id", get(get_item).delete(remove_item))
        .route("/inventory/:id/adjust", post(adjust_inventory))
        .route("/inventory/:id/quantity", put(set_quantity))
        .route(
            "/assignments",
            post(create_assignment).delete(remove_assignment),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct OrderResponse {
    #[serde(flatten)]
    order: MedicationOrder,
    dose_status: DoseStatus,
}

fn order_response(order: MedicationOrder) -> OrderResponse {
    let dose_status = order.dose_status(Utc::now());
    OrderResponse { order, dose_status }
}

fn command_metadata(actor: &Actor) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("command_id".to_string(), Ulid::new().to_string());
    metadata.insert("actor_id".to_string(), actor.id.clone());
    metadata
}

async fn load_order(state: &AppState, order_id: &str) -> Result<View, ApiError> {
    state
        .orders_repo
        .load(order_id)
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?
        .ok_or_else(|| {
            ApiError::from(Error::NotFound {
                entity: orders::AGGREGATE_TYPE.to_string(),
            })
        })
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

async fn create_order(
    Path(resident_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    state.policy.authorize_mutate_orders(&actor, &resident_id)?;
    let schedule: Schedule = input.schedule.parse()?;

    let order_id = Ulid::new().to_string();
    let command = Command::Create {
        id: order_id.clone(),
        resident_id,
        inventory_item_id: input.inventory_item_id,
        dosage: input.dosage,
        schedule,
        notes: input.notes,
    };

    state
        .orders_cqrs
        .execute_with_metadata(&order_id, command, command_metadata(&actor))
        .await?;

    let view = load_order(&state, &order_id).await?;
    Ok((StatusCode::CREATED, Json(order_response(view.order))))
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    include_deleted: bool,
}

async fn list_resident_orders(
    Path(resident_id): Path<String>,
    Query(params): Query<ListParams>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    state.policy.authorize_view_orders(&actor, &resident_id)?;

    let orders = orders::list_by_resident(&state.orders_repo, &resident_id, params.include_deleted);
    let body: Vec<OrderResponse> = orders.into_iter().map(order_response).collect();
    Ok(Json(body))
}

async fn update_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<UpdateOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    let view = load_order(&state, &id).await?;
    state
        .policy
        .authorize_mutate_orders(&actor, &view.order.resident_id)?;

    let schedule = match input.schedule {
        Some(raw) => Some(raw.parse::<Schedule>()?),
        None => None,
    };
    let command = Command::Update {
        dosage: input.dosage,
        schedule,
        notes: input.notes,
    };

    state
        .orders_cqrs
        .execute_with_metadata(&id, command, command_metadata(&actor))
        .await?;

    let view = load_order(&state, &id).await?;
    Ok(Json(order_response(view.order)))
}

async fn delete_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    let view = load_order(&state, &id).await?;
    state
        .policy
        .authorize_mutate_orders(&actor, &view.order.resident_id)?;

    state
        .orders_cqrs
        .execute_with_metadata(&id, Command::Delete, command_metadata(&actor))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn transition_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<TransitionInput>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    let view = load_order(&state, &id).await?;
    state
        .policy
        .authorize_mutate_orders(&actor, &view.order.resident_id)?;

    let target: IntakeStatus = input.target.parse()?;
    let command = Command::Transition {
        target,
        actor_id: actor.id.clone(),
    };

    state
        .orders_cqrs
        .execute_with_metadata(&id, command, command_metadata(&actor))
        .await?;

    let view = load_order(&state, &id).await?;
    Ok(Json(view.order.dose_status(Utc::now())))
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

fn authorize_inventory(state: &AppState, actor: &Actor) -> Result<(), ApiError> {
    if state.policy.can_manage_inventory(actor) {
        Ok(())
    } else {
        Err(Error::Forbidden.into())
    }
}

async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    authorize_inventory(&state, &actor)?;

    let category = input.category.parse()?;
    let item = state
        .inventory
        .create_item(&input.name, category, input.quantity, input.dose_mg)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    authorize_inventory(&state, &actor)?;
    Ok(Json(state.inventory.list()))
}

async fn get_item(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    authorize_inventory(&state, &actor)?;
    Ok(Json(state.inventory.get(&id)?))
}

async fn remove_item(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    authorize_inventory(&state, &actor)?;
    state.inventory.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn adjust_inventory(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<AdjustInventoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    authorize_inventory(&state, &actor)?;
    let quantity = state.inventory.adjust(&id, input.delta)?;
    Ok(Json(json!({ "item_id": id, "quantity": quantity })))
}

async fn set_quantity(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SetQuantityInput>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    authorize_inventory(&state, &actor)?;
    let quantity = state.inventory.set_quantity(&id, input.quantity)?;
    Ok(Json(json!({ "item_id": id, "quantity": quantity })))
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

async fn create_assignment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<AssignmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    if !state.policy.can_manage_assignments(&actor) {
        return Err(Error::Forbidden.into());
    }
    let assignment = state
        .assignments
        .assign(&input.caregiver_id, &input.resident_id);
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn remove_assignment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<AssignmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_actor(&headers)?;
    if !state.policy.can_manage_assignments(&actor) {
        return Err(Error::Forbidden.into());
    }
    state
        .assignments
        .unassign(&input.caregiver_id, &input.resident_id)?;
    Ok(StatusCode::NO_CONTENT)
}
