//! End-to-end tests against the real router: identity headers, policy
//! enforcement, and the error statuses the calling surface branches on.

use api::AppState;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> (Router, AppState) {
    let state = AppState::new();
    (api::app(state.clone()), state)
}

fn request(
    method: Method,
    uri: &str,
    actor: Option<(&str, &str)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = actor {
        builder = builder.header("x-actor-id", id).header("x-actor-role", role);
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

const ADMIN: Option<(&str, &str)> = Some(("adm-1", "admin"));

async fn seed_item(app: &Router, name: &str, quantity: u32) -> String {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/inventory",
            ADMIN,
            Some(json!({
                "name": name,
                "category": "medication",
                "quantity": quantity,
                "dose_mg": 100
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn seed_order(app: &Router, resident_id: &str, item_id: &str) -> String {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            &format!("/residents/{resident_id}/orders"),
            ADMIN,
            Some(json!({
                "inventory_item_id": item_id,
                "dosage": "100",
                "schedule": "Once daily"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_identity_headers_are_unauthorized() {
    let (app, _) = app();
    let (status, _) = send(
        &app,
        request(Method::GET, "/residents/res-1/orders", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request(
            Method::GET,
            "/inventory",
            Some(("adm-1", "superuser")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn residents_read_their_own_orders_only() {
    let (app, _) = app();
    let item_id = seed_item(&app, "Aspirin", 5).await;
    seed_order(&app, "res-1", &item_id).await;

    let own = Some(("res-1", "resident"));
    let (status, body) = send(
        &app,
        request(Method::GET, "/residents/res-1/orders", own, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        request(Method::GET, "/residents/res-2/orders", own, None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Residents cannot create orders.
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/residents/res-1/orders",
            own,
            Some(json!({ "schedule": "Once daily", "dosage": "100" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn caregiver_scope_opens_with_assignment() {
    let (app, _) = app();
    let caregiver = Some(("cg-1", "caregiver"));

    let (status, _) = send(
        &app,
        request(Method::GET, "/residents/res-1/orders", caregiver, None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Only admins manage assignments.
    let pair = json!({ "caregiver_id": "cg-1", "resident_id": "res-1" });
    let (status, _) = send(
        &app,
        request(Method::POST, "/assignments", caregiver, Some(pair.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request(Method::POST, "/assignments", ADMIN, Some(pair)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        request(Method::GET, "/residents/res-1/orders", caregiver, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_order_validates_schedule_and_item() {
    let (app, _) = app();
    let item_id = seed_item(&app, "Aspirin", 5).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/residents/res-1/orders",
            ADMIN,
            Some(json!({
                "inventory_item_id": item_id,
                "schedule": "Whenever",
                "dosage": "100"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_schedule");

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/residents/res-1/orders",
            ADMIN,
            Some(json!({
                "inventory_item_id": "missing",
                "schedule": "Once daily",
                "dosage": "100"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_inventory_item");
}

#[tokio::test]
async fn update_with_invalid_schedule_leaves_the_order_unchanged() {
    let (app, _) = app();
    let item_id = seed_item(&app, "Aspirin", 5).await;
    let order_id = seed_order(&app, "res-1", &item_id).await;

    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/orders/{order_id}"),
            ADMIN,
            Some(json!({ "schedule": "InvalidValue" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_schedule");

    let (status, body) = send(
        &app,
        request(Method::GET, "/residents/res-1/orders", ADMIN, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["schedule"], "Once daily");
}

#[tokio::test]
async fn administration_decrements_until_the_shelf_is_empty() {
    let (app, _) = app();
    let item_id = seed_item(&app, "Aspirin 100 mg", 1).await;
    let first = seed_order(&app, "res-1", &item_id).await;
    let second = seed_order(&app, "res-2", &item_id).await;

    let transition = json!({ "target": "administered" });
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/orders/{first}/status"),
            ADMIN,
            Some(transition.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intake_status"], "administered");
    assert!(body["last_administered_at"].is_string());

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/orders/{second}/status"),
            ADMIN,
            Some(transition),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_stock");

    let (status, body) = send(
        &app,
        request(Method::GET, &format!("/inventory/{item_id}"), ADMIN, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 0);
}

#[tokio::test]
async fn inventory_floor_and_validation_errors_are_distinct() {
    let (app, _) = app();
    let item_id = seed_item(&app, "Gauze", 0).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/inventory/{item_id}/adjust"),
            ADMIN,
            Some(json!({ "delta": -1 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_stock");

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            &format!("/inventory/{item_id}/quantity"),
            ADMIN,
            Some(json!({ "quantity": -5 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_quantity");

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            &format!("/inventory/{item_id}/adjust"),
            Some(("res-1", "resident")),
            Some(json!({ "delta": 1 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn soft_delete_hides_orders_from_the_default_listing() {
    let (app, _) = app();
    let item_id = seed_item(&app, "Aspirin", 5).await;
    let order_id = seed_order(&app, "res-1", &item_id).await;

    let (status, _) = send(
        &app,
        request(Method::DELETE, &format!("/orders/{order_id}"), ADMIN, None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        request(Method::GET, "/residents/res-1/orders", ADMIN, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            "/residents/res-1/orders?include_deleted=true",
            ADMIN,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert!(body[0]["deleted_at"].is_string());
}

#[tokio::test]
async fn missing_orders_are_not_found() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/orders/nope/status",
            ADMIN,
            Some(json!({ "target": "administered" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
