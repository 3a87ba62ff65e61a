//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET    /health, / - Health check
/// - GET    /api/v1/products - List active products
/// - POST   /api/v1/checkouts - Start a checkout
/// - GET    /api/v1/checkouts/{id} - Checkout summary
/// - PUT    /api/v1/checkouts/{id} - Set custom fields
/// - DELETE /api/v1/checkouts/{id} - Destroy checkout
/// - POST   /api/v1/checkouts/{id}/items - Add item
/// - PUT    /api/v1/checkouts/{id}/items/{item_id} - Update item
/// - DELETE /api/v1/checkouts/{id}/items/{item_id} - Remove item
/// - POST   /api/v1/checkouts/{id}/discount - Apply discount code
/// - PUT    /api/v1/checkouts/{id}/purchaser - Attach purchaser
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let checkout_routes = Router::new()
        .route(
            "/{checkout_id}",
            get(handlers::get_checkout)
                .put(handlers::update_checkout)
                .delete(handlers::delete_checkout),
        )
        .route("/{checkout_id}/items", post(handlers::add_item))
        .route(
            "/{checkout_id}/items/{item_id}",
            put(handlers::update_item).delete(handlers::remove_item),
        )
        .route("/{checkout_id}/discount", post(handlers::apply_discount))
        .route("/{checkout_id}/purchaser", put(handlers::set_purchaser));

    let api_routes = Router::new()
        .route("/products", get(handlers::list_products))
        .route("/checkouts", post(handlers::create_checkout))
        .nest("/checkouts", checkout_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use cart_core::{ProductCatalog, StoreConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PRODUCTS: &str = r#"
        [[products]]
        id = "tee"
        name = "Classic Tee"
        price = "10.00"

        [[products]]
        id = "poster"
        name = "Poster"
        price = "7.50"
        active = false
    "#;

    const STORE: &str = r#"
        [shipping]
        flat_rate = "5.00"
        free_over = "100.00"

        [tax]
        rate = "0.10"

        [[discounts]]
        code = "SAVE5"
        amount = "5.00"

        [logistics]
        required_fields = ["shipping_address.city"]
    "#;

    fn app() -> Router {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            store_config: String::new(),
            products_config: String::new(),
        };
        let store = StoreConfig::from_toml(STORE).unwrap();
        let catalog = ProductCatalog::from_toml(PRODUCTS).unwrap();
        create_router(AppState::from_parts(config, store, catalog))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn new_checkout(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/api/v1/checkouts", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["cart"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_list_products_hides_inactive() {
        let (status, body) = call(&app(), Method::GET, "/api/v1/products", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["products"][0]["id"], "tee");
    }

    #[tokio::test]
    async fn test_checkout_flow() {
        let app = app();
        let id = new_checkout(&app).await;
        let base = format!("/api/v1/checkouts/{}", id);

        let (status, item) = call(
            &app,
            Method::POST,
            &format!("{}/items", base),
            Some(json!({ "purchaseable_type": "product", "purchaseable_id": "tee", "qty": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["price"], "20.00");
        let item_id = item["id"].as_u64().unwrap();

        // Totals stay hidden until the shipping city is known
        let (_, summary) = call(&app, Method::GET, &base, None).await;
        assert_eq!(summary["subtotal"], "25.00");
        assert!(summary.get("total").is_none());

        let (status, summary) = call(
            &app,
            Method::PUT,
            &base,
            Some(json!({ "custom_fields": { "shipping_address": { "city": "Porto" } } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["cart"]["custom_fields"]["shipping_address"]["city"], "Porto");
        assert_eq!(summary["total"], "27.50");

        let (_, summary) = call(
            &app,
            Method::POST,
            &format!("{}/discount", base),
            Some(json!({ "code": "save5" })),
        )
        .await;
        assert_eq!(summary["discount"], "5.00");
        assert_eq!(summary["taxes"], "2.00");
        assert_eq!(summary["total"], "22.00");

        let (status, item) = call(
            &app,
            Method::PUT,
            &format!("{}/items/{}", base, item_id),
            Some(json!({ "qty": 3, "options": { "size": "L" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["price"], "30.00");

        let (status, item) = call(&app, Method::DELETE, &format!("{}/items/{}", base, item_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(item["deleted_at"].is_string());

        let (_, summary) = call(&app, Method::GET, &base, None).await;
        assert_eq!(summary["cart"]["items"].as_array().unwrap().len(), 0);
        assert_eq!(summary["subtotal"], "0.00");
    }

    #[tokio::test]
    async fn test_set_purchaser() {
        let app = app();
        let id = new_checkout(&app).await;

        let (status, summary) = call(
            &app,
            Method::PUT,
            &format!("/api/v1/checkouts/{}/purchaser", id),
            Some(json!({ "purchaser_type": "customer", "purchaser_id": "42" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["cart"]["purchaser"], json!({ "id": "42", "type": "customer" }));

        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/api/v1/checkouts/{}/purchaser", id),
            Some(json!({ "purchaser_type": "", "purchaser_id": "42" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], 422);
    }

    #[tokio::test]
    async fn test_item_errors() {
        let app = app();
        let id = new_checkout(&app).await;
        let items = format!("/api/v1/checkouts/{}/items", id);

        let (status, _) = call(
            &app,
            Method::POST,
            &items,
            Some(json!({ "purchaseable_type": "product", "purchaseable_id": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &app,
            Method::POST,
            &items,
            Some(json!({ "purchaseable_type": "product", "purchaseable_id": "poster" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = call(&app, Method::PUT, &format!("{}/999", items), Some(json!({ "qty": 1 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn test_malformed_bodies_answer_with_json_errors() {
        let app = app();
        let id = new_checkout(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/checkouts/{}/items", id),
            Some(json!({ "purchaseable_type": "product", "purchaseable_id": "tee", "qty": "two" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/checkouts/{}/discount", id),
            Some(json!({ "coupon": "SAVE5" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);

        let request = Request::builder()
            .method(Method::PUT)
            .uri(format!("/api/v1/checkouts/{}", id))
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 400);

        // Nothing was added
        let (_, summary) = call(&app, Method::GET, &format!("/api/v1/checkouts/{}", id), None).await;
        assert_eq!(summary["cart"]["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_and_destroyed_checkouts() {
        let app = app();

        let (status, _) = call(&app, Method::GET, "/api/v1/checkouts/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = new_checkout(&app).await;
        let base = format!("/api/v1/checkouts/{}", id);

        let (status, body) = call(&app, Method::DELETE, &base, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = call(&app, Method::GET, &base, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
