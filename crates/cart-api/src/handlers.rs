//! # Request Handlers
//!
//! Axum request handlers for the checkout API.
//! Every handler opens the checkout by id, performs one operation and
//! answers with either the affected item or the checkout summary.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use cart_core::{CartItem, Checkout, CheckoutError, CheckoutSummary, ItemId, PurchaserRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, field, info, instrument, warn, Span};
use uuid::Uuid;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Update checkout request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCheckoutRequest {
    /// Fields to set, each under its literal key
    #[serde(default)]
    pub custom_fields: Option<Map<String, Value>>,
}

/// Add item request
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub purchaseable_type: String,
    pub purchaseable_id: String,
    #[serde(default = "default_qty")]
    pub qty: i64,
    #[serde(default)]
    pub options: Option<Value>,
}

fn default_qty() -> i64 {
    1
}

/// Update item request
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub qty: i64,
    #[serde(default)]
    pub options: Option<Value>,
}

/// Apply discount request
#[derive(Debug, Deserialize)]
pub struct ApplyDiscountRequest {
    pub code: String,
}

/// Set purchaser request
#[derive(Debug, Deserialize)]
pub struct SetPurchaserRequest {
    pub purchaser_type: String,
    pub purchaser_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn checkout_error_to_response(err: CheckoutError) -> ApiError {
    let code = err.status_code();
    if err.is_infrastructure() {
        error!("Checkout infrastructure failure: {}", err);
    }
    let response = ErrorResponse::new(err.to_string(), code);
    (StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), Json(response))
}

/// Open a live checkout; ids that are not UUIDs are simply not found
async fn open_checkout(state: &AppState, id: &str) -> Result<Checkout, ApiError> {
    let id = Uuid::parse_str(id)
        .map_err(|_| checkout_error_to_response(CheckoutError::checkout_not_found(id)))?;
    state
        .services
        .find_by_id(id, false)
        .await
        .map_err(checkout_error_to_response)
}

/// Unwrap a JSON body, answering malformed input with the JSON error shape
fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            Err(checkout_error_to_response(CheckoutError::InvalidRequest(
                rejection.body_text(),
            )))
        }
    }
}

async fn summary_of(checkout: &Checkout) -> Result<Json<CheckoutSummary>, ApiError> {
    checkout
        .summary()
        .await
        .map(Json)
        .map_err(checkout_error_to_response)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "checkout-rs",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Get products list
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let products: Vec<_> = state.catalog.active_products().collect();
    Json(serde_json::json!({
        "products": products,
        "count": products.len()
    }))
}

/// Start a new checkout
#[instrument(skip(state))]
pub async fn create_checkout(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CheckoutSummary>), ApiError> {
    let checkout = state
        .services
        .create()
        .await
        .map_err(checkout_error_to_response)?;

    info!("Checkout {} opened over HTTP", checkout.id());
    let summary = summary_of(&checkout).await?;
    Ok((StatusCode::CREATED, summary))
}

/// Get checkout summary
#[instrument(skip(state))]
pub async fn get_checkout(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
) -> Result<Json<CheckoutSummary>, ApiError> {
    let checkout = open_checkout(&state, &checkout_id).await?;
    summary_of(&checkout).await
}

/// Update checkout custom fields
#[instrument(skip(state, body))]
pub async fn update_checkout(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    body: Result<Json<UpdateCheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutSummary>, ApiError> {
    let request = parse_body(body)?;
    let mut checkout = open_checkout(&state, &checkout_id).await?;

    for (key, value) in request.custom_fields.unwrap_or_default() {
        checkout
            .set_custom_field(&key, value)
            .await
            .map_err(checkout_error_to_response)?;
    }

    summary_of(&checkout).await
}

/// Destroy a checkout
#[instrument(skip(state))]
pub async fn delete_checkout(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let checkout = open_checkout(&state, &checkout_id).await?;
    checkout.destroy().await.map_err(checkout_error_to_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a purchaseable to the checkout
#[instrument(skip(state, body), fields(purchaseable = field::Empty, qty = field::Empty))]
pub async fn add_item(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    body: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<CartItem>, ApiError> {
    let request = parse_body(body)?;
    Span::current()
        .record("purchaseable", field::display(&request.purchaseable_id))
        .record("qty", request.qty);
    let mut checkout = open_checkout(&state, &checkout_id).await?;

    let purchaseable = state
        .services
        .resolve_purchaseable(&request.purchaseable_type, &request.purchaseable_id)
        .await
        .map_err(checkout_error_to_response)?
        .ok_or_else(|| {
            warn!(
                "Unknown purchaseable {}#{}",
                request.purchaseable_type, request.purchaseable_id
            );
            checkout_error_to_response(CheckoutError::ReferenceUnresolved {
                purchaseable_type: request.purchaseable_type.clone(),
                purchaseable_id: request.purchaseable_id.clone(),
            })
        })?;

    let item = checkout
        .add_item(purchaseable.as_ref(), request.qty, None, request.options)
        .await
        .map_err(checkout_error_to_response)?;

    Ok(Json(item))
}

/// Update quantity and options of an item
#[instrument(skip(state, body))]
pub async fn update_item(
    State(state): State<AppState>,
    Path((checkout_id, item_id)): Path<(String, ItemId)>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<CartItem>, ApiError> {
    let request = parse_body(body)?;
    let mut checkout = open_checkout(&state, &checkout_id).await?;
    let item = checkout
        .update_item(item_id, request.qty, None, request.options)
        .await
        .map_err(checkout_error_to_response)?;
    Ok(Json(item))
}

/// Remove an item
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((checkout_id, item_id)): Path<(String, ItemId)>,
) -> Result<Json<CartItem>, ApiError> {
    let mut checkout = open_checkout(&state, &checkout_id).await?;
    let item = checkout
        .remove_item(item_id)
        .await
        .map_err(checkout_error_to_response)?;
    Ok(Json(item))
}

/// Apply a discount code
#[instrument(skip(state, body), fields(code = field::Empty))]
pub async fn apply_discount(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    body: Result<Json<ApplyDiscountRequest>, JsonRejection>,
) -> Result<Json<CheckoutSummary>, ApiError> {
    let request = parse_body(body)?;
    Span::current().record("code", field::display(&request.code));
    let mut checkout = open_checkout(&state, &checkout_id).await?;
    checkout
        .apply_discount_code(&request.code)
        .await
        .map_err(checkout_error_to_response)?;
    summary_of(&checkout).await
}

/// Attach the purchaser
#[instrument(skip(state, body))]
pub async fn set_purchaser(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    body: Result<Json<SetPurchaserRequest>, JsonRejection>,
) -> Result<Json<CheckoutSummary>, ApiError> {
    let request = parse_body(body)?;
    let mut checkout = open_checkout(&state, &checkout_id).await?;
    let purchaser = PurchaserRef::new(request.purchaser_id, request.purchaser_type);
    checkout
        .set_purchaser(&purchaser)
        .await
        .map_err(checkout_error_to_response)?;
    summary_of(&checkout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400).with_details("qty");
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
        assert_eq!(err.details.as_deref(), Some("qty"));
    }

    #[test]
    fn test_checkout_error_conversion() {
        let (status, Json(body)) = checkout_error_to_response(CheckoutError::ItemNotFound { item_id: 3 });
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, 404);

        let (status, _) = checkout_error_to_response(CheckoutError::ItemConflict {
            item_id: 3,
            purchaseable: "product#tee".to_string(),
        });
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = checkout_error_to_response(CheckoutError::Storage("down".to_string()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_add_item_request_defaults() {
        let request: AddItemRequest = serde_json::from_str(
            r#"{ "purchaseable_type": "product", "purchaseable_id": "tee" }"#,
        )
        .unwrap();
        assert_eq!(request.qty, 1);
        assert!(request.options.is_none());
    }
}
