//! # cart-api
//!
//! HTTP API layer for checkout-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints over the checkout orchestrator
//! - Store rules and product catalog loading from TOML
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | List products |
//! | POST | `/api/v1/checkouts` | Start a checkout |
//! | GET | `/api/v1/checkouts/{id}` | Checkout summary |
//! | PUT | `/api/v1/checkouts/{id}` | Set custom fields |
//! | DELETE | `/api/v1/checkouts/{id}` | Destroy checkout |
//! | POST | `/api/v1/checkouts/{id}/items` | Add item |
//! | PUT | `/api/v1/checkouts/{id}/items/{item_id}` | Update item |
//! | DELETE | `/api/v1/checkouts/{id}/items/{item_id}` | Remove item |
//! | POST | `/api/v1/checkouts/{id}/discount` | Apply discount code |
//! | PUT | `/api/v1/checkouts/{id}/purchaser` | Attach purchaser |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
