//! API Module
//!
//! HTTP handlers and routing for the store's REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a value
//! - `GET /get/:key` - Retrieve a value
//! - `DELETE /del/:key` - Delete a key
//! - `POST /pop/:key` - Retrieve and delete a key
//! - `DELETE /clear` - Remove everything
//! - `GET /keys` - List live keys
//! - `GET /stats` - Entry count
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
