//! HTTP transport for ravenlayer.
//!
//! This crate provides a `reqwest`-based implementation of the `Transport` trait that talks
//! to a RavenDB-style server over its HTTP API.
//!
//! To use this transport, include the `http` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! ravenlayer = { version = "x.y.z", features = ["http"] }
//! ```
//!
//! # Requests
//!
//! - `GET /databases/{database}/docs/{id}` for single documents. The server returns the
//!   document fields as the body and its metadata as `Raven-Entity-Name`, `Raven-Clr-Type`,
//!   `Last-Modified` and `ETag` headers.
//! - `POST /databases/{database}/queries?include=...` for batches, with the identifiers as
//!   a JSON array body. The server answers `{ "Results": [...], "Includes": [...] }`.
//!
//! See [`response`] for how status codes and error bodies are classified.
//!
//! # Example
//!
//! ```ignore
//! use ravenlayer::{prelude::*, http::HttpTransport, transport::TransportBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::builder().build().await?;
//!     let store = DocumentStore::new(transport, ConnectionInfo::new("localhost", 8080, "Northwind"));
//!
//!     let loaded = store.open_session().load(["orders/1", "orders/2"]).await?;
//!     println!("{} orders", loaded.results.len());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as ravenlayer_http;

pub mod response;
pub mod transport;

pub use transport::{HttpTransport, HttpTransportBuilder};
