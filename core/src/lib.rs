//! Client core for the now-playing movie catalog.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A `CatalogSession` runs the
//! two-phase load: the image configuration first, then the now-playing
//! listing, whose items are handed to a `Presenter` one at a time.
//!
//! # Design
//! - `CatalogClient` is stateless; it holds the base URL and API key.
//! - `CatalogSession` owns the protocol state and the single `CatalogConfig`.
//! - Hosts either implement `Transport` and call `run_session`, or feed
//!   responses to the session from their own event loop (see `catalog-ffi`).
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.

pub mod client;
pub mod error;
pub mod http;
pub mod session;
pub mod settings;
pub mod types;

pub use client::CatalogClient;
pub use error::CatalogError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use session::{run_session, CatalogSession, Phase, PhaseFailure, Presenter, SessionState, Step};
pub use settings::Settings;
pub use types::{CatalogConfig, CatalogItem};
