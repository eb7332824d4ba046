//! In-process imitation of the two catalog endpoints.
//!
//! Serves `/configuration` and `/movie/now_playing` from replaceable JSON
//! fixtures, rejects requests without the expected `api_key`, and counts hits
//! per endpoint so tests can assert which phases were actually requested.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
}

/// Error body the catalog returns for a missing or wrong key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status_code: u32,
    pub status_message: String,
    pub success: bool,
}

#[derive(Deserialize)]
pub struct KeyQuery {
    pub api_key: Option<String>,
}

/// Shared server state: expected key, fixtures, and hit counters.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<Inner>,
}

struct Inner {
    api_key: String,
    configuration: RwLock<Value>,
    now_playing: RwLock<Value>,
    configuration_hits: AtomicUsize,
    now_playing_hits: AtomicUsize,
}

impl Catalog {
    pub fn new(api_key: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                api_key: api_key.to_string(),
                configuration: RwLock::new(default_configuration()),
                now_playing: RwLock::new(movies_body(&default_movies())),
                configuration_hits: AtomicUsize::new(0),
                now_playing_hits: AtomicUsize::new(0),
            }),
        }
    }

    /// Replace the `/configuration` body.
    pub async fn set_configuration(&self, body: Value) {
        *self.inner.configuration.write().await = body;
    }

    /// Replace the `/movie/now_playing` body.
    pub async fn set_now_playing(&self, body: Value) {
        *self.inner.now_playing.write().await = body;
    }

    pub fn configuration_hits(&self) -> usize {
        self.inner.configuration_hits.load(Ordering::SeqCst)
    }

    pub fn now_playing_hits(&self) -> usize {
        self.inner.now_playing_hits.load(Ordering::SeqCst)
    }

    fn authorize(&self, query: &KeyQuery) -> Result<(), (StatusCode, Json<StatusMessage>)> {
        match query.api_key.as_deref() {
            Some(key) if key == self.inner.api_key => Ok(()),
            _ => {
                log::warn!("rejected request with missing or invalid api key");
                Err((
                    StatusCode::UNAUTHORIZED,
                    Json(StatusMessage {
                        status_code: 7,
                        status_message: "Invalid API key: You must be granted a valid key."
                            .to_string(),
                        success: false,
                    }),
                ))
            }
        }
    }
}

pub fn default_configuration() -> Value {
    json!({
        "images": {
            "base_url": "http://image.example.org/t/p/",
            "secure_base_url": "https://image.example.org/t/p/",
            "backdrop_sizes": ["w300", "w780", "w1280", "original"],
            "poster_sizes": ["w92", "w154", "w185", "w342", "w500", "w780", "original"]
        },
        "change_keys": ["adult", "images", "overview", "title"]
    })
}

pub fn default_movies() -> Vec<Movie> {
    vec![
        Movie {
            title: "The Long Night".to_string(),
            overview: "A lighthouse keeper waits out a storm.".to_string(),
            poster_path: Some("/long-night.jpg".to_string()),
        },
        Movie {
            title: "Paper Moon Station".to_string(),
            overview: "Two strangers share the last train.".to_string(),
            poster_path: None,
        },
        Movie {
            title: "Ferrous".to_string(),
            overview: "A robot learns to paint.".to_string(),
            poster_path: Some("/ferrous.jpg".to_string()),
        },
    ]
}

/// Listing envelope around `movies`, with the paging fields the catalog sends.
pub fn movies_body(movies: &[Movie]) -> Value {
    json!({
        "page": 1,
        "results": movies,
        "total_pages": 1,
        "total_results": movies.len(),
    })
}

pub fn app(catalog: Catalog) -> Router {
    Router::new()
        .route("/configuration", get(configuration))
        .route("/movie/now_playing", get(now_playing))
        .with_state(catalog)
}

pub async fn run(listener: TcpListener, catalog: Catalog) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("mock catalog listening on {addr}");
    }
    axum::serve(listener, app(catalog)).await
}

async fn configuration(
    State(catalog): State<Catalog>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<Value>, (StatusCode, Json<StatusMessage>)> {
    catalog.inner.configuration_hits.fetch_add(1, Ordering::SeqCst);
    catalog.authorize(&query)?;
    Ok(Json(catalog.inner.configuration.read().await.clone()))
}

async fn now_playing(
    State(catalog): State<Catalog>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<Value>, (StatusCode, Json<StatusMessage>)> {
    catalog.inner.now_playing_hits.fetch_add(1, Ordering::SeqCst);
    catalog.authorize(&query)?;
    Ok(Json(catalog.inner.now_playing.read().await.clone()))
}
