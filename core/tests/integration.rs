//! Two-phase load over real HTTP against the mock catalog.
//!
//! # Design
//! Starts the mock server on a random port inside a background tokio runtime,
//! then drives `CatalogSession` with a blocking ureq transport. Validates the
//! request ordering and the presenter contract end-to-end, and uses the
//! server's hit counters to prove which phases were requested.

use std::sync::Arc;

use catalog_core::{
    run_session, CatalogConfig, CatalogError, CatalogItem, HttpRequest, HttpResponse, Phase,
    PhaseFailure, Presenter, SessionState, Settings, Transport,
};
use mock_server::Catalog;
use serde_json::json;

const API_KEY: &str = "integration-key";

/// Execute an `HttpRequest` using ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data, letting the core classify them.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&mut self, req: &HttpRequest) -> Result<HttpResponse, CatalogError> {
        let mut builder = self.agent.get(&req.url());
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }
        let mut response = builder
            .call()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

#[derive(Default)]
struct ListPresenter {
    config: Option<Arc<CatalogConfig>>,
    rows: Vec<(usize, CatalogItem)>,
    failures: Vec<PhaseFailure>,
}

impl Presenter for ListPresenter {
    fn on_config_ready(&mut self, config: Arc<CatalogConfig>) {
        assert!(self.rows.is_empty(), "config must arrive before any item");
        self.config = Some(config);
    }

    fn on_item_appended(&mut self, item: CatalogItem, index: usize) {
        assert_eq!(index, self.rows.len(), "items must arrive in order");
        self.rows.push((index, item));
    }

    fn on_phase_failed(&mut self, failure: &PhaseFailure) {
        self.failures.push(failure.clone());
    }
}

/// Start the mock catalog; the returned runtime keeps it alive.
fn start_server() -> (tokio::runtime::Runtime, Catalog, String) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let catalog = Catalog::new(API_KEY);
    let served = catalog.clone();
    let addr = rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(mock_server::run(listener, served));
        addr
    });
    (rt, catalog, format!("http://{addr}"))
}

fn settings(base_url: &str, api_key: &str) -> Settings {
    Settings::from_toml(&format!(
        "api_base_url = \"{base_url}\"\napi_key = \"{api_key}\"\nposter_size = \"w500\""
    ))
    .unwrap()
}

#[test]
fn loads_configuration_then_listing() {
    let (_rt, catalog, base_url) = start_server();
    let mut session = settings(&base_url, API_KEY).session();
    let mut presenter = ListPresenter::default();

    let state = run_session(&mut session, &mut UreqTransport::new(), &mut presenter).unwrap();

    assert_eq!(state, SessionState::Ready);
    assert!(presenter.failures.is_empty());
    assert_eq!(catalog.configuration_hits(), 1);
    assert_eq!(catalog.now_playing_hits(), 1);

    let titles: Vec<&str> = presenter.rows.iter().map(|(_, i)| i.title.as_str()).collect();
    assert_eq!(titles, vec!["The Long Night", "Paper Moon Station", "Ferrous"]);

    let config = presenter.config.as_ref().unwrap();
    assert_eq!(config.default_poster_size(), "w500");
    assert_eq!(
        presenter.rows[0].1.poster_url(config).as_deref(),
        Some("https://image.example.org/t/p/w500/long-night.jpg")
    );
    assert_eq!(presenter.rows[1].1.poster_url(config), None);
}

#[test]
fn malformed_configuration_skips_listing() {
    let (rt, catalog, base_url) = start_server();
    rt.block_on(catalog.set_configuration(json!({"images": {"poster_sizes": ["w92"]}})));
    let mut session = settings(&base_url, API_KEY).session();
    let mut presenter = ListPresenter::default();

    let state = run_session(&mut session, &mut UreqTransport::new(), &mut presenter).unwrap();

    assert_eq!(state, SessionState::Failed(Phase::Config));
    assert_eq!(catalog.configuration_hits(), 1);
    assert_eq!(catalog.now_playing_hits(), 0);
    assert!(presenter.config.is_none());
    assert!(presenter.rows.is_empty());
    assert_eq!(presenter.failures.len(), 1);
    assert!(presenter.failures[0].error.is_parse());
}

#[test]
fn wrong_api_key_fails_configuration_phase() {
    let (_rt, catalog, base_url) = start_server();
    let mut session = settings(&base_url, "wrong-key").session();
    let mut presenter = ListPresenter::default();

    let state = run_session(&mut session, &mut UreqTransport::new(), &mut presenter).unwrap();

    assert_eq!(state, SessionState::Failed(Phase::Config));
    assert_eq!(catalog.now_playing_hits(), 0);
    assert!(matches!(
        presenter.failures[0].error,
        CatalogError::Http { status: 401, .. }
    ));
}

#[test]
fn malformed_listing_fails_listing_phase() {
    let (rt, catalog, base_url) = start_server();
    rt.block_on(catalog.set_now_playing(json!({"results": "none"})));
    let mut session = settings(&base_url, API_KEY).session();
    let mut presenter = ListPresenter::default();

    let state = run_session(&mut session, &mut UreqTransport::new(), &mut presenter).unwrap();

    assert_eq!(state, SessionState::Failed(Phase::Listing));
    assert!(presenter.config.is_some());
    assert!(presenter.rows.is_empty());
    assert_eq!(presenter.failures[0].phase, Phase::Listing);
}

#[test]
fn unreachable_catalog_is_transport_failure() {
    let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = unused.local_addr().unwrap();
    drop(unused);

    let mut session = settings(&format!("http://{addr}"), API_KEY).session();
    let mut presenter = ListPresenter::default();

    let state = run_session(&mut session, &mut UreqTransport::new(), &mut presenter).unwrap();

    assert_eq!(state, SessionState::Failed(Phase::Config));
    assert!(matches!(presenter.failures[0].error, CatalogError::Transport(_)));
}
