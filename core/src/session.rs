//! Two-phase load session: configuration first, then the now-playing listing.
//!
//! # Design
//! `CatalogSession` is a sans-IO state machine. `start` hands out the
//! configuration request; every `on_response` call consumes the outcome of
//! the single in-flight request and either hands out the next request or
//! reports that the session is finished. The listing request can only come
//! out of a successful configuration response, so ordering holds by
//! construction and no locking is needed.
//!
//! Results reach the host through the `Presenter` trait. The session owns the
//! `CatalogConfig` (written once, shared as `Arc`), items are moved into the
//! presenter one at a time in listing order.

use std::fmt;
use std::sync::Arc;

use crate::client::CatalogClient;
use crate::error::CatalogError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{CatalogConfig, CatalogItem};

/// One of the two sequential fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Config,
    Listing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Config => write!(f, "configuration"),
            Phase::Listing => write!(f, "listing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    LoadingConfig,
    ConfigLoaded,
    LoadingListing,
    Ready,
    Failed(Phase),
    Cancelled,
}

impl SessionState {
    /// True once the session will issue no further request.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Ready | SessionState::Failed(_) | SessionState::Cancelled
        )
    }
}

/// What the host should do after feeding a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Execute this request and feed its outcome back.
    Fetch(HttpRequest),
    /// Nothing left to do.
    Finished,
}

/// Failure notification delivered once per failed phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub error: CatalogError,
    /// Whether the host should show a transient notification to the user.
    /// The failure is logged either way.
    pub notify_user: bool,
}

impl PhaseFailure {
    pub fn message(&self) -> String {
        format!("Failed to load {}: {}", self.phase, self.error)
    }
}

/// Receives the results of a session. Implemented by the UI layer.
pub trait Presenter {
    fn on_config_ready(&mut self, config: Arc<CatalogConfig>);

    /// Called once per listing record, in listing order. `index` counts
    /// from zero.
    fn on_item_appended(&mut self, item: CatalogItem, index: usize);

    fn on_phase_failed(&mut self, failure: &PhaseFailure);
}

/// A single configuration-then-listing load.
///
/// Sessions are single-use: a failed or cancelled session stays that way,
/// and a refresh means building a new one.
#[derive(Debug)]
pub struct CatalogSession {
    client: CatalogClient,
    poster_size: String,
    notify_on_failure: bool,
    state: SessionState,
    config: Option<Arc<CatalogConfig>>,
    items_delivered: usize,
}

impl CatalogSession {
    /// `poster_size` is the preferred default poster size.
    pub fn new(client: CatalogClient, poster_size: &str) -> Self {
        Self {
            client,
            poster_size: poster_size.to_string(),
            notify_on_failure: true,
            state: SessionState::Idle,
            config: None,
            items_delivered: 0,
        }
    }

    /// Controls `PhaseFailure::notify_user`. Defaults to `true`.
    pub fn with_failure_notifications(mut self, enabled: bool) -> Self {
        self.notify_on_failure = enabled;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The configuration, once the first phase succeeded.
    pub fn config(&self) -> Option<Arc<CatalogConfig>> {
        self.config.clone()
    }

    pub fn items_delivered(&self) -> usize {
        self.items_delivered
    }

    /// Begin the load and return the configuration request.
    pub fn start(&mut self) -> Result<HttpRequest, CatalogError> {
        if self.state != SessionState::Idle {
            log::warn!("start called in state {:?}", self.state);
            return Err(CatalogError::AlreadyStarted);
        }
        self.state = SessionState::LoadingConfig;
        let request = self.client.build_configuration();
        log::debug!("requesting {}", request.path);
        Ok(request)
    }

    /// Stop the session. Responses that arrive later are dropped.
    /// Terminal states are left untouched.
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            log::debug!("session cancelled in state {:?}", self.state);
            self.state = SessionState::Cancelled;
        }
    }

    /// Feed the outcome of the in-flight request.
    pub fn on_response<P: Presenter + ?Sized>(
        &mut self,
        result: Result<HttpResponse, CatalogError>,
        presenter: &mut P,
    ) -> Step {
        match self.state {
            SessionState::LoadingConfig => self.on_config_response(result, presenter),
            SessionState::LoadingListing => self.on_listing_response(result, presenter),
            SessionState::Cancelled => {
                log::debug!("dropping response for cancelled session");
                Step::Finished
            }
            state => {
                log::warn!("unexpected response in state {state:?}");
                Step::Finished
            }
        }
    }

    fn on_config_response<P: Presenter + ?Sized>(
        &mut self,
        result: Result<HttpResponse, CatalogError>,
        presenter: &mut P,
    ) -> Step {
        let parsed =
            result.and_then(|resp| self.client.parse_configuration(resp, &self.poster_size));
        let config = match parsed {
            Ok(config) => Arc::new(config),
            Err(error) => return self.fail(Phase::Config, error, presenter),
        };
        log::info!(
            "Loaded configuration with image base url {} and poster size {}",
            config.image_base_url(),
            config.default_poster_size()
        );
        self.config = Some(Arc::clone(&config));
        self.state = SessionState::ConfigLoaded;
        presenter.on_config_ready(config);

        self.state = SessionState::LoadingListing;
        let request = self.client.build_now_playing();
        log::debug!("requesting {}", request.path);
        Step::Fetch(request)
    }

    fn on_listing_response<P: Presenter + ?Sized>(
        &mut self,
        result: Result<HttpResponse, CatalogError>,
        presenter: &mut P,
    ) -> Step {
        let items = match result.and_then(|resp| self.client.parse_now_playing(resp)) {
            Ok(items) => items,
            Err(error) => return self.fail(Phase::Listing, error, presenter),
        };
        let count = items.len();
        for item in items {
            presenter.on_item_appended(item, self.items_delivered);
            self.items_delivered += 1;
        }
        log::info!("Loaded {count} movies");
        self.state = SessionState::Ready;
        Step::Finished
    }

    fn fail<P: Presenter + ?Sized>(
        &mut self,
        phase: Phase,
        error: CatalogError,
        presenter: &mut P,
    ) -> Step {
        let failure = PhaseFailure {
            phase,
            error,
            notify_user: self.notify_on_failure,
        };
        log::error!("{}", failure.message());
        self.state = SessionState::Failed(phase);
        presenter.on_phase_failed(&failure);
        Step::Finished
    }
}

/// Drive `session` to completion over a blocking `transport`.
///
/// Returns the terminal state. Fails only when the session was already
/// started; phase failures are reported to `presenter` and show up as
/// `SessionState::Failed`.
pub fn run_session<T, P>(
    session: &mut CatalogSession,
    transport: &mut T,
    presenter: &mut P,
) -> Result<SessionState, CatalogError>
where
    T: Transport + ?Sized,
    P: Presenter + ?Sized,
{
    let mut request = session.start()?;
    loop {
        let result = transport.execute(&request);
        match session.on_response(result, presenter) {
            Step::Fetch(next) => request = next,
            Step::Finished => return Ok(session.state()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    const CONFIG_BODY: &str =
        r#"{"images":{"secure_base_url":"https://img/","poster_sizes":["w92","w500"]}}"#;
    const LISTING_BODY: &str = r#"{"results":[{"title":"A","overview":"o1","poster_path":"/a.jpg"},{"title":"B","overview":"o2","poster_path":null}]}"#;

    #[derive(Debug, PartialEq)]
    enum Event {
        Config(String),
        Item(String, usize),
        Failed(Phase, bool),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        config: Option<Arc<CatalogConfig>>,
        items: Vec<CatalogItem>,
    }

    impl Presenter for Recorder {
        fn on_config_ready(&mut self, config: Arc<CatalogConfig>) {
            self.events.push(Event::Config(config.image_base_url().to_string()));
            self.config = Some(config);
        }

        fn on_item_appended(&mut self, item: CatalogItem, index: usize) {
            self.events.push(Event::Item(item.title.clone(), index));
            self.items.push(item);
        }

        fn on_phase_failed(&mut self, failure: &PhaseFailure) {
            self.events.push(Event::Failed(failure.phase, failure.notify_user));
        }
    }

    /// Replays canned outcomes and records the paths it was asked for.
    struct Scripted {
        outcomes: VecDeque<Result<HttpResponse, CatalogError>>,
        paths: Vec<String>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<HttpResponse, CatalogError>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                paths: Vec::new(),
            }
        }
    }

    impl Transport for Scripted {
        fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, CatalogError> {
            self.paths.push(request.path.clone());
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Err(CatalogError::Transport("no scripted response".to_string())))
        }
    }

    fn ok(body: &str) -> Result<HttpResponse, CatalogError> {
        Ok(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn session() -> CatalogSession {
        CatalogSession::new(CatalogClient::new("http://catalog", "key"), "w500")
    }

    #[test]
    fn full_load_delivers_items_in_order() {
        let mut session = session();
        let mut transport = Scripted::new(vec![ok(CONFIG_BODY), ok(LISTING_BODY)]);
        let mut presenter = Recorder::default();

        let state = run_session(&mut session, &mut transport, &mut presenter).unwrap();

        assert_eq!(state, SessionState::Ready);
        assert_eq!(
            transport.paths,
            vec!["http://catalog/configuration", "http://catalog/movie/now_playing"]
        );
        assert_eq!(
            presenter.events,
            vec![
                Event::Config("https://img/".to_string()),
                Event::Item("A".to_string(), 0),
                Event::Item("B".to_string(), 1),
            ]
        );
        assert_eq!(session.items_delivered(), 2);
    }

    #[test]
    fn second_item_has_no_image_url() {
        let mut session = session();
        let mut transport = Scripted::new(vec![ok(CONFIG_BODY), ok(LISTING_BODY)]);
        let mut presenter = Recorder::default();
        run_session(&mut session, &mut transport, &mut presenter).unwrap();

        let config = presenter.config.as_ref().unwrap();
        assert_eq!(
            presenter.items[0].poster_url(config).as_deref(),
            Some("https://img/w500/a.jpg")
        );
        assert_eq!(presenter.items[1].poster_url(config), None);
    }

    #[test]
    fn session_shares_the_presented_config() {
        let mut session = session();
        let mut transport = Scripted::new(vec![ok(CONFIG_BODY), ok(LISTING_BODY)]);
        let mut presenter = Recorder::default();
        run_session(&mut session, &mut transport, &mut presenter).unwrap();

        let held = session.config().unwrap();
        assert!(Arc::ptr_eq(&held, presenter.config.as_ref().unwrap()));
    }

    #[test]
    fn malformed_config_never_requests_listing() {
        let mut session = session();
        let mut transport = Scripted::new(vec![
            ok(r#"{"images":{"poster_sizes":["w92"]}}"#),
            ok(LISTING_BODY),
        ]);
        let mut presenter = Recorder::default();

        let state = run_session(&mut session, &mut transport, &mut presenter).unwrap();

        assert_eq!(state, SessionState::Failed(Phase::Config));
        assert_eq!(transport.paths, vec!["http://catalog/configuration"]);
        assert_eq!(presenter.events, vec![Event::Failed(Phase::Config, true)]);
        assert!(session.config().is_none());
    }

    #[test]
    fn config_transport_error_fails_config_phase() {
        let mut session = session();
        let mut transport =
            Scripted::new(vec![Err(CatalogError::Transport("connection reset".to_string()))]);
        let mut presenter = Recorder::default();

        let state = run_session(&mut session, &mut transport, &mut presenter).unwrap();

        assert_eq!(state, SessionState::Failed(Phase::Config));
        assert_eq!(transport.paths.len(), 1);
    }

    #[test]
    fn listing_http_error_fails_listing_phase() {
        let mut session = session().with_failure_notifications(false);
        let mut transport = Scripted::new(vec![
            ok(CONFIG_BODY),
            Ok(HttpResponse {
                status: 503,
                headers: Vec::new(),
                body: "unavailable".to_string(),
            }),
        ]);
        let mut presenter = Recorder::default();

        let state = run_session(&mut session, &mut transport, &mut presenter).unwrap();

        assert_eq!(state, SessionState::Failed(Phase::Listing));
        assert_eq!(
            presenter.events,
            vec![
                Event::Config("https://img/".to_string()),
                Event::Failed(Phase::Listing, false),
            ]
        );
    }

    #[test]
    fn listing_parse_error_delivers_no_items() {
        let mut session = session();
        let mut transport = Scripted::new(vec![
            ok(CONFIG_BODY),
            ok(r#"{"results":[{"title":"A"},{"title":["nope"]}]}"#),
        ]);
        let mut presenter = Recorder::default();

        let state = run_session(&mut session, &mut transport, &mut presenter).unwrap();

        assert_eq!(state, SessionState::Failed(Phase::Listing));
        assert!(presenter.items.is_empty());
        assert_eq!(session.items_delivered(), 0);
    }

    #[test]
    fn start_twice_is_already_started() {
        let mut session = session();
        session.start().unwrap();
        let err = session.start().unwrap_err();
        assert_eq!(err, CatalogError::AlreadyStarted);
        assert_eq!(session.state(), SessionState::LoadingConfig);
    }

    #[test]
    fn run_on_started_session_is_already_started() {
        let mut session = session();
        session.start().unwrap();
        let mut transport = Scripted::new(Vec::new());
        let mut presenter = Recorder::default();
        let err = run_session(&mut session, &mut transport, &mut presenter).unwrap_err();
        assert_eq!(err, CatalogError::AlreadyStarted);
        assert!(transport.paths.is_empty());
    }

    #[test]
    fn states_follow_the_protocol() {
        let mut session = session();
        let mut presenter = Recorder::default();
        assert_eq!(session.state(), SessionState::Idle);

        let request = session.start().unwrap();
        assert_eq!(request.path, "http://catalog/configuration");
        assert_eq!(session.state(), SessionState::LoadingConfig);

        let step = session.on_response(ok(CONFIG_BODY), &mut presenter);
        assert_eq!(session.state(), SessionState::LoadingListing);
        let Step::Fetch(listing) = step else {
            panic!("expected listing request");
        };
        assert_eq!(listing.path, "http://catalog/movie/now_playing");
        assert_eq!(listing.query, vec![("api_key".to_string(), "key".to_string())]);

        let step = session.on_response(ok(LISTING_BODY), &mut presenter);
        assert_eq!(step, Step::Finished);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn response_after_cancel_is_dropped() {
        let mut session = session();
        let mut presenter = Recorder::default();
        session.start().unwrap();
        session.cancel();

        let step = session.on_response(ok(CONFIG_BODY), &mut presenter);

        assert_eq!(step, Step::Finished);
        assert_eq!(session.state(), SessionState::Cancelled);
        assert!(presenter.events.is_empty());
        assert!(session.config().is_none());
    }

    #[test]
    fn cancel_between_phases_drops_listing() {
        let mut session = session();
        let mut presenter = Recorder::default();
        session.start().unwrap();
        session.on_response(ok(CONFIG_BODY), &mut presenter);
        session.cancel();

        session.on_response(ok(LISTING_BODY), &mut presenter);

        assert!(presenter.items.is_empty());
        assert_eq!(session.state(), SessionState::Cancelled);
    }

    #[test]
    fn cancel_keeps_terminal_state() {
        let mut session = session();
        let mut transport = Scripted::new(vec![ok(CONFIG_BODY), ok(LISTING_BODY)]);
        let mut presenter = Recorder::default();
        run_session(&mut session, &mut transport, &mut presenter).unwrap();

        session.cancel();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn cancelled_session_cannot_start() {
        let mut session = session();
        session.cancel();
        assert_eq!(session.start().unwrap_err(), CatalogError::AlreadyStarted);
    }

    #[test]
    fn response_on_idle_session_is_ignored() {
        let mut session = session();
        let mut presenter = Recorder::default();
        let step = session.on_response(ok(CONFIG_BODY), &mut presenter);
        assert_eq!(step, Step::Finished);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(presenter.events.is_empty());
    }

    #[test]
    fn failure_message_names_phase() {
        let failure = PhaseFailure {
            phase: Phase::Config,
            error: CatalogError::ConfigParse("missing image base url".to_string()),
            notify_user: true,
        };
        assert_eq!(
            failure.message(),
            "Failed to load configuration: configuration parse failed: missing image base url"
        );
    }
}
