//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: `*mut c_char`
//! instead of `String`, raw pointer + length instead of `Vec`, and enums with
//! explicit discriminants. Requests handed to C are heap-allocated and owned
//! by the caller until `catalog_free_request`. Everything passed *into* a
//! presenter callback is borrowed and only valid for the duration of that
//! call.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::sync::Arc;

use catalog_core::{
    CatalogConfig, CatalogError, CatalogItem, CatalogSession, HttpMethod, HttpRequest, Phase,
    PhaseFailure, Presenter, SessionState,
};

/// Opaque handle to a `CatalogSession`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiCatalogSession {
    pub(crate) inner: CatalogSession,
}

/// Build a C string, dropping interior NUL bytes rather than failing.
pub(crate) fn c_string(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request for the host to execute.
///
/// `url` is absolute and already carries the query string. The host executes
/// the request and reports back through `catalog_session_on_response` or
/// `catalog_session_on_transport_error`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let url = c_string(&req.url()).into_raw();

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k).into_raw(),
                    value: c_string(v).into_raw(),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller builds this on the stack after executing a request. The FFI
/// layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Session state and failures
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiSessionState {
    Idle = 0,
    LoadingConfig = 1,
    ConfigLoaded = 2,
    LoadingListing = 3,
    Ready = 4,
    FailedConfig = 5,
    FailedListing = 6,
    Cancelled = 7,
    /// Returned when the session pointer is null.
    Invalid = 255,
}

impl From<SessionState> for FfiSessionState {
    fn from(s: SessionState) -> Self {
        match s {
            SessionState::Idle => FfiSessionState::Idle,
            SessionState::LoadingConfig => FfiSessionState::LoadingConfig,
            SessionState::ConfigLoaded => FfiSessionState::ConfigLoaded,
            SessionState::LoadingListing => FfiSessionState::LoadingListing,
            SessionState::Ready => FfiSessionState::Ready,
            SessionState::Failed(Phase::Config) => FfiSessionState::FailedConfig,
            SessionState::Failed(Phase::Listing) => FfiSessionState::FailedListing,
            SessionState::Cancelled => FfiSessionState::Cancelled,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiPhase {
    Config = 0,
    Listing = 1,
}

impl From<Phase> for FfiPhase {
    fn from(p: Phase) -> Self {
        match p {
            Phase::Config => FfiPhase::Config,
            Phase::Listing => FfiPhase::Listing,
        }
    }
}

/// Error category carried by `FfiPhaseFailure`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Http = 1,
    Transport = 2,
    ConfigParse = 3,
    Parse = 4,
    AlreadyStarted = 5,
    Settings = 6,
}

impl From<&CatalogError> for FfiErrorCode {
    fn from(e: &CatalogError) -> Self {
        match e {
            CatalogError::Http { .. } => FfiErrorCode::Http,
            CatalogError::Transport(_) => FfiErrorCode::Transport,
            CatalogError::ConfigParse(_) => FfiErrorCode::ConfigParse,
            CatalogError::Parse(_) => FfiErrorCode::Parse,
            CatalogError::AlreadyStarted => FfiErrorCode::AlreadyStarted,
            CatalogError::Settings(_) => FfiErrorCode::Settings,
        }
    }
}

// ---------------------------------------------------------------------------
// Presenter callbacks
// ---------------------------------------------------------------------------

/// Image configuration, borrowed for the duration of `on_config_ready`.
#[repr(C)]
pub struct FfiCatalogConfig {
    pub image_base_url: *const c_char,
    pub default_poster_size: *const c_char,
    pub poster_sizes: *const *const c_char,
    pub poster_sizes_len: u32,
}

/// One listing row, borrowed for the duration of `on_item_appended`.
///
/// `poster_path` and `poster_url` are null when the movie has no poster.
/// `poster_url` is resolved at the default poster size.
#[repr(C)]
pub struct FfiCatalogItem {
    pub title: *const c_char,
    pub overview: *const c_char,
    pub poster_path: *const c_char,
    pub poster_url: *const c_char,
}

/// Phase failure, borrowed for the duration of `on_phase_failed`.
#[repr(C)]
pub struct FfiPhaseFailure {
    pub phase: FfiPhase,
    pub error_code: FfiErrorCode,
    /// Status of a non-2xx response, 0 otherwise.
    pub http_status: u16,
    pub message: *const c_char,
    /// Whether the host should show a transient notification.
    pub notify_user: bool,
}

/// Presenter implemented by the host as plain function pointers.
///
/// Any callback may be null. `user_data` is passed back untouched.
/// Callbacks run inside `catalog_session_on_*` and must not call back into
/// the same session.
#[repr(C)]
pub struct FfiPresenter {
    pub user_data: *mut c_void,
    pub on_config_ready: Option<extern "C" fn(*mut c_void, *const FfiCatalogConfig)>,
    pub on_item_appended: Option<extern "C" fn(*mut c_void, *const FfiCatalogItem, u32)>,
    pub on_phase_failed: Option<extern "C" fn(*mut c_void, *const FfiPhaseFailure)>,
}

/// Adapts an optional `FfiPresenter` to the core `Presenter` trait.
///
/// Holds the last configuration so items can carry a resolved poster URL.
pub(crate) struct CallbackPresenter<'a> {
    callbacks: Option<&'a FfiPresenter>,
    config: Option<Arc<CatalogConfig>>,
}

impl<'a> CallbackPresenter<'a> {
    pub(crate) fn new(callbacks: Option<&'a FfiPresenter>, config: Option<Arc<CatalogConfig>>) -> Self {
        Self { callbacks, config }
    }
}

impl Presenter for CallbackPresenter<'_> {
    fn on_config_ready(&mut self, config: Arc<CatalogConfig>) {
        if let Some((user_data, f)) = self
            .callbacks
            .and_then(|c| c.on_config_ready.map(|f| (c.user_data, f)))
        {
            let base = c_string(config.image_base_url());
            let default_size = c_string(config.default_poster_size());
            let sizes: Vec<CString> = config.poster_sizes().iter().map(|s| c_string(s)).collect();
            let size_ptrs: Vec<*const c_char> = sizes.iter().map(|s| s.as_ptr()).collect();
            let ffi = FfiCatalogConfig {
                image_base_url: base.as_ptr(),
                default_poster_size: default_size.as_ptr(),
                poster_sizes: size_ptrs.as_ptr(),
                poster_sizes_len: size_ptrs.len() as u32,
            };
            f(user_data, &ffi);
        }
        self.config = Some(config);
    }

    fn on_item_appended(&mut self, item: CatalogItem, index: usize) {
        let Some((user_data, f)) = self
            .callbacks
            .and_then(|c| c.on_item_appended.map(|f| (c.user_data, f)))
        else {
            return;
        };
        let title = c_string(&item.title);
        let overview = c_string(&item.overview);
        let poster_path = item.poster_path.as_deref().map(c_string);
        let poster_url = self
            .config
            .as_ref()
            .and_then(|config| item.poster_url(config))
            .map(|url| c_string(&url));
        let ffi = FfiCatalogItem {
            title: title.as_ptr(),
            overview: overview.as_ptr(),
            poster_path: poster_path.as_ref().map_or(std::ptr::null(), |s| s.as_ptr()),
            poster_url: poster_url.as_ref().map_or(std::ptr::null(), |s| s.as_ptr()),
        };
        f(user_data, &ffi, index as u32);
    }

    fn on_phase_failed(&mut self, failure: &PhaseFailure) {
        let Some((user_data, f)) = self
            .callbacks
            .and_then(|c| c.on_phase_failed.map(|f| (c.user_data, f)))
        else {
            return;
        };
        let message = c_string(&failure.message());
        let http_status = match &failure.error {
            CatalogError::Http { status, .. } => *status,
            _ => 0,
        };
        let ffi = FfiPhaseFailure {
            phase: failure.phase.into(),
            error_code: (&failure.error).into(),
            http_status,
            message: message.as_ptr(),
            notify_user: failure.notify_user,
        };
        f(user_data, &ffi);
    }
}
