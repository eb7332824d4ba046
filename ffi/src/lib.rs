//! C-ABI wrapper around `catalog-core`.
//!
//! # Overview
//! Lets a native mobile host run the two-phase catalog load with its own HTTP
//! stack and UI thread. The host asks the session for a request, executes it,
//! and feeds the outcome back; results arrive through presenter callbacks on
//! the calling thread.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - A request pointer returned by `catalog_session_start` or
//!   `catalog_session_on_*` means "execute this next"; null means the session
//!   has nothing more to fetch.
//! - The C caller owns returned requests and strings and must release them
//!   with `catalog_free_request` / `catalog_free_string`.
//! - Host teardown calls `catalog_session_cancel`; responses that complete
//!   afterwards are dropped without touching the presenter.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use catalog_core::settings::DEFAULT_POSTER_SIZE;
use catalog_core::{CatalogClient, CatalogError, CatalogSession, HttpResponse, Step};

use types::*;

/// Read a nullable C string. Invalid UTF-8 is replaced, not rejected.
fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// Create an idle session against `base_url` with `api_key`.
///
/// `poster_size` is the preferred default poster size; null selects the
/// library default. Returns null if `base_url` or `api_key` is null.
/// The caller must free the returned pointer with `catalog_session_free`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_session_new(
    base_url: *const c_char,
    api_key: *const c_char,
    poster_size: *const c_char,
    notify_user: bool,
) -> *mut FfiCatalogSession {
    catch_unwind(|| {
        let (Some(base_url), Some(api_key)) = (read_str(base_url), read_str(api_key)) else {
            log::warn!("catalog_session_new: null base_url or api_key");
            return std::ptr::null_mut();
        };
        let poster_size = read_str(poster_size).unwrap_or_else(|| DEFAULT_POSTER_SIZE.to_string());
        let session = CatalogSession::new(CatalogClient::new(&base_url, &api_key), &poster_size)
            .with_failure_notifications(notify_user);
        Box::into_raw(Box::new(FfiCatalogSession { inner: session }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a session created by `catalog_session_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_session_free(session: *mut FfiCatalogSession) {
    if !session.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(session) });
        });
    }
}

/// Begin the load and return the configuration request.
///
/// Returns null if `session` is null or the session already left `Idle`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_session_start(session: *mut FfiCatalogSession) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if session.is_null() {
            return std::ptr::null_mut();
        }
        let session = unsafe { &mut *session };
        match session.inner.start() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Cancel the session. Later responses are dropped. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_session_cancel(session: *mut FfiCatalogSession) {
    if !session.is_null() {
        let _ = catch_unwind(|| {
            unsafe { &mut *session }.inner.cancel();
        });
    }
}

/// Current protocol state, or `Invalid` for a null session.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_session_state(session: *const FfiCatalogSession) -> FfiSessionState {
    catch_unwind(|| {
        if session.is_null() {
            return FfiSessionState::Invalid;
        }
        unsafe { &*session }.inner.state().into()
    })
    .unwrap_or(FfiSessionState::Invalid)
}

// ---------------------------------------------------------------------------
// Feeding responses
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: read_str(resp.body).unwrap_or_default(),
    }
}

/// Feed `result` to the session, reporting through `presenter`, and return
/// the next request or null.
fn advance(
    session: &mut FfiCatalogSession,
    result: Result<HttpResponse, CatalogError>,
    presenter: *const FfiPresenter,
) -> *mut FfiHttpRequest {
    let callbacks = unsafe { presenter.as_ref() };
    let mut adapter = CallbackPresenter::new(callbacks, session.inner.config());
    match session.inner.on_response(result, &mut adapter) {
        Step::Fetch(req) => FfiHttpRequest::from_core(req),
        Step::Finished => std::ptr::null_mut(),
    }
}

/// Feed the response of the last request returned for this session.
///
/// `presenter` may be null, in which case results are not reported. Returns
/// the next request to execute, or null when the session is finished.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_session_on_response(
    session: *mut FfiCatalogSession,
    response: *const FfiHttpResponse,
    presenter: *const FfiPresenter,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if session.is_null() || response.is_null() {
            return std::ptr::null_mut();
        }
        let session = unsafe { &mut *session };
        let core_resp = ffi_response_to_core(unsafe { &*response });
        advance(session, Ok(core_resp), presenter)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Report that the last request could not be executed at all.
///
/// `message` may be null. Fails the current phase; the return value follows
/// `catalog_session_on_response`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_session_on_transport_error(
    session: *mut FfiCatalogSession,
    message: *const c_char,
    presenter: *const FfiPresenter,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if session.is_null() {
            return std::ptr::null_mut();
        }
        let session = unsafe { &mut *session };
        let message = read_str(message).unwrap_or_else(|| "unknown transport error".to_string());
        advance(session, Err(CatalogError::Transport(message)), presenter)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Resolve a poster URL with the session's configuration.
///
/// `size` may be null to use the default poster size. Returns null if the
/// configuration is not loaded yet or `poster_path` is null or empty.
/// The caller must free the result with `catalog_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_session_resolve_image_url(
    session: *const FfiCatalogSession,
    size: *const c_char,
    poster_path: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        if session.is_null() {
            return std::ptr::null_mut();
        }
        let Some(config) = unsafe { &*session }.inner.config() else {
            return std::ptr::null_mut();
        };
        let path = read_str(poster_path);
        let url = match read_str(size) {
            Some(size) => config.resolve_image_url(&size, path.as_deref()),
            None => config.resolve_default_image_url(path.as_deref()),
        };
        url.map_or(std::ptr::null_mut(), |u| c_string(&u).into_raw())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `catalog_session_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
