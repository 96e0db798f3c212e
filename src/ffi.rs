//! FFI bindings for Synheart Gesture
//!
//! This module provides C-compatible functions for driving a gesture session
//! from a host that owns the camera and inference engine. All functions use
//! C strings (null-terminated) and return allocated memory that must be freed
//! by the caller using `gesture_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::{GestureConfig, ThresholdOverrides};
use crate::pipeline::{count_gestures, GestureProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Parse an optional config pointer; NULL means defaults
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<GestureConfig, String> {
    if config_json.is_null() {
        return Ok(GestureConfig::default());
    }
    let json = cstr_to_string(config_json).ok_or_else(|| "Invalid config string pointer".to_string())?;
    GestureConfig::from_json(&json).map_err(|e| e.to_string())
}

// ============================================================================
// Stateless API
// ============================================================================

/// Count gestures in an NDJSON frame stream and return the report JSON.
///
/// # Safety
/// - `ndjson` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a newly allocated string that must be freed with `gesture_free_string`.
/// - Returns NULL on error; call `gesture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gesture_count_ndjson(
    ndjson: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let ndjson_str = match cstr_to_string(ndjson) {
        Some(s) => s,
        None => {
            set_last_error("Invalid NDJSON string pointer");
            return ptr::null_mut();
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    let result = count_gestures(&ndjson_str, config)
        .and_then(|report| serde_json::to_string(&report).map_err(Into::into));
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a GestureProcessor
pub struct GestureProcessorHandle {
    processor: GestureProcessor,
}

/// Create a new GestureProcessor.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `gesture_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_new(config_json: *const c_char) -> *mut GestureProcessorHandle {
    clear_last_error();

    let config = match config_from_ptr(config_json) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    match GestureProcessor::new(config) {
        Ok(processor) => Box::into_raw(Box::new(GestureProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a GestureProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_free(processor: *mut GestureProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Feed one stream record (frame, start, reset or stop) to a processor.
///
/// Returns the snapshot JSON for every frame record (a stopped session
/// reports its stored state) and an empty string for lifecycle records.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`.
/// - `record_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `gesture_free_string`.
/// - Returns NULL on error; call `gesture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_process(
    processor: *mut GestureProcessorHandle,
    record_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let record_str = match cstr_to_string(record_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid record string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.process_json(&record_str) {
        Ok(Some(snapshot)) => string_to_cstr(&snapshot),
        Ok(None) => string_to_cstr(""),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Update live thresholds from a partial JSON object,
/// e.g. `{"brow_high": 0.25}`.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`.
/// - `thresholds_json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `gesture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_set_thresholds(
    processor: *mut GestureProcessorHandle,
    thresholds_json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(thresholds_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid thresholds string pointer");
            return -1;
        }
    };

    let overrides: ThresholdOverrides = match serde_json::from_str(&json_str) {
        Ok(o) => o,
        Err(e) => {
            set_last_error(&e.to_string());
            return -1;
        }
    };

    let updated = handle.processor.session().thresholds().apply(&overrides);
    match handle.processor.set_thresholds(updated) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Current counts as JSON (`{"blink":n,"mouth":n,"brow":n}`).
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`.
/// - Returns a newly allocated string that must be freed with `gesture_free_string`.
/// - Returns NULL on error; call `gesture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_counts(processor: *mut GestureProcessorHandle) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    match serde_json::to_string(&handle.processor.counts()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Report for everything processed so far, as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`.
/// - Returns a newly allocated string that must be freed with `gesture_free_string`.
/// - Returns NULL on error; call `gesture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_report(processor: *mut GestureProcessorHandle) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    match serde_json::to_string(&handle.processor.report()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by gesture functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a gesture function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gesture_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next gesture function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn gesture_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn gesture_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
