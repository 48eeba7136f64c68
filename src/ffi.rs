//! FFI bindings for Gaze RQA
//!
//! This module provides C-compatible functions for calling the engine from
//! other languages (e.g. a visualization front end). All functions use C
//! strings (null-terminated) and return allocated memory that must be freed by
//! the caller using `rqa_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapter::FixationAdapter;
use crate::config::RqaConfig;
use crate::error::RqaError;
use crate::pipeline::RqaProcessor;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

/// A null config pointer selects the defaults
unsafe fn processor_from(config_json: *const c_char) -> Result<RqaProcessor, RqaError> {
    if config_json.is_null() {
        return Ok(RqaProcessor::new());
    }
    let json = cstr_to_string(config_json)
        .ok_or_else(|| RqaError::InvalidConfig("config is not valid UTF-8".to_string()))?;
    RqaProcessor::with_config(RqaConfig::from_json(&json)?)
}

/// Run `f` and translate its outcome into the C calling convention
fn respond<F>(f: F) -> *mut c_char
where
    F: FnOnce() -> Result<String, RqaError>,
{
    match f() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Compute an RQA snapshot from a JSON array of fixations.
///
/// # Safety
/// - `fixations_json` must be a valid null-terminated C string.
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `rqa_free_string`.
/// - Returns NULL on error; call `rqa_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rqa_compute_json(
    fixations_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(fixations_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid fixations string pointer");
            return ptr::null_mut();
        }
    };

    respond(|| {
        let processor = processor_from(config_json)?;
        processor.process_json(&json_str, None)
    })
}

/// Build the recurrence matrix for a JSON array of fixations, as nested rows.
///
/// # Safety
/// - `fixations_json` must be a valid null-terminated C string.
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `rqa_free_string`.
/// - Returns NULL on error; call `rqa_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rqa_matrix_json(
    fixations_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(fixations_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid fixations string pointer");
            return ptr::null_mut();
        }
    };

    respond(|| {
        let processor = processor_from(config_json)?;
        let fixations = FixationAdapter::parse_array(&json_str)?;
        FixationAdapter::ensure_valid(&fixations)?;
        let matrix = processor.build_matrix(&fixations);
        Ok(serde_json::to_string(&matrix)?)
    })
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a static string that is valid until the next FFI call.
/// - Returns NULL if there was no error.
/// - Do NOT free this pointer.
#[no_mangle]
pub unsafe extern "C" fn rqa_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Free a string returned by an `rqa_*` function.
///
/// # Safety
/// - `s` must be a pointer returned by an `rqa_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rqa_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the library version string.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free this pointer.
#[no_mangle]
pub unsafe extern "C" fn rqa_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        unsafe { rqa_free_string(ptr) };
        s
    }

    #[test]
    fn test_compute_with_default_config() {
        let fixations = CString::new(
            r#"[{"id":1,"timestamp":0,"aoi":["A"]},{"id":2,"timestamp":100,"aoi":["B"]},{"id":3,"timestamp":200,"aoi":["A"]}]"#,
        )
        .unwrap();

        let result = unsafe { rqa_compute_json(fixations.as_ptr(), ptr::null()) };
        let payload: serde_json::Value = serde_json::from_str(&take(result)).unwrap();

        // one of three pairs recurs
        let rate = payload["metrics"]["recurrenceRate"].as_f64().unwrap();
        assert!((rate - 100.0 / 3.0).abs() < 1e-9);
        assert!(unsafe { rqa_last_error() }.is_null());
    }

    #[test]
    fn test_matrix_json() {
        let fixations =
            CString::new(r#"[{"id":1,"timestamp":0,"aoi":["A"]},{"id":2,"timestamp":100,"aoi":["A"]}]"#)
                .unwrap();
        let config = CString::new(r#"{"method":"self_transition_corrected"}"#).unwrap();

        let result = unsafe { rqa_matrix_json(fixations.as_ptr(), config.as_ptr()) };
        assert_eq!(take(result), "[[1,0],[0,1]]");
    }

    #[test]
    fn test_error_reporting() {
        let fixations = CString::new("not json").unwrap();

        let result = unsafe { rqa_compute_json(fixations.as_ptr(), ptr::null()) };
        assert!(result.is_null());

        let err = unsafe { rqa_last_error() };
        assert!(!err.is_null());
        let msg = unsafe { CStr::from_ptr(err) }.to_str().unwrap();
        assert!(msg.contains("Invalid JSON"), "{msg}");
    }

    #[test]
    fn test_null_input() {
        let result = unsafe { rqa_compute_json(ptr::null(), ptr::null()) };
        assert!(result.is_null());
        assert!(!unsafe { rqa_last_error() }.is_null());
    }

    #[test]
    fn test_version() {
        let version = unsafe { CStr::from_ptr(rqa_version()) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
