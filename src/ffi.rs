//! FFI bindings for Synheart Sense
//!
//! This module provides C-compatible functions for calling Sense from other
//! languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `sense_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{signals_to_snapshot, SenseProcessor};
use crate::SENSE_VERSION;

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

// ============================================================================
// Stateless API
// ============================================================================

/// Process a JSON array of signals and return snapshot JSON.
///
/// # Safety
/// - `signals_json` and `entity_id` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with
///   `sense_free_string`.
/// - Returns NULL on error; call `sense_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sense_signals_to_snapshot(
    signals_json: *const c_char,
    entity_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(signals_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid signals JSON string pointer");
            return ptr::null_mut();
        }
    };

    let entity_str = match cstr_to_string(entity_id) {
        Some(s) => s,
        None => {
            set_last_error("Invalid entity_id string pointer");
            return ptr::null_mut();
        }
    };

    match signals_to_snapshot(json_str, entity_str) {
        Ok(snapshot) => string_to_cstr(&snapshot),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a SenseProcessor
pub struct SenseProcessorHandle {
    processor: SenseProcessor,
}

/// Create a new SenseProcessor for the given entity.
///
/// # Safety
/// - `entity_id` must be a valid null-terminated C string.
/// - Returns a pointer to a newly allocated SenseProcessor.
/// - Must be freed with `sense_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn sense_processor_new(entity_id: *const c_char) -> *mut SenseProcessorHandle {
    clear_last_error();

    let entity_str = match cstr_to_string(entity_id) {
        Some(s) => s,
        None => {
            set_last_error("Invalid entity_id string pointer");
            return ptr::null_mut();
        }
    };

    let processor = SenseProcessor::new(entity_str);
    let handle = Box::new(SenseProcessorHandle { processor });
    Box::into_raw(handle)
}

/// Free a SenseProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sense_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sense_processor_free(processor: *mut SenseProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Process one signal JSON and return the interpretations as a JSON array.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sense_processor_new`.
/// - `signal_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `sense_free_string`.
/// - Returns NULL on error; call `sense_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sense_processor_process(
    processor: *mut SenseProcessorHandle,
    signal_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(signal_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid signal JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.process_json(&json_str) {
        Ok(interpretations) => match serde_json::to_string(&interpretations) {
            Ok(json) => string_to_cstr(&json),
            Err(e) => {
                set_last_error(&e.to_string());
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Encode the processor's current state to snapshot JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sense_processor_new`.
/// - Returns a newly allocated string that must be freed with
///   `sense_free_string`.
/// - Returns NULL on error; call `sense_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sense_processor_snapshot(
    processor: *mut SenseProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.snapshot_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Save processor state (context, baselines, memory) to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sense_processor_new`.
/// - Returns a newly allocated string that must be freed with
///   `sense_free_string`.
/// - Returns NULL on error; call `sense_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sense_processor_save_state(
    processor: *mut SenseProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.save_state() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load processor state previously produced by `sense_processor_save_state`.
///
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sense_processor_new`.
/// - `state_json` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn sense_processor_load_state(
    processor: *mut SenseProcessorHandle,
    state_json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(state_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid state JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_state(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Free a string returned by any sense function.
///
/// # Safety
/// - `s` must be a pointer returned by a sense function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sense_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the last error message, or NULL if there was no error.
///
/// # Safety
/// - The returned pointer is valid until the next sense call on this thread.
/// - Do NOT free the returned pointer.
#[no_mangle]
pub unsafe extern "C" fn sense_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(msg) => msg.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with
///   `sense_free_string`.
#[no_mangle]
pub unsafe extern "C" fn sense_version() -> *mut c_char {
    string_to_cstr(SENSE_VERSION)
}
