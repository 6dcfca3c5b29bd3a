//! Unit tests for error.rs
//!
//! Tests all Error variants and the engine_err!/engine_bail! helpers.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("device lost".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("device lost"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(format!("{}", err), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("Render target 'scene' is not valid".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("scene"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("Fullscreen quad creation failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("Fullscreen quad"));
}

#[test]
fn test_incomplete_target_display_uses_hex_status() {
    let err = Error::IncompleteTarget { name: "shadow_0".to_string(), status: 0x8CD6 };
    let display = format!("{}", err);
    assert!(display.contains("shadow_0"));
    assert!(display.contains("0x8CD6"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let err = Error::IncompleteTarget { name: "scene".to_string(), status: 1 };
    let debug = format!("{:?}", err);
    assert!(debug.contains("IncompleteTarget"));
    assert!(debug.contains("scene"));
}

#[test]
fn test_error_clone() {
    let err1 = Error::InvalidResource("texture".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));
}

// ============================================================================
// MACRO TESTS
// ============================================================================

fn bail_when(fail: bool) -> Result<u32> {
    if fail {
        crate::engine_bail!("compositor::tests", "failed with code {}", 7);
    }
    Ok(42)
}

#[test]
fn test_engine_bail_returns_backend_error() {
    match bail_when(true) {
        Err(Error::BackendError(msg)) => assert_eq!(msg, "failed with code 7"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_engine_bail_passes_through_on_success() {
    assert_eq!(bail_when(false).unwrap(), 42);
}

#[test]
fn test_engine_err_builds_error() {
    let err = crate::engine_err!("compositor::tests", "lock {} poisoned", "device");
    assert!(matches!(err, Error::BackendError(ref msg) if msg == "lock device poisoned"));
}
