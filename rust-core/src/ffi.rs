//! C FFI Bindings for Native Hosts
//!
//! This module exposes the balance engine via C ABI so a host application
//! (device driver shim, game plugin, input mapper) can feed frames and read
//! action edges without linking Rust.
//!
//! Memory Safety:
//! - All returned strings must be freed with `bw_free_string()`
//! - The engine instance must be freed with `bw_engine_destroy()`
//! - NULL checks are performed on all inputs
//! - Events are copied into a caller-provided buffer; nothing is retained
//!
//! Thread Safety:
//! - The engine is NOT thread-safe. Use a single thread or mutex.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::pipeline::BalanceEngine;
use crate::recording::SessionSummary;
use crate::types::{Action, ActionEvent, Edge, GaitPhase, SensorFrame};

// ============================================================================
// OPAQUE HANDLE TYPES
// ============================================================================

/// Opaque handle to a balance engine.
pub struct BwEngine {
    engine: BalanceEngine,
    summary: SessionSummary,
}

/// Result status codes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BwStatus {
    /// Operation succeeded.
    Ok = 0,
    /// Null pointer provided.
    NullPointer = 1,
    /// Invalid parameter value.
    InvalidParameter = 2,
    /// Frame rejected (non-finite reading or timestamp going backwards).
    RejectedFrame = 3,
    /// Event buffer too small; `event_count` holds the required size.
    BufferTooSmall = 4,
}

/// One action edge.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BwActionEvent {
    /// Action (0=Left, 1=Right, 2=Forward, 3=Backward, 4=Modifier, 5=Jump).
    pub action: i32,
    /// Edge (0=Start, 1=Stop).
    pub edge: i32,
    /// Timestamp of the frame that produced the edge.
    pub timestamp_ms: u64,
}

impl From<&ActionEvent> for BwActionEvent {
    fn from(e: &ActionEvent) -> Self {
        Self {
            action: action_code(e.action),
            edge: match e.edge {
                Edge::Start => 0,
                Edge::Stop => 1,
            },
            timestamp_ms: e.timestamp_ms,
        }
    }
}

/// Output from a single frame.
#[repr(C)]
#[derive(Debug, Clone, Default)]
pub struct BwTickOutput {
    /// Timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Left/right balance, 50 = neutral.
    pub balance_x: f32,
    /// Bottom-corner share, 50 = neutral.
    pub balance_y: f32,
    /// Total weight in kg, never negative.
    pub total_kg: f32,
    /// Platform occupied (0 or 1).
    pub in_use: i32,
    /// Horizontal turn rate.
    pub turn_horizontal: i32,
    /// Vertical turn rate.
    pub turn_vertical: i32,
    /// Turn rates valid (0 when both turn channels are disabled).
    pub turn_enabled: i32,
    /// Gait (0=Idle, 1=Walking, 2=Sprinting).
    pub gait: i32,
    /// Airborne (0 or 1).
    pub airborne: i32,
    /// Number of events this frame produced, including any that did not fit.
    pub event_count: u32,
}

/// Ratios of the latest frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct BwRatios {
    pub percent_top_left: f32,
    pub percent_top_right: f32,
    pub percent_bottom_left: f32,
    pub percent_bottom_right: f32,
    pub balance_x: f32,
    pub balance_y: f32,
    pub diagonal_left: f32,
    pub diagonal_right: f32,
    pub diagonal_delta: f32,
}

// ============================================================================
// ENGINE LIFECYCLE
// ============================================================================

/// Create a new balance engine.
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated C string holding
///   a JSON configuration (partial configurations are filled with defaults).
/// - The returned pointer must be freed with `bw_engine_destroy()`.
///
/// # Returns
/// - Pointer to BwEngine on success.
/// - NULL if the configuration is not valid UTF-8, not valid JSON, or fails
///   validation.
#[no_mangle]
pub unsafe extern "C" fn bw_engine_create(config_json: *const c_char) -> *mut BwEngine {
    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        let text = match CStr::from_ptr(config_json).to_str() {
            Ok(s) => s,
            Err(_) => return ptr::null_mut(),
        };
        match EngineConfig::from_json_str(text) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("bw_engine_create: {}", err);
                return ptr::null_mut();
            }
        }
    };

    match BalanceEngine::new(config) {
        Ok(engine) => Box::into_raw(Box::new(BwEngine {
            engine,
            summary: SessionSummary::new(),
        })),
        Err(_) => ptr::null_mut(),
    }
}

/// Destroy a balance engine.
///
/// # Safety
/// - `engine` must be a valid pointer from `bw_engine_create()`.
/// - Must not be called more than once for the same pointer.
#[no_mangle]
pub unsafe extern "C" fn bw_engine_destroy(engine: *mut BwEngine) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Reset the engine state, keeping its configuration. Held actions are
/// dropped without events; call `bw_release_all()` first to receive them.
///
/// # Safety
/// - `engine` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn bw_engine_reset(engine: *mut BwEngine) -> BwStatus {
    if engine.is_null() {
        return BwStatus::NullPointer;
    }

    let engine = &mut *engine;
    engine.engine.reset();
    engine.summary = SessionSummary::new();

    BwStatus::Ok
}

/// Replace the configuration.
///
/// # Safety
/// - `engine` must be a valid pointer.
/// - `config_json` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn bw_engine_set_config(engine: *mut BwEngine, config_json: *const c_char) -> BwStatus {
    if engine.is_null() || config_json.is_null() {
        return BwStatus::NullPointer;
    }

    let engine = &mut *engine;
    let config = match CStr::from_ptr(config_json).to_str() {
        Ok(text) => match EngineConfig::from_json_str(text) {
            Ok(config) => config,
            Err(_) => return BwStatus::InvalidParameter,
        },
        Err(_) => return BwStatus::InvalidParameter,
    };

    match engine.engine.set_config(config) {
        Ok(()) => BwStatus::Ok,
        Err(_) => BwStatus::InvalidParameter,
    }
}

// ============================================================================
// FRAME PROCESSING
// ============================================================================

/// Process one frame.
///
/// # Safety
/// - `engine` must be a valid pointer.
/// - `output` must be a valid pointer to receive results.
/// - `events` must point to at least `events_capacity` writable elements, or
///   be NULL when `events_capacity` is 0.
///
/// # Parameters
/// - `timestamp_ms`: Frame timestamp; must not go backwards.
/// - `top_left`..`bottom_right`: Corner readings in kg.
///
/// # Returns
/// - `BufferTooSmall` if more events occurred than fit. The frame is still
///   processed; the first `events_capacity` events are written and
///   `output.event_count` holds the full count.
#[no_mangle]
pub unsafe extern "C" fn bw_submit_frame(
    engine: *mut BwEngine,
    timestamp_ms: u64,
    top_left: f32,
    top_right: f32,
    bottom_left: f32,
    bottom_right: f32,
    output: *mut BwTickOutput,
    events: *mut BwActionEvent,
    events_capacity: u32,
) -> BwStatus {
    if engine.is_null() || output.is_null() {
        return BwStatus::NullPointer;
    }
    if events.is_null() && events_capacity > 0 {
        return BwStatus::NullPointer;
    }

    let engine = &mut *engine;
    let output = &mut *output;

    let frame = SensorFrame::new(timestamp_ms, top_left, top_right, bottom_left, bottom_right);
    let result = match engine.engine.submit_frame(frame) {
        Ok(result) => result,
        Err(_) => return BwStatus::RejectedFrame,
    };
    engine.summary.add_tick(&result);

    // Copy events
    let written = result.events.len().min(events_capacity as usize);
    for (i, event) in result.events.iter().take(written).enumerate() {
        *events.add(i) = BwActionEvent::from(event);
    }

    // Fill output struct
    output.timestamp_ms = timestamp_ms;
    output.balance_x = result.ratios.balance_x;
    output.balance_y = result.ratios.balance_y;
    output.total_kg = result.calibrated.total_kg;
    output.in_use = result.calibrated.in_use as i32;
    let turn = result.turn.unwrap_or_default();
    output.turn_horizontal = turn.horizontal;
    output.turn_vertical = turn.vertical;
    output.turn_enabled = result.turn.is_some() as i32;
    output.gait = gait_code(result.motion.gait);
    output.airborne = result.motion.airborne as i32;
    output.event_count = result.events.len() as u32;

    if written < result.events.len() {
        BwStatus::BufferTooSmall
    } else {
        BwStatus::Ok
    }
}

/// Release every held action.
///
/// # Safety
/// - `engine` must be a valid pointer.
/// - `events` must point to at least `events_capacity` writable elements.
/// - `event_count` must be a valid pointer; receives the number of stop
///   events, which is at most 6.
#[no_mangle]
pub unsafe extern "C" fn bw_release_all(
    engine: *mut BwEngine,
    timestamp_ms: u64,
    events: *mut BwActionEvent,
    events_capacity: u32,
    event_count: *mut u32,
) -> BwStatus {
    if engine.is_null() || event_count.is_null() {
        return BwStatus::NullPointer;
    }
    if events.is_null() && events_capacity > 0 {
        return BwStatus::NullPointer;
    }

    let engine = &mut *engine;
    let released = engine.engine.release_all(timestamp_ms);
    for event in &released {
        engine.summary.add_event(event);
    }

    let written = released.len().min(events_capacity as usize);
    for (i, event) in released.iter().take(written).enumerate() {
        *events.add(i) = BwActionEvent::from(event);
    }
    *event_count = released.len() as u32;

    if written < released.len() {
        BwStatus::BufferTooSmall
    } else {
        BwStatus::Ok
    }
}

// ============================================================================
// CALIBRATION REQUESTS
// ============================================================================

/// Capture the current stance as balanced on the next frame.
///
/// # Safety
/// - `engine` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn bw_request_center_capture(engine: *mut BwEngine) -> BwStatus {
    if engine.is_null() {
        return BwStatus::NullPointer;
    }
    (*engine).engine.request_center_capture();
    BwStatus::Ok
}

/// Clear floor and center calibration on the next frame.
///
/// # Safety
/// - `engine` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn bw_request_zero(engine: *mut BwEngine) -> BwStatus {
    if engine.is_null() {
        return BwStatus::NullPointer;
    }
    (*engine).engine.request_zero();
    BwStatus::Ok
}

// ============================================================================
// STATUS QUERIES
// ============================================================================

/// Copy the latest ratios.
///
/// # Safety
/// - `engine` and `out` must be valid pointers.
#[no_mangle]
pub unsafe extern "C" fn bw_get_ratios(engine: *const BwEngine, out: *mut BwRatios) -> BwStatus {
    if engine.is_null() || out.is_null() {
        return BwStatus::NullPointer;
    }

    let r = (*engine).engine.ratios();
    *out = BwRatios {
        percent_top_left: r.percent_top_left,
        percent_top_right: r.percent_top_right,
        percent_bottom_left: r.percent_bottom_left,
        percent_bottom_right: r.percent_bottom_right,
        balance_x: r.balance_x,
        balance_y: r.balance_y,
        diagonal_left: r.diagonal_left,
        diagonal_right: r.diagonal_right,
        diagonal_delta: r.diagonal_delta,
    };
    BwStatus::Ok
}

/// Get the total number of frames processed.
///
/// # Safety
/// - `engine` must be a valid pointer.
///
/// # Returns
/// - Frame count, or -1 if `engine` is NULL.
#[no_mangle]
pub unsafe extern "C" fn bw_get_tick_count(engine: *const BwEngine) -> i64 {
    if engine.is_null() {
        return -1;
    }
    (*engine).engine.state().ticks() as i64
}

/// Get the current gait (0=Idle, 1=Walking, 2=Sprinting).
///
/// # Safety
/// - `engine` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn bw_get_gait(engine: *const BwEngine) -> i32 {
    if engine.is_null() {
        return -1;
    }
    gait_code((*engine).engine.motion().gait)
}

// ============================================================================
// JSON OUTPUT
// ============================================================================

/// Get the active configuration as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer.
///
/// # Returns
/// - JSON string (MUST be freed with `bw_free_string()`).
/// - NULL on error.
#[no_mangle]
pub unsafe extern "C" fn bw_config_json(engine: *const BwEngine) -> *mut c_char {
    if engine.is_null() {
        return ptr::null_mut();
    }
    match (*engine).engine.config().to_json_pretty() {
        Ok(json) => into_c_string(json),
        Err(_) => ptr::null_mut(),
    }
}

/// Get the session summary as JSON and start a new summary.
///
/// # Safety
/// - `engine` must be a valid pointer.
///
/// # Returns
/// - JSON string (MUST be freed with `bw_free_string()`).
/// - NULL on error.
#[no_mangle]
pub unsafe extern "C" fn bw_export_summary_json(engine: *mut BwEngine) -> *mut c_char {
    if engine.is_null() {
        return ptr::null_mut();
    }

    let engine = &mut *engine;
    let summary = std::mem::take(&mut engine.summary);
    match summary.to_json() {
        Ok(json) => into_c_string(json),
        Err(_) => ptr::null_mut(),
    }
}

/// Free a string returned by this library.
///
/// # Safety
/// - `ptr` must be a string returned by `bw_config_json()` or
///   `bw_export_summary_json()`.
/// - Must not be called more than once for the same pointer.
#[no_mangle]
pub unsafe extern "C" fn bw_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Get the library version string.
///
/// # Returns
/// - Static string, do NOT free.
#[no_mangle]
pub extern "C" fn bw_version() -> *const c_char {
    static VERSION: &[u8] = concat!("balance-walk/", env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

/// Get the enabled features of an engine (bitfield).
///
/// Bit 0: Walking
/// Bit 1: Sprinting
/// Bit 2: Turning
/// Bit 3: Vertical turning
/// Bit 4: Jumping
/// Bit 5: Leaning
///
/// # Safety
/// - `engine` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn bw_features(engine: *const BwEngine) -> u32 {
    if engine.is_null() {
        return 0;
    }
    let f = &(*engine).engine.config().features;
    [f.walking, f.sprinting, f.turning, f.turning_vertical, f.jumping, f.leaning]
        .iter()
        .enumerate()
        .fold(0, |bits, (i, &on)| if on { bits | (1 << i) } else { bits })
}

// ============================================================================
// HELPERS
// ============================================================================

fn action_code(action: Action) -> i32 {
    match action {
        Action::Left => 0,
        Action::Right => 1,
        Action::Forward => 2,
        Action::Backward => 3,
        Action::Modifier => 4,
        Action::Jump => 5,
    }
}

fn gait_code(gait: GaitPhase) -> i32 {
    match gait {
        GaitPhase::Idle => 0,
        GaitPhase::Walking => 1,
        GaitPhase::Sprinting => 2,
    }
}

fn into_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cstring) => cstring.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
