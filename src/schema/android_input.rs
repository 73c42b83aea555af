//! Android input dispatcher event schemas.
//!
//! Field layouts of `AndroidMotionEvent`, `AndroidKeyEvent` and
//! `AndroidWindowInputDispatchEvent`, plus the symbolic names of their enum
//! and flag fields (the constants of `android.view.MotionEvent`,
//! `android.view.KeyEvent` and `android.view.InputDevice`).

use std::sync::Arc;

use crate::timestamp::ClockKind;
use crate::tree::{Formatter, SymbolTable};

use super::{FieldSchema, FieldType, MessageSchema};

pub const MOTION_EVENT: &str = "AndroidMotionEvent";
pub const KEY_EVENT: &str = "AndroidKeyEvent";
pub const WINDOW_DISPATCH_EVENT: &str = "AndroidWindowInputDispatchEvent";

/// Name of the merged dependents container on every input entry.
pub const WINDOW_DISPATCH_EVENTS: &str = "windowDispatchEvents";

pub fn motion_action_table() -> Arc<SymbolTable> {
    Arc::new(SymbolTable::new(
        "MotionEventAction",
        &[
            (0, "ACTION_DOWN"),
            (1, "ACTION_UP"),
            (2, "ACTION_MOVE"),
            (3, "ACTION_CANCEL"),
            (4, "ACTION_OUTSIDE"),
            (5, "ACTION_POINTER_DOWN"),
            (6, "ACTION_POINTER_UP"),
            (7, "ACTION_HOVER_MOVE"),
            (8, "ACTION_SCROLL"),
            (9, "ACTION_HOVER_ENTER"),
            (10, "ACTION_HOVER_EXIT"),
            (11, "ACTION_BUTTON_PRESS"),
            (12, "ACTION_BUTTON_RELEASE"),
        ],
    ))
}

pub fn key_action_table() -> Arc<SymbolTable> {
    Arc::new(SymbolTable::new(
        "KeyEventAction",
        &[(0, "ACTION_DOWN"), (1, "ACTION_UP"), (2, "ACTION_MULTIPLE")],
    ))
}

pub fn source_table() -> Arc<SymbolTable> {
    Arc::new(SymbolTable::new(
        "InputDeviceSource",
        &[
            (0x0000_0000, "SOURCE_UNKNOWN"),
            (0x0000_0101, "SOURCE_KEYBOARD"),
            (0x0000_0201, "SOURCE_DPAD"),
            (0x0000_0401, "SOURCE_GAMEPAD"),
            (0x0000_1002, "SOURCE_TOUCHSCREEN"),
            (0x0000_2002, "SOURCE_MOUSE"),
            (0x0000_4002, "SOURCE_STYLUS"),
            (0x0000_c002, "SOURCE_BLUETOOTH_STYLUS"),
            (0x0001_0004, "SOURCE_TRACKBALL"),
            (0x0002_0004, "SOURCE_MOUSE_RELATIVE"),
            (0x0010_0008, "SOURCE_TOUCHPAD"),
            (0x0020_0000, "SOURCE_TOUCH_NAVIGATION"),
            (0x0040_0000, "SOURCE_ROTARY_ENCODER"),
            (0x0100_0010, "SOURCE_JOYSTICK"),
            (0x0200_0001, "SOURCE_HDMI"),
            (0x0400_0000, "SOURCE_SENSOR"),
        ],
    ))
}

pub fn classification_table() -> Arc<SymbolTable> {
    Arc::new(SymbolTable::new(
        "MotionClassification",
        &[
            (0, "CLASSIFICATION_NONE"),
            (1, "CLASSIFICATION_AMBIGUOUS_GESTURE"),
            (2, "CLASSIFICATION_DEEP_PRESS"),
            (3, "CLASSIFICATION_TWO_FINGER_SWIPE"),
            (4, "CLASSIFICATION_MULTI_FINGER_SWIPE"),
            (5, "CLASSIFICATION_PINCH"),
        ],
    ))
}

pub fn tool_type_table() -> Arc<SymbolTable> {
    Arc::new(SymbolTable::new(
        "ToolType",
        &[
            (0, "TOOL_TYPE_UNKNOWN"),
            (1, "TOOL_TYPE_FINGER"),
            (2, "TOOL_TYPE_STYLUS"),
            (3, "TOOL_TYPE_MOUSE"),
            (4, "TOOL_TYPE_ERASER"),
            (5, "TOOL_TYPE_PALM"),
        ],
    ))
}

pub fn axis_table() -> Arc<SymbolTable> {
    Arc::new(SymbolTable::new(
        "MotionAxis",
        &[
            (0, "AXIS_X"),
            (1, "AXIS_Y"),
            (2, "AXIS_PRESSURE"),
            (3, "AXIS_SIZE"),
            (4, "AXIS_TOUCH_MAJOR"),
            (5, "AXIS_TOUCH_MINOR"),
            (6, "AXIS_TOOL_MAJOR"),
            (7, "AXIS_TOOL_MINOR"),
            (8, "AXIS_ORIENTATION"),
            (9, "AXIS_VSCROLL"),
            (10, "AXIS_HSCROLL"),
            (11, "AXIS_Z"),
            (12, "AXIS_RX"),
            (13, "AXIS_RY"),
            (14, "AXIS_RZ"),
            (15, "AXIS_HAT_X"),
            (16, "AXIS_HAT_Y"),
            (17, "AXIS_LTRIGGER"),
            (18, "AXIS_RTRIGGER"),
            (19, "AXIS_THROTTLE"),
            (20, "AXIS_RUDDER"),
            (21, "AXIS_WHEEL"),
            (22, "AXIS_GAS"),
            (23, "AXIS_BRAKE"),
            (24, "AXIS_DISTANCE"),
            (25, "AXIS_TILT"),
            (26, "AXIS_SCROLL"),
            (27, "AXIS_RELATIVE_X"),
            (28, "AXIS_RELATIVE_Y"),
        ],
    ))
}

pub fn meta_state_table() -> Arc<SymbolTable> {
    Arc::new(SymbolTable::new(
        "MetaState",
        &[
            (0x0000_0001, "META_SHIFT_ON"),
            (0x0000_0002, "META_ALT_ON"),
            (0x0000_0004, "META_SYM_ON"),
            (0x0000_0008, "META_FUNCTION_ON"),
            (0x0000_0010, "META_ALT_LEFT_ON"),
            (0x0000_0020, "META_ALT_RIGHT_ON"),
            (0x0000_0040, "META_SHIFT_LEFT_ON"),
            (0x0000_0080, "META_SHIFT_RIGHT_ON"),
            (0x0000_1000, "META_CTRL_ON"),
            (0x0000_2000, "META_CTRL_LEFT_ON"),
            (0x0000_4000, "META_CTRL_RIGHT_ON"),
            (0x0001_0000, "META_META_ON"),
            (0x0002_0000, "META_META_LEFT_ON"),
            (0x0004_0000, "META_META_RIGHT_ON"),
            (0x0010_0000, "META_CAPS_LOCK_ON"),
            (0x0020_0000, "META_NUM_LOCK_ON"),
            (0x0040_0000, "META_SCROLL_LOCK_ON"),
        ],
    ))
}

pub fn key_flags_table() -> Arc<SymbolTable> {
    Arc::new(SymbolTable::new(
        "KeyEventFlags",
        &[
            (0x0001, "FLAG_WOKE_HERE"),
            (0x0002, "FLAG_SOFT_KEYBOARD"),
            (0x0004, "FLAG_KEEP_TOUCH_MODE"),
            (0x0008, "FLAG_FROM_SYSTEM"),
            (0x0010, "FLAG_EDITOR_ACTION"),
            (0x0020, "FLAG_CANCELED"),
            (0x0040, "FLAG_VIRTUAL_HARD_KEY"),
            (0x0080, "FLAG_LONG_PRESS"),
            (0x0100, "FLAG_CANCELED_LONG_PRESS"),
            (0x0200, "FLAG_TRACKING"),
            (0x0400, "FLAG_FALLBACK"),
        ],
    ))
}

pub fn key_code_table() -> Arc<SymbolTable> {
    let mut symbols: Vec<(i64, String)> = vec![
        (0, "KEYCODE_UNKNOWN".to_string()),
        (3, "KEYCODE_HOME".to_string()),
        (4, "KEYCODE_BACK".to_string()),
        (19, "KEYCODE_DPAD_UP".to_string()),
        (20, "KEYCODE_DPAD_DOWN".to_string()),
        (21, "KEYCODE_DPAD_LEFT".to_string()),
        (22, "KEYCODE_DPAD_RIGHT".to_string()),
        (23, "KEYCODE_DPAD_CENTER".to_string()),
        (24, "KEYCODE_VOLUME_UP".to_string()),
        (25, "KEYCODE_VOLUME_DOWN".to_string()),
        (26, "KEYCODE_POWER".to_string()),
        (62, "KEYCODE_SPACE".to_string()),
        (66, "KEYCODE_ENTER".to_string()),
        (67, "KEYCODE_DEL".to_string()),
        (82, "KEYCODE_MENU".to_string()),
        (111, "KEYCODE_ESCAPE".to_string()),
        (187, "KEYCODE_APP_SWITCH".to_string()),
    ];
    // KEYCODE_0..9 are 7..16, KEYCODE_A..Z are 29..54
    symbols.extend((0..10).map(|d| (7 + d, format!("KEYCODE_{d}"))));
    symbols.extend(
        (b'A'..=b'Z')
            .enumerate()
            .map(|(i, c)| (29 + i as i64, format!("KEYCODE_{}", c as char))),
    );
    let borrowed: Vec<(i64, &str)> = symbols.iter().map(|(c, s)| (*c, s.as_str())).collect();
    Arc::new(SymbolTable::new("KeyCode", &borrowed))
}

fn nanos_field(name: &str, number: u32) -> FieldSchema {
    FieldSchema::scalar(name, number, FieldType::Int64)
        .with_formatter(Formatter::Timestamp(ClockKind::Elapsed))
}

pub fn axis_value_schema() -> Arc<MessageSchema> {
    Arc::new(MessageSchema::new(
        "AxisValue",
        vec![
            FieldSchema::enumeration("axis", 1, &axis_table()),
            FieldSchema::scalar("value", 2, FieldType::Double),
        ],
    ))
}

pub fn pointer_schema(axis_value: &Arc<MessageSchema>) -> Arc<MessageSchema> {
    Arc::new(MessageSchema::new(
        "Pointer",
        vec![
            FieldSchema::scalar("pointer_id", 1, FieldType::Int32),
            FieldSchema::enumeration("tool_type", 2, &tool_type_table()),
            FieldSchema::message("axis_value", 3, axis_value).repeated(),
        ],
    ))
}

pub fn motion_event_schema() -> Arc<MessageSchema> {
    let axis_value = axis_value_schema();
    let pointer = pointer_schema(&axis_value);
    Arc::new(MessageSchema::new(
        MOTION_EVENT,
        vec![
            FieldSchema::scalar("event_id", 1, FieldType::Fixed32),
            nanos_field("event_time_nanos", 2),
            FieldSchema::enumeration("source", 3, &source_table()),
            FieldSchema::enumeration("action", 4, &motion_action_table()),
            FieldSchema::scalar("device_id", 5, FieldType::Int32),
            FieldSchema::scalar("display_id", 6, FieldType::Int32),
            FieldSchema::enumeration("classification", 7, &classification_table()),
            FieldSchema::scalar("flags", 8, FieldType::UInt32),
            FieldSchema::scalar("policy_flags", 9, FieldType::UInt32),
            FieldSchema::scalar("button_state", 10, FieldType::Int32),
            FieldSchema::scalar("action_button", 11, FieldType::Int32),
            FieldSchema::scalar("cursor_position_x", 12, FieldType::Float),
            FieldSchema::scalar("cursor_position_y", 13, FieldType::Float),
            FieldSchema::scalar("meta_state", 14, FieldType::Int32)
                .with_formatter(Formatter::Flags(meta_state_table())),
            FieldSchema::scalar("precision_x", 15, FieldType::Float),
            FieldSchema::scalar("precision_y", 16, FieldType::Float),
            nanos_field("down_time_nanos", 17),
            FieldSchema::message("pointer", 18, &pointer).repeated(),
        ],
    ))
}

pub fn key_event_schema() -> Arc<MessageSchema> {
    Arc::new(MessageSchema::new(
        KEY_EVENT,
        vec![
            FieldSchema::scalar("event_id", 1, FieldType::Fixed32),
            nanos_field("event_time_nanos", 2),
            nanos_field("down_time_nanos", 3),
            FieldSchema::enumeration("source", 4, &source_table()),
            FieldSchema::enumeration("action", 5, &key_action_table()),
            FieldSchema::scalar("device_id", 6, FieldType::Int32),
            FieldSchema::scalar("display_id", 7, FieldType::Int32),
            FieldSchema::enumeration("key_code", 8, &key_code_table()),
            FieldSchema::scalar("scan_code", 9, FieldType::UInt32),
            FieldSchema::scalar("meta_state", 10, FieldType::Int32)
                .with_formatter(Formatter::Flags(meta_state_table())),
            FieldSchema::scalar("repeat_count", 11, FieldType::Int32),
            FieldSchema::scalar("flags", 12, FieldType::UInt32)
                .with_formatter(Formatter::Flags(key_flags_table())),
            FieldSchema::scalar("policy_flags", 13, FieldType::UInt32),
        ],
    ))
}

pub fn window_dispatch_event_schema() -> Arc<MessageSchema> {
    let axis_value = axis_value_schema();
    let dispatched_pointer = Arc::new(MessageSchema::new(
        "DispatchedPointer",
        vec![
            FieldSchema::scalar("pointer_id", 1, FieldType::Int32),
            FieldSchema::scalar("x_in_display", 2, FieldType::Float),
            FieldSchema::scalar("y_in_display", 3, FieldType::Float),
            FieldSchema::message("axis_value_in_window", 4, &axis_value).repeated(),
        ],
    ));
    Arc::new(MessageSchema::new(
        WINDOW_DISPATCH_EVENT,
        vec![
            FieldSchema::scalar("event_id", 1, FieldType::Fixed32),
            FieldSchema::scalar("vsync_id", 2, FieldType::Int64),
            FieldSchema::scalar("window_id", 3, FieldType::Int64),
            FieldSchema::message("dispatched_pointer", 4, &dispatched_pointer).repeated(),
            FieldSchema::scalar("resolved_flags", 5, FieldType::UInt32),
        ],
    ))
}
