//! The recorded input events every fixture format is built from.
//!
//! Four touchscreen motion events of one tap-and-drag gesture. The first one
//! was dispatched to six windows; the others to fewer or none.

/// `REALTIME - BOOTTIME` at recording time.
pub const REAL_TO_ELAPSED_OFFSET_NS: i64 = 1_718_163_676_000_000_000;

pub const EXPECTED_REAL_TIMESTAMPS: [i64; 4] = [
    1_718_163_696_245_804_410,
    1_718_163_696_254_923_410,
    1_718_163_696_262_592_410,
    1_718_163_696_271_081_410,
];

pub const SOURCE_TOUCHSCREEN: i32 = 0x1002;
pub const MOTION_FLAGS: u32 = 128;
pub const DEVICE_ID: i32 = 4;

#[derive(Debug, Clone)]
pub struct DispatchFixture {
    pub vsync_id: i64,
    pub window_id: i64,
}

#[derive(Debug, Clone)]
pub struct MotionFixture {
    pub event_id: u32,
    pub elapsed_ns: i64,
    pub down_time_ns: i64,
    pub action: i32,
    pub x: f64,
    pub y: f64,
    pub dispatches: Vec<DispatchFixture>,
}

#[derive(Debug, Clone)]
pub struct KeyFixture {
    pub event_id: u32,
    pub elapsed_ns: i64,
    pub action: i32,
    pub key_code: i32,
    pub dispatches: Vec<DispatchFixture>,
}

fn dispatches(vsync_id: i64, window_ids: &[i64]) -> Vec<DispatchFixture> {
    window_ids
        .iter()
        .map(|&window_id| DispatchFixture {
            vsync_id,
            window_id,
        })
        .collect()
}

/// Motion events in timestamp order.
pub fn motion_scenario() -> Vec<MotionFixture> {
    let elapsed: Vec<i64> = EXPECTED_REAL_TIMESTAMPS
        .iter()
        .map(|real| real - REAL_TO_ELAPSED_OFFSET_NS)
        .collect();
    let down_time_ns = elapsed[0];
    vec![
        MotionFixture {
            event_id: 856_299_947,
            elapsed_ns: elapsed[0],
            down_time_ns,
            action: 0,
            x: 350.0,
            y: 370.0,
            dispatches: dispatches(89_001, &[292, 247, 240, 370, 229, 0]),
        },
        MotionFixture {
            event_id: 1_024_446_201,
            elapsed_ns: elapsed[1],
            down_time_ns,
            action: 2,
            x: 350.5,
            y: 381.25,
            dispatches: dispatches(89_002, &[292, 0]),
        },
        MotionFixture {
            event_id: 301_877_163,
            elapsed_ns: elapsed[2],
            down_time_ns,
            action: 2,
            x: 352.0,
            y: 392.75,
            dispatches: Vec::new(),
        },
        MotionFixture {
            event_id: 1_790_522_048,
            elapsed_ns: elapsed[3],
            down_time_ns,
            action: 1,
            x: 352.0,
            y: 401.0,
            dispatches: dispatches(89_004, &[292]),
        },
    ]
}

/// A key press and release.
pub fn key_scenario() -> Vec<KeyFixture> {
    vec![
        KeyFixture {
            event_id: 40_001,
            elapsed_ns: 21_000_000_000,
            action: 0,
            key_code: 29,
            dispatches: dispatches(90_001, &[318]),
        },
        KeyFixture {
            event_id: 40_002,
            elapsed_ns: 21_080_000_000,
            action: 1,
            key_code: 29,
            dispatches: dispatches(90_006, &[318, 0]),
        },
    ]
}
