//! Common test utilities for winscope-trace integration tests.

pub mod perfetto;
pub mod scenario;
pub mod sqlite;

#[allow(unused_imports)]
pub use perfetto::{gzip, perfetto_trace, perfetto_trace_with};
#[allow(unused_imports)]
pub use scenario::{
    key_scenario, motion_scenario, DispatchFixture, KeyFixture, MotionFixture,
    EXPECTED_REAL_TIMESTAMPS, REAL_TO_ELAPSED_OFFSET_NS,
};
#[allow(unused_imports)]
pub use sqlite::{scenario_database, scenario_processor};
