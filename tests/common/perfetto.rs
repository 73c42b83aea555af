//! Perfetto binary trace fixtures.

use std::io::Write;
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use perfetto_protos::builtin_clock::BuiltinClock;
use perfetto_protos::clock_snapshot::clock_snapshot::Clock;
use perfetto_protos::clock_snapshot::ClockSnapshot;
use perfetto_protos::trace_packet::TracePacket;
use protobuf::{CodedOutputStream, Message};

use super::scenario::{
    key_scenario, motion_scenario, DispatchFixture, KeyFixture, MotionFixture, DEVICE_ID,
    MOTION_FLAGS, REAL_TO_ELAPSED_OFFSET_NS, SOURCE_TOUCHSCREEN,
};

const BOOTTIME: u32 = BuiltinClock::BUILTIN_CLOCK_BOOTTIME as u32;
const REALTIME: u32 = BuiltinClock::BUILTIN_CLOCK_REALTIME as u32;

/// Serialize fields written by `write` into a standalone message.
pub fn encode(
    write: impl FnOnce(&mut CodedOutputStream<'_>) -> Result<(), protobuf::Error>,
) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut os = CodedOutputStream::vec(&mut out);
        write(&mut os).unwrap();
        os.flush().unwrap();
    }
    out
}

fn motion_payload(event: &MotionFixture) -> Vec<u8> {
    let axis_x = encode(|os| {
        os.write_int32(1, 0)?;
        os.write_double(2, event.x)
    });
    let axis_y = encode(|os| {
        os.write_int32(1, 1)?;
        os.write_double(2, event.y)
    });
    let pointer = encode(|os| {
        os.write_int32(1, 0)?;
        os.write_int32(2, 1)?;
        os.write_bytes(3, &axis_x)?;
        os.write_bytes(3, &axis_y)
    });
    encode(|os| {
        os.write_fixed32(1, event.event_id)?;
        os.write_int64(2, event.elapsed_ns)?;
        os.write_int32(3, SOURCE_TOUCHSCREEN)?;
        os.write_int32(4, event.action)?;
        os.write_int32(5, DEVICE_ID)?;
        os.write_int32(6, 0)?;
        os.write_int32(7, 0)?;
        os.write_uint32(8, MOTION_FLAGS)?;
        os.write_int32(14, 0)?;
        os.write_int64(17, event.down_time_ns)?;
        os.write_bytes(18, &pointer)
    })
}

fn key_payload(event: &KeyFixture) -> Vec<u8> {
    encode(|os| {
        os.write_fixed32(1, event.event_id)?;
        os.write_int64(2, event.elapsed_ns)?;
        os.write_int32(4, 0x101)?;
        os.write_int32(5, event.action)?;
        os.write_int32(6, 1)?;
        os.write_int32(8, event.key_code)?;
        os.write_int32(10, 0)
    })
}

fn dispatch_payload(event_id: u32, dispatch: &DispatchFixture) -> Vec<u8> {
    encode(|os| {
        os.write_fixed32(1, event_id)?;
        os.write_int64(2, dispatch.vsync_id)?;
        os.write_int64(3, dispatch.window_id)
    })
}

/// A packet carrying one `AndroidInputEvent` member.
pub fn input_event_packet(elapsed_ns: i64, oneof_field: u32, payload: &[u8]) -> Vec<u8> {
    let mut meta = TracePacket::new();
    meta.set_timestamp(elapsed_ns as u64);
    meta.set_timestamp_clock_id(BOOTTIME);
    let mut bytes = meta.write_to_bytes().unwrap();

    let input_event = encode(|os| os.write_bytes(oneof_field, payload));
    let extensions = encode(|os| os.write_bytes(5, &input_event));
    bytes.extend(encode(|os| os.write_bytes(112, &extensions)));
    bytes
}

pub fn clock_snapshot_packet(boottime_ns: i64, offset_ns: i64) -> Vec<u8> {
    let mut boot = Clock::new();
    boot.set_clock_id(BOOTTIME);
    boot.set_timestamp(boottime_ns as u64);
    let mut real = Clock::new();
    real.set_clock_id(REALTIME);
    real.set_timestamp((boottime_ns + offset_ns) as u64);

    let mut snapshot = ClockSnapshot::new();
    snapshot.clocks = vec![boot, real];
    let mut packet = TracePacket::new();
    packet.set_clock_snapshot(snapshot);
    packet.write_to_bytes().unwrap()
}

/// Frame packets as `Trace.packet` fields.
pub fn frame(packets: &[Vec<u8>]) -> Vec<u8> {
    packets
        .iter()
        .flat_map(|packet| encode(|os| os.write_bytes(1, packet)))
        .collect()
}

/// The full scenario as a Perfetto trace.
///
/// Packets are not in timestamp order: each dispatch follows its event, and
/// the third motion event is written before the second.
pub fn perfetto_trace() -> Arc<[u8]> {
    perfetto_trace_with(|_| {})
}

/// Like [`perfetto_trace`], letting the caller edit the packet list first.
pub fn perfetto_trace_with(edit: impl FnOnce(&mut Vec<Vec<u8>>)) -> Arc<[u8]> {
    let motions = motion_scenario();
    let mut packets = vec![clock_snapshot_packet(
        motions[0].elapsed_ns - 1_000_000,
        REAL_TO_ELAPSED_OFFSET_NS,
    )];

    for index in [0, 2, 1, 3] {
        let event = &motions[index];
        packets.push(input_event_packet(event.elapsed_ns, 1, &motion_payload(event)));
        for dispatch in &event.dispatches {
            // redacted and full dispatch variants alternate
            let field = if dispatch.window_id % 2 == 0 { 5 } else { 6 };
            packets.push(input_event_packet(
                event.elapsed_ns + 500_000,
                field,
                &dispatch_payload(event.event_id, dispatch),
            ));
        }
    }

    for event in key_scenario() {
        packets.push(input_event_packet(event.elapsed_ns, 3, &key_payload(&event)));
        for dispatch in &event.dispatches {
            packets.push(input_event_packet(
                event.elapsed_ns + 500_000,
                5,
                &dispatch_payload(event.event_id, dispatch),
            ));
        }
    }

    edit(&mut packets);
    frame(&packets).into()
}

pub fn gzip(bytes: &[u8]) -> Arc<[u8]> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap().into()
}
