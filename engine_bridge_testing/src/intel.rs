use engine_bridge::{
    StreamId,
    StreamRegistry,
    intel::{FINAL_STREAM_INTEL_LEN, STREAM_INTEL_LEN},
};

/// Stream intel array for `stream_id` on connection 1, first attempt.
pub fn stream_intel(stream_id: i64) -> [i64; STREAM_INTEL_LEN] { [stream_id, 1, 1, 0] }

/// Final intel array for a stream that ran from 1000 ms to 1250 ms on a
/// fresh socket, with every intermediate phase absent.
pub fn final_intel() -> [i64; FINAL_STREAM_INTEL_LEN] {
    let mut values = [-1; FINAL_STREAM_INTEL_LEN];
    values[0] = 1_000;
    values[10] = 1_250;
    values[11..].fill(0);
    values
}

/// Pass `pairs` to the registry as one block, flagging the first fragment as
/// the block start. Returns the declared count to complete the block with.
pub fn feed_block(registry: &StreamRegistry, id: StreamId, pairs: &[(&str, &str)]) -> u64 {
    for (i, (name, value)) in pairs.iter().enumerate() {
        registry
            .pass_header(id, name.as_bytes(), value.as_bytes(), i == 0)
            .expect("stream open while feeding headers");
    }
    pairs.len() as u64
}
