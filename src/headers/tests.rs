//! Tests for header block accumulation.

use proptest::prelude::*;
use rstest::{fixture, rstest};

use super::*;

#[fixture]
fn accumulator() -> HeaderAccumulator { HeaderAccumulator::new() }

#[rstest]
fn groups_repeated_names(mut accumulator: HeaderAccumulator) {
    accumulator.add_fragment(b"x", b"1", true);
    accumulator.add_fragment(b"x", b"2", false);
    accumulator.add_fragment(b"y", b"3", false);

    assert!(accumulator.is_complete(3));
    let block = accumulator.drain();
    assert_eq!(block.names().collect::<Vec<_>>(), ["x", "y"]);
    assert_eq!(block.get("x"), Some(&["1".to_owned(), "2".to_owned()][..]));
    assert_eq!(block.get("y"), Some(&["3".to_owned()][..]));
}

#[rstest]
fn block_start_discards_unfinished_block(mut accumulator: HeaderAccumulator) {
    accumulator.add_fragment(b"stale", b"1", true);
    accumulator.add_fragment(b"stale", b"2", false);

    accumulator.add_fragment(b":status", b"200", true);

    assert_eq!(accumulator.count(), 1);
    let block = accumulator.take_block(1).expect("fresh block is complete");
    assert_eq!(block.get("stale"), None);
    assert_eq!(block.first(":status"), Some("200"));
}

#[rstest]
fn large_block_keeps_values_grouped(mut accumulator: HeaderAccumulator) {
    const FRAGMENTS: usize = 20_000;
    for i in 0..FRAGMENTS {
        let name = format!("x-trailer-{}", i % 500);
        accumulator.add_fragment(name.as_bytes(), i.to_string().as_bytes(), i == 0);
    }

    let block = accumulator
        .take_block(FRAGMENTS as u64)
        .expect("block complete");
    assert_eq!(block.len(), 500);
    assert_eq!(block.value_count(), FRAGMENTS);
    let values = block.get("x-trailer-7").expect("name present");
    assert_eq!(values.len(), FRAGMENTS / 500);
    assert_eq!(values[..2], ["7".to_owned(), "507".to_owned()]);
    assert_eq!(block.names().nth(499), Some("x-trailer-499"));
}

#[rstest]
fn drain_resets_for_reuse(mut accumulator: HeaderAccumulator) {
    accumulator.add_fragment(b"a", b"1", true);
    let _ = accumulator.drain();
    assert_eq!(accumulator.count(), 0);

    accumulator.add_fragment(b"b", b"2", false);
    let block = accumulator.take_block(1).expect("second block complete");
    assert_eq!(block.names().collect::<Vec<_>>(), ["b"]);
}

#[rstest]
#[case::short(2)]
#[case::long(4)]
fn take_block_rejects_count_mismatch(mut accumulator: HeaderAccumulator, #[case] declared: u64) {
    accumulator.add_fragment(b"a", b"1", true);
    accumulator.add_fragment(b"b", b"2", false);
    accumulator.add_fragment(b"c", b"3", false);

    assert_eq!(
        accumulator.take_block(declared),
        Err(HeaderCountMismatch {
            declared,
            accumulated: 3,
        })
    );
    assert_eq!(accumulator.count(), 0, "mismatched block is discarded");
}

#[rstest]
fn empty_block_is_complete_at_zero(mut accumulator: HeaderAccumulator) {
    accumulator.begin_if_needed();
    assert!(accumulator.is_complete(0));
    assert!(accumulator.take_block(0).expect("empty block").is_empty());
}

#[rstest]
fn begin_if_needed_keeps_open_block(mut accumulator: HeaderAccumulator) {
    accumulator.add_fragment(b"a", b"1", true);
    accumulator.begin_if_needed();
    assert_eq!(accumulator.count(), 1);
}

#[rstest]
fn invalid_utf8_is_replaced(mut accumulator: HeaderAccumulator) {
    accumulator.add_fragment(b"name", &[b'o', 0xff, b'k'], true);
    let block = accumulator.drain();
    assert_eq!(block.first("name"), Some("o\u{fffd}k"));
}

proptest! {
    #[test]
    fn round_trip_preserves_counts_and_order(
        fragments in proptest::collection::vec(("[a-d]", "[0-9]{1,3}"), 1..32),
    ) {
        let mut accumulator = HeaderAccumulator::new();
        for (i, (name, value)) in fragments.iter().enumerate() {
            accumulator.add_fragment(name.as_bytes(), value.as_bytes(), i == 0);
        }
        let declared = fragments.len() as u64;
        prop_assert!(accumulator.is_complete(declared));
        let block = accumulator.take_block(declared).expect("complete block");

        prop_assert_eq!(block.value_count(), fragments.len());

        let mut first_seen: Vec<&str> = Vec::new();
        for (name, _) in &fragments {
            if !first_seen.contains(&name.as_str()) {
                first_seen.push(name);
            }
        }
        prop_assert_eq!(block.names().collect::<Vec<_>>(), first_seen.clone());

        for name in first_seen {
            let expected: Vec<&str> = fragments
                .iter()
                .filter(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
                .collect();
            let actual: Vec<&str> = block
                .get(name)
                .unwrap_or_default()
                .iter()
                .map(String::as_str)
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
