// SPDX-License-Identifier: MIT

use proptest::prelude::*;

use super::*;

proptest! {
    #[test]
    fn never_exceeds_head_plus_marker_plus_tail(
        input in proptest::collection::vec(any::<u8>(), 0..4000),
        limit in 1usize..2000,
    ) {
        let out = truncate_log(&input, limit);
        if input.len() <= limit {
            prop_assert_eq!(out, input);
        } else {
            let head_len = (limit as f64 * 0.2).floor() as usize;
            let tail_len = (limit as f64 * 0.8).floor() as usize;
            prop_assert_eq!(out.len(), head_len + MARKER.len() + tail_len.min(input.len()));
            prop_assert!(out.ends_with(&input[input.len() - tail_len.min(input.len())..]));
        }
    }
}

#[test]
fn leaves_short_logs_untouched() {
    let input = b"hello world";
    assert_eq!(truncate_log(input, 100), input.to_vec());
}

#[test]
fn splits_twenty_eighty_with_marker() {
    let mut input = vec![b'a'; 20];
    input.extend(vec![b'x'; 200]);
    input.extend(vec![b'b'; 80]);

    let out = truncate_log(&input, 100);

    let mut expected = vec![b'a'; 20];
    expected.extend_from_slice(MARKER);
    expected.extend(vec![b'b'; 80]);
    assert_eq!(out, expected);
}

#[test]
fn thirty_as_then_hundred_bs_at_limit_100() {
    let mut input = vec![b'a'; 30];
    input.extend(vec![b'b'; 100]);

    let out = truncate_log(&input, 100);

    let mut expected = vec![b'a'; 20];
    expected.extend_from_slice(MARKER);
    expected.extend(vec![b'b'; 80]);
    assert_eq!(out, expected);
}

#[test]
fn exact_limit_is_untouched() {
    let input = vec![b'z'; 100];
    assert_eq!(truncate_log(&input, 100), input);
}
