use proptest::prelude::*;
use unmarker::marker::{self, MarkerDecoder};
use unmarker::stream::StreamDecoder;

/// Bytes drawn mostly from the marker alphabet so derailments and partial
/// markers are common.
fn marker_soup() -> impl Strategy<Value = Vec<u8>> {
    let byte = prop_oneof![
        4 => prop::sample::select(b"()x0123456789".to_vec()),
        3 => prop::sample::select(b"ABCXYZ".to_vec()),
        1 => any::<u8>(),
    ];
    proptest::collection::vec(byte, 0..512)
}

/// Inputs built only from well-formed markers and marker-free text, with
/// the expected output computed independently.
fn well_formed() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    let literal = proptest::collection::vec(prop::sample::select(b"ABCDEFGH".to_vec()), 0..8);
    let unit = proptest::collection::vec(any::<u8>(), 0..12);
    let piece = (literal, unit, 0usize..6);
    proptest::collection::vec(piece, 0..16).prop_map(|pieces| {
        let mut input = Vec::new();
        let mut expected = Vec::new();
        for (literal, unit, repeat) in pieces {
            input.extend_from_slice(&literal);
            expected.extend_from_slice(&literal);
            input.extend_from_slice(format!("({}x{})", unit.len(), repeat).as_bytes());
            input.extend_from_slice(&unit);
            for _ in 0..repeat {
                expected.extend_from_slice(&unit);
            }
        }
        (input, expected)
    })
}

proptest! {
    #[test]
    fn prop_plain_text_is_identity(
        input in proptest::collection::vec(
            any::<u8>().prop_filter("no marker open", |b| *b != b'('),
            0..1024,
        )
    ) {
        prop_assert_eq!(marker::decode(&input), input);
    }

    #[test]
    fn prop_well_formed_markers_expand((input, expected) in well_formed()) {
        prop_assert_eq!(marker::decode(&input), expected);
    }

    #[test]
    fn prop_decoded_len_matches_decode(input in marker_soup()) {
        prop_assert_eq!(marker::decoded_len(&input), marker::decode(&input).len() as u64);
    }

    #[test]
    fn prop_chunking_does_not_matter(input in marker_soup(), split in any::<prop::sample::Index>()) {
        let at = split.index(input.len() + 1);
        let mut decoder = MarkerDecoder::new();
        decoder.push(&input[..at]);
        let mut out = decoder.take_output();
        decoder.push(&input[at..]);
        out.extend_from_slice(&decoder.finish());
        prop_assert_eq!(out, marker::decode(&input));
    }

    #[test]
    fn prop_stream_matches_one_shot(input in marker_soup()) {
        let mut decoder = StreamDecoder::new(&input[..]);
        let mut out = Vec::new();
        let written = decoder.decode_to(&mut out).unwrap();
        prop_assert_eq!(written, out.len() as u64);
        prop_assert_eq!(out, marker::decode(&input));
    }

    #[test]
    fn prop_unexpanded_input_is_preserved(input in marker_soup()) {
        // With no marker ever closed, every byte goes out as literal text.
        let mut decoder = MarkerDecoder::new();
        decoder.push(&input);
        decoder.finish_in_place();
        let stats = decoder.stats();
        prop_assert_eq!(stats.bytes_in, input.len() as u64);
        prop_assert_eq!(stats.bytes_out, decoder.sink().len() as u64);
        if stats.markers == 0 && stats.truncated == 0 {
            prop_assert_eq!(decoder.take_output(), input);
        }
    }
}

#[test]
#[ignore = "performance properties are workload and machine dependent"]
fn perf_property_decode_not_pathological() {
    use std::time::Instant;
    let mut input = Vec::new();
    for i in 0..200_000u32 {
        input.extend_from_slice(format!("AB({}x{})", i % 7 + 1, i % 11).as_bytes());
        input.extend_from_slice(b"QRSTUVW");
    }
    let t0 = Instant::now();
    let len = marker::decoded_len(&input);
    let dt = t0.elapsed();
    assert!(len > 0);
    assert!(dt.as_secs_f64() < 20.0, "decode took {:?}", dt);
}
