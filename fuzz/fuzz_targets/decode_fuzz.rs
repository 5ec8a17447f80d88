#![no_main]
use libfuzzer_sys::fuzz_target;
use unmarker::marker::{self, MarkerDecoder};
use unmarker::stream::StreamDecoder;

fuzz_target!(|data: &[u8]| {
    // The grammar is total: decoding must never panic. Capped so hostile
    // markers cannot exhaust memory.
    let mut decoder = StreamDecoder::with_limit(data, Some(1 << 20));
    let mut out = Vec::new();
    let Ok(written) = decoder.decode_to(&mut out) else {
        return;
    };
    assert_eq!(written, out.len() as u64);
    assert_eq!(marker::decoded_len(data), written);

    // Splitting the input anywhere gives the same output.
    if data.len() >= 2 {
        let (head, tail) = data.split_at(data.len() / 2);
        let mut split = MarkerDecoder::new();
        split.push(head);
        split.push(tail);
        assert_eq!(split.finish(), out);
    }
});
