#![no_main]

use libfuzzer_sys::fuzz_target;

use pdp_core::distance::{compute_distance, Alignment};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    // First byte picks the column count; the rest is cut into sequences.
    let width = usize::from(data[0] % 16) + 1;
    let sequences: Vec<(String, Vec<u8>)> = data[1..]
        .chunks_exact(width)
        .take(32)
        .enumerate()
        .map(|(i, chunk)| {
            let seq = chunk.iter().map(|b| b"ACGT-."[usize::from(b % 6)]).collect();
            (format!("s{i}"), seq)
        })
        .collect();
    let Ok(alignment) = Alignment::new(sequences) else {
        return;
    };

    let row = compute_distance("fuzz", &alignment);
    assert!(row.min >= 0.0 && row.max <= 1.0);
    assert!(row.min <= row.mean + 1e-12 && row.mean <= row.max + 1e-12);
    assert!(row.sd >= 0.0);
    assert_eq!(row.unique_count + row.nonunique_count, alignment.len());
});
