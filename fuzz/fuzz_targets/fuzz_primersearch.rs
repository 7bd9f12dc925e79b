#![no_main]

use libfuzzer_sys::fuzz_target;

use pdp_core::primersearch::parse_report;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(results) = parse_report(text) {
        for result in &results {
            for amplimer in &result.amplimers {
                assert!(!amplimer.sequence_id.is_empty());
                assert!(amplimer.length > 0);
                assert_eq!(amplimer.span().len(), amplimer.length);
            }
        }
    }
});
