#![no_main]

use libfuzzer_sys::fuzz_target;
use sonarcloud_api::paging::total_pages;
use sonarcloud_api::{PageEnvelope, build_document};

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    // Arbitrary service responses must decode or fail, never panic
    let Ok(mut envelope) = serde_json::from_str::<PageEnvelope>(body) else {
        return;
    };

    let size = envelope.effective_page_size();
    assert_ne!(size, Some(0), "zero page size must be treated as absent");

    if let (Some(total), Some(size)) = (envelope.total_results(), size) {
        let pages = total_pages(total, size);
        assert!(pages >= 1);
        assert!(pages.saturating_mul(u64::from(size)) >= total);
    }

    // Fragments that survived decoding are valid JSON, so splicing them must succeed
    let issues = envelope.take_issues();
    let hotspots = envelope.take_hotspots();
    let document = build_document(&issues, &hotspots).expect("decoded fragments must splice");

    let value: serde_json::Value = serde_json::from_str(&document).expect("document is JSON");
    assert_eq!(value["issues"].as_array().map(Vec::len), Some(issues.len()));
    assert_eq!(value["hotspots"].as_array().map(Vec::len), Some(hotspots.len()));
});
