#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::value::RawValue;
use sonarcloud_api::{SonarError, build_document};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // First line holds hotspots, the rest one issue fragment per line
    let mut lines = input.lines();
    let hotspots: Vec<&str> = lines.next().map(|l| vec![l]).unwrap_or_default();
    let issues: Vec<&str> = lines.collect();

    let all_valid = issues
        .iter()
        .chain(hotspots.iter())
        .all(|f| serde_json::from_str::<&RawValue>(f).is_ok());

    match build_document(&issues, &hotspots) {
        Ok(document) => {
            assert!(all_valid, "invalid fragment slipped through: {input:?}");
            let value: serde_json::Value =
                serde_json::from_str(&document).expect("document is JSON");
            let object = value.as_object().expect("document is an object");
            assert_eq!(object.len(), 2);
            assert_eq!(value["issues"].as_array().map(Vec::len), Some(issues.len()));
            assert_eq!(value["hotspots"].as_array().map(Vec::len), Some(hotspots.len()));
        }
        Err(SonarError::InvalidFragment { .. }) => {
            assert!(!all_valid, "valid fragments rejected: {input:?}");
        }
        // Nesting two levels deeper can cross the parser's recursion limit
        Err(_) => {}
    }
});
