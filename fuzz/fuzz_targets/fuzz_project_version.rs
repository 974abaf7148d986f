#![no_main]

use libfuzzer_sys::fuzz_target;
use sonarsnap::output::result_file_name;
use sonarsnap::project_version::parse_project_version;

fuzz_target!(|data: &[u8]| {
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(version) = parse_project_version(xml) else {
        return;
    };
    assert!(!version.is_empty());
    assert_eq!(version, version.trim());

    // Whatever the descriptor says, the results file must stay inside the output directory
    if let Ok(name) = result_file_name(&version, "10.4.0.87286") {
        assert!(!name.contains('/') && !name.contains('\\') && !name.contains(".."));
    }
});
