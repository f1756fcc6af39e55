#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        let registry = multiref::Registry::new();
        let opts = multiref::DecodeOptions::default();
        let _ = multiref::decode_str(xml, &registry, &opts, &mut multiref::IgnoreEvents);
        let _ = multiref::decode_str(xml, &registry, &opts.clone().with_root_attribute(), &mut multiref::IgnoreEvents);
    }
});
