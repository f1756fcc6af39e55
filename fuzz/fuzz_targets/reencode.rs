#![no_main]
use libfuzzer_sys::fuzz_target;

// Alles, was sich decodieren laesst, muss sich auch wieder schreiben lassen.
fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        let registry = multiref::Registry::new();
        if let Ok((decoded, _)) = multiref::decode_str_collecting(xml, &registry, &multiref::DecodeOptions::default()) {
            for style in [multiref::EncodingStyle::Soap11, multiref::EncodingStyle::Soap12] {
                let opts = multiref::EncodeOptions::default().with_style(style);
                let out = multiref::encode_to_string(&decoded.graph, &decoded.root, &registry, &opts)
                    .expect("decoded graph must encode");
                multiref::decode_str_collecting(&out, &registry, &multiref::DecodeOptions::default())
                    .expect("encoded graph must decode");
            }
        }
    }
});
