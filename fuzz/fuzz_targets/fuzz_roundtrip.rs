#![no_main]

use libfuzzer_sys::fuzz_target;
use lz4kd::{decode, Encoder, Error, Page};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 4096 {
        return;
    }

    let mut encoder = Encoder::new();
    match encoder.encode(data) {
        Ok(compressed) => {
            assert!(compressed.len() <= data.len(), "Encoded block grew");
            let decompressed = decode(&compressed, data.len()).expect("Block decode failed");
            assert_eq!(data, &decompressed[..], "Block roundtrip failed");
        }
        Err(Error::Incompressible) => {}
        Err(e) => panic!("Unexpected encode error: {}", e),
    }

    let page = Page::compress(&mut encoder, data).expect("Page compress failed");
    assert_eq!(data, &page.decompress().expect("Page decompress failed")[..], "Page roundtrip failed");
});
