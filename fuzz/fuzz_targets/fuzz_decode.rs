#![no_main]

use libfuzzer_sys::fuzz_target;
use lz4kd::decode_into;

fuzz_target!(|data: &[u8]| {
    // First byte picks the output size, the rest is the block.
    // Must never panic or write past the output.
    let Some((&size, block)) = data.split_first() else {
        return;
    };
    let cap = (size as usize + 1) * 16;
    let mut dst = vec![0u8; cap];
    if let Ok(n) = decode_into(block, &mut dst) {
        assert!(n <= cap.min(4096));
    }
});
