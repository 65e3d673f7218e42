#![no_main]

use libfuzzer_sys::fuzz_target;
use mzscan::decoder::{DecodeMode, ScanRecordDecoder};
use mzscan::dialect::{LEGACY, MODERN};

fuzz_target!(|data: &[u8]| {
    // Any input must decode or fail with an error, never panic
    for descriptor in [&LEGACY, &MODERN] {
        let decoder = ScanRecordDecoder::new(descriptor);
        let _ = decoder.decode(data, 0, DecodeMode::HeaderOnly);
        let _ = decoder.decode(data, 0, DecodeMode::Full);
        let _ = decoder.read_file_info(data);
        let _ = decoder.read_record_key(data);
    }
});
