#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Give arbitrary bytes a valid header so the token reader gets exercised
    let mut buf = b"Yaz0".to_vec();
    let size = data.first().map_or(0, |&b| b as u32 * 64);
    buf.extend_from_slice(&size.to_be_bytes());
    buf.extend_from_slice(&[0; 8]);
    buf.extend_from_slice(data);

    // Corrupt streams must fail cleanly, never panic
    if let Ok(out) = szs::decode(&buf) {
        assert_eq!(out.len(), size as usize);
    }
    let _ = szs::decode(data);
});
