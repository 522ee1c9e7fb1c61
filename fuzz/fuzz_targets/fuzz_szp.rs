#![no_main]

use libfuzzer_sys::fuzz_target;
use szs::{szp, Algorithm};

fuzz_target!(|data: &[u8]| {
    let encoded = szs::encode(data, Algorithm::LibYaz0).expect("encode");
    let yay0 = szp::deinterlace(&encoded).expect("deinterlace");
    assert!(yay0.len() as u32 <= szp::deinterlaced_upper_bound(encoded.len() as u32));
    assert_eq!(szp::decode(&yay0).expect("szp decode"), data);

    // Arbitrary bytes behind a Yay0 magic must not panic
    let mut raw = b"Yay0".to_vec();
    raw.extend_from_slice(data);
    let _ = szp::decode(&raw);
});
