#![no_main]

use libfuzzer_sys::fuzz_target;
use szs::Algorithm;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let algo = Algorithm::ALL[selector as usize % Algorithm::ALL.len()];

    let encoded = szs::encode(payload, algo).expect("encode");
    assert!(encoded.len() as u32 <= szs::upper_bound(payload.len() as u32));
    assert_eq!(szs::decode(&encoded).expect("decode"), payload);
});
