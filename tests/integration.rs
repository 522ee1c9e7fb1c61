//! End-to-end integration tests for szs.
//!
//! Exercises every algorithm against every decoder path with synthetic data.

use std::process::Command;

use szs::{
    decode, decode_into, decoded_size, encode, encode_batch, encode_into, encode_with,
    is_compressed, szp, upper_bound, Algorithm, CompressionLevel, EncodeConfig, ErrorKind, Header,
    Magic,
};

// ============================================================================
// Test Data Generators
// ============================================================================

/// Generate random data using a simple PRNG
fn generate_random_data(size: usize, seed: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state = seed;
    for _ in 0..size {
        // Simple xorshift PRNG
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.push((state & 0xFF) as u8);
    }
    data
}

/// Generate highly repetitive data (good compression)
fn generate_repetitive_data(size: usize) -> Vec<u8> {
    let pattern = b"AAAAAAAAAAAAAAAA";
    pattern.iter().cycle().take(size).copied().collect()
}

/// Generate data shaped like a game archive: headers, zero padding, repeated
/// strings and small integer tables
fn generate_archive_data(size: usize, seed: u64) -> Vec<u8> {
    let names = [
        b"course.kcl".as_slice(),
        b"course_model.brres".as_slice(),
        b"map_model.brres".as_slice(),
    ];
    let mut data = Vec::with_capacity(size);
    let mut state = seed | 1;
    while data.len() < size {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        match state % 4 {
            0 => data.extend_from_slice(names[(state >> 8) as usize % names.len()]),
            1 => data.resize(data.len() + (state >> 16) as usize % 40, 0),
            2 => data.extend_from_slice(&((state >> 20) as u32 % 1000).to_be_bytes()),
            _ => data.extend_from_slice(&state.to_le_bytes()[..3]),
        }
    }
    data.truncate(size);
    data
}

fn test_inputs() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        vec![0x42],
        b"ab".to_vec(),
        b"abc".to_vec(),
        generate_repetitive_data(1000),
        generate_random_data(3000, 12345),
        generate_archive_data(20_000, 99),
        generate_repetitive_data(300_000),
    ]
}

/// Walk the flag bits of a stream; true if every token is a literal
fn all_literal(encoded: &[u8], size: usize) -> bool {
    let mut pos = 16;
    let mut produced = 0;
    while produced < size {
        let flags = encoded[pos];
        pos += 1;
        for bit in 0..8 {
            if produced == size {
                break;
            }
            if flags & (0x80 >> bit) == 0 {
                return false;
            }
            pos += 1;
            produced += 1;
        }
    }
    true
}

// ============================================================================
// Round-trip Tests
// ============================================================================

#[test]
fn test_roundtrip_all_algorithms() {
    for data in test_inputs() {
        for algo in Algorithm::ALL {
            let encoded = encode(&data, algo).unwrap();
            assert_eq!(decode(&encoded).unwrap(), data, "{algo} len {}", data.len());
        }
    }
}

#[test]
fn test_roundtrip_window_edges() {
    // Repeats at exactly 4096 and 4097 bytes back
    let block = generate_random_data(4096, 7);
    let mut data = block.clone();
    data.extend_from_slice(&block);
    data.push(0);
    data.extend_from_slice(&block[..500]);
    for algo in Algorithm::ALL {
        let encoded = encode(&data, algo).unwrap();
        assert_eq!(decode(&encoded).unwrap(), data, "{algo}");
    }
}

#[test]
fn test_roundtrip_lib_yaz0_every_level() {
    let data = generate_archive_data(20_000, 5);
    for level in 1..=9 {
        let config = EncodeConfig {
            algorithm: Algorithm::LibYaz0,
            level: CompressionLevel::from_level(level),
            ..Default::default()
        };
        let encoded = encode_with(&data, &config).unwrap();
        assert_eq!(decode(&encoded).unwrap(), data, "level {level}");
    }
}

// ============================================================================
// Header and Detection Tests
// ============================================================================

#[test]
fn test_detection_and_size() {
    for data in test_inputs() {
        for algo in Algorithm::ALL {
            let encoded = encode(&data, algo).unwrap();
            assert!(is_compressed(&encoded));
            assert_eq!(decoded_size(&encoded).unwrap(), data.len() as u32);
        }
    }
}

#[test]
fn test_yaz1_header() {
    let data = generate_archive_data(5000, 3);
    let config = EncodeConfig {
        magic: Magic::Yaz1,
        ..Default::default()
    };
    let encoded = encode_with(&data, &config).unwrap();
    assert_eq!(&encoded[..4], b"Yaz1");
    assert!(is_compressed(&encoded));
    assert_eq!(decoded_size(&encoded).unwrap(), data.len() as u32);
    assert_eq!(decode(&encoded).unwrap(), data);
}

#[test]
fn test_not_compressed() {
    assert!(!is_compressed(b""));
    assert!(!is_compressed(b"Yaz"));
    assert!(!is_compressed(b"YAZ0\0\0\0\0\0\0\0\0\0\0\0\0"));
    assert!(!is_compressed(b"Yay0\0\0\0\0\0\0\0\0\0\0\0\0"));
    assert!(!is_compressed(&generate_random_data(64, 1)[1..]));
    assert_eq!(decoded_size(b"PK\x03\x04").unwrap_err().kind(), ErrorKind::MalformedHeader);
    assert_eq!(decode(b"Yaz0\0\0").unwrap_err().kind(), ErrorKind::MalformedHeader);
}

#[test]
fn test_reserved_bytes_ignored_by_decoder() {
    let mut encoded = encode(b"reserved reserved reserved", Algorithm::Reference).unwrap();
    encoded[8..16].copy_from_slice(&[0, 0, 0x20, 0, 0xDE, 0xAD, 0xBE, 0xEF]);
    let header = Header::parse(&encoded).unwrap();
    assert_eq!(header.alignment, 0x2000);
    assert_eq!(decode(&encoded).unwrap(), b"reserved reserved reserved");
}

// ============================================================================
// Size Bound Tests
// ============================================================================

#[test]
fn test_upper_bound_holds() {
    for data in test_inputs() {
        let bound = upper_bound(data.len() as u32) as usize;
        for algo in Algorithm::ALL {
            let encoded = encode(&data, algo).unwrap();
            assert!(encoded.len() <= bound, "{algo}: {} > {bound}", encoded.len());
        }
    }
}

#[test]
fn test_worst_case_is_literal_only() {
    for data in test_inputs() {
        let encoded = encode(&data, Algorithm::WorstCase).unwrap();
        assert!(all_literal(&encoded, data.len()));
        assert_eq!(encoded.len(), 16 + data.len() + (data.len() + 7) / 8);
    }
}

#[test]
fn test_reference_never_worse_than_worst_case() {
    for data in test_inputs() {
        let worst = encode(&data, Algorithm::WorstCase).unwrap();
        let reference = encode(&data, Algorithm::Reference).unwrap();
        assert!(reference.len() <= worst.len());
    }
}

#[test]
fn test_ct_lib_stream_aligned() {
    for data in test_inputs() {
        let encoded = encode(&data, Algorithm::CtLib).unwrap();
        assert_eq!((encoded.len() - 16) % 4, 0);
    }
}

#[test]
fn test_encode_into_caller_buffer() {
    let data = generate_archive_data(10_000, 11);
    let mut dst = vec![0u8; upper_bound(data.len() as u32) as usize];
    for algo in Algorithm::ALL {
        let n = encode_into(&mut dst, &data, algo).unwrap();
        assert_eq!(&dst[..n], &encode(&data, algo).unwrap()[..]);
    }

    let mut small = vec![0u8; dst.len() - 1];
    let err = encode_into(&mut small, &data, Algorithm::Mk8).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
}

// ============================================================================
// Concrete Stream Tests
// ============================================================================

#[test]
fn test_run_of_twenty_a() {
    let data = [b'A'; 20];
    let encoded = encode(&data, Algorithm::Reference).unwrap();
    assert_eq!(&encoded[..4], b"Yaz0");
    assert_eq!(&encoded[4..8], &20u32.to_be_bytes());
    assert_eq!(&encoded[8..16], &[0u8; 8]);
    assert_eq!(&encoded[16..], &[0x80, b'A', 0x00, 0x00, 0x01]);
    assert_eq!(decode(&encoded).unwrap(), data);
}

#[test]
fn test_empty_input() {
    for algo in Algorithm::ALL {
        let encoded = encode(&[], algo).unwrap();
        assert!(is_compressed(&encoded));
        assert_eq!(decoded_size(&encoded).unwrap(), 0);
        assert!(decode(&encoded).unwrap().is_empty());
    }
}

// ============================================================================
// Golden Vectors
// ============================================================================

/// Token streams (everything after the header) that the historical encoders of
/// each compatibility variant write for short inputs. `kart.kcl` and
/// `course_model.brr` are all literals, so they show the flag byte the eager
/// encoders leave after a full group.
const GOLDEN_SMALL: &[(Algorithm, &[u8], &str)] = &[
    (Algorithm::Nintendo, b"", "00"),
    (Algorithm::LibYaz0, b"", ""),
    (Algorithm::Mk8, b"", "00"),
    (Algorithm::CtLib, b"", "00000000"),
    (Algorithm::Ctgp, b"", ""),
    (Algorithm::Nintendo, b"kart.kcl", "ff6b6172742e6b636c00"),
    (Algorithm::LibYaz0, b"kart.kcl", "ff6b6172742e6b636c"),
    (Algorithm::Mk8, b"kart.kcl", "ff6b6172742e6b636c00"),
    (Algorithm::CtLib, b"kart.kcl", "ff6b6172742e6b636c000000"),
    (Algorithm::Ctgp, b"kart.kcl", "ff6b6172742e6b636c"),
    (Algorithm::Nintendo, b"ABCDABCD", "f0414243442003"),
    (Algorithm::LibYaz0, b"ABCDABCD", "f0414243442003"),
    (Algorithm::Mk8, b"ABCDABCD", "f0414243442003"),
    (Algorithm::CtLib, b"ABCDABCD", "f041424344200300"),
    (Algorithm::Ctgp, b"ABCDABCD", "ff4142434441424344"),
    (
        Algorithm::Nintendo,
        b"course_model.brr",
        "ff636f757273655f6dff6f64656c2e62727200",
    ),
    (
        Algorithm::LibYaz0,
        b"course_model.brr",
        "ff636f757273655f6dff6f64656c2e627272",
    ),
    (
        Algorithm::Mk8,
        b"course_model.brr",
        "ff636f757273655f6dff6f64656c2e62727200",
    ),
    (
        Algorithm::CtLib,
        b"course_model.brr",
        "ff636f757273655f6dff6f64656c2e6272720000",
    ),
    (
        Algorithm::Ctgp,
        b"course_model.brr",
        "ff636f757273655f6dff6f64656c2e627272",
    ),
    (
        Algorithm::Nintendo,
        b"course.kclcourse",
        "ff636f757273652e6bc0636c4009",
    ),
    (
        Algorithm::LibYaz0,
        b"course.kclcourse",
        "ff636f757273652e6bc0636c4009",
    ),
    (
        Algorithm::Mk8,
        b"course.kclcourse",
        "ff636f757273652e6bc0636c4009",
    ),
    (
        Algorithm::CtLib,
        b"course.kclcourse",
        "ff636f757273652e6bc0636c40090000",
    ),
    (
        Algorithm::Ctgp,
        b"course.kclcourse",
        "ff636f757273652e6bff636c636f75727365",
    ),
];

/// Length and CRC-32 of the whole file the historical encoders write for
/// `generate_archive_data(6000, 10)`
const GOLDEN_ARCHIVE: &[(Algorithm, usize, u32)] = &[
    (Algorithm::Nintendo, 1348, 0x4eb6_e55f),
    (Algorithm::LibYaz0, 1347, 0xbd0c_7bc4),
    (Algorithm::Mk8, 1348, 0x8d0c_aef5),
    (Algorithm::CtLib, 1364, 0x14f2_7a96),
    (Algorithm::Ctgp, 1919, 0x957e_2281),
];

fn unhex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

#[test]
fn test_golden_small_inputs() {
    for &(algo, input, payload) in GOLDEN_SMALL {
        let encoded = encode(input, algo).unwrap();
        let header = Header::new(Magic::Yaz0, input.len() as u32).to_bytes();
        assert_eq!(&encoded[..16], &header[..], "{algo} {input:?}");
        assert_eq!(&encoded[16..], &unhex(payload)[..], "{algo} {input:?}");
    }
}

#[test]
fn test_golden_archive_sample() {
    let data = generate_archive_data(6000, 10);
    assert_ne!(data[0], 0);
    for &(algo, len, crc) in GOLDEN_ARCHIVE {
        let encoded = encode(&data, algo).unwrap();
        assert_eq!(encoded.len(), len, "{algo}");
        assert_eq!(crc32fast::hash(&encoded), crc, "{algo}");
    }
}

#[test]
fn test_ctgp_leading_zeros_fall_back_to_literals() {
    // The ring starts zeroed, so early zero runs find matches before the start
    let mut data = vec![0u8; 40];
    data.extend_from_slice(&generate_archive_data(3000, 10));
    let encoded = encode(&data, Algorithm::Ctgp).unwrap();
    assert_eq!(decode(&encoded).unwrap(), data);
    assert!(encoded.len() < data.len());
}

// ============================================================================
// Corrupt Input Tests
// ============================================================================

#[test]
fn test_distance_past_start_rejected() {
    let mut stream = Header::new(Magic::Yaz0, 10).to_bytes().to_vec();
    // literal 'x', then a back-reference 5 bytes back
    stream.extend_from_slice(&[0x80, b'x', 0x30, 0x04]);
    assert_eq!(decode(&stream).unwrap_err().kind(), ErrorKind::CorruptStream);
}

#[test]
fn test_truncated_streams_rejected() {
    let data = generate_archive_data(4000, 21);
    let encoded = encode(&data, Algorithm::Nintendo).unwrap();
    for cut in [17, 40, encoded.len() / 2, encoded.len() - 1] {
        let err = decode(&encoded[..cut]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream, "cut at {cut}");
    }
}

#[test]
fn test_random_garbage_never_panics() {
    for seed in 1..200u64 {
        let mut buf = Header::new(Magic::Yaz0, (seed * 37 % 5000) as u32).to_bytes().to_vec();
        buf.extend_from_slice(&generate_random_data((seed * 13 % 700) as usize, seed));
        let _ = decode(&buf);
        let _ = szp::deinterlace(&buf);
    }
}

#[test]
fn test_decode_into_requires_capacity() {
    let data = generate_repetitive_data(100);
    let encoded = encode(&data, Algorithm::LibYaz0).unwrap();
    let mut small = [0u8; 99];
    assert_eq!(decode_into(&mut small, &encoded).unwrap_err().kind(), ErrorKind::BufferTooSmall);
    let mut big = [0u8; 128];
    assert_eq!(decode_into(&mut big, &encoded).unwrap(), 100);
    assert_eq!(&big[..100], &data[..]);
}

// ============================================================================
// SZP and Batch Tests
// ============================================================================

#[test]
fn test_szp_roundtrip() {
    for data in test_inputs() {
        let yaz0 = encode(&data, Algorithm::Nintendo).unwrap();
        let yay0 = szp::deinterlace(&yaz0).unwrap();
        assert!(szp::is_compressed(&yay0));
        assert!(yay0.len() as u32 <= szp::deinterlaced_upper_bound(yaz0.len() as u32));
        assert_eq!(szp::decode(&yay0).unwrap(), data);
    }
}

#[test]
fn test_batch_matches_sequential() {
    let owned = test_inputs();
    let inputs: Vec<&[u8]> = owned.iter().map(Vec::as_slice).collect();
    let config = EncodeConfig::with_algorithm(Algorithm::CtLib);
    let results = encode_batch(&inputs, &config, 3);
    for (result, data) in results.into_iter().zip(&owned) {
        assert_eq!(result.unwrap(), encode(data, Algorithm::CtLib).unwrap());
    }
}

// ============================================================================
// Binary CLI Tests
// ============================================================================

fn szs_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_szs"))
}

#[test]
fn test_cli_compress_decompress() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("course.bin");
    let packed = dir.path().join("course.szs");
    let unpacked = dir.path().join("course.out");
    let data = generate_archive_data(30_000, 8);
    std::fs::write(&raw, &data).unwrap();

    let status = szs_bin()
        .args(["compress", "-a", "mkw", "--verify", "-i"])
        .arg(&raw)
        .arg("-o")
        .arg(&packed)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(is_compressed(&std::fs::read(&packed).unwrap()));

    let status = szs_bin()
        .args(["decompress", "-i"])
        .arg(&packed)
        .arg("-o")
        .arg(&unpacked)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(std::fs::read(&unpacked).unwrap(), data);
}

#[test]
fn test_cli_info_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let packed = dir.path().join("a.szs");
    let plain = dir.path().join("a.txt");
    std::fs::write(&packed, encode(b"info info info info", Algorithm::Reference).unwrap()).unwrap();
    std::fs::write(&plain, b"plain text").unwrap();

    let out = szs_bin().args(["info", "-i"]).arg(&packed).output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Decoded size: 19 bytes"));

    let out = szs_bin().args(["info", "-i"]).arg(&plain).output().unwrap();
    assert_eq!(out.status.code(), Some(1));

    let out = szs_bin().args(["info", "-i"]).arg(dir.path().join("missing")).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_cli_rejects_unknown_algorithm() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("x");
    std::fs::write(&raw, b"x").unwrap();
    let out = szs_bin()
        .args(["compress", "-a", "zstd", "-i"])
        .arg(&raw)
        .arg("-o")
        .arg(dir.path().join("y"))
        .output()
        .unwrap();
    assert!(!out.status.success());
}

#[test]
fn test_cli_compare() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("cmp.bin");
    std::fs::write(&raw, generate_archive_data(8000, 4)).unwrap();
    let out = szs_bin().args(["compare", "-t", "2", "-i"]).arg(&raw).output().unwrap();
    assert!(out.status.success());
    let table = String::from_utf8_lossy(&out.stdout);
    for algo in Algorithm::ALL {
        assert!(table.contains(algo.name()), "missing {algo}");
    }
    assert!(!table.contains("MISMATCH"));
}

#[test]
fn test_cli_deinterlace() {
    let dir = tempfile::tempdir().unwrap();
    let packed = dir.path().join("d.szs");
    let szp_path = dir.path().join("d.szp");
    let data = generate_repetitive_data(5000);
    std::fs::write(&packed, encode(&data, Algorithm::LibYaz0).unwrap()).unwrap();
    let status = szs_bin()
        .args(["deinterlace", "-i"])
        .arg(&packed)
        .arg("-o")
        .arg(&szp_path)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(szp::decode(&std::fs::read(&szp_path).unwrap()).unwrap(), data);
}
