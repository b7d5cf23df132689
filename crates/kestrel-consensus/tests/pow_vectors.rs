use kestrel_consensus::{check_proof_of_work, decode_compact, encode_compact};
use kestrel_core::{ConsensusParams, Hash32, Network};
use num_bigint::BigUint;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CompactVector {
    name: String,
    bits: String,
    target: String,
    negative: bool,
    overflow: bool,
    reencoded: String,
}

#[derive(Debug, Deserialize)]
struct PowVector {
    name: String,
    network: Network,
    hash: Hash32,
    bits: String,
    valid: bool,
}

#[derive(Debug, Deserialize)]
struct Vectors {
    compact: Vec<CompactVector>,
    pow: Vec<PowVector>,
}

fn vectors_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("vectors")
        .join("compact_targets.json")
}

fn load() -> Vectors {
    let data = fs::read_to_string(vectors_path()).expect("vector file");
    serde_json::from_str(&data).expect("parse json")
}

fn parse_bits(s: &str) -> u32 {
    u32::from_str_radix(s, 16).expect("bits hex")
}

#[test]
fn compact_target_vectors() {
    for v in load().compact {
        let bits = parse_bits(&v.bits);
        let decoded = decode_compact(bits);

        let expected = BigUint::from_bytes_be(&hex::decode(&v.target).expect("target hex"));
        assert_eq!(decoded.target, expected, "target mismatch for {}", v.name);
        assert_eq!(decoded.negative, v.negative, "negative flag for {}", v.name);
        assert_eq!(decoded.overflow, v.overflow, "overflow flag for {}", v.name);
        assert_eq!(
            encode_compact(&decoded.target),
            parse_bits(&v.reencoded),
            "re-encoding mismatch for {}",
            v.name
        );
    }
}

#[test]
fn proof_of_work_vectors() {
    for v in load().pow {
        let params = ConsensusParams::for_network(v.network);
        assert_eq!(
            check_proof_of_work(&v.hash, parse_bits(&v.bits), &params),
            v.valid,
            "pow verdict mismatch for {}",
            v.name
        );
    }
}
