use crate::Error;
use crate::codec::compressed::{
    CompressedDecodeWorkspace, Compression, decode_envelope_compressed,
    decode_envelope_compressed_with_workspace,
};
use crate::codec::exports::decode_body;
use crate::tables::TableKind;

#[cfg(any(feature = "compression-zstd", feature = "compression-gzip"))]
use std::io::Write;

fn sample_body() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "results": [ { "result": { "data": { "dsr": { "DS": [ {
            "ValueDicts": { "D0": ["Jane"], "D4": ["jane@example.org"] },
            "PH": [ { "DM0": [ { "C": [0, 0, 0, 0, 0] }, { "C": [0, 0, 0, 0, 0] } ] } ]
        } ] } } } } ]
    }))
    .unwrap()
}

#[cfg(feature = "compression-gzip")]
fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = flate2::GzBuilder::new()
        .mtime(0)
        .write(&mut out, flate2::Compression::new(6));
    enc.write_all(bytes).unwrap();
    let _ = enc.finish().unwrap();
    out
}

#[cfg(feature = "compression-zstd")]
fn zstd_compress(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = zstd::stream::write::Encoder::new(&mut out, 3).unwrap();
    enc.write_all(bytes).unwrap();
    let _ = enc.finish().unwrap();
    out
}

#[test]
fn plain_body_parses() {
    let body = sample_body();
    let env = decode_envelope_compressed(&body, Compression::None, body.len()).unwrap();
    assert_eq!(env.dm0().count(), 2);

    let mut ws = CompressedDecodeWorkspace::default();
    let again =
        decode_envelope_compressed_with_workspace(&body, Compression::None, body.len(), &mut ws)
            .unwrap();
    assert_eq!(again, env);
}

#[test]
fn plain_body_is_bounded_too() {
    let body = sample_body();
    let err = decode_envelope_compressed(&body, Compression::None, body.len() - 1).unwrap_err();
    assert_eq!(
        err,
        Error::Decompress("body exceeds max_uncompressed_len".to_string())
    );
}

#[test]
fn unparsable_body_is_an_error() {
    let err = decode_envelope_compressed(b"<html>", Compression::None, 1024).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn content_encoding_mapping() {
    assert_eq!(
        Compression::from_content_encoding("gzip"),
        Some(Compression::Gzip)
    );
    assert_eq!(
        Compression::from_content_encoding(" ZSTD "),
        Some(Compression::Zstd)
    );
    assert_eq!(
        Compression::from_content_encoding(""),
        Some(Compression::None)
    );
    assert_eq!(Compression::from_content_encoding("br"), None);
}

#[test]
fn decode_body_runs_the_preset_decoder() {
    let body = sample_body();
    let table = decode_body(
        &body,
        Compression::None,
        1 << 20,
        &TableKind::Contact.layout(),
    )
    .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.row(1).unwrap().get("Public Email"),
        Some(&crate::Value::from("jane@example.org"))
    );
}

#[cfg(not(feature = "compression-gzip"))]
#[test]
fn gzip_without_feature_is_rejected() {
    let err = decode_envelope_compressed(b"\x1f\x8b", Compression::Gzip, 1024).unwrap_err();
    assert_eq!(
        err,
        Error::Decompress("gzip compression feature not enabled".to_string())
    );
}

#[cfg(not(feature = "compression-zstd"))]
#[test]
fn zstd_without_feature_is_rejected() {
    let err = decode_envelope_compressed(b"", Compression::Zstd, 1024).unwrap_err();
    assert_eq!(
        err,
        Error::Decompress("zstd compression feature not enabled".to_string())
    );
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzip_body_matches_plain() {
    let body = sample_body();
    let compressed = gzip(&body);
    let mut ws = CompressedDecodeWorkspace::default();
    let env =
        decode_envelope_compressed_with_workspace(&compressed, Compression::Gzip, 1 << 20, &mut ws)
            .unwrap();
    let plain = decode_envelope_compressed(&body, Compression::None, 1 << 20).unwrap();
    assert_eq!(env, plain);
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzip_bound_is_enforced() {
    let body = sample_body();
    let compressed = gzip(&body);
    let err =
        decode_envelope_compressed(&compressed, Compression::Gzip, body.len() - 1).unwrap_err();
    assert_eq!(
        err,
        Error::Decompress("decompressed body exceeds max_uncompressed_len".to_string())
    );
    assert!(decode_envelope_compressed(&compressed, Compression::Gzip, body.len()).is_ok());
}

#[cfg(feature = "compression-zstd")]
#[test]
fn zstd_body_matches_plain_and_workspace_is_reusable() {
    let body = sample_body();
    let compressed = zstd_compress(&body);
    let mut ws = CompressedDecodeWorkspace::default();
    for _ in 0..3 {
        let env = decode_envelope_compressed_with_workspace(
            &compressed,
            Compression::Zstd,
            body.len(),
            &mut ws,
        )
        .unwrap();
        assert_eq!(env.dm0().count(), 2);
    }
    let err =
        decode_envelope_compressed(&compressed, Compression::Zstd, body.len() - 1).unwrap_err();
    assert_eq!(
        err,
        Error::Decompress("decompressed body exceeds max_uncompressed_len".to_string())
    );
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzip_zero_bound_and_corrupt_body() {
    let body = sample_body();
    let compressed = gzip(&body);
    let err = decode_envelope_compressed(&compressed, Compression::Gzip, 0).unwrap_err();
    assert_eq!(
        err,
        Error::Decompress("decompressed body exceeds max_uncompressed_len".to_string())
    );

    let err = decode_envelope_compressed(b"not gzip at all", Compression::Gzip, 1 << 20)
        .unwrap_err();
    assert!(matches!(err, Error::Decompress(_)));
}

#[cfg(feature = "compression-zstd")]
#[test]
fn zstd_corrupt_body_is_a_decompress_error() {
    let err = decode_envelope_compressed(b"not zstd at all", Compression::Zstd, 1 << 20)
        .unwrap_err();
    assert!(matches!(err, Error::Decompress(_)));
}
