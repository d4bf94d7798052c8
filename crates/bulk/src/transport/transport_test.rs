//! Tests for payload framing

use crate::transport::{Compression, frame_payload};
use flate2::read::GzDecoder;
use lz4_flex::frame::FrameDecoder;
use std::io::Read;

const QUERY: &str = "INSERT INTO t (`a`) FORMAT RowBinary";

fn expected(rows: &[u8]) -> Vec<u8> {
    let mut body = format!("{QUERY}\n").into_bytes();
    body.extend_from_slice(rows);
    body
}

#[test]
fn test_uncompressed_frame() {
    let body = frame_payload(QUERY, &[1, 2, 3], Compression::None).unwrap();
    assert_eq!(body.to_vec(), expected(&[1, 2, 3]));
}

#[test]
fn test_gzip_single_stream() {
    let rows = vec![7u8; 10_000];
    let body = frame_payload(QUERY, &rows, Compression::Gzip).unwrap();

    assert_eq!(&body[..2], &[0x1f, 0x8b]);
    assert!(body.len() < rows.len());

    let mut decoded = Vec::new();
    GzDecoder::new(&body[..]).read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, expected(&rows));
}

#[test]
fn test_lz4_frame() {
    let rows = b"abcabcabcabc".repeat(100);
    let body = frame_payload(QUERY, &rows, Compression::Lz4).unwrap();

    let mut decoded = Vec::new();
    FrameDecoder::new(&body[..]).read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, expected(&rows));
}

#[test]
fn test_empty_rows_still_carry_query() {
    let body = frame_payload(QUERY, &[], Compression::None).unwrap();
    assert_eq!(body.to_vec(), expected(&[]));
}

#[test]
fn test_content_encoding() {
    assert_eq!(Compression::None.content_encoding(), None);
    assert_eq!(Compression::Gzip.content_encoding(), Some("gzip"));
    assert_eq!(Compression::Lz4.to_string(), "lz4");
    assert_eq!(Compression::None.to_string(), "none");
}
