//! Tests for record header validation and fragment reassembly.

use std::{
    borrow::Cow,
    sync::{Arc, atomic::Ordering},
};

use rstest::rstest;
use sni_peek_testing::{RECORD_VERSION_TLS10, ScriptedReader, frame_records};

use super::{RecordHeader, RecordReader};
use crate::{
    buffer::{BufferCursor, PooledBuffer},
    error::{InspectError, RecordViolation},
    pool::BufferPool,
    source::{ByteSource, SliceSource},
};

fn framed(payload: &[u8], split_points: &[usize]) -> Vec<u8> {
    frame_records(payload, RECORD_VERSION_TLS10, split_points)
}

#[rstest]
#[case::application_data([0x17, 0x03, 0x01, 0x00, 0x10], false, RecordViolation::ContentType(0x17))]
#[case::ssl3_strict([0x16, 0x03, 0x00, 0x00, 0x10], true, RecordViolation::Version(0x0300))]
#[case::ssl2_strict([0x16, 0x00, 0x02, 0x00, 0x10], true, RecordViolation::Version(0x0002))]
#[case::empty([0x16, 0x03, 0x01, 0x00, 0x00], false, RecordViolation::EmptyFragment)]
#[case::oversized_strict([0x16, 0x03, 0x01, 0x40, 0x01], true, RecordViolation::Oversized(16_385))]
fn header_violations(
    #[case] bytes: [u8; 5],
    #[case] strict: bool,
    #[case] expected: RecordViolation,
) {
    assert_eq!(RecordHeader::from_bytes(bytes).validate(strict), Err(expected));
}

#[rstest]
#[case::ssl3([0x16, 0x03, 0x00, 0x00, 0x10])]
#[case::oversized([0x16, 0x03, 0x03, 0x40, 0x01])]
fn lenient_mode_accepts_parseable_headers(#[case] bytes: [u8; 5]) {
    assert!(RecordHeader::from_bytes(bytes).validate(false).is_ok());
}

#[test]
fn reads_within_one_fragment_borrow() {
    let bytes = framed(&[1, 2, 3, 4, 5], &[]);
    let mut reader = RecordReader::new(SliceSource::new(&bytes), true);
    assert_eq!(reader.read_byte().expect("byte"), 1);
    assert!(matches!(
        reader.read_n(3).expect("three bytes"),
        Cow::Borrowed(&[2, 3, 4])
    ));
    assert_eq!(reader.records_read(), 1);
}

#[test]
fn read_spanning_fragments_is_stitched() {
    let payload: Vec<u8> = (0..20).collect();
    let bytes = framed(&payload, &[3, 4, 11]);
    let mut reader = RecordReader::new(SliceSource::new(&bytes), false);
    reader.skip(2).expect("skip");
    let stitched = reader.read_n(12).expect("stitched");
    assert!(matches!(stitched, Cow::Owned(_)));
    assert_eq!(&*stitched, &payload[2..14]);
    drop(stitched);
    assert_eq!(reader.records_read(), 4);
    assert_eq!(reader.read_u16().expect("u16"), 0x0e0f);
}

#[test]
fn skip_crosses_record_boundaries() {
    let payload: Vec<u8> = (0..10).collect();
    let bytes = framed(&payload, &[1, 2, 5]);
    let mut reader = RecordReader::new(SliceSource::new(&bytes), false);
    reader.skip(9).expect("skip");
    assert_eq!(reader.read_byte().expect("last byte"), 9);
}

#[test]
fn next_header_is_read_only_when_needed() {
    let mut bytes = framed(&[7, 8], &[]);
    bytes.extend_from_slice(&[0x17, 0x03, 0x01, 0x00, 0x01, 0x00]);
    let mut reader = RecordReader::new(SliceSource::new(&bytes), false);
    assert_eq!(reader.read_u16().expect("whole fragment"), 0x0708);
    assert_eq!(reader.records_read(), 1);
    let err = reader.read_byte().expect_err("second record is not handshake");
    assert!(matches!(
        err,
        InspectError::InvalidRecord(RecordViolation::ContentType(0x17))
    ));
}

#[test]
fn limit_is_charged_across_records() {
    let payload: Vec<u8> = (0..8).collect();
    let bytes = framed(&payload, &[2]);
    let mut reader = RecordReader::new(SliceSource::new(&bytes), true);
    reader.set_limit(3).expect("first limit");
    assert_eq!(&*reader.read_n(3).expect("within budget"), &[0, 1, 2]);
    assert_eq!(reader.limit(), Some(0));
    let err = reader.read_byte().expect_err("over budget");
    assert!(matches!(
        err,
        InspectError::OutOfBoundary {
            requested: 1,
            remaining: 0
        }
    ));
    assert!(matches!(reader.read_byte(), Err(InspectError::Broken)));
}

#[test]
fn limit_is_checked_before_records() {
    let mut reader = RecordReader::new(SliceSource::new(&[]), false);
    reader.set_limit(1).expect("limit");
    let err = reader.skip(2).expect_err("over budget");
    assert!(matches!(err, InspectError::OutOfBoundary { requested: 2, .. }));
}

#[test]
fn limit_only_shrinks() {
    let bytes = framed(&[1, 2, 3], &[]);
    let mut reader = RecordReader::new(SliceSource::new(&bytes), true);
    reader.set_limit(2).expect("first limit");
    reader.set_limit(1).expect("shrinking");
    let err = reader.set_limit(5).expect_err("raising");
    assert!(matches!(
        err,
        InspectError::OutOfBoundary {
            requested: 5,
            remaining: 1
        }
    ));
    assert!(reader.is_broken());
}

#[test]
fn zero_length_requests_need_no_record() {
    let mut reader = RecordReader::new(SliceSource::new(&[]), false);
    assert!(reader.read_n(0).expect("empty").is_empty());
    reader.skip(0).expect("empty skip");
    assert_eq!(reader.records_read(), 0);
}

#[test]
fn failure_is_sticky_and_stops_reading() {
    let pool = Arc::new(BufferPool::new());
    let mut bytes = framed(&[1, 2, 3, 4], &[]);
    bytes.truncate(7);
    let stream = ScriptedReader::new(bytes).with_chunks(vec![1; 7]);
    let counter = stream.read_counter();
    let mut buffer = PooledBuffer::new(stream, &pool, 4096);
    let mut reader = RecordReader::new(BufferCursor::new(&mut buffer), false);

    assert_eq!(reader.read_u16().expect("two bytes"), 0x0102);
    assert!(reader.read_n(2).expect_err("truncated").is_eof());

    let reads = counter.load(Ordering::SeqCst);
    assert!(matches!(reader.read_byte(), Err(InspectError::Broken)));
    assert!(matches!(reader.skip(1), Err(InspectError::Broken)));
    assert!(matches!(reader.read_n(0), Err(InspectError::Broken)));
    assert!(matches!(reader.set_limit(0), Err(InspectError::Broken)));
    assert_eq!(counter.load(Ordering::SeqCst), reads);

    drop(reader);
    assert!(buffer.is_broken());
    assert_eq!(pool.stats().outstanding(), 0);
}

#[rstest]
#[case::whole_stream(usize::MAX)]
#[case::beyond_stream(usize::MAX / 2)]
fn oversized_read_is_an_error(#[case] n: usize) {
    let bytes = [0x16, 0x03, 0x01, 0x00, 0x02, 0xaa, 0xbb];
    let mut reader = RecordReader::new(SliceSource::new(&bytes), false);
    assert!(reader.read_n(n).expect_err("short stream").is_eof());
    assert!(reader.is_broken());
}

#[test]
fn oversized_read_from_buffer_is_an_error() {
    let pool = Arc::new(BufferPool::new());
    let stream = ScriptedReader::new(framed(&[1, 2, 3, 4], &[2]));
    let mut buffer = PooledBuffer::new(stream, &pool, 4096);
    let mut reader = RecordReader::new(BufferCursor::new(&mut buffer), false);
    assert!(reader.read_n(usize::MAX).is_err());
    assert!(reader.is_broken());
}
