//! Tests for net/codec.rs: frame encoding over a byte stream.

use simplecloud_sync::net::{Frame, FrameKind, MAX_FRAME_SIZE, read_frame, write_frame};
use simplecloud_sync::protocol::{CacheUpdateMessage, HelloMessage};
use simplecloud_sync::{SyncAction, SyncMessage};
use simplecloud_types::Template;
use std::io::Cursor;

#[tokio::test]
async fn frame_layout_is_length_prefixed_json() {
    let frame = Frame::request(3, SyncMessage::Ping(9));
    let mut buf = Vec::new();
    write_frame(&mut buf, &frame).await.unwrap();

    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    assert_eq!(len, buf.len() - 4);
    let json: serde_json::Value = serde_json::from_slice(&buf[4..]).unwrap();
    assert_eq!(json["id"], 3);
    assert_eq!(json["kind"], "request");
    assert_eq!(json["message"]["Ping"], 9);
}

#[tokio::test]
async fn frames_read_back_in_order() {
    let update = CacheUpdateMessage::encode("template-cache", &Template::new("Lobby"), SyncAction::Delete).unwrap();
    let frames = vec![
        Frame::request(1, SyncMessage::Hello(HelloMessage::new("Wrapper-1"))),
        Frame::response(1, SyncMessage::Ack),
        Frame::request(2, SyncMessage::CacheUpdate(update)),
    ];

    let mut buf = Vec::new();
    for frame in &frames {
        write_frame(&mut buf, frame).await.unwrap();
    }

    let mut cursor = Cursor::new(buf);
    for expected in &frames {
        let frame = read_frame(&mut cursor).await.unwrap();
        assert_eq!(&frame, expected);
    }
    assert_eq!(read_frame(&mut cursor).await.unwrap_err().kind(), std::io::ErrorKind::UnexpectedEof);
}

#[tokio::test]
async fn oversized_length_is_rejected() {
    let mut buf = ((MAX_FRAME_SIZE + 1) as u32).to_be_bytes().to_vec();
    buf.extend_from_slice(b"{}");

    let err = read_frame(&mut Cursor::new(buf)).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[tokio::test]
async fn garbage_body_is_invalid_data() {
    let body = b"not json";
    let mut buf = (body.len() as u32).to_be_bytes().to_vec();
    buf.extend_from_slice(body);

    let err = read_frame(&mut Cursor::new(buf)).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn response_keeps_request_id() {
    let frame = Frame::response(42, SyncMessage::Ack);
    assert_eq!(frame.id, 42);
    assert_eq!(frame.kind, FrameKind::Response);
}
