//! Upload payloads

use axum_test::multipart::{MultipartForm, Part};

/// ISO base media header with an `isom` brand, padded to `len` bytes.
pub fn mp4_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![
        0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0x00, 0x00, 0x02,
        0x00, b'i', b's', b'o', b'm', b'i', b's', b'o', b'2',
    ];
    data.resize(len.max(data.len()), 0);
    data
}

/// MPEG program stream pack header, padded to `len` bytes.
pub fn mpeg_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0x00, 0x00, 0x01, 0xBA, 0x44, 0x00, 0x04, 0x00, 0x04, 0x01];
    data.resize(len.max(data.len()), 0);
    data
}

/// Multipart form with the file in the `data` field.
pub fn upload_form(filename: &str, data: Vec<u8>, mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "data",
        Part::bytes(bytes::Bytes::from(data)).file_name(filename).mime_type(mime_type),
    )
}
