use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

/// An upload payload encoded as a `data:` URI.
///
/// The destination platform takes emoji binaries inline as
/// `data:<mime>;base64,<payload>`; the mime type is sniffed from the
/// binary's magic bytes.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct DataUri(String);

impl DataUri {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mime = infer::get(bytes).map_or("application/octet-stream", |kind| kind.mime_type());

        let mut out = format!("data:{mime};base64,");
        STANDARD.encode_string(bytes, &mut out);

        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_gif_bytes_with_their_mime_type() {
        let uri = DataUri::from_bytes(b"GIF89a\x01\x00\x01\x00\x00\x00\x00;");

        assert!(uri.as_str().starts_with("data:image/gif;base64,"));

        let payload = uri.as_str().rsplit(',').next().unwrap();
        assert_eq!(
            STANDARD.decode(payload).unwrap(),
            b"GIF89a\x01\x00\x01\x00\x00\x00\x00;"
        );
    }

    #[test]
    fn unknown_bytes_fall_back_to_octet_stream() {
        let uri = DataUri::from_bytes(b"\x00\x01\x02\x03");
        assert!(uri.as_str().starts_with("data:application/octet-stream;base64,"));
    }
}
