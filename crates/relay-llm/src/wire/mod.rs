//! Response body decoding: bytes in, text deltas out.

mod decoder;
mod extract;
mod utf8;

pub use decoder::{decode_single_shot, DeltaDecoder};
pub use extract::{extract_text, TEXT_FIELDS};
pub use utf8::Utf8Decoder;

use std::fmt::Display;
use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::error::{RelayError, Result};

/// Stream of non-empty text deltas in upstream order.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Body framing, chosen from the response `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `text/event-stream`
    EventStream,
    /// Other `text/*` and `application/octet-stream` bodies, streamed as-is.
    PlainText,
    /// `application/json`: read fully, then extract one text.
    SingleShot,
    /// Missing or unrecognized type; sniffed for SSE framing.
    Unknown,
}

impl WireFormat {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return WireFormat::Unknown;
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "text/event-stream" => WireFormat::EventStream,
            "application/json" => WireFormat::SingleShot,
            m if m.starts_with("application/") && m.ends_with("+json") => WireFormat::SingleShot,
            "application/octet-stream" => WireFormat::PlainText,
            m if m.starts_with("text/") => WireFormat::PlainText,
            _ => WireFormat::Unknown,
        }
    }
}

/// Turn a chunked byte body into a [`DeltaStream`].
///
/// Chunk errors end the stream with [`RelayError::Stream`]; bytes after an SSE
/// `[DONE]` are not read.
pub fn decode_stream<S, B, E>(body: S, format: WireFormat) -> DeltaStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut body = Box::pin(body);
        let mut utf8 = Utf8Decoder::new();
        let mut decoder = DeltaDecoder::new(format);

        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err::<String, RelayError>(RelayError::Stream(e.to_string()));
                    return;
                }
            };
            for delta in decoder.push(&utf8.decode(bytes.as_ref())) {
                yield Ok(delta);
            }
            if decoder.is_done() {
                break;
            }
        }

        for delta in decoder.push(&utf8.finish()) {
            yield Ok(delta);
        }
        for delta in decoder.finish() {
            yield Ok(delta);
        }
    };

    Box::pin(stream)
}

/// Decode a `reqwest` response according to its `Content-Type`.
pub fn decode_response(response: reqwest::Response) -> DeltaStream {
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let format = WireFormat::from_content_type(content_type.as_deref());
    log::debug!(
        "Decoding upstream body as {:?} (content-type: {:?})",
        format,
        content_type
    );
    decode_stream(response.bytes_stream(), format)
}
