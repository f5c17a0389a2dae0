pub mod error;
pub mod request;
pub mod transport;
pub mod wire;

pub use chat_core::Config;
pub use error::{RelayError, Result};
pub use request::{ChatPayload, SearchOptions, WireMessage};
pub use transport::{ChatTransport, HttpTransport};
pub use wire::{decode_single_shot, decode_stream, DeltaDecoder, DeltaStream, WireFormat};
