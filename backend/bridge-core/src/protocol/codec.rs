use crate::error::ProtocolError;
use crate::protocol::envelope::Envelope;

use serde_json::Value;
use thiserror::Error as ThisError;

/// Whether more bytes may still arrive after the buffer being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finality {
    /// The connection is open; a parse failure means "keep reading".
    Partial,
    /// The remote closed; this is everything there will ever be.
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum DecodeError {
    /// Nothing parseable yet. Not an error while the connection is open.
    #[error("incomplete JSON document")]
    Incomplete,

    /// The final buffer does not hold a JSON document.
    #[error("malformed JSON document: {raw}")]
    Malformed { raw: String },
}

/// Serializes an envelope to the bytes written on the wire.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(envelope)?)
}

/// Attempts to parse the whole accumulated buffer as one JSON document.
///
/// Leading and trailing whitespace is accepted, so a newline-terminated reply
/// decodes the same as a bare one. Only an empty buffer is
/// [`DecodeError::Incomplete`] once final; any bytes that never parse,
/// whitespace included, are [`DecodeError::Malformed`].
pub fn try_decode(buffer: &[u8], finality: Finality) -> Result<Value, DecodeError> {
    if buffer.is_empty()
        || (finality == Finality::Partial && buffer.iter().all(u8::is_ascii_whitespace))
    {
        return Err(DecodeError::Incomplete);
    }

    match serde_json::from_slice::<Value>(buffer) {
        Ok(value) => Ok(value),
        Err(_) if finality == Finality::Partial => Err(DecodeError::Incomplete),
        Err(_) => Err(DecodeError::Malformed {
            raw: String::from_utf8_lossy(buffer).into_owned(),
        }),
    }
}
