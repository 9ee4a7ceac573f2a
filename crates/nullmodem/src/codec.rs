//! Setup message codec.
//!
//! Messages are short ASCII strings of the form `ID<id>_<stage>`, with the id
//! zero-padded to six digits (`ID000042_1`). This is the format spoken by the
//! later revisions of `sersetup.exe`, so it must not change.

use nullmodem_common::CodecError;
use nullmodem_common::constants::{
    MAX_INBOUND_PAYLOAD, MAX_WIRE_ID, OUTBOUND_PAYLOAD_RESERVE,
    wire::{ID_WIDTH, PREFIX, SEPARATOR},
};
use nullmodem_common::Stage;

/// Encode a setup message. No terminator is written.
pub fn encode(id: u32, stage: Stage) -> Result<Vec<u8>, CodecError> {
    if id > MAX_WIRE_ID {
        return Err(CodecError::IdOutOfRange(id));
    }

    let text = format!("{PREFIX}{id:0width$}{SEPARATOR}{stage}", width = ID_WIDTH);
    let mut bytes = Vec::with_capacity(OUTBOUND_PAYLOAD_RESERVE.max(text.len()));
    bytes.extend_from_slice(text.as_bytes());
    Ok(bytes)
}

/// Decode a setup message into `(id, stage)`.
///
/// The payload is read as text up to its end or the first NUL. Anything
/// after the stage digits is ignored.
pub fn decode(payload: &[u8]) -> Result<(u32, Stage), CodecError> {
    if payload.len() > MAX_INBOUND_PAYLOAD {
        return Err(CodecError::Oversized {
            len: payload.len(),
            max: MAX_INBOUND_PAYLOAD,
        });
    }

    let text = match payload.iter().position(|&b| b == 0) {
        Some(end) => &payload[..end],
        None => payload,
    };

    let rest = text
        .strip_prefix(PREFIX.as_bytes())
        .ok_or(CodecError::Malformed)?;
    let (id, rest) = scan_u32(rest)?;
    let rest = rest
        .strip_prefix(&[SEPARATOR as u8])
        .ok_or(CodecError::Malformed)?;
    let (stage, _trailing) = scan_u32(rest)?;

    Ok((id, Stage::new(stage)))
}

/// Parse a leading run of ASCII digits, returning the value and the remainder
fn scan_u32(input: &[u8]) -> Result<(u32, &[u8]), CodecError> {
    let digits = input.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return Err(CodecError::Malformed);
    }

    let value = input[..digits].iter().try_fold(0u32, |acc, &b| {
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    });

    match value {
        Some(v) => Ok((v, &input[digits..])),
        None => Err(CodecError::Malformed),
    }
}
