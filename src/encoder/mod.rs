use crate::domain::MetricPoint;
use bytes::{BufMut, BytesMut};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Non-finite value {value} for metric {path}")]
    NonFiniteValue { path: String, value: f64 },
    #[error("Pickle serialization failed: {0}")]
    Pickle(#[from] serde_pickle::Error),
    #[error("Encoded payload of {0} bytes exceeds the 4-byte length header")]
    PayloadTooLarge(usize),
}

/// Encode a batch the way the Graphite pickle receiver expects it: a
/// 4-byte big-endian unsigned length header followed by a pickle
/// protocol 2 list of `(path, (timestamp, value))` tuples.
///
/// Input order is preserved. An empty batch still encodes to a well-formed
/// zero-element list so the receiver accepts it without error.
pub fn encode(points: &[MetricPoint]) -> Result<Vec<u8>, EncodeError> {
    for point in points {
        // Pickle would happily encode NaN/Infinity, but the receiver's
        // whisper backend rejects them; fail the run up front.
        if !point.value.is_finite() {
            return Err(EncodeError::NonFiniteValue {
                path: point.path.clone(),
                value: point.value,
            });
        }
    }

    let tuples: Vec<(&str, (i64, f64))> = points
        .iter()
        .map(|point| (point.path.as_str(), (point.timestamp, point.value)))
        .collect();

    let payload = serde_pickle::to_vec(&tuples, serde_pickle::SerOptions::new().proto_v2())?;
    let length = u32::try_from(payload.len())
        .map_err(|_| EncodeError::PayloadTooLarge(payload.len()))?;

    let mut frame = BytesMut::with_capacity(payload.len() + 4);
    frame.put_u32(length);
    frame.put_slice(&payload);
    Ok(frame.to_vec())
}
