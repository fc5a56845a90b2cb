//! # Binary Frames
//!
//! One frame is one self-describing batch of same-typed records, bounded to
//! [`STORAGE_FRAME`] bytes so it fits a single datagram.
//!
//! ## Layout
//!
//! ```text
//! [name_len: u8][name: name_len bytes][count: u8][count * size_of::<T>() bytes]
//! ```
//!
//! Records are copied byte-for-byte (`Pod`), with no alignment and no type tag
//! beyond the name. There is no version field: a layout change in a record
//! type silently breaks frames written by older builds.

use bytemuck::Pod;

use crate::config::STORAGE_FRAME;
use crate::error::{SubtileError, SubtileResult};

/// Bytes spent on the two length prefixes.
const HEADER_BYTES: usize = 2;

/// A fixed-size, name-tagged binary record batch.
///
/// Designed to be reused: encoding into an existing frame overwrites it
/// without allocating.
#[derive(Clone)]
pub struct Frame {
    buffer: [u8; STORAGE_FRAME],
    size: usize,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; STORAGE_FRAME],
            size: 0,
        }
    }

    /// Returns the number of meaningful bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns true if nothing has been encoded.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the meaningful bytes, ready to be sent or stored.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.size]
    }

    /// Returns how many `T` records fit in one frame named `name`.
    #[must_use]
    pub fn max_records<T: Pod>(name: &str) -> usize {
        let room = STORAGE_FRAME.saturating_sub(HEADER_BYTES + name.len());
        match std::mem::size_of::<T>() {
            0 => usize::from(u8::MAX),
            size => (room / size).min(usize::from(u8::MAX)),
        }
    }

    /// Rebuilds a frame from received bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::FrameMalformed`] if the bytes do not fit a
    /// frame or do not carry a complete header.
    pub fn from_bytes(bytes: &[u8]) -> SubtileResult<Self> {
        if bytes.len() > STORAGE_FRAME {
            return Err(SubtileError::FrameMalformed {
                reason: "longer than frame capacity",
            });
        }

        let mut frame = Self::new();
        frame.buffer[..bytes.len()].copy_from_slice(bytes);
        frame.size = bytes.len();
        frame.header()?;
        Ok(frame)
    }

    /// Encodes `records` under `name`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::FrameEncode`] if the name is empty, if the
    /// name or record count does not fit its one-byte prefix, or if the
    /// encoded size exceeds the frame. The frame is untouched on failure.
    pub fn encode<T: Pod>(&mut self, name: &str, records: &[T]) -> SubtileResult<()> {
        let name = name.as_bytes();
        if name.is_empty() {
            return Err(SubtileError::FrameEncode { reason: "empty name" });
        }
        let name_len = u8::try_from(name.len())
            .map_err(|_| SubtileError::FrameEncode { reason: "name longer than 255 bytes" })?;
        let count = u8::try_from(records.len())
            .map_err(|_| SubtileError::FrameEncode { reason: "more than 255 records" })?;

        let payload: &[u8] = bytemuck::cast_slice(records);
        let size = HEADER_BYTES + name.len() + payload.len();
        if size > STORAGE_FRAME {
            return Err(SubtileError::FrameEncode {
                reason: "records exceed frame capacity",
            });
        }

        let data = 1 + name.len();
        self.buffer[0] = name_len;
        self.buffer[1..data].copy_from_slice(name);
        self.buffer[data] = count;
        self.buffer[data + 1..size].copy_from_slice(payload);
        self.size = size;

        Ok(())
    }

    /// Decodes the frame's records into `out`, returning how many were written.
    ///
    /// The caller vouches that `T` is the type the frame was encoded with;
    /// only the name is checked.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::FrameTagMismatch`] if the embedded name differs
    /// from `name`, [`SubtileError::FrameMalformed`] if the frame is shorter
    /// than its header claims, or [`SubtileError::CapacityExceeded`] if `out`
    /// is too small. `out` is untouched on failure.
    pub fn decode<T: Pod>(&self, name: &str, out: &mut [T]) -> SubtileResult<usize> {
        let (embedded, count, payload) = self.header()?;
        if embedded != name.as_bytes() {
            return Err(SubtileError::FrameTagMismatch);
        }

        let record = std::mem::size_of::<T>();
        if count * record > payload.len() {
            return Err(SubtileError::FrameMalformed {
                reason: "payload shorter than its record count",
            });
        }
        if count > out.len() {
            return Err(SubtileError::CapacityExceeded {
                what: "decode buffer",
                capacity: out.len(),
            });
        }

        for (i, slot) in out.iter_mut().take(count).enumerate() {
            *slot = bytemuck::pod_read_unaligned(&payload[i * record..(i + 1) * record]);
        }

        Ok(count)
    }

    /// Decodes the frame's records into a new vector.
    ///
    /// # Errors
    ///
    /// Same as [`decode`](Self::decode).
    pub fn decode_vec<T: Pod>(&self, name: &str) -> SubtileResult<Vec<T>> {
        let mut out = vec![<T as bytemuck::Zeroable>::zeroed(); Self::max_records::<T>(name)];
        let count = self.decode(name, &mut out)?;
        out.truncate(count);
        Ok(out)
    }

    /// Returns the embedded name, or `None` if the frame is empty or malformed.
    #[must_use]
    pub fn name(&self) -> Option<&[u8]> {
        self.header().ok().map(|(name, _, _)| name)
    }

    /// Returns true if the embedded name is `name`.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name() == Some(name.as_bytes())
    }

    /// Splits the frame into name, record count and payload bytes.
    fn header(&self) -> SubtileResult<(&[u8], usize, &[u8])> {
        let bytes = self.as_slice();
        let Some(&name_len) = bytes.first() else {
            return Err(SubtileError::FrameMalformed { reason: "empty frame" });
        };

        let name_len = usize::from(name_len);
        if name_len == 0 {
            return Err(SubtileError::FrameMalformed { reason: "empty name" });
        }
        if HEADER_BYTES + name_len > bytes.len() {
            return Err(SubtileError::FrameMalformed { reason: "truncated header" });
        }

        let name = &bytes[1..=name_len];
        let count = usize::from(bytes[1 + name_len]);
        Ok((name, count, &bytes[HEADER_BYTES + name_len..]))
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Frame {}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("name", &self.name().map(String::from_utf8_lossy))
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[repr(C)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    struct Sample {
        id: u16,
        flags: u16,
        weight: f32,
    }

    fn samples(n: u16) -> Vec<Sample> {
        (0..n)
            .map(|id| Sample { id, flags: id * 3, weight: f32::from(id) * 0.5 })
            .collect()
    }

    #[test]
    fn test_frame_roundtrip() {
        let records = samples(5);
        let mut frame = Frame::new();
        frame.encode("sample", &records).unwrap();
        assert_eq!(frame.len(), 2 + 6 + 5 * 8);
        assert!(frame.is_named("sample"));

        let mut out = [Sample::default(); 8];
        assert_eq!(frame.decode("sample", &mut out), Ok(5));
        assert_eq!(&out[..5], &records[..]);
        assert_eq!(frame.decode_vec::<Sample>("sample").unwrap(), records);
    }

    #[test]
    fn test_frame_exact_capacity() {
        // 2 + 6 + 15 * 8 = 128
        let mut frame = Frame::new();
        frame.encode("sample", &samples(15)).unwrap();
        assert_eq!(frame.len(), STORAGE_FRAME);
        assert_eq!(Frame::max_records::<Sample>("sample"), 15);

        assert_eq!(
            frame.encode("sample", &samples(16)),
            Err(SubtileError::FrameEncode { reason: "records exceed frame capacity" })
        );
        // Failed encode keeps the previous content.
        assert_eq!(frame.decode_vec::<Sample>("sample").unwrap().len(), 15);
    }

    #[test]
    fn test_frame_rejects_empty_name() {
        let mut frame = Frame::new();
        assert_eq!(
            frame.encode("", &samples(1)),
            Err(SubtileError::FrameEncode { reason: "empty name" })
        );
        assert!(frame.is_empty());
    }

    #[test]
    fn test_frame_tag_mismatch_leaves_output() {
        let mut frame = Frame::new();
        frame.encode("sample", &samples(3)).unwrap();

        let sentinel = Sample { id: 99, flags: 99, weight: 99.0 };
        let mut out = [sentinel; 4];
        assert_eq!(frame.decode("samples", &mut out), Err(SubtileError::FrameTagMismatch));
        assert_eq!(frame.decode("sampl", &mut out), Err(SubtileError::FrameTagMismatch));
        assert_eq!(frame.decode("SAMPLE", &mut out), Err(SubtileError::FrameTagMismatch));
        assert!(out.iter().all(|s| *s == sentinel));
    }

    #[test]
    fn test_frame_small_output() {
        let mut frame = Frame::new();
        frame.encode("sample", &samples(3)).unwrap();
        let mut out = [Sample::zeroed(); 2];
        assert_eq!(
            frame.decode("sample", &mut out),
            Err(SubtileError::CapacityExceeded { what: "decode buffer", capacity: 2 })
        );
    }

    #[test]
    fn test_frame_from_bytes() {
        let mut frame = Frame::new();
        frame.encode("sample", &samples(2)).unwrap();

        let copy = Frame::from_bytes(frame.as_slice()).unwrap();
        assert_eq!(copy, frame);

        // Truncated payload: header claims 2 records, only one is present.
        let short = Frame::from_bytes(&frame.as_slice()[..frame.len() - 8]).unwrap();
        assert!(matches!(
            short.decode_vec::<Sample>("sample"),
            Err(SubtileError::FrameMalformed { .. })
        ));

        assert!(Frame::from_bytes(&[]).is_err());
        assert!(Frame::from_bytes(&[4, b'a']).is_err());
        assert!(Frame::from_bytes(&[0u8; STORAGE_FRAME + 1]).is_err());
    }
}
