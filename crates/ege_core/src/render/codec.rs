//! # Command Codec
//!
//! Compact, memory-backed command buffer. Render commands are appended as
//! self-describing binary records into a fixed-size byte array and decoded
//! back into a [`FrameBuffer`] on the presentation side.
//!
//! ## Record Layout (host byte order)
//!
//! ```text
//! Clear:  opcode=0 (1) | color (4)                                    =  5 bytes
//! Rect:   opcode=1 (1) | layer (1) | color (4) | x | y | w | h (2 each) = 14 bytes
//! ```
//!
//! The format is an in-process hand-off between two threads of the same
//! binary. It is not meant to be persisted or sent over a network.

use std::iter::FusedIterator;

use bytemuck::{bytes_of, pod_read_unaligned};

use super::command::{ClearRecord, Command, Opcode, RectRecord};
use super::frame::FrameBuffer;
use crate::error::{CodecError, CodecResult};

/// Fixed-capacity buffer of encoded render commands.
///
/// ## Usage
///
/// ```rust
/// use ege_core::{Command, CommandBuffer, FrameBuffer};
///
/// let mut buf: CommandBuffer<256> = CommandBuffer::new();
/// buf.push_clear(0x1122_3344);
/// buf.push_rect(2, 0xFF, 1, 2, 3, 4);
///
/// let mut frame: FrameBuffer<16> = FrameBuffer::new();
/// assert_eq!(buf.decode(&mut frame), 2);
/// assert_eq!(frame.commands()[0], Command::Clear { color: 0x1122_3344 });
/// ```
#[derive(Clone)]
pub struct CommandBuffer<const CAPACITY: usize> {
    /// Encoded records, valid up to `len`.
    bytes: [u8; CAPACITY],
    /// Write cursor. Always `<= CAPACITY`.
    len: usize,
    /// Cleared once the buffer is handed to the consumer.
    writable: bool,
}

impl<const CAPACITY: usize> CommandBuffer<CAPACITY> {
    /// Creates an empty, writable buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0; CAPACITY],
            len: 0,
            writable: true,
        }
    }

    /// Creates an empty buffer that rejects every write.
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            bytes: [0; CAPACITY],
            len: 0,
            writable: false,
        }
    }

    /// Rewinds the write cursor. The writable flag is left as is.
    #[inline]
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Bytes written so far.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing has been recorded.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes still free.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        CAPACITY - self.len
    }

    /// Returns true if the buffer accepts writes.
    #[inline]
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.writable
    }

    /// The encoded records.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[inline]
    pub(crate) fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    /// Appends a clear record.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is read-only or lacks room for the record. Both
    /// mean the caller sized or used the buffer wrong.
    #[track_caller]
    pub fn push_clear(&mut self, color: u32) {
        self.try_push_clear(color).unwrap_or_else(|err| panic!("{err}"));
    }

    /// Appends a rect record.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is read-only or lacks room for the record.
    #[track_caller]
    pub fn push_rect(&mut self, layer: u8, color: u32, x: i16, y: i16, w: i16, h: i16) {
        self.try_push_rect(layer, color, x, y, w, h)
            .unwrap_or_else(|err| panic!("{err}"));
    }

    /// Appends any command.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is read-only or lacks room for the record.
    #[track_caller]
    pub fn push(&mut self, command: Command) {
        self.try_push(command).unwrap_or_else(|err| panic!("{err}"));
    }

    /// Appends a clear record, or reports why it can't.
    ///
    /// # Errors
    ///
    /// [`CodecError::ReadOnly`] or [`CodecError::CapacityExceeded`]. The
    /// buffer is unchanged on error.
    pub fn try_push_clear(&mut self, color: u32) -> CodecResult<()> {
        self.write_record(Opcode::Clear, bytes_of(&ClearRecord { color }))
    }

    /// Appends a rect record, or reports why it can't.
    ///
    /// # Errors
    ///
    /// [`CodecError::ReadOnly`] or [`CodecError::CapacityExceeded`]. The
    /// buffer is unchanged on error.
    pub fn try_push_rect(
        &mut self,
        layer: u8,
        color: u32,
        x: i16,
        y: i16,
        w: i16,
        h: i16,
    ) -> CodecResult<()> {
        let record = RectRecord { layer, color, x, y, w, h };
        self.write_record(Opcode::Rect, bytes_of(&record))
    }

    /// Appends any command, or reports why it can't.
    ///
    /// # Errors
    ///
    /// [`CodecError::ReadOnly`] or [`CodecError::CapacityExceeded`].
    pub fn try_push(&mut self, command: Command) -> CodecResult<()> {
        match command {
            Command::Clear { color } => self.try_push_clear(color),
            Command::Rect { layer, color, rect } => {
                self.try_push_rect(layer, color, rect.x, rect.y, rect.w, rect.h)
            }
        }
    }

    fn write_record(&mut self, opcode: Opcode, payload: &[u8]) -> CodecResult<()> {
        if !self.writable {
            return Err(CodecError::ReadOnly);
        }

        let needed = 1 + payload.len();
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CodecError::CapacityExceeded { needed, remaining });
        }

        let record = &mut self.bytes[self.len..self.len + needed];
        record[0] = opcode as u8;
        record[1..].copy_from_slice(payload);
        self.len += needed;
        Ok(())
    }

    /// Iterates over the recorded commands.
    #[inline]
    #[must_use]
    pub fn commands(&self) -> Decoder<'_> {
        Decoder::new(self.as_bytes())
    }

    /// Decodes into `out`, replacing its contents.
    ///
    /// Stops without error at the end of input, at a truncated record, at an
    /// unknown opcode, or when `out` is full. Returns the number of commands
    /// decoded, which is always a run of whole leading records.
    pub fn decode<const MAX: usize>(&self, out: &mut FrameBuffer<MAX>) -> usize {
        out.reset();
        for command in self.commands() {
            if !out.push(command) {
                tracing::debug!(capacity = MAX, "frame buffer full, remaining commands dropped");
                break;
            }
        }
        out.len()
    }
}

impl<const CAPACITY: usize> Default for CommandBuffer<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAPACITY: usize> std::fmt::Debug for CommandBuffer<CAPACITY> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("capacity", &CAPACITY)
            .field("len", &self.len)
            .field("writable", &self.writable)
            .finish()
    }
}

/// Front-to-back record parser over any byte slice.
///
/// Yields commands until the input is exhausted, a record is cut short, or
/// an opcode is unknown. Field values are copied out verbatim, never
/// validated.
#[derive(Clone, Debug)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    /// Starts decoding at the beginning of `bytes`.
    #[inline]
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Bytes consumed by the records decoded so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Input not yet consumed.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }
}

impl Iterator for Decoder<'_> {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        let (&tag, rest) = self.remaining().split_first()?;

        let Ok(opcode) = Opcode::try_from(tag) else {
            tracing::trace!(offset = self.position, opcode = tag, "unknown opcode, decode stopped");
            return None;
        };

        let Some(payload) = rest.get(..opcode.payload_len()) else {
            tracing::trace!(offset = self.position, ?opcode, "truncated record, decode stopped");
            return None;
        };

        let command = match opcode {
            Opcode::Clear => Command::from(pod_read_unaligned::<ClearRecord>(payload)),
            Opcode::Rect => Command::from(pod_read_unaligned::<RectRecord>(payload)),
        };
        self.position += opcode.record_len();
        Some(command)
    }
}

// A stopped decoder never moves again, so it keeps returning `None`.
impl FusedIterator for Decoder<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Rect;

    #[test]
    fn test_encode_decode() {
        let mut buf: CommandBuffer<256> = CommandBuffer::new();
        assert_eq!(buf.len(), 0);

        buf.push_clear(0x1122_3344);
        buf.push_rect(2, 0xFF, 1, 2, 3, 4);
        buf.push_rect(1, 0xAA, -5, -6, 7, 8);
        assert_eq!(buf.len(), 5 + 14 + 14);

        let mut out: FrameBuffer<16> = FrameBuffer::new();
        let count = buf.decode(&mut out);
        assert_eq!(count, 3);
        assert_eq!(
            out.commands(),
            &[
                Command::Clear { color: 0x1122_3344 },
                Command::Rect { layer: 2, color: 0xFF, rect: Rect::new(1, 2, 3, 4) },
                Command::Rect { layer: 1, color: 0xAA, rect: Rect::new(-5, -6, 7, 8) },
            ]
        );
    }

    #[test]
    fn test_record_bytes_are_host_order() {
        let mut buf: CommandBuffer<32> = CommandBuffer::new();
        buf.push_rect(7, 0x0102_0304, -2, 300, 4, 5);

        let bytes = buf.as_bytes();
        assert_eq!(bytes[0], Opcode::Rect as u8);
        assert_eq!(bytes[1], 7);
        assert_eq!(bytes[2..6], 0x0102_0304u32.to_ne_bytes());
        assert_eq!(bytes[6..8], (-2i16).to_ne_bytes());
        assert_eq!(bytes[8..10], 300i16.to_ne_bytes());
        assert_eq!(bytes[10..12], 4i16.to_ne_bytes());
        assert_eq!(bytes[12..14], 5i16.to_ne_bytes());
    }

    #[test]
    fn test_decode_stops_at_truncated_record() {
        let mut buf: CommandBuffer<64> = CommandBuffer::new();
        buf.push_clear(1);
        buf.push_rect(0, 2, 0, 0, 1, 1);

        // Cut the rect record short.
        let bytes = &buf.as_bytes()[..buf.len() - 3];
        let mut decoder = Decoder::new(bytes);
        assert_eq!(decoder.next(), Some(Command::Clear { color: 1 }));
        assert_eq!(decoder.next(), None);
        assert_eq!(decoder.position(), 5);
        assert_eq!(decoder.remaining().len(), 11);
        // Fused.
        assert_eq!(decoder.next(), None);
    }

    #[test]
    fn test_decode_stops_at_unknown_opcode() {
        let mut bytes = Vec::new();
        bytes.push(Opcode::Clear as u8);
        bytes.extend_from_slice(&7u32.to_ne_bytes());
        bytes.push(0x2A); // not an opcode
        bytes.push(Opcode::Clear as u8);
        bytes.extend_from_slice(&8u32.to_ne_bytes());

        let commands: Vec<Command> = Decoder::new(&bytes).collect();
        assert_eq!(commands, vec![Command::Clear { color: 7 }]);
    }

    #[test]
    fn test_decode_empty_input() {
        let buf: CommandBuffer<8> = CommandBuffer::new();
        let mut out: FrameBuffer<4> = FrameBuffer::new();
        out.push(Command::Clear { color: 5 });

        // Decode replaces old contents.
        assert_eq!(buf.decode(&mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_decode_stops_when_frame_full() {
        let mut buf: CommandBuffer<64> = CommandBuffer::new();
        for color in 0..5 {
            buf.push_clear(color);
        }

        let mut out: FrameBuffer<3> = FrameBuffer::new();
        assert_eq!(buf.decode(&mut out), 3);
        assert_eq!(out.get(2), Some(&Command::Clear { color: 2 }));
    }

    #[test]
    fn test_exact_fit() {
        let mut buf: CommandBuffer<19> = CommandBuffer::new();
        buf.push_clear(1);
        buf.push_rect(0, 0, 0, 0, 0, 0);
        assert_eq!(buf.remaining(), 0);
        assert_eq!(
            buf.try_push_clear(2),
            Err(CodecError::CapacityExceeded { needed: 5, remaining: 0 })
        );
    }

    #[test]
    fn test_checked_push_leaves_buffer_untouched() {
        let mut buf: CommandBuffer<10> = CommandBuffer::new();
        buf.push_clear(1);
        let before = buf.as_bytes().to_vec();

        assert_eq!(
            buf.try_push_rect(0, 0, 0, 0, 0, 0),
            Err(CodecError::CapacityExceeded { needed: 14, remaining: 5 })
        );
        assert_eq!(buf.as_bytes(), &before[..]);
        assert!(buf.try_push(Command::Clear { color: 2 }).is_ok());
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "command buffer full")]
    fn test_push_past_capacity_panics() {
        let mut buf: CommandBuffer<13> = CommandBuffer::new();
        buf.push_rect(0, 0, 0, 0, 0, 0);
    }

    #[test]
    #[should_panic(expected = "read-only")]
    fn test_push_into_read_only_panics() {
        let mut buf: CommandBuffer<64> = CommandBuffer::read_only();
        buf.push_clear(0);
    }

    #[test]
    fn test_reset_rewinds() {
        let mut buf: CommandBuffer<32> = CommandBuffer::new();
        buf.push(Command::rect(1, 1, 1, 1, 1, 1));
        assert!(!buf.is_empty());
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.commands().count(), 0);
        assert!(buf.is_writable());
    }
}
