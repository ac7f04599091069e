//! # Render Commands
//!
//! The closed set of render instructions, in decoded form, plus the binary
//! record layouts they travel in.

use bytemuck::{Pod, Zeroable};

/// An axis-aligned rectangle in pixels. Width and height may be negative;
/// the codec never validates ranges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: i16,
    /// Top edge.
    pub y: i16,
    /// Width.
    pub w: i16,
    /// Height.
    pub h: i16,
}

impl Rect {
    /// Creates a rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i16, y: i16, w: i16, h: i16) -> Self {
        Self { x, y, w, h }
    }
}

/// One decoded render instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Fill the whole target with a packed color.
    Clear {
        /// Packed color (ARGB8888 on the reference backends).
        color: u32,
    },
    /// Fill a rectangle on a layer.
    Rect {
        /// Draw layer.
        layer: u8,
        /// Packed color.
        color: u32,
        /// Geometry.
        rect: Rect,
    },
}

impl Command {
    /// Shorthand for a [`Command::Rect`].
    #[inline]
    #[must_use]
    pub const fn rect(layer: u8, color: u32, x: i16, y: i16, w: i16, h: i16) -> Self {
        Self::Rect {
            layer,
            color,
            rect: Rect::new(x, y, w, h),
        }
    }

    /// Returns the opcode this command is encoded with.
    #[inline]
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Clear { .. } => Opcode::Clear,
            Self::Rect { .. } => Opcode::Rect,
        }
    }

    /// Returns the packed color.
    #[inline]
    #[must_use]
    pub const fn color(&self) -> u32 {
        match *self {
            Self::Clear { color } | Self::Rect { color, .. } => color,
        }
    }

    /// Size of this command's record in bytes, opcode included.
    #[inline]
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        self.opcode().record_len()
    }
}

impl Default for Command {
    fn default() -> Self {
        Self::Clear { color: 0 }
    }
}

/// One-byte tag at the start of every record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Followed by a [`ClearRecord`].
    Clear = 0,
    /// Followed by a [`RectRecord`].
    Rect = 1,
}

impl Opcode {
    /// Payload size after the opcode byte.
    #[inline]
    #[must_use]
    pub const fn payload_len(self) -> usize {
        match self {
            Self::Clear => std::mem::size_of::<ClearRecord>(),
            Self::Rect => std::mem::size_of::<RectRecord>(),
        }
    }

    /// Full record size, opcode included.
    #[inline]
    #[must_use]
    pub const fn record_len(self) -> usize {
        1 + self.payload_len()
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(Self::Clear),
            1 => Ok(Self::Rect),
            other => Err(other),
        }
    }
}

/// Clear payload: `color(4)`.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C, packed)]
pub struct ClearRecord {
    /// Packed color.
    pub color: u32,
}

/// Rect payload: `layer(1) | color(4) | x(2) | y(2) | w(2) | h(2)`.
///
/// Packed, so the in-memory layout is exactly the wire layout in host byte
/// order.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C, packed)]
pub struct RectRecord {
    /// Draw layer.
    pub layer: u8,
    /// Packed color.
    pub color: u32,
    /// Left edge.
    pub x: i16,
    /// Top edge.
    pub y: i16,
    /// Width.
    pub w: i16,
    /// Height.
    pub h: i16,
}

impl From<RectRecord> for Command {
    fn from(record: RectRecord) -> Self {
        Self::rect(record.layer, record.color, record.x, record.y, record.w, record.h)
    }
}

impl From<ClearRecord> for Command {
    fn from(record: ClearRecord) -> Self {
        Self::Clear { color: record.color }
    }
}

// Wire sizes are part of the format.
const _: () = assert!(Opcode::Clear.record_len() == 5);
const _: () = assert!(Opcode::Rect.record_len() == 14);
