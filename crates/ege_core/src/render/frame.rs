//! Decoded frame data.
//!
//! Contains all commands needed to present a single frame.

use super::command::Command;

/// Fixed-capacity ordered list of decoded commands.
///
/// Filled by [`CommandBuffer::decode`](super::CommandBuffer::decode) and
/// consumed read-only by presentation.
#[derive(Clone)]
pub struct FrameBuffer<const MAX: usize> {
    commands: [Command; MAX],
    count: usize,
}

impl<const MAX: usize> FrameBuffer<MAX> {
    /// Creates an empty frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: [Command::Clear { color: 0 }; MAX],
            count: 0,
        }
    }

    /// Appends a command. Returns false if the frame is full.
    #[inline]
    pub fn push(&mut self, command: Command) -> bool {
        if self.count == MAX {
            return false;
        }
        self.commands[self.count] = command;
        self.count += 1;
        true
    }

    /// Forgets all commands.
    #[inline]
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Number of commands in the frame.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if there's nothing to present.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if no more commands fit.
    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.count == MAX
    }

    /// Maximum number of commands.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        MAX
    }

    /// The decoded commands, in order.
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands[..self.count]
    }

    /// Returns the command at `index`, if present.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Command> {
        self.commands().get(index)
    }

    /// Iterates over the decoded commands.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands().iter()
    }
}

impl<const MAX: usize> Default for FrameBuffer<MAX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX: usize> std::fmt::Debug for FrameBuffer<MAX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("capacity", &MAX)
            .field("commands", &self.commands())
            .finish()
    }
}

impl<'a, const MAX: usize> IntoIterator for &'a FrameBuffer<MAX> {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
