//! Running status: the stateful status-byte compression shared by the live
//! wire and SMF track events.
//!
//! MIDI allows a channel message to omit its status byte when it matches the
//! status of the previous message. The tracker below owns the single-slot
//! status memory and is the one place that decides whether a byte is a
//! status or a data byte; the readers classify through it and the writers
//! elide through it.

use crate::error::{Error, Result};

/// What a freshly read byte means, given the current running status.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum StatusKind {
    /// An explicit channel voice status byte, stored as the new running
    /// status.
    Channel(u8),
    /// A system status byte (sysex, system common, or meta in SMF streams).
    /// Clears the running status.
    System(u8),
    /// A System Realtime byte. The running status is unaffected.
    Realtime(u8),
    /// A data byte resolved against the stored running status:
    /// `(status, first data byte)`.
    Running(u8, u8),
}

/// Which transport the tracker serves. SMF tracks repurpose the `0xFF`
/// realtime status for meta events and allow no realtime bytes at all.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Stream {
    Live,
    Smf,
}

/// The single-slot status memory owned by each reader and writer.
#[derive(Clone, Debug)]
pub(crate) struct RunningStatus {
    last: Option<u8>,
    stream: Stream,
}

impl RunningStatus {
    /// A tracker for a live wire stream.
    pub(crate) fn live() -> RunningStatus {
        RunningStatus {
            last: None,
            stream: Stream::Live,
        }
    }

    /// A tracker for an SMF track stream.
    pub(crate) fn smf() -> RunningStatus {
        RunningStatus {
            last: None,
            stream: Stream::Smf,
        }
    }

    /// Forget the stored status, as on SMF track boundaries and after
    /// writing any non-channel message.
    pub(crate) fn clear(&mut self) {
        self.last = None;
    }

    /// Classify a byte read from the stream and update the slot.
    ///
    /// A data byte with no stored status has no valid interpretation, and
    /// neither does a realtime byte inside an SMF track.
    pub(crate) fn read(&mut self, byte: u8) -> Result<StatusKind> {
        match byte {
            0x80..=0xEF => {
                self.last = Some(byte);
                Ok(StatusKind::Channel(byte))
            }
            0xF0..=0xF7 => {
                self.last = None;
                Ok(StatusKind::System(byte))
            }
            0xF8..=0xFF => match self.stream {
                Stream::Live => Ok(StatusKind::Realtime(byte)),
                Stream::Smf if byte == 0xFF => {
                    self.last = None;
                    Ok(StatusKind::System(byte))
                }
                Stream::Smf => Err(Error::MalformedData("realtime status inside an smf track")),
            },
            _ => match self.last {
                Some(status) => Ok(StatusKind::Running(status, byte)),
                None => Err(Error::MalformedData("data byte without a running status")),
            },
        }
    }

    /// Decide whether a channel status byte must be written out, updating
    /// the slot. Returns `false` when the status matches the stored one and
    /// may be elided.
    pub(crate) fn write(&mut self, status: u8) -> bool {
        debug_assert!((0x80..=0xEF).contains(&status));
        if self.last == Some(status) {
            false
        } else {
            self.last = Some(status);
            true
        }
    }
}
