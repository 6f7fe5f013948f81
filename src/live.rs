//! Reading and writing "live" MIDI wire streams, in contrast with "dead"
//! MIDI as stored in a `.mid` file.
//!
//! A live stream is a plain sequence of status and data bytes with one
//! quirk: System Realtime bytes (`0xF8..=0xFF`) may interrupt any other
//! message, even between its status byte and its data bytes. The reader
//! peels these off into a side channel the moment they arrive, so the main
//! decode path only ever sees whole non-realtime messages.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::message::{ChannelMessage, Message, SystemCommon, SystemRealtime};
use crate::primitive::{read_u8, try_read_u8};
use crate::running::{RunningStatus, StatusKind};

/// Reads complete MIDI messages from a live byte stream.
///
/// Realtime messages are handed to the realtime sink as soon as their byte
/// is read and never surface from [`read`](MidiReader::read) itself; all
/// other messages are returned in stream order.
pub struct MidiReader<R, F = fn(SystemRealtime)> {
    src: R,
    realtime: Option<F>,
    running: RunningStatus,
    pedantic: bool,
}

impl<R: Read> MidiReader<R> {
    /// Create a reader that discards realtime messages.
    pub fn new(src: R) -> MidiReader<R> {
        MidiReader {
            src,
            realtime: None,
            running: RunningStatus::live(),
            pedantic: false,
        }
    }
}

impl<R: Read, F: FnMut(SystemRealtime)> MidiReader<R, F> {
    /// Create a reader that delivers realtime messages to the given sink.
    ///
    /// The sink is invoked on the decode path, so realtime messages are
    /// observed in stream order relative to each other.
    pub fn with_realtime(src: R, realtime: F) -> MidiReader<R, F> {
        MidiReader {
            src,
            realtime: Some(realtime),
            running: RunningStatus::live(),
            pedantic: false,
        }
    }

    /// Keep the NoteOn/NoteOff distinction for NoteOn messages with
    /// velocity 0 instead of folding them into NoteOff.
    pub fn pedantic_note_off(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }

    /// Read the next non-realtime message.
    ///
    /// Returns `Ok(None)` once the source is exhausted at a message
    /// boundary; running out of bytes inside a message is an
    /// [`Error::UnexpectedEof`].
    pub fn read(&mut self) -> Result<Option<Message>> {
        loop {
            let byte = match try_read_u8(&mut self.src)? {
                Some(byte) => byte,
                None => return Ok(None),
            };
            match self.running.read(byte)? {
                StatusKind::Realtime(byte) => self.deliver_realtime(byte),
                StatusKind::Channel(status) => return Ok(Some(self.read_channel(status, None)?)),
                StatusKind::Running(status, first) => {
                    return Ok(Some(self.read_channel(status, Some(first))?))
                }
                StatusKind::System(status) => return Ok(Some(self.read_system(status)?)),
            }
        }
    }

    fn deliver_realtime(&mut self, byte: u8) {
        if let Some(sink) = self.realtime.as_mut() {
            sink(SystemRealtime::new(byte));
        }
    }

    /// Read one data byte, passing through any realtime bytes that
    /// interrupt the message.
    fn read_data_byte(&mut self) -> Result<u8> {
        loop {
            let byte = read_u8(&mut self.src, "reading message data")?;
            match byte {
                0x00..=0x7F => return Ok(byte),
                0xF8..=0xFF => self.deliver_realtime(byte),
                _ => return Err(Error::MalformedData("status byte inside message data")),
            }
        }
    }

    fn read_channel(&mut self, status: u8, first: Option<u8>) -> Result<Message> {
        let len = ChannelMessage::data_len(status);
        let mut data = [0u8; 2];
        let mut have = 0;
        if let Some(byte) = first {
            data[0] = byte;
            have = 1;
        }
        while have < len {
            data[have] = self.read_data_byte()?;
            have += 1;
        }
        Ok(Message::Channel {
            channel: status & 0xF,
            msg: ChannelMessage::decode(status, &data[..len], self.pedantic),
        })
    }

    fn read_system(&mut self, status: u8) -> Result<Message> {
        Ok(Message::Common(match status {
            0xF0 => SystemCommon::SysEx(self.read_sysex()?),
            0xF1 => SystemCommon::MtcQuarterFrame(self.read_data_byte()?),
            0xF2 => {
                let lsb = self.read_data_byte()? as u16;
                let msb = self.read_data_byte()? as u16;
                SystemCommon::SongPosition(msb << 7 | lsb)
            }
            0xF3 => SystemCommon::SongSelect(self.read_data_byte()?),
            0xF6 => SystemCommon::TuneRequest,
            0xF7 => return Err(Error::MalformedData("sysex end marker without a sysex")),
            _ => SystemCommon::Undefined(status),
        }))
    }

    /// Read sysex data bytes up to the closing `0xF7`, which is consumed
    /// but not included.
    fn read_sysex(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        loop {
            let byte = read_u8(&mut self.src, "reading sysex data")?;
            match byte {
                0x00..=0x7F => data.push(byte),
                0xF7 => return Ok(data),
                0xF8..=0xFF => self.deliver_realtime(byte),
                _ => return Err(Error::MalformedData("status byte inside sysex data")),
            }
        }
    }
}

/// Writes MIDI messages to a live byte stream.
///
/// Channel messages use running status unless it is disabled; realtime
/// messages are a single byte and leave the status memory untouched.
pub struct MidiWriter<W> {
    out: W,
    running: RunningStatus,
    no_running_status: bool,
}

impl<W: Write> MidiWriter<W> {
    pub fn new(out: W) -> MidiWriter<W> {
        MidiWriter {
            out,
            running: RunningStatus::live(),
            no_running_status: false,
        }
    }

    /// Always emit status bytes, even when running status would allow
    /// eliding them.
    pub fn no_running_status(mut self, no_running_status: bool) -> Self {
        self.no_running_status = no_running_status;
        self
    }

    /// Write a single message in its live framing.
    ///
    /// Meta messages have no live framing and are rejected.
    pub fn write(&mut self, msg: &Message) -> Result<()> {
        match msg {
            Message::Channel { channel, msg } => {
                let status = msg.status(*channel);
                let emit_status = self.running.write(status) || self.no_running_status;
                if emit_status {
                    self.out.write_all(&[status])?;
                }
                let (data, len) = msg.data();
                self.out.write_all(&data[..len])?;
            }
            Message::Common(common) => {
                self.running.clear();
                common.write(&mut self.out)?;
            }
            Message::Realtime(rt) => self.out.write_all(&[rt.encode()])?,
            Message::Meta(_) => {
                return Err(Error::MalformedData(
                    "meta messages cannot be written to a live stream",
                ))
            }
            Message::Unknown(data) => {
                self.running.clear();
                self.out.write_all(data)?;
            }
        }
        Ok(())
    }

    /// Access the underlying sink, flushing or otherwise.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }
}
