//! The MIDI message model and its byte-level codec.
//!
//! A [`Message`] is a tagged union over the four MIDI message categories:
//! channel voice messages, System Common messages, System Realtime messages
//! and SMF meta messages, plus a catch-all for syntactically framed but
//! unrecognized bytes. Messages are immutable values; the transports in
//! [`live`](crate::live) and [`smf`](crate::smf) decide how they are framed
//! on the wire.

use std::fmt;
use std::io::Write;

use crate::error::{Error, Result};
use crate::primitive::{write_varlen, SmpteTime};

/// A general MIDI message, from any transport.
///
/// When reading from a live connection no meta messages can occur, and
/// conversely a `.mid` file holds System Common and Realtime messages only
/// in frozen escape form. The decoder of each transport produces the
/// variants its envelope allows.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum Message {
    /// A message associated to a channel, carrying note playback data.
    /// This is the most common MIDI message type.
    Channel {
        /// The channel that this message is associated to, in `[0, 15]`.
        channel: u8,
        /// The type of message sent and its associated data.
        msg: ChannelMessage,
    },
    /// A System Common message, including System Exclusive dumps.
    Common(SystemCommon),
    /// A one-byte System Realtime message.
    Realtime(SystemRealtime),
    /// A meta message, only present in `.mid` files.
    Meta(MetaMessage),
    /// A syntactically framed but unrecognized sequence of bytes, such as an
    /// SMF escape event that does not decode to a known message.
    Unknown(Vec<u8>),
}

impl Message {
    /// The canonical bytes of this message, including its status byte.
    ///
    /// Channel and system messages encode to their live wire form, meta
    /// messages to their SMF form (`FF type length data`). Running-status
    /// elision is a transport concern and never applies here.
    pub fn raw(&self) -> Vec<u8> {
        let mut raw = Vec::new();
        match self {
            Message::Channel { channel, msg } => {
                raw.push(msg.status(*channel));
                let (data, len) = msg.data();
                raw.extend_from_slice(&data[..len]);
            }
            Message::Common(common) => {
                // The live framing is the canonical one.
                common
                    .write(&mut raw)
                    .expect("writing to a vec cannot fail");
            }
            Message::Realtime(rt) => raw.push(rt.encode()),
            Message::Meta(meta) => {
                raw.push(0xFF);
                meta.write(&mut raw)
                    .expect("writing to a vec cannot fail");
            }
            Message::Unknown(data) => raw.extend_from_slice(data),
        }
        raw
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Message::Channel { channel, msg } => write!(f, "ch{} {}", channel, msg),
            Message::Common(common) => fmt::Display::fmt(common, f),
            Message::Realtime(rt) => fmt::Display::fmt(rt, f),
            Message::Meta(meta) => fmt::Display::fmt(meta, f),
            Message::Unknown(data) => write!(f, "unknown ({} bytes)", data.len()),
        }
    }
}

/// A channel voice message, the bulk of most MIDI data.
///
/// All data byte values are in the `0..=127` range.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ChannelMessage {
    /// Stop playing a note.
    ///
    /// A velocity of 0 is the common case and encodes as a NoteOn with
    /// velocity 0, which lets on/off pairs share running status.
    NoteOff { key: u8, vel: u8 },
    /// Start playing a note with the given velocity.
    NoteOn { key: u8, vel: u8 },
    /// Modify the velocity of a note after it has been played.
    Aftertouch { key: u8, vel: u8 },
    /// Modify the value of a MIDI controller.
    Controller { controller: u8, value: u8 },
    /// Change the program (also called instrument) of a channel.
    ProgramChange { program: u8 },
    /// Change the velocity of an entire channel at once.
    ChannelAftertouch { vel: u8 },
    /// Set the pitch bend of an entire channel.
    PitchBend { bend: PitchBend },
}

impl ChannelMessage {
    /// Number of data bytes following a channel status byte.
    pub(crate) fn data_len(status: u8) -> usize {
        match status >> 4 {
            0xC | 0xD => 1,
            _ => 2,
        }
    }

    /// Decode from a channel status byte and its data bytes.
    ///
    /// `data` must hold exactly `data_len(status)` bytes in `0..=127`.
    /// Unless `pedantic` is set, a NoteOn with velocity 0 is folded into a
    /// NoteOff, as the two are equivalent on the wire.
    pub(crate) fn decode(status: u8, data: &[u8], pedantic: bool) -> ChannelMessage {
        match status >> 4 {
            0x8 => ChannelMessage::NoteOff {
                key: data[0],
                vel: data[1],
            },
            0x9 => {
                if data[1] == 0 && !pedantic {
                    ChannelMessage::NoteOff {
                        key: data[0],
                        vel: 0,
                    }
                } else {
                    ChannelMessage::NoteOn {
                        key: data[0],
                        vel: data[1],
                    }
                }
            }
            0xA => ChannelMessage::Aftertouch {
                key: data[0],
                vel: data[1],
            },
            0xB => ChannelMessage::Controller {
                controller: data[0],
                value: data[1],
            },
            0xC => ChannelMessage::ProgramChange { program: data[0] },
            0xD => ChannelMessage::ChannelAftertouch { vel: data[0] },
            0xE => ChannelMessage::PitchBend {
                bend: PitchBend::from_u16(data[0] as u16 | (data[1] as u16) << 7),
            },
            _ => unreachable!("not a channel status"),
        }
    }

    /// The status byte for this message on the given channel.
    pub(crate) fn status(&self, channel: u8) -> u8 {
        let nibble = match self {
            ChannelMessage::NoteOff { vel: 0, .. } => 0x9,
            ChannelMessage::NoteOff { .. } => 0x8,
            ChannelMessage::NoteOn { .. } => 0x9,
            ChannelMessage::Aftertouch { .. } => 0xA,
            ChannelMessage::Controller { .. } => 0xB,
            ChannelMessage::ProgramChange { .. } => 0xC,
            ChannelMessage::ChannelAftertouch { .. } => 0xD,
            ChannelMessage::PitchBend { .. } => 0xE,
        };
        nibble << 4 | (channel & 0xF)
    }

    /// The data bytes following the status byte, and how many are used.
    pub(crate) fn data(&self) -> ([u8; 2], usize) {
        match *self {
            ChannelMessage::NoteOff { key, vel: 0 } => ([key, 0], 2),
            ChannelMessage::NoteOff { key, vel } => ([key, vel], 2),
            ChannelMessage::NoteOn { key, vel } => ([key, vel], 2),
            ChannelMessage::Aftertouch { key, vel } => ([key, vel], 2),
            ChannelMessage::Controller { controller, value } => ([controller, value], 2),
            ChannelMessage::ProgramChange { program } => ([program, 0], 1),
            ChannelMessage::ChannelAftertouch { vel } => ([vel, 0], 1),
            ChannelMessage::PitchBend { bend } => {
                let bend = bend.as_u16();
                // Little-endian 7-bit order, contrasting with the big-endian
                // order of everything else in an SMF file.
                ([(bend & 0x7F) as u8, (bend >> 7) as u8], 2)
            }
        }
    }
}

impl fmt::Display for ChannelMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ChannelMessage::NoteOff { key, vel } => write!(f, "note off key {} vel {}", key, vel),
            ChannelMessage::NoteOn { key, vel } => write!(f, "note on key {} vel {}", key, vel),
            ChannelMessage::Aftertouch { key, vel } => {
                write!(f, "aftertouch key {} vel {}", key, vel)
            }
            ChannelMessage::Controller { controller, value } => {
                write!(f, "controller {} value {}", controller, value)
            }
            ChannelMessage::ProgramChange { program } => write!(f, "program change {}", program),
            ChannelMessage::ChannelAftertouch { vel } => write!(f, "channel aftertouch {}", vel),
            ChannelMessage::PitchBend { bend } => write!(f, "pitch bend {}", bend.as_i16()),
        }
    }
}

/// A pitch-bend value, stored as a signed offset in the range
/// `PitchBend::MIN ..= PitchBend::MAX` around the neutral position.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct PitchBend(pub i16);
impl PitchBend {
    /// The minimum value, indicating full bend downwards.
    pub const MIN: i16 = -0x2000;
    /// The middle value, indicating no bend.
    pub const MID: i16 = 0;
    /// The maximum value, indicating full bend upwards.
    pub const MAX: i16 = 0x1FFF;

    /// The value as an unsigned integer in `0..=0x3FFF`, where `0x2000` is
    /// the middle value. This is the form found on the wire.
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0.wrapping_sub(Self::MIN) as u16
    }

    /// The value as a signed integer in `-0x2000..=0x1FFF`, where `0` is the
    /// middle value.
    #[inline]
    pub const fn as_i16(&self) -> i16 {
        self.0
    }

    /// Convert from an unsigned integer in `0..=0x3FFF`, where `0x2000` is
    /// the middle value.
    #[inline]
    pub const fn from_u16(uint: u16) -> PitchBend {
        PitchBend((uint as i16).wrapping_add(Self::MIN))
    }

    /// Convert from a signed integer in `-0x2000..=0x1FFF`.
    #[inline]
    pub const fn from_i16(int: i16) -> PitchBend {
        PitchBend(int)
    }
}

/// A System Common message.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum SystemCommon {
    /// A system exclusive dump: the data bytes only, all in `0..=127`,
    /// without the `F0`/`F7` framing. Each transport adds its own framing.
    SysEx(Vec<u8>),
    /// One quarter frame of MIDI Time Code: the tag in the high nibble and
    /// the tag value in the low nibble.
    MtcQuarterFrame(u8),
    /// The number of MIDI beats (6 x MIDI clocks) elapsed since the start of
    /// the sequence, a 14-bit value.
    SongPosition(u16),
    /// Select a given song index.
    SongSelect(u8),
    /// Request analog synthesizers to tune their oscillators.
    TuneRequest,
    /// An undefined System Common status byte (`F4` or `F5`).
    Undefined(u8),
}

impl SystemCommon {
    /// Write the message in its live framing, status byte included.
    pub(crate) fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            SystemCommon::SysEx(data) => {
                out.write_all(&[0xF0])?;
                out.write_all(data)?;
                out.write_all(&[0xF7])?;
            }
            SystemCommon::MtcQuarterFrame(frame) => out.write_all(&[0xF1, frame & 0x7F])?,
            SystemCommon::SongPosition(pos) => {
                out.write_all(&[0xF2, (pos & 0x7F) as u8, ((pos >> 7) & 0x7F) as u8])?
            }
            SystemCommon::SongSelect(song) => out.write_all(&[0xF3, song & 0x7F])?,
            SystemCommon::TuneRequest => out.write_all(&[0xF6])?,
            SystemCommon::Undefined(status) => out.write_all(&[*status])?,
        }
        Ok(())
    }
}

impl fmt::Display for SystemCommon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SystemCommon::SysEx(data) => write!(f, "sysex ({} bytes)", data.len()),
            SystemCommon::MtcQuarterFrame(frame) => write!(f, "mtc quarter frame {}", frame),
            SystemCommon::SongPosition(pos) => write!(f, "song position {}", pos),
            SystemCommon::SongSelect(song) => write!(f, "song select {}", song),
            SystemCommon::TuneRequest => write!(f, "tune request"),
            SystemCommon::Undefined(status) => write!(f, "undefined system common {:#04X}", status),
        }
    }
}

/// A single-byte System Realtime message.
///
/// These messages are time-sensitive, get top priority, and may legally be
/// transmitted in between the bytes of other messages.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum SystemRealtime {
    /// If sent, they should be sent 24 times per quarter note.
    TimingClock,
    /// Request the receiver to start playing from the beginning.
    Start,
    /// Request the receiver to continue playing from where it stopped.
    Continue,
    /// Request the receiver to stop playing.
    Stop,
    /// Once one of these is transmitted, one should arrive every 300ms or
    /// else the connection is considered broken.
    ActiveSensing,
    /// Request the receiver to reset itself to the power-up state.
    Reset,
    /// One of the reserved realtime status bytes, `F9` or `FD`.
    Undefined(u8),
}

impl SystemRealtime {
    /// Create a system realtime message from its status byte.
    #[inline]
    pub fn new(status: u8) -> SystemRealtime {
        use SystemRealtime::*;
        match status {
            0xF8 => TimingClock,
            0xFA => Start,
            0xFB => Continue,
            0xFC => Stop,
            0xFE => ActiveSensing,
            0xFF => Reset,
            _ => Undefined(status),
        }
    }

    /// The status byte for this message.
    #[inline]
    pub fn encode(self) -> u8 {
        use SystemRealtime::*;
        match self {
            TimingClock => 0xF8,
            Start => 0xFA,
            Continue => 0xFB,
            Stop => 0xFC,
            ActiveSensing => 0xFE,
            Reset => 0xFF,
            Undefined(byte) => byte,
        }
    }
}

impl fmt::Display for SystemRealtime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SystemRealtime::TimingClock => write!(f, "timing clock"),
            SystemRealtime::Start => write!(f, "start"),
            SystemRealtime::Continue => write!(f, "continue"),
            SystemRealtime::Stop => write!(f, "stop"),
            SystemRealtime::ActiveSensing => write!(f, "active sensing"),
            SystemRealtime::Reset => write!(f, "reset"),
            SystemRealtime::Undefined(byte) => write!(f, "undefined realtime {:#04X}", byte),
        }
    }
}

/// A meta message, as defined by the SMF spec.
/// These carry metadata about the track: tempo, time signature, names,
/// copyright and so on.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum MetaMessage {
    /// For sequential SMF files an empty sequence number defaults to the
    /// track index.
    SequenceNumber(Option<u16>),
    /// Arbitrary text associated to a position in the file.
    Text(Vec<u8>),
    Copyright(Vec<u8>),
    TrackName(Vec<u8>),
    InstrumentName(Vec<u8>),
    Lyric(Vec<u8>),
    Marker(Vec<u8>),
    CuePoint(Vec<u8>),
    ProgramName(Vec<u8>),
    /// The name of the device or port this track is intended for.
    DevicePort(Vec<u8>),
    /// The MIDI channel the following meta messages are associated with.
    ChannelPrefix(u8),
    /// The MIDI port this track should be played on.
    PortPrefix(u8),
    /// Obligatory at track end.
    EndOfTrack,
    /// Microseconds per beat (quarter note).
    ///
    /// Usually appears at the beginning of the first track, but there are no
    /// guarantees, and the tempo may change along the song.
    Tempo(u32),
    /// The SMPTE time at which the track should start.
    SmpteOffset(SmpteTime),
    /// In order: numerator, denominator as a power of two, MIDI clocks per
    /// metronome click, and 32nd notes per quarter note.
    TimeSignature(u8, u8, u8, u8),
    KeySignature(KeySignature),
    /// An arbitrary blob intended for a specific sequencer, with the first
    /// few bytes identifying the sequencer.
    SequencerSpecific(Vec<u8>),
    /// An unknown meta message type with its raw payload.
    Unknown(u8, Vec<u8>),
}

impl MetaMessage {
    /// Decode a meta message from its type byte and complete payload.
    ///
    /// Payloads whose length contradicts the declared type are malformed;
    /// unknown type bytes are not errors and decode to [`MetaMessage::Unknown`].
    pub(crate) fn decode(typ: u8, data: Vec<u8>) -> Result<MetaMessage> {
        Ok(match typ {
            0x00 => match data.len() {
                0 => MetaMessage::SequenceNumber(None),
                2 => MetaMessage::SequenceNumber(Some(u16::from_be_bytes([data[0], data[1]]))),
                _ => return Err(Error::MalformedData("sequence number expected length 0 or 2")),
            },
            0x01 => MetaMessage::Text(data),
            0x02 => MetaMessage::Copyright(data),
            0x03 => MetaMessage::TrackName(data),
            0x04 => MetaMessage::InstrumentName(data),
            0x05 => MetaMessage::Lyric(data),
            0x06 => MetaMessage::Marker(data),
            0x07 => MetaMessage::CuePoint(data),
            0x08 => MetaMessage::ProgramName(data),
            0x09 => MetaMessage::DevicePort(data),
            0x20 => match data.len() {
                1 => MetaMessage::ChannelPrefix(data[0]),
                _ => return Err(Error::MalformedData("channel prefix expected length 1")),
            },
            0x21 => match data.len() {
                1 => MetaMessage::PortPrefix(data[0]),
                _ => return Err(Error::MalformedData("port prefix expected length 1")),
            },
            0x2F => match data.len() {
                0 => MetaMessage::EndOfTrack,
                _ => return Err(Error::MalformedData("end of track expected length 0")),
            },
            0x51 => match data.len() {
                3 => MetaMessage::Tempo(u32::from_be_bytes([0, data[0], data[1], data[2]])),
                _ => return Err(Error::MalformedData("tempo expected length 3")),
            },
            0x54 => match data.len() {
                5 => MetaMessage::SmpteOffset(SmpteTime::from_bytes(&data)?),
                _ => return Err(Error::MalformedData("smpte offset expected length 5")),
            },
            0x58 => match data.len() {
                4 => MetaMessage::TimeSignature(data[0], data[1], data[2], data[3]),
                _ => return Err(Error::MalformedData("time signature expected length 4")),
            },
            0x59 => match data.len() {
                2 => MetaMessage::KeySignature(KeySignature::from_sharps_flats(
                    data[0] as i8,
                    data[1] != 0,
                )),
                _ => return Err(Error::MalformedData("key signature expected length 2")),
            },
            0x7F => MetaMessage::SequencerSpecific(data),
            _ => MetaMessage::Unknown(typ, data),
        })
    }

    /// Write the type byte, length and payload. The leading `0xFF` status
    /// byte is the caller's responsibility.
    pub(crate) fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut write_msg = |typ: u8, data: &[u8]| -> Result<()> {
            out.write_all(&[typ])?;
            write_varlen(out, data.len() as u32)?;
            out.write_all(data)?;
            Ok(())
        };
        match self {
            MetaMessage::SequenceNumber(n) => match n {
                None => write_msg(0x00, &[]),
                Some(n) => write_msg(0x00, &n.to_be_bytes()[..]),
            },
            MetaMessage::Text(data) => write_msg(0x01, data),
            MetaMessage::Copyright(data) => write_msg(0x02, data),
            MetaMessage::TrackName(data) => write_msg(0x03, data),
            MetaMessage::InstrumentName(data) => write_msg(0x04, data),
            MetaMessage::Lyric(data) => write_msg(0x05, data),
            MetaMessage::Marker(data) => write_msg(0x06, data),
            MetaMessage::CuePoint(data) => write_msg(0x07, data),
            MetaMessage::ProgramName(data) => write_msg(0x08, data),
            MetaMessage::DevicePort(data) => write_msg(0x09, data),
            MetaMessage::ChannelPrefix(channel) => write_msg(0x20, &[*channel]),
            MetaMessage::PortPrefix(port) => write_msg(0x21, &[*port]),
            MetaMessage::EndOfTrack => write_msg(0x2F, &[]),
            MetaMessage::Tempo(micros_per_quarter) => {
                write_msg(0x51, &micros_per_quarter.to_be_bytes()[1..])
            }
            MetaMessage::SmpteOffset(time) => write_msg(0x54, &time.encode()[..]),
            MetaMessage::TimeSignature(num, den, clocks_per_click, notated_32nds) => {
                write_msg(0x58, &[*num, *den, *clocks_per_click, *notated_32nds])
            }
            MetaMessage::KeySignature(key) => {
                let (sf, mi) = key.sharps_flats();
                write_msg(0x59, &[sf as u8, mi])
            }
            MetaMessage::SequencerSpecific(data) => write_msg(0x7F, data),
            MetaMessage::Unknown(typ, data) => write_msg(*typ, data),
        }
    }
}

impl fmt::Display for MetaMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = |data: &[u8]| String::from_utf8_lossy(data).into_owned();
        match self {
            MetaMessage::SequenceNumber(None) => write!(f, "sequence number (default)"),
            MetaMessage::SequenceNumber(Some(n)) => write!(f, "sequence number {}", n),
            MetaMessage::Text(data) => write!(f, "text {:?}", text(data)),
            MetaMessage::Copyright(data) => write!(f, "copyright {:?}", text(data)),
            MetaMessage::TrackName(data) => write!(f, "track name {:?}", text(data)),
            MetaMessage::InstrumentName(data) => write!(f, "instrument name {:?}", text(data)),
            MetaMessage::Lyric(data) => write!(f, "lyric {:?}", text(data)),
            MetaMessage::Marker(data) => write!(f, "marker {:?}", text(data)),
            MetaMessage::CuePoint(data) => write!(f, "cue point {:?}", text(data)),
            MetaMessage::ProgramName(data) => write!(f, "program name {:?}", text(data)),
            MetaMessage::DevicePort(data) => write!(f, "device port {:?}", text(data)),
            MetaMessage::ChannelPrefix(channel) => write!(f, "channel prefix {}", channel),
            MetaMessage::PortPrefix(port) => write!(f, "port prefix {}", port),
            MetaMessage::EndOfTrack => write!(f, "end of track"),
            MetaMessage::Tempo(micros) => {
                write!(f, "tempo {} us/quarter ({:.1} bpm)", micros, tempo_to_bpm(*micros))
            }
            MetaMessage::SmpteOffset(time) => write!(
                f,
                "smpte offset {:02}:{:02}:{:02}",
                time.hour(),
                time.minute(),
                time.second()
            ),
            MetaMessage::TimeSignature(num, den, _, _) => {
                write!(f, "time signature {}/{}", num, 1u32 << (*den).min(31))
            }
            MetaMessage::KeySignature(key) => fmt::Display::fmt(key, f),
            MetaMessage::SequencerSpecific(data) => {
                write!(f, "sequencer specific ({} bytes)", data.len())
            }
            MetaMessage::Unknown(typ, data) => {
                write!(f, "unknown meta {:#04X} ({} bytes)", typ, data.len())
            }
        }
    }
}

/// Convert a tempo in microseconds per quarter note to beats per minute.
pub fn tempo_to_bpm(micros_per_quarter: u32) -> f64 {
    60_000_000.0 / micros_per_quarter.max(1) as f64
}

/// Convert beats per minute to microseconds per quarter note.
pub fn bpm_to_tempo(bpm: f64) -> u32 {
    (60_000_000.0 / bpm) as u32
}

/// A key signature, decoded from the raw `(sharps-or-flats, mode)` pair of
/// the key signature meta message.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct KeySignature {
    /// The key pitch class, `0` = C up to `11` = B.
    pub key: u8,
    /// Whether the scale is major or minor.
    pub is_major: bool,
    /// The number of accidentals in the signature, `0..=7`.
    pub num: u8,
    /// Whether the accidentals are flats rather than sharps.
    pub is_flat: bool,
}

impl KeySignature {
    /// Decode from the raw signature byte (positive counts sharps, negative
    /// counts flats) and mode (`false` major, `true` minor).
    ///
    /// The key is the signature's pitch class: seven semitones per sharp,
    /// minus three for the relative minor, reduced to an octave.
    pub fn from_sharps_flats(sf: i8, minor: bool) -> KeySignature {
        let mut tmp = sf as i32 * 7;
        if minor {
            tmp -= 3;
        }
        while tmp < 0 {
            tmp += 12;
        }
        KeySignature {
            key: (tmp % 12) as u8,
            is_major: !minor,
            num: sf.unsigned_abs(),
            is_flat: sf < 0,
        }
    }

    /// The raw `(sf, mi)` pair as stored in the meta message.
    pub fn sharps_flats(&self) -> (i8, u8) {
        let sf = if self.is_flat {
            -(self.num as i8)
        } else {
            self.num as i8
        };
        (sf, (!self.is_major) as u8)
    }

    /// The name of the key note, using the enharmonic spelling implied by
    /// the accidentals.
    pub fn note(&self) -> &'static str {
        match (self.key % 12, self.is_flat) {
            (0, _) => "C",
            (2, _) => "D",
            (4, _) => "E",
            (5, _) => "F",
            (7, _) => "G",
            (9, _) => "A",
            (11, _) => "B",
            (1, false) => "C♯",
            (1, true) => "D♭",
            (3, false) => "D♯",
            (3, true) => "E♭",
            (6, false) => "F♯",
            (6, true) => "G♭",
            (8, false) => "G♯",
            (8, true) => "A♭",
            (10, false) => "A♯",
            (10, true) => "B♭",
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_major {
            write!(f, "{} maj.", self.note())
        } else {
            write!(f, "{} min.", self.note())
        }
    }
}
