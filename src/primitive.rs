//! Simple building-block data that can be read in one go: fixed-size
//! big-endian integers, variable-length quantities, and the SMF header
//! fields built out of them.

use std::io::{self, Read, Write};
use std::time::Duration;

use crate::error::{Error, Result};

/// Read a single byte, mapping a clean end of stream to `None`.
pub(crate) fn try_read_u8<R: Read>(src: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match src.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

/// Read a single byte that must be present.
pub(crate) fn read_u8<R: Read>(src: &mut R, what: &'static str) -> Result<u8> {
    try_read_u8(src)?.ok_or(Error::UnexpectedEof(what))
}

pub(crate) fn read_exact<R: Read>(src: &mut R, buf: &mut [u8], what: &'static str) -> Result<()> {
    src.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::UnexpectedEof(what),
        _ => Error::from(err),
    })
}

pub(crate) fn read_u16<R: Read>(src: &mut R, what: &'static str) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(src, &mut buf, what)?;
    Ok(u16::from_be_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(src: &mut R, what: &'static str) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(src, &mut buf, what)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a variable-length quantity: up to 4 bytes of 7 data bits each, with
/// the top bit flagging continuation.
pub(crate) fn read_varlen<R: Read>(src: &mut R) -> Result<u32> {
    let mut int: u32 = 0;
    for _ in 0..4 {
        let byte = read_u8(src, "reading varlen integer")?;
        int <<= 7;
        int |= (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok(int);
        }
    }
    Err(Error::MalformedData("varlen integer larger than 4 bytes"))
}

/// Write a variable-length quantity, using the fewest bytes that hold it.
pub(crate) fn write_varlen<W: Write>(out: &mut W, int: u32) -> Result<()> {
    if int >= 1 << 28 {
        return Err(Error::MalformedData("varlen integer exceeds 28 bits"));
    }
    let mut skipping = true;
    for i in (0..4).rev() {
        let byte = ((int >> (i * 7)) & 0x7F) as u8;
        if skipping && byte == 0 && i != 0 {
            // Skip leading zeros
        } else {
            skipping = false;
            if i == 0 {
                out.write_all(&[byte])?;
            } else {
                out.write_all(&[byte | 0x80])?;
            }
        }
    }
    Ok(())
}

/// The different formats an SMF file can have, as declared in its header.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Format {
    /// The file contains a single track.
    SingleTrack,
    /// The file contains several tracks meant to be played simultaneously.
    ///
    /// Usually the first track carries tempo and other song metadata.
    Parallel,
    /// The file contains several independent tracks, each a separate song.
    Sequential,
}
impl Format {
    pub(crate) fn from_bits(bits: u16) -> Result<Format> {
        Ok(match bits {
            0 => Format::SingleTrack,
            1 => Format::Parallel,
            2 => Format::Sequential,
            _ => return Err(Error::MalformedData("invalid smf format")),
        })
    }

    pub(crate) fn as_bits(&self) -> u16 {
        *self as u8 as u16
    }
}

/// A frame rate from the set of SMPTE rates the MIDI spec allows.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Fps {
    /// 24 frames per second.
    Fps24,
    /// 25 frames per second.
    Fps25,
    /// `29.97 = 30 / 1.001` frames per second (30 drop frame).
    Fps29,
    /// 30 frames per second.
    Fps30,
}
impl Fps {
    /// Direct transformation (ie. `24 -> Fps24`).
    pub fn from_u8(raw: u8) -> Option<Fps> {
        Some(match raw {
            24 => Fps::Fps24,
            25 => Fps::Fps25,
            29 => Fps::Fps29,
            30 => Fps::Fps30,
            _ => return None,
        })
    }

    /// The nominal integer rate (`29.97` is reported as `29`).
    pub fn as_u8(self) -> u8 {
        match self {
            Fps::Fps24 => 24,
            Fps::Fps25 => 25,
            Fps::Fps29 => 29,
            Fps::Fps30 => 30,
        }
    }

    /// The exact rate.
    pub fn as_f32(self) -> f32 {
        match self {
            Fps::Fps24 => 24.0,
            Fps::Fps25 => 25.0,
            Fps::Fps29 => 30.0 / 1.001,
            Fps::Fps30 => 30.0,
        }
    }

    /// Transformation from the 2-bit code used inside SMPTE hour bytes.
    pub(crate) fn from_code(code: u8) -> Fps {
        match code & 0b11 {
            0 => Fps::Fps24,
            1 => Fps::Fps25,
            2 => Fps::Fps29,
            _ => Fps::Fps30,
        }
    }

    pub(crate) fn as_code(self) -> u8 {
        match self {
            Fps::Fps24 => 0,
            Fps::Fps25 => 1,
            Fps::Fps29 => 2,
            Fps::Fps30 => 3,
        }
    }
}

/// The meaning of delta ticks in an SMF file.
/// Time is counted either in ticks per quarter note or in ticks per second.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Timing {
    /// Ticks per quarter note, a 15-bit value.
    ///
    /// The wall-clock length of a quarter note comes from the tempo meta
    /// messages within the file, so on its own this value fixes no timing.
    Metrical(u16),
    /// SMPTE frames per second and ticks per frame.
    /// The length of a tick is `1 / fps / subframes` seconds.
    Timecode(Fps, u8),
}
impl Timing {
    /// Decode the 16-bit `division` field of an SMF header.
    ///
    /// Bit 15 selects the time format: clear for metrical ticks, set for
    /// timecode with the negated frame rate stored in two's complement in
    /// bits 8 to 14.
    pub(crate) fn from_bits(raw: u16) -> Result<Timing> {
        if raw & 0x8000 != 0 {
            let fps = -(((raw >> 8) as u8 as i8) as i32);
            let subframes = (raw & 0xFF) as u8;
            let fps = Fps::from_u8(fps as u8).ok_or(Error::MalformedData("invalid smpte fps"))?;
            Ok(Timing::Timecode(fps, subframes))
        } else {
            Ok(Timing::Metrical(raw))
        }
    }

    pub(crate) fn encode(&self) -> [u8; 2] {
        match *self {
            // Bit 15 must stay clear, so tick counts cap at 32767.
            Timing::Metrical(ticks) => ticks.min(0x7FFF).to_be_bytes(),
            Timing::Timecode(fps, subframes) => [(-(fps.as_u8() as i8)) as u8, subframes],
        }
    }

    /// The wall-clock length of `delta` ticks.
    ///
    /// For metrical timing the current tempo (in microseconds per quarter
    /// note) must be supplied; for timecode timing it is ignored, since a
    /// tick is a fixed fraction of a second.
    pub fn duration_of(&self, delta: u32, micros_per_quarter: u32) -> Duration {
        match *self {
            Timing::Metrical(ticks) => {
                let nanos =
                    delta as u64 * micros_per_quarter as u64 * 1_000 / ticks.max(1) as u64;
                Duration::from_nanos(nanos)
            }
            Timing::Timecode(fps, subframes) => {
                let ticks_per_sec = fps.as_f32() as f64 * subframes.max(1) as f64;
                Duration::from_secs_f64(delta as f64 / ticks_per_sec)
            }
        }
    }
}

/// Encodes an SMPTE time of day, as carried by the SMPTE offset meta message.
///
/// Enforces several guarantees:
/// `hour` is inside `[0, 23]`,
/// `minute` and `second` are inside `[0, 59]`,
/// `frame` is inside `[0, fps)`,
/// `subframe` is inside `[0, 99]`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct SmpteTime {
    hour: u8,
    minute: u8,
    second: u8,
    frame: u8,
    subframe: u8,
    fps: Fps,
}
impl SmpteTime {
    pub fn new(
        hour: u8,
        minute: u8,
        second: u8,
        frame: u8,
        subframe: u8,
        fps: Fps,
    ) -> Option<SmpteTime> {
        if hour >= 24 || minute >= 60 || second >= 60 || frame >= fps.as_u8() || subframe >= 100 {
            return None;
        }
        Some(SmpteTime {
            hour,
            minute,
            second,
            frame,
            subframe,
            fps,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }
    pub fn minute(&self) -> u8 {
        self.minute
    }
    pub fn second(&self) -> u8 {
        self.second
    }
    pub fn frame(&self) -> u8 {
        self.frame
    }
    pub fn subframe(&self) -> u8 {
        self.subframe
    }
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Decode from the 5 bytes of an SMPTE offset meta message.
    /// The frame rate lives in bits 5 and 6 of the hour byte.
    pub(crate) fn from_bytes(data: &[u8]) -> Result<SmpteTime> {
        let fps = Fps::from_code(data[0] >> 5);
        let hour = data[0] & 0b11111;
        SmpteTime::new(hour, data[1], data[2], data[3], data[4], fps)
            .ok_or(Error::MalformedData("invalid smpte time"))
    }

    pub(crate) fn encode(&self) -> [u8; 5] {
        [
            self.hour | (self.fps.as_code() << 5),
            self.minute,
            self.second,
            self.frame,
            self.subframe,
        ]
    }
}
