//! Reading and writing Standard MIDI Files, chunk by chunk.
//!
//! An SMF file is a sequence of chunks, each a 4-byte ASCII type, a 32-bit
//! big-endian length and a payload. The first chunk must be `MThd` with a
//! 6-byte body; track data lives in `MTrk` chunks as a stream of
//! `delta-time event` pairs. Both the reader and the writer here are
//! streaming: the reader pulls one event per call from an [`io::Read`]
//! source, the writer buffers one track body at a time and never seeks.

use std::io::{self, Read, Write};

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::message::{ChannelMessage, Message, MetaMessage, SystemCommon, SystemRealtime};
use crate::primitive::{
    read_exact, read_u16, read_u32, read_u8, read_varlen, try_read_u8, write_varlen, Format, Timing,
};
use crate::running::{RunningStatus, StatusKind};

/// The parsed contents of an `MThd` chunk.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Header {
    /// How the tracks of the file relate to each other.
    pub format: Format,
    /// The number of `MTrk` chunks the file declares. Authoritative: the
    /// reader stops after this many tracks.
    pub num_tracks: u16,
    /// How delta ticks translate to time.
    pub timing: Timing,
}

/// Where an event sits inside an SMF file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Position {
    /// Zero-based index of the track the event belongs to.
    pub track: u16,
    /// Delta ticks to the previous event in the same track.
    pub delta: u32,
    /// Ticks from the beginning of the track, the running sum of deltas.
    pub abs_time: u64,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum ReaderState {
    /// At the start of the file, expecting the `MThd` chunk.
    ExpectHeader,
    /// Between chunks. Anything other than `MTrk` is skippable.
    ExpectChunk,
    /// Inside an `MTrk` chunk, expecting a delta time and an event.
    ExpectTrackEvent,
    /// All declared tracks have been read.
    Done,
}

/// A streaming Standard MIDI File reader.
///
/// Events are pulled one at a time with [`read`](SmfReader::read); each
/// comes tagged with its [`Position`]. The header can be inspected up front
/// with [`read_header`](SmfReader::read_header), or left to the first
/// `read` call.
pub struct SmfReader<R> {
    src: R,
    state: ReaderState,
    running: RunningStatus,
    header: Option<Result<Header>>,
    num_tracks: u16,
    processed_tracks: u16,
    abs_track_time: u64,
    fail_on_unknown_chunks: bool,
    pedantic: bool,
}

impl<R: Read> SmfReader<R> {
    pub fn new(src: R) -> SmfReader<R> {
        SmfReader {
            src,
            state: ReaderState::ExpectHeader,
            running: RunningStatus::smf(),
            header: None,
            num_tracks: 0,
            processed_tracks: 0,
            abs_track_time: 0,
            fail_on_unknown_chunks: false,
            pedantic: false,
        }
    }

    /// Fail with [`Error::UnknownChunk`] on chunk types other than `MTrk`
    /// instead of skipping over them.
    pub fn fail_on_unknown_chunks(mut self, fail: bool) -> Self {
        self.fail_on_unknown_chunks = fail;
        self
    }

    /// Keep the NoteOn/NoteOff distinction for NoteOn messages with
    /// velocity 0 instead of folding them into NoteOff.
    pub fn pedantic_note_off(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }

    /// Read and cache the `MThd` header.
    ///
    /// Reading the header is implied by the first call to
    /// [`read`](SmfReader::read); calling this again afterwards (or calling
    /// it twice) returns the cached result without touching the source.
    pub fn read_header(&mut self) -> Result<Header> {
        if let Some(cached) = &self.header {
            trace!("header already read");
            return cached.clone();
        }
        let result = self.read_mthd();
        if let Ok(header) = &result {
            self.num_tracks = header.num_tracks;
            self.state = ReaderState::ExpectChunk;
        }
        self.header = Some(result.clone());
        result
    }

    fn read_mthd(&mut self) -> Result<Header> {
        let (typ, len) = self
            .read_chunk_head()?
            .ok_or(Error::UnexpectedEof("reading file header"))?;
        if &typ != b"MThd" {
            return Err(Error::UnexpectedChunkType(typ));
        }
        if len != 6 {
            return Err(Error::WrongHeaderLength(len));
        }
        let format = Format::from_bits(read_u16(&mut self.src, "reading header format")?)?;
        let num_tracks = read_u16(&mut self.src, "reading header track count")?;
        let timing = Timing::from_bits(read_u16(&mut self.src, "reading header division")?)?;
        let header = Header {
            format,
            num_tracks,
            timing,
        };
        debug!("read header: {:?}", header);
        Ok(header)
    }

    /// Read the next event.
    ///
    /// Returns `Ok(None)` once all tracks declared in the header have been
    /// read, or once the source ends cleanly at a chunk boundary.
    pub fn read(&mut self) -> Result<Option<(Position, Message)>> {
        loop {
            match self.state {
                ReaderState::ExpectHeader => {
                    self.read_header()?;
                }
                ReaderState::ExpectChunk => self.read_chunk()?,
                ReaderState::ExpectTrackEvent => return self.read_event(),
                ReaderState::Done => return Ok(None),
            }
        }
    }

    /// Read a chunk header and either enter the track or skip the chunk.
    /// A clean end of file here is the natural end of the stream.
    fn read_chunk(&mut self) -> Result<()> {
        let (typ, len) = match self.read_chunk_head()? {
            Some(head) => head,
            None => {
                debug!("end of file at chunk boundary");
                self.state = ReaderState::Done;
                return Ok(());
            }
        };
        if &typ == b"MTrk" {
            trace!("entering track {}", self.processed_tracks);
            self.state = ReaderState::ExpectTrackEvent;
            self.running.clear();
            self.abs_track_time = 0;
            return Ok(());
        }
        if self.fail_on_unknown_chunks {
            return Err(Error::UnknownChunk(typ));
        }
        debug!(
            "skipping unknown chunk {:?} of {} bytes",
            String::from_utf8_lossy(&typ),
            len
        );
        let skipped = io::copy(&mut (&mut self.src).take(len as u64), &mut io::sink())?;
        if skipped < len as u64 {
            return Err(Error::UnexpectedEof("skipping unknown chunk"));
        }
        Ok(())
    }

    fn read_chunk_head(&mut self) -> Result<Option<([u8; 4], u32)>> {
        let mut typ = [0u8; 4];
        // Only a clean end of file before the first byte is a valid stream
        // end; a truncated chunk header is not.
        typ[0] = match try_read_u8(&mut self.src)? {
            Some(byte) => byte,
            None => return Ok(None),
        };
        read_exact(&mut self.src, &mut typ[1..], "reading chunk type")?;
        let len = read_u32(&mut self.src, "reading chunk length")?;
        Ok(Some((typ, len)))
    }

    fn read_event(&mut self) -> Result<Option<(Position, Message)>> {
        if self.processed_tracks == self.num_tracks {
            debug!("last track has been read");
            self.state = ReaderState::Done;
            return Ok(None);
        }
        let delta = read_varlen(&mut self.src)?;
        self.abs_track_time += delta as u64;
        let pos = Position {
            track: self.processed_tracks,
            delta,
            abs_time: self.abs_track_time,
        };
        let canary = read_u8(&mut self.src, "reading event status")?;
        let msg = match self.running.read(canary)? {
            StatusKind::Channel(status) => self.read_channel(status, None)?,
            StatusKind::Running(status, first) => self.read_channel(status, Some(first))?,
            StatusKind::System(status) => self.read_system(status)?,
            StatusKind::Realtime(_) => unreachable!("smf tracker rejects realtime bytes"),
        };
        if let Message::Meta(MetaMessage::EndOfTrack) = msg {
            trace!("end of track {}", self.processed_tracks);
            self.processed_tracks += 1;
            self.state = ReaderState::ExpectChunk;
        }
        Ok(Some((pos, msg)))
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
            let byte = read_u8(&mut self.src, "reading event data")?;
            if byte >= 0x80 {
                return Err(Error::MalformedData("status byte inside event data"));
            }
            data[have] = byte;
            have += 1;
        }
        Ok(Message::Channel {
            channel: status & 0xF,
            msg: ChannelMessage::decode(status, &data[..len], self.pedantic),
        })
    }

    fn read_system(&mut self, status: u8) -> Result<Message> {
        match status {
            0xF0 => {
                let mut data = self.read_varlen_bytes()?;
                // The stored payload includes the closing F7.
                if data.last() == Some(&0xF7) {
                    data.pop();
                }
                Ok(Message::Common(SystemCommon::SysEx(data)))
            }
            0xF7 => Ok(decode_escape(self.read_varlen_bytes()?)),
            0xFF => {
                let typ = match read_u8(&mut self.src, "reading meta type") {
                    Ok(typ) => typ,
                    Err(Error::UnexpectedEof(_)) => {
                        return Err(Error::MalformedData("meta event missing its type byte"))
                    }
                    Err(err) => return Err(err),
                };
                let data = self.read_varlen_bytes()?;
                Ok(Message::Meta(MetaMessage::decode(typ, data)?))
            }
            _ => Err(Error::MalformedData(
                "system common status inside an smf track",
            )),
        }
    }

    fn read_varlen_bytes(&mut self) -> Result<Vec<u8>> {
        let len = read_varlen(&mut self.src)? as usize;
        let mut data = vec![0; len];
        read_exact(&mut self.src, &mut data, "reading event payload")?;
        Ok(data)
    }
}

/// Decode the payload of an `0xF7` escape event.
///
/// Escapes are used to freeze live-only messages into a file; a single
/// realtime byte decodes back to its message, anything else flows through
/// as unknown bytes.
fn decode_escape(data: Vec<u8>) -> Message {
    match data.as_slice() {
        &[byte @ 0xF8..=0xFF] => Message::Realtime(SystemRealtime::new(byte)),
        _ => Message::Unknown(data),
    }
}

/// A streaming Standard MIDI File writer.
///
/// Events are appended with [`write`](SmfWriter::write), preceded by
/// [`set_delta`](SmfWriter::set_delta) when the event does not land on the
/// same tick as the previous one. The current track body is buffered in
/// memory and flushed as an `MTrk` chunk when
/// [`MetaMessage::EndOfTrack`] is written, so the output sink never needs
/// to seek. Writing after the last declared track fails with
/// [`Error::FinishedAllTracks`].
pub struct SmfWriter<W> {
    out: W,
    header: Header,
    header_written: bool,
    track: Vec<u8>,
    running: RunningStatus,
    no_running_status: bool,
    delta: u32,
    tracks_processed: u16,
    error: Option<Error>,
}

impl<W: Write> SmfWriter<W> {
    /// Create a writer with the default header: format 0, one track, 960
    /// metrical ticks per quarter note.
    pub fn new(out: W) -> SmfWriter<W> {
        SmfWriter {
            out,
            header: Header {
                format: Format::SingleTrack,
                num_tracks: 1,
                timing: Timing::Metrical(960),
            },
            header_written: false,
            track: Vec::new(),
            running: RunningStatus::smf(),
            no_running_status: false,
            delta: 0,
            tracks_processed: 0,
            error: None,
        }
    }

    pub fn format(mut self, format: Format) -> Self {
        self.header.format = format;
        self
    }

    pub fn num_tracks(mut self, num_tracks: u16) -> Self {
        self.header.num_tracks = num_tracks;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.header.timing = timing;
        self
    }

    /// Always emit status bytes, even when running status would allow
    /// eliding them.
    pub fn no_running_status(mut self, no_running_status: bool) -> Self {
        self.no_running_status = no_running_status;
        self
    }

    /// The header this writer emits. A single-track format with more than
    /// one declared track is upgraded to the parallel format.
    pub fn header(&self) -> Header {
        let mut header = self.header;
        if header.num_tracks > 1 && header.format != Format::Sequential {
            header.format = Format::Parallel;
        }
        header
    }

    /// Write the `MThd` chunk. Implied by the first call to
    /// [`write`](SmfWriter::write); calling it again returns the sticky
    /// error state, if any.
    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return self.sticky();
        }
        self.header_written = true;
        let result = self.write_mthd();
        if let Err(err) = &result {
            self.error = Some(err.clone());
        }
        result
    }

    /// Set the delta time for the next event. Resets to 0 after each write.
    pub fn set_delta(&mut self, delta: u32) {
        self.delta = delta;
    }

    /// Append one event to the current track.
    ///
    /// Writing [`MetaMessage::EndOfTrack`] flushes the buffered track body
    /// as an `MTrk` chunk and starts the next track.
    pub fn write(&mut self, msg: &Message) -> Result<()> {
        // The delta is consumed even by failed writes.
        let delta = std::mem::replace(&mut self.delta, 0);
        if !self.header_written {
            self.write_header()?;
        }
        self.sticky()?;
        if self.tracks_processed == self.header().num_tracks {
            self.error = Some(Error::FinishedAllTracks);
            return Err(Error::FinishedAllTracks);
        }
        let result = self.append_event(delta, msg);
        if let Err(err) = &result {
            self.error = Some(err.clone());
            return result;
        }
        if let Message::Meta(MetaMessage::EndOfTrack) = msg {
            let result = self.flush_track();
            if let Err(err) = &result {
                self.error = Some(err.clone());
            }
            return result;
        }
        Ok(())
    }

    fn sticky(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn write_mthd(&mut self) -> Result<()> {
        let header = self.header();
        let mut chunk = [0u8; 14];
        chunk[0..4].copy_from_slice(b"MThd");
        chunk[4..8].copy_from_slice(&6u32.to_be_bytes());
        chunk[8..10].copy_from_slice(&header.format.as_bits().to_be_bytes());
        chunk[10..12].copy_from_slice(&header.num_tracks.to_be_bytes());
        chunk[12..14].copy_from_slice(&header.timing.encode());
        self.out.write_all(&chunk)?;
        debug!("wrote header: {:?}", header);
        Ok(())
    }

    fn append_event(&mut self, delta: u32, msg: &Message) -> Result<()> {
        write_varlen(&mut self.track, delta)?;
        match msg {
            Message::Channel { channel, msg } => {
                let status = msg.status(*channel);
                let emit_status = self.running.write(status) || self.no_running_status;
                if emit_status {
                    self.track.push(status);
                }
                let (data, len) = msg.data();
                self.track.extend_from_slice(&data[..len]);
            }
            Message::Common(SystemCommon::SysEx(data)) => {
                self.running.clear();
                // The length prefix covers the data and the closing F7.
                self.track.push(0xF0);
                write_varlen(&mut self.track, data.len() as u32 + 1)?;
                self.track.extend_from_slice(data);
                self.track.push(0xF7);
            }
            Message::Common(common) => {
                // Other system common messages are frozen as escapes.
                self.running.clear();
                let mut bytes = Vec::new();
                common.write(&mut bytes)?;
                self.write_escape(&bytes)?;
            }
            Message::Realtime(rt) => {
                // Escapes read back as status-clearing, so the tracker must
                // forget its status here even though live realtime would not.
                self.running.clear();
                self.write_escape(&[rt.encode()])?;
            }
            Message::Meta(meta) => {
                self.running.clear();
                self.track.push(0xFF);
                meta.write(&mut self.track)?;
            }
            Message::Unknown(data) => {
                self.running.clear();
                self.write_escape(data)?;
            }
        }
        Ok(())
    }

    fn write_escape(&mut self, bytes: &[u8]) -> Result<()> {
        self.track.push(0xF7);
        write_varlen(&mut self.track, bytes.len() as u32)?;
        self.track.extend_from_slice(bytes);
        Ok(())
    }

    fn flush_track(&mut self) -> Result<()> {
        let len = u32::try_from(self.track.len())
            .map_err(|_| Error::MalformedData("track chunk exceeds 32 bit length"))?;
        self.out.write_all(b"MTrk")?;
        self.out.write_all(&len.to_be_bytes())?;
        self.out.write_all(&self.track)?;
        self.track.clear();
        self.running.clear();
        self.delta = 0;
        self.tracks_processed += 1;
        debug!(
            "finished track {}/{}",
            self.tracks_processed,
            self.header().num_tracks
        );
        Ok(())
    }

    /// Access the underlying sink, flushing or otherwise.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }
}
