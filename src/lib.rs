//! # Overview
//!
//! `midiwire` reads and writes MIDI byte streams in their two transport
//! envelopes: the **live wire**, a continuous stream of status and data
//! bytes as delivered by hardware or virtual ports, and the **Standard MIDI
//! File** (`.mid`), a chunked serialization with variable-length delta
//! times. Both share one message model, one running-status state machine
//! and one set of byte-level codecs; the crate is untimed and caller-driven
//! throughout, so any `io::Read`/`io::Write` pair will do.
//!
//! # Reading and writing a file
//!
//! ```rust
//! use midiwire::{
//!     smf::{SmfReader, SmfWriter},
//!     ChannelMessage, Message, MetaMessage,
//! };
//!
//! // Write a one-track file into memory.
//! let mut bytes = Vec::new();
//! let mut wr = SmfWriter::new(&mut bytes);
//! wr.write(&Message::Channel {
//!     channel: 2,
//!     msg: ChannelMessage::NoteOn { key: 65, vel: 90 },
//! })?;
//! wr.set_delta(2);
//! wr.write(&Message::Channel {
//!     channel: 2,
//!     msg: ChannelMessage::NoteOff { key: 65, vel: 0 },
//! })?;
//! wr.write(&Message::Meta(MetaMessage::EndOfTrack))?;
//!
//! // Read it back, event by event.
//! let mut rd = SmfReader::new(&bytes[..]);
//! while let Some((pos, msg)) = rd.read()? {
//!     println!("track {} tick {}: {}", pos.track, pos.abs_time, msg);
//! }
//! # Ok::<(), midiwire::Error>(())
//! ```
//!
//! # Reading a live stream
//!
//! Realtime bytes may interrupt other messages on a live wire, so the live
//! reader takes a side channel for them:
//!
//! ```rust
//! use midiwire::live::MidiReader;
//!
//! // A note-on with a timing clock wedged between its data bytes.
//! let wire = [0x90, 0xF8, 0x3C, 0x7F];
//! let mut rd = MidiReader::with_realtime(&wire[..], |rt| println!("realtime: {}", rt));
//! while let Some(msg) = rd.read()? {
//!     println!("{}", msg);
//! }
//! # Ok::<(), midiwire::Error>(())
//! ```
//!
//! # Dispatching with callbacks
//!
//! The [`handler`] module routes decoded messages to per-kind callbacks,
//! for when matching on [`Message`] at every call site is too noisy.

/// All of the errors this crate produces.
mod error;
/// The message model and its byte-level codec.
mod message;
/// Simple building-block data that can be read in one go.
mod primitive;
/// The running-status state machine shared by both transports.
mod running;

/// High-level dispatch of decoded messages to per-kind callbacks.
pub mod handler;
/// Reading and writing live MIDI wire streams.
pub mod live;
/// Reading and writing Standard MIDI Files.
pub mod smf;

pub use crate::{
    error::{Error, Result},
    message::{
        bpm_to_tempo, tempo_to_bpm, ChannelMessage, KeySignature, Message, MetaMessage, PitchBend,
        SystemCommon, SystemRealtime,
    },
    primitive::{Format, Fps, SmpteTime, Timing},
};

#[cfg(test)]
mod test;
