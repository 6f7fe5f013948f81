use std::cell::{Cell, RefCell};
use std::io::{self, Read};
use std::rc::Rc;

use crate::handler::HandlerBuilder;
use crate::live::{MidiReader, MidiWriter};
use crate::primitive::{read_varlen, write_varlen};
use crate::smf::{Header, SmfReader, SmfWriter};
use crate::{
    ChannelMessage, Error, Format, KeySignature, Message, MetaMessage, PitchBend, SmpteTime,
    SystemCommon, SystemRealtime, Timing,
};

fn note_on(channel: u8, key: u8, vel: u8) -> Message {
    Message::Channel {
        channel,
        msg: ChannelMessage::NoteOn { key, vel },
    }
}

fn note_off(channel: u8, key: u8) -> Message {
    Message::Channel {
        channel,
        msg: ChannelMessage::NoteOff { key, vel: 0 },
    }
}

/// Encode a message on a fresh live writer and decode it on a fresh live
/// reader, with both running-status trackers seeded empty.
fn live_round_trip(msg: &Message) -> Message {
    let mut bytes = Vec::new();
    let mut wr = MidiWriter::new(&mut bytes);
    wr.write(msg).unwrap();
    let mut rd = MidiReader::new(&bytes[..]);
    let back = rd.read().unwrap().expect("no message decoded");
    assert_eq!(rd.read().unwrap(), None, "leftover bytes after {:x?}", bytes);
    back
}

#[test]
fn live_round_trips() {
    let messages = [
        note_off(0, 30),
        Message::Channel {
            channel: 3,
            msg: ChannelMessage::NoteOff { key: 30, vel: 64 },
        },
        note_on(15, 127, 1),
        Message::Channel {
            channel: 1,
            msg: ChannelMessage::Aftertouch { key: 60, vel: 77 },
        },
        Message::Channel {
            channel: 2,
            msg: ChannelMessage::Controller {
                controller: 7,
                value: 100,
            },
        },
        Message::Channel {
            channel: 9,
            msg: ChannelMessage::ProgramChange { program: 42 },
        },
        Message::Channel {
            channel: 9,
            msg: ChannelMessage::ChannelAftertouch { vel: 5 },
        },
        Message::Channel {
            channel: 5,
            msg: ChannelMessage::PitchBend {
                bend: PitchBend::from_i16(-1234),
            },
        },
        Message::Common(SystemCommon::SysEx(vec![0x7D, 0x01, 0x02, 0x03])),
        Message::Common(SystemCommon::SysEx(vec![])),
        Message::Common(SystemCommon::MtcQuarterFrame(0x35)),
        Message::Common(SystemCommon::SongPosition(0x2000)),
        Message::Common(SystemCommon::SongSelect(12)),
        Message::Common(SystemCommon::TuneRequest),
    ];
    for msg in &messages {
        assert_eq!(&live_round_trip(msg), msg);
    }
}

#[test]
fn running_status_compression() {
    let mut bytes = Vec::new();
    let mut wr = MidiWriter::new(&mut bytes);
    wr.write(&note_on(0, 50, 33)).unwrap();
    wr.write(&note_off(0, 50)).unwrap();
    assert_eq!(bytes, [0x90, 0x32, 0x21, 0x32, 0x00]);

    let mut bytes = Vec::new();
    let mut wr = MidiWriter::new(&mut bytes).no_running_status(true);
    wr.write(&note_on(0, 50, 33)).unwrap();
    wr.write(&note_off(0, 50)).unwrap();
    assert_eq!(bytes, [0x90, 0x32, 0x21, 0x90, 0x32, 0x00]);
}

#[test]
fn system_common_cancels_running_status() {
    let mut bytes = Vec::new();
    let mut wr = MidiWriter::new(&mut bytes);
    wr.write(&note_on(0, 60, 100)).unwrap();
    wr.write(&Message::Common(SystemCommon::TuneRequest)).unwrap();
    wr.write(&note_on(0, 60, 100)).unwrap();
    assert_eq!(bytes, [0x90, 0x3C, 0x64, 0xF6, 0x90, 0x3C, 0x64]);
}

#[test]
fn realtime_does_not_touch_running_status() {
    let mut bytes = Vec::new();
    let mut wr = MidiWriter::new(&mut bytes);
    wr.write(&note_on(0, 60, 100)).unwrap();
    wr.write(&Message::Realtime(SystemRealtime::TimingClock))
        .unwrap();
    wr.write(&note_on(0, 61, 100)).unwrap();
    assert_eq!(bytes, [0x90, 0x3C, 0x64, 0xF8, 0x3D, 0x64]);
}

#[test]
fn meta_has_no_live_framing() {
    let mut wr = MidiWriter::new(Vec::<u8>::new());
    let err = wr
        .write(&Message::Meta(MetaMessage::EndOfTrack))
        .unwrap_err();
    assert!(matches!(err, Error::MalformedData(_)));
}

#[test]
fn realtime_interleaving() {
    // A timing clock wedged between the status and data bytes of a note-on.
    let wire = [0x90, 0xF8, 0x3C, 0x7F];
    let mut realtime = Vec::new();
    let mut messages = Vec::new();
    {
        let mut rd = MidiReader::with_realtime(&wire[..], |rt| realtime.push(rt));
        while let Some(msg) = rd.read().unwrap() {
            messages.push(msg);
        }
    }
    assert_eq!(messages, [note_on(0, 60, 127)]);
    assert_eq!(realtime, [SystemRealtime::TimingClock]);
}

#[test]
fn realtime_inside_sysex() {
    let wire = [0xF0, 0x01, 0x02, 0x03, 0xFE, 0xF7];
    let mut realtime = Vec::new();
    let mut messages = Vec::new();
    {
        let mut rd = MidiReader::with_realtime(&wire[..], |rt| realtime.push(rt));
        while let Some(msg) = rd.read().unwrap() {
            messages.push(msg);
        }
    }
    assert_eq!(
        messages,
        [Message::Common(SystemCommon::SysEx(vec![0x01, 0x02, 0x03]))]
    );
    assert_eq!(realtime, [SystemRealtime::ActiveSensing]);
}

#[test]
fn reserved_realtime_bytes_are_undefined() {
    let wire = [0xF9, 0xFD];
    let mut realtime = Vec::new();
    {
        let mut rd = MidiReader::with_realtime(&wire[..], |rt| realtime.push(rt));
        assert_eq!(rd.read().unwrap(), None);
    }
    assert_eq!(
        realtime,
        [
            SystemRealtime::Undefined(0xF9),
            SystemRealtime::Undefined(0xFD)
        ]
    );
}

#[test]
fn running_status_without_status_byte() {
    let mut rd = MidiReader::new(&[0x3C, 0x7F][..]);
    assert!(matches!(
        rd.read().unwrap_err(),
        Error::MalformedData("data byte without a running status")
    ));
}

#[test]
fn eof_mid_message() {
    let mut rd = MidiReader::new(&[0x90, 0x3C][..]);
    assert!(matches!(rd.read().unwrap_err(), Error::UnexpectedEof(_)));
}

#[test]
fn pedantic_note_off() {
    let wire = [0x95, 0x3C, 0x00];
    let mut rd = MidiReader::new(&wire[..]);
    assert_eq!(
        rd.read().unwrap().unwrap(),
        Message::Channel {
            channel: 5,
            msg: ChannelMessage::NoteOff { key: 0x3C, vel: 0 },
        }
    );
    let mut rd = MidiReader::new(&wire[..]).pedantic_note_off(true);
    assert_eq!(
        rd.read().unwrap().unwrap(),
        Message::Channel {
            channel: 5,
            msg: ChannelMessage::NoteOn { key: 0x3C, vel: 0 },
        }
    );
}

#[test]
fn pitch_bend_symmetry() {
    for v in [-8192i16, 0, 8191] {
        let biased = (v + 8192) as u16;
        let msg = Message::Channel {
            channel: 5,
            msg: ChannelMessage::PitchBend {
                bend: PitchBend::from_i16(v),
            },
        };
        assert_eq!(
            msg.raw(),
            [0xE5, (biased & 0x7F) as u8, ((biased >> 7) & 0x7F) as u8]
        );
        assert_eq!(live_round_trip(&msg), msg);
    }
}

#[test]
fn varlen_codec() {
    let cases: &[(u32, &[u8])] = &[
        (0x00000000, &[0x00]),
        (0x00000040, &[0x40]),
        (0x0000007F, &[0x7F]),
        (0x00000080, &[0x81, 0x00]),
        (0x00002000, &[0xC0, 0x00]),
        (0x00003FFF, &[0xFF, 0x7F]),
        (0x00004000, &[0x81, 0x80, 0x00]),
        (0x0FFFFFFF, &[0xFF, 0xFF, 0xFF, 0x7F]),
    ];
    for &(int, bytes) in cases {
        let mut out = Vec::new();
        write_varlen(&mut out, int).unwrap();
        assert_eq!(out, bytes, "encoding {:#x}", int);
        assert_eq!(read_varlen(&mut &bytes[..]).unwrap(), int);
    }
    assert!(matches!(
        read_varlen(&mut &[0xFF, 0xFF, 0xFF, 0xFF, 0x7F][..]),
        Err(Error::MalformedData(_))
    ));
    assert!(matches!(
        read_varlen(&mut &[0x81][..]),
        Err(Error::UnexpectedEof(_))
    ));
    assert!(matches!(
        write_varlen(&mut Vec::new(), 1 << 28),
        Err(Error::MalformedData(_))
    ));
}

/// The file from the SMF end-to-end scenario: format 0, 960 ticks per
/// quarter, one track with a note-on/note-off pair.
fn write_simple_file() -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut wr = SmfWriter::new(&mut bytes);
    wr.write(&note_on(2, 65, 90)).unwrap();
    wr.set_delta(2);
    wr.write(&note_off(2, 65)).unwrap();
    wr.write(&Message::Meta(MetaMessage::EndOfTrack)).unwrap();
    bytes
}

#[test]
fn smf_end_to_end() {
    let bytes = write_simple_file();
    let mut rd = SmfReader::new(&bytes[..]);
    let header = rd.read_header().unwrap();
    assert_eq!(
        header,
        Header {
            format: Format::SingleTrack,
            num_tracks: 1,
            timing: Timing::Metrical(960),
        }
    );
    let mut events = Vec::new();
    while let Some(ev) = rd.read().unwrap() {
        events.push(ev);
    }
    let (positions, messages): (Vec<_>, Vec<_>) = events.into_iter().unzip();
    assert_eq!(
        messages,
        [
            note_on(2, 65, 90),
            note_off(2, 65),
            Message::Meta(MetaMessage::EndOfTrack),
        ]
    );
    assert_eq!(
        positions.iter().map(|p| p.delta).collect::<Vec<_>>(),
        [0, 2, 0]
    );
    assert_eq!(
        positions.iter().map(|p| p.abs_time).collect::<Vec<_>>(),
        [0, 2, 2]
    );
    assert!(positions.iter().all(|p| p.track == 0));
}

#[test]
fn smf_exact_bytes() {
    let bytes = write_simple_file();
    let expected = [
        b'M', b'T', b'h', b'd', 0x00, 0x00, 0x00, 0x06, // header chunk
        0x00, 0x00, 0x00, 0x01, 0x03, 0xC0, // format 0, 1 track, 960 tpq
        b'M', b'T', b'r', b'k', 0x00, 0x00, 0x00, 0x0B, // track chunk
        0x00, 0x92, 0x41, 0x5A, // delta 0, note on
        0x02, 0x41, 0x00, // delta 2, note off with running status
        0x00, 0xFF, 0x2F, 0x00, // delta 0, end of track
    ];
    assert_eq!(bytes, expected);
}

#[test]
fn smf_meta_round_trip() {
    let smpte = SmpteTime::new(1, 2, 3, 4, 5, crate::Fps::Fps25).unwrap();
    let events = [
        Message::Meta(MetaMessage::SequenceNumber(Some(3))),
        Message::Meta(MetaMessage::SequenceNumber(None)),
        Message::Meta(MetaMessage::Text(b"some text".to_vec())),
        Message::Meta(MetaMessage::Copyright(b"(c) nobody".to_vec())),
        Message::Meta(MetaMessage::TrackName(b"lead".to_vec())),
        Message::Meta(MetaMessage::InstrumentName(b"piano".to_vec())),
        Message::Meta(MetaMessage::Lyric(b"la la".to_vec())),
        Message::Meta(MetaMessage::Marker(b"verse".to_vec())),
        Message::Meta(MetaMessage::CuePoint(b"cue".to_vec())),
        Message::Meta(MetaMessage::ProgramName(b"organ".to_vec())),
        Message::Meta(MetaMessage::DevicePort(b"port a".to_vec())),
        Message::Meta(MetaMessage::ChannelPrefix(4)),
        Message::Meta(MetaMessage::PortPrefix(1)),
        Message::Meta(MetaMessage::Tempo(500_000)),
        Message::Meta(MetaMessage::SmpteOffset(smpte)),
        Message::Meta(MetaMessage::TimeSignature(6, 3, 24, 8)),
        Message::Meta(MetaMessage::KeySignature(KeySignature::from_sharps_flats(
            -3, true,
        ))),
        Message::Meta(MetaMessage::SequencerSpecific(vec![0x7D, 1, 2])),
        Message::Meta(MetaMessage::Unknown(0x60, vec![9, 9])),
        Message::Common(SystemCommon::SysEx(vec![0x01, 0x02])),
        Message::Realtime(SystemRealtime::TimingClock),
        Message::Unknown(vec![0xF2, 0x10, 0x20]),
        Message::Meta(MetaMessage::EndOfTrack),
    ];
    let mut bytes = Vec::new();
    let mut wr = SmfWriter::new(&mut bytes);
    for ev in &events {
        wr.write(ev).unwrap();
    }
    let mut rd = SmfReader::new(&bytes[..]);
    let mut back = Vec::new();
    while let Some((_, msg)) = rd.read().unwrap() {
        back.push(msg);
    }
    assert_eq!(back, events);
}

fn header_bytes(division: [u8; 2]) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x00]); // format 0
    bytes.extend_from_slice(&[0x00, 0x00]); // no tracks
    bytes.extend_from_slice(&division);
    bytes
}

#[test]
fn division_parsing() {
    let bytes = header_bytes([0x00, 0x60]);
    let header = SmfReader::new(&bytes[..]).read_header().unwrap();
    assert_eq!(header.timing, Timing::Metrical(96));

    let bytes = header_bytes([0xE2, 0x50]);
    let header = SmfReader::new(&bytes[..]).read_header().unwrap();
    assert_eq!(header.timing, Timing::Timecode(crate::Fps::Fps30, 80));
    assert_eq!(header.timing.encode(), [0xE2, 0x50]);
}

#[test]
fn header_errors() {
    // Track chunk where the header should be.
    let mut bytes = b"MTrk".to_vec();
    bytes.extend_from_slice(&0u32.to_be_bytes());
    assert!(matches!(
        SmfReader::new(&bytes[..]).read_header().unwrap_err(),
        Error::UnexpectedChunkType(typ) if &typ == b"MTrk"
    ));

    // Header with the wrong body length.
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&7u32.to_be_bytes());
    bytes.extend_from_slice(&[0; 7]);
    assert!(matches!(
        SmfReader::new(&bytes[..]).read_header().unwrap_err(),
        Error::WrongHeaderLength(7)
    ));

    // Empty stream.
    assert!(matches!(
        SmfReader::new(&[][..]).read_header().unwrap_err(),
        Error::UnexpectedEof(_)
    ));
}

#[derive(Clone)]
struct CountingReader<R> {
    inner: R,
    reads: Rc<Cell<usize>>,
}
impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.set(self.reads.get() + 1);
        self.inner.read(buf)
    }
}

#[test]
fn read_header_is_idempotent() {
    let bytes = write_simple_file();
    let reads = Rc::new(Cell::new(0));
    let mut rd = SmfReader::new(CountingReader {
        inner: &bytes[..],
        reads: reads.clone(),
    });
    let first = rd.read_header().unwrap();
    let reads_after_first = reads.get();
    let second = rd.read_header().unwrap();
    assert_eq!(first, second);
    assert_eq!(reads.get(), reads_after_first, "second call re-read");

    // A failed header read is cached as well.
    let reads = Rc::new(Cell::new(0));
    let mut rd = SmfReader::new(CountingReader {
        inner: &b"JUNKJUNKJUNK"[..],
        reads: reads.clone(),
    });
    assert!(rd.read_header().is_err());
    let reads_after_first = reads.get();
    assert!(rd.read_header().is_err());
    assert!(rd.read().is_err());
    assert_eq!(reads.get(), reads_after_first, "cached error re-read");
}

#[test]
fn delta_accumulation() {
    let deltas = [0u32, 5, 0, 7, 3];
    let mut bytes = Vec::new();
    let mut wr = SmfWriter::new(&mut bytes)
        .num_tracks(2)
        .format(Format::Parallel);
    for track in 0u8..2 {
        for (i, &delta) in deltas.iter().enumerate() {
            wr.set_delta(delta);
            wr.write(&note_on(0, 60 + track + i as u8, 10)).unwrap();
        }
        wr.write(&Message::Meta(MetaMessage::EndOfTrack)).unwrap();
    }
    let mut rd = SmfReader::new(&bytes[..]);
    let mut sum = 0u64;
    while let Some((pos, msg)) = rd.read().unwrap() {
        sum += pos.delta as u64;
        assert_eq!(pos.abs_time, sum);
        if matches!(msg, Message::Meta(MetaMessage::EndOfTrack)) {
            sum = 0;
        }
    }
}

#[test]
fn multi_track_positions() {
    let mut bytes = Vec::new();
    let mut wr = SmfWriter::new(&mut bytes).num_tracks(2);
    wr.write(&note_on(0, 60, 10)).unwrap();
    wr.write(&Message::Meta(MetaMessage::EndOfTrack)).unwrap();
    wr.set_delta(4);
    wr.write(&note_on(1, 61, 10)).unwrap();
    wr.write(&Message::Meta(MetaMessage::EndOfTrack)).unwrap();

    let mut rd = SmfReader::new(&bytes[..]);
    // A single-track format with two tracks is upgraded on write.
    assert_eq!(rd.read_header().unwrap().format, Format::Parallel);
    let events: Vec<_> = std::iter::from_fn(|| rd.read().unwrap()).collect();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0].0.track, 0);
    assert_eq!(events[2].0.track, 1);
    assert_eq!(events[2].0.delta, 4);
    assert_eq!(events[2].0.abs_time, 4, "absolute time reset per track");
}

#[test]
fn unknown_chunks() {
    // An alien chunk wedged between the header and the track.
    let simple = write_simple_file();
    let mut bytes = simple[..14].to_vec();
    bytes.extend_from_slice(b"XFIL");
    bytes.extend_from_slice(&4u32.to_be_bytes());
    bytes.extend_from_slice(&[1, 2, 3, 4]);
    bytes.extend_from_slice(&simple[14..]);

    let mut rd = SmfReader::new(&bytes[..]);
    let mut count = 0;
    while rd.read().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 3, "events must survive the skipped chunk");

    let mut rd = SmfReader::new(&bytes[..]).fail_on_unknown_chunks(true);
    assert!(matches!(
        rd.read().unwrap_err(),
        Error::UnknownChunk(typ) if &typ == b"XFIL"
    ));

    // A skip that runs past the end of the file.
    let mut bytes = header_bytes([0x00, 0x60]);
    bytes.extend_from_slice(b"XFIL");
    bytes.extend_from_slice(&100u32.to_be_bytes());
    bytes.extend_from_slice(&[1, 2]);
    let mut rd = SmfReader::new(&bytes[..]);
    assert!(matches!(
        rd.read().unwrap_err(),
        Error::UnexpectedEof("skipping unknown chunk")
    ));
}

#[test]
fn escape_between_channel_messages() {
    // The escape framing clears running status on the read side, so the
    // writer must re-emit the status byte afterwards.
    let mut bytes = Vec::new();
    let mut wr = SmfWriter::new(&mut bytes);
    wr.write(&note_on(0, 60, 10)).unwrap();
    wr.write(&Message::Realtime(SystemRealtime::TimingClock))
        .unwrap();
    wr.write(&note_on(0, 61, 10)).unwrap();
    wr.write(&Message::Meta(MetaMessage::EndOfTrack)).unwrap();

    let mut rd = SmfReader::new(&bytes[..]);
    let mut back = Vec::new();
    while let Some((_, msg)) = rd.read().unwrap() {
        back.push(msg);
    }
    assert_eq!(
        back,
        [
            note_on(0, 60, 10),
            Message::Realtime(SystemRealtime::TimingClock),
            note_on(0, 61, 10),
            Message::Meta(MetaMessage::EndOfTrack),
        ]
    );
}

#[test]
fn realtime_canary_in_smf() {
    // Corrupt the note-on status into a timing clock.
    let mut bytes = write_simple_file();
    bytes[23] = 0xF8;
    let mut rd = SmfReader::new(&bytes[..]);
    assert!(matches!(
        rd.read().unwrap_err(),
        Error::MalformedData("realtime status inside an smf track")
    ));
}

#[test]
fn finished_all_tracks() {
    let mut bytes = Vec::new();
    let mut wr = SmfWriter::new(&mut bytes);
    wr.write(&Message::Meta(MetaMessage::EndOfTrack)).unwrap();
    assert!(matches!(
        wr.write(&note_on(0, 60, 10)).unwrap_err(),
        Error::FinishedAllTracks
    ));
    // The error is sticky.
    assert!(matches!(
        wr.write(&note_on(0, 60, 10)).unwrap_err(),
        Error::FinishedAllTracks
    ));
}

#[test]
fn extra_tracks_beyond_declared_count_are_ignored() {
    let bytes = write_simple_file();
    let mut doubled = bytes.clone();
    // Append a second MTrk chunk; the header still declares one track.
    doubled.extend_from_slice(&bytes[14..]);
    let mut rd = SmfReader::new(&doubled[..]);
    let mut count = 0;
    while rd.read().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 3);
}

#[test]
fn unknown_meta_flows_through() {
    let data = vec![1, 2, 3];
    let msg = MetaMessage::decode(0x42, data.clone()).unwrap();
    assert_eq!(msg, MetaMessage::Unknown(0x42, data));
}

#[test]
fn meta_length_mismatch_is_malformed() {
    assert!(matches!(
        MetaMessage::decode(0x59, vec![1]),
        Err(Error::MalformedData("key signature expected length 2"))
    ));
    assert!(matches!(
        MetaMessage::decode(0x51, vec![1, 2]),
        Err(Error::MalformedData("tempo expected length 3"))
    ));
}

#[test]
fn key_signature_derivation() {
    // Three flats, minor: C minor.
    let key = KeySignature::from_sharps_flats(-3, true);
    assert_eq!(
        key,
        KeySignature {
            key: 0,
            is_major: false,
            num: 3,
            is_flat: true,
        }
    );
    assert_eq!(key.sharps_flats(), (-3, 1));
    assert_eq!(key.to_string(), "C min.");

    // Six flats, minor: E-flat minor.
    let key = KeySignature::from_sharps_flats(-6, true);
    assert_eq!(key.key, 3);
    assert_eq!(key.to_string(), "E♭ min.");

    // Three sharps, major: A major.
    let key = KeySignature::from_sharps_flats(3, false);
    assert_eq!(key.key, 9);
    assert_eq!(key.sharps_flats(), (3, 0));
    assert_eq!(key.to_string(), "A maj.");

    // Raw decode of FF 59 02 FD 01.
    assert_eq!(
        MetaMessage::decode(0x59, vec![0xFD, 0x01]).unwrap(),
        MetaMessage::KeySignature(KeySignature::from_sharps_flats(-3, true))
    );
}

#[test]
fn tempo_conversion() {
    assert_eq!(crate::tempo_to_bpm(500_000), 120.0);
    assert_eq!(crate::bpm_to_tempo(120.0), 500_000);
    assert_eq!(
        Timing::Metrical(960).duration_of(960, 500_000),
        std::time::Duration::from_millis(500)
    );
}

#[test]
fn handler_reads_smf() {
    let bytes = write_simple_file();
    let channel_events = RefCell::new(Vec::new());
    let metas = Cell::new(0);
    let every = Cell::new(0);
    let headers = RefCell::new(Vec::new());
    let mut handler = HandlerBuilder::new()
        .no_log()
        .on_header(|header| headers.borrow_mut().push(*header))
        .on_channel(|pos, channel, msg| {
            let pos = pos.expect("smf events carry a position");
            channel_events.borrow_mut().push((pos.delta, channel, *msg));
        })
        .on_meta(|pos, _| {
            assert!(pos.is_some());
            metas.set(metas.get() + 1);
        })
        .on_each(|_, _| every.set(every.get() + 1))
        .build();
    handler.read_smf(&bytes[..]).unwrap();
    assert_eq!(
        &*channel_events.borrow(),
        &[
            (0, 2, ChannelMessage::NoteOn { key: 65, vel: 90 }),
            (2, 2, ChannelMessage::NoteOff { key: 65, vel: 0 }),
        ]
    );
    assert_eq!(metas.get(), 1);
    assert_eq!(every.get(), 3);
    assert_eq!(headers.borrow().len(), 1);
    assert_eq!(headers.borrow()[0].num_tracks, 1);
}

#[test]
fn handler_reads_live_with_realtime() {
    let mut wire = Vec::new();
    {
        let mut wr = MidiWriter::new(&mut wire);
        wr.write(&note_on(2, 65, 90)).unwrap();
        wr.write(&Message::Realtime(SystemRealtime::Reset)).unwrap();
        wr.write(&note_off(2, 65)).unwrap();
    }
    let channel_events = Cell::new(0);
    let realtime = RefCell::new(Vec::new());
    let mut handler = HandlerBuilder::new()
        .no_log()
        .on_channel(|pos, _, _| {
            assert!(pos.is_none(), "live events carry no position");
            channel_events.set(channel_events.get() + 1);
        })
        .on_realtime(|rt| realtime.borrow_mut().push(rt))
        .build();
    handler.read_live(&wire[..]).unwrap();
    assert_eq!(channel_events.get(), 2);
    assert_eq!(&*realtime.borrow(), &[SystemRealtime::Reset]);
}

#[test]
fn message_display() {
    assert_eq!(note_on(2, 65, 90).to_string(), "ch2 note on key 65 vel 90");
    assert_eq!(
        Message::Meta(MetaMessage::Tempo(500_000)).to_string(),
        "tempo 500000 us/quarter (120.0 bpm)"
    );
    assert_eq!(
        Message::Realtime(SystemRealtime::TimingClock).to_string(),
        "timing clock"
    );
}
