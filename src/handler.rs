//! High-level dispatch of decoded messages to per-kind callbacks.
//!
//! A [`Handler`] owns one optional sink per message kind. Configuration is
//! two-phase: attach the callbacks on a [`HandlerBuilder`], then seal it
//! with [`build`](HandlerBuilder::build) and drive a whole stream with
//! [`read_live`](Handler::read_live) or [`read_smf`](Handler::read_smf).
//! Sinks cannot change once reading has begun.
//!
//! When reading an SMF file each sink receives the event [`Position`]; live
//! data carries no position. Realtime messages never block the decode of
//! the message they interrupted: they pass through a bounded mailbox and
//! are delivered, in stream order, once the surrounding message is done.

use std::io::Read;

use crossbeam_channel::{bounded, Receiver};
use log::debug;

use crate::error::Result;
use crate::live::MidiReader;
use crate::message::{ChannelMessage, Message, MetaMessage, SystemCommon, SystemRealtime};
use crate::smf::{Header, Position, SmfReader};

/// How many realtime messages may pile up while one long message (a large
/// sysex dump, say) is being decoded.
const REALTIME_MAILBOX_DEPTH: usize = 16;

type ChannelSink<'a> = Box<dyn FnMut(Option<&Position>, u8, &ChannelMessage) + 'a>;
type CommonSink<'a> = Box<dyn FnMut(Option<&Position>, &SystemCommon) + 'a>;
type RealtimeSink<'a> = Box<dyn FnMut(SystemRealtime) + 'a>;
type MetaSink<'a> = Box<dyn FnMut(Option<&Position>, &MetaMessage) + 'a>;
type UnknownSink<'a> = Box<dyn FnMut(Option<&Position>, &[u8]) + 'a>;
type EachSink<'a> = Box<dyn FnMut(Option<&Position>, &Message) + 'a>;
type HeaderSink<'a> = Box<dyn FnMut(&Header) + 'a>;

/// Configures a [`Handler`]. Attach only the sinks you care about;
/// everything else flows by unobserved.
#[derive(Default)]
pub struct HandlerBuilder<'a> {
    channel: Option<ChannelSink<'a>>,
    common: Option<CommonSink<'a>>,
    realtime: Option<RealtimeSink<'a>>,
    meta: Option<MetaSink<'a>>,
    unknown: Option<UnknownSink<'a>>,
    each: Option<EachSink<'a>>,
    header: Option<HeaderSink<'a>>,
    log_events: bool,
}

impl<'a> HandlerBuilder<'a> {
    pub fn new() -> HandlerBuilder<'a> {
        HandlerBuilder {
            log_events: true,
            ..HandlerBuilder::default()
        }
    }

    /// Disable the default per-event debug logging.
    pub fn no_log(mut self) -> Self {
        self.log_events = false;
        self
    }

    /// Called for every channel voice message, with its channel.
    pub fn on_channel(
        mut self,
        f: impl FnMut(Option<&Position>, u8, &ChannelMessage) + 'a,
    ) -> Self {
        self.channel = Some(Box::new(f));
        self
    }

    /// Called for every System Common message, sysex dumps included.
    pub fn on_common(mut self, f: impl FnMut(Option<&Position>, &SystemCommon) + 'a) -> Self {
        self.common = Some(Box::new(f));
        self
    }

    /// Called for every System Realtime message. Realtime carries no
    /// position, even in a file.
    pub fn on_realtime(mut self, f: impl FnMut(SystemRealtime) + 'a) -> Self {
        self.realtime = Some(Box::new(f));
        self
    }

    /// Called for every meta message.
    pub fn on_meta(mut self, f: impl FnMut(Option<&Position>, &MetaMessage) + 'a) -> Self {
        self.meta = Some(Box::new(f));
        self
    }

    /// Called for unrecognized but syntactically framed bytes.
    pub fn on_unknown(mut self, f: impl FnMut(Option<&Position>, &[u8]) + 'a) -> Self {
        self.unknown = Some(Box::new(f));
        self
    }

    /// Called for every message, in addition to its kind-specific sink.
    pub fn on_each(mut self, f: impl FnMut(Option<&Position>, &Message) + 'a) -> Self {
        self.each = Some(Box::new(f));
        self
    }

    /// Called once with the SMF header when reading a file.
    pub fn on_header(mut self, f: impl FnMut(&Header) + 'a) -> Self {
        self.header = Some(Box::new(f));
        self
    }

    /// Seal the configuration into a [`Handler`].
    pub fn build(self) -> Handler<'a> {
        Handler {
            channel: self.channel,
            common: self.common,
            realtime: self.realtime,
            meta: self.meta,
            unknown: self.unknown,
            each: self.each,
            header: self.header,
            log_events: self.log_events,
        }
    }
}

/// Routes decoded messages to the sinks configured on its builder.
pub struct Handler<'a> {
    channel: Option<ChannelSink<'a>>,
    common: Option<CommonSink<'a>>,
    realtime: Option<RealtimeSink<'a>>,
    meta: Option<MetaSink<'a>>,
    unknown: Option<UnknownSink<'a>>,
    each: Option<EachSink<'a>>,
    header: Option<HeaderSink<'a>>,
    log_events: bool,
}

impl<'a> Handler<'a> {
    /// Read live wire data until the source is exhausted, dispatching every
    /// message. Sinks receive no position.
    pub fn read_live<R: Read>(&mut self, src: R) -> Result<()> {
        let (tx, rx) = bounded(REALTIME_MAILBOX_DEPTH);
        let overflow = rx.clone();
        let mut rd = MidiReader::with_realtime(src, move |rt| {
            // A stalled consumer drops the oldest message rather than
            // blocking the decode.
            if tx.is_full() {
                let _ = overflow.try_recv();
            }
            let _ = tx.try_send(rt);
        });
        loop {
            let msg = match rd.read() {
                Ok(msg) => msg,
                Err(err) => {
                    self.drain_realtime(&rx);
                    return Err(err);
                }
            };
            self.drain_realtime(&rx);
            match msg {
                Some(msg) => self.dispatch(None, &msg),
                None => return Ok(()),
            }
        }
    }

    /// Read an SMF file to its natural end, dispatching every event with
    /// its position.
    pub fn read_smf<R: Read>(&mut self, src: R) -> Result<()> {
        let mut rd = SmfReader::new(src);
        let header = rd.read_header()?;
        if self.log_events {
            debug!("{:?}", header);
        }
        if let Some(f) = &mut self.header {
            f(&header);
        }
        while let Some((pos, msg)) = rd.read()? {
            self.dispatch(Some(&pos), &msg);
        }
        Ok(())
    }

    fn drain_realtime(&mut self, rx: &Receiver<SystemRealtime>) {
        while let Ok(rt) = rx.try_recv() {
            self.dispatch_realtime(rt);
        }
    }

    fn dispatch(&mut self, pos: Option<&Position>, msg: &Message) {
        if self.log_events {
            match pos {
                Some(p) => debug!("#{} [{} d:{}] {}", p.track, p.abs_time, p.delta, msg),
                None => debug!("{}", msg),
            }
        }
        if let Some(each) = &mut self.each {
            each(pos, msg);
        }
        match msg {
            Message::Channel { channel, msg } => {
                if let Some(f) = &mut self.channel {
                    f(pos, *channel, msg);
                }
            }
            Message::Common(common) => {
                if let Some(f) = &mut self.common {
                    f(pos, common);
                }
            }
            Message::Realtime(rt) => {
                if let Some(f) = &mut self.realtime {
                    f(*rt);
                }
            }
            Message::Meta(meta) => {
                if let Some(f) = &mut self.meta {
                    f(pos, meta);
                }
            }
            Message::Unknown(data) => {
                if let Some(f) = &mut self.unknown {
                    f(pos, data);
                }
            }
        }
    }

    fn dispatch_realtime(&mut self, rt: SystemRealtime) {
        if self.log_events {
            debug!("{}", rt);
        }
        if let Some(f) = &mut self.realtime {
            f(rt);
        }
    }
}
