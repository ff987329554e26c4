use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::{debug, trace, warn};

use crate::error::BridgeResult;
use crate::translator::{MidiMessage, Translator, TranslatorState};

/// Result of one blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Report(Vec<u8>),
    /// The read timed out without data.
    Idle,
    /// The device is gone; no more reports will arrive.
    EndOfStream,
}

/// Where raw HID reports come from.
pub trait ReportSource {
    fn read_report(&mut self) -> BridgeResult<ReadOutcome>;
}

/// Where translated MIDI messages go.
pub trait MidiSink {
    fn send(&mut self, message: &MidiMessage) -> BridgeResult<()>;
}

/// Shared stop flag for the bridge loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why [`Bridge::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    EndOfStream,
}

/// Counters kept over one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub reports: u64,
    pub messages: u64,
    pub read_errors: u64,
    pub send_errors: u64,
}

/// Single-threaded read, translate, send loop.
///
/// Owns the source, the sink and the translator state; each report is fully
/// handled before the next read is issued.
pub struct Bridge<S, M> {
    source: S,
    sink: M,
    translator: Translator,
    state: TranslatorState,
    stats: BridgeStats,
}

impl<S: ReportSource, M: MidiSink> Bridge<S, M> {
    pub fn new(source: S, sink: M, translator: Translator) -> Self {
        Self {
            source,
            sink,
            translator,
            state: TranslatorState::default(),
            stats: BridgeStats::default(),
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> TranslatorState {
        self.state
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    #[allow(dead_code)]
    pub fn sink(&self) -> &M {
        &self.sink
    }

    /// Loop until `cancel` is tripped or the source runs dry. Read and send
    /// failures are logged and the loop moves on to the next read.
    pub fn run(&mut self, cancel: &CancelToken) -> StopReason {
        while !cancel.is_cancelled() {
            match self.source.read_report() {
                Ok(ReadOutcome::Report(report)) => self.process(&report),
                Ok(ReadOutcome::Idle) => {}
                Ok(ReadOutcome::EndOfStream) => {
                    debug!("report source ended");
                    return StopReason::EndOfStream;
                }
                Err(err) => {
                    self.stats.read_errors += 1;
                    warn!(error = %err, "USB transfer failed");
                }
            }
        }
        StopReason::Cancelled
    }

    /// Translate a single report and send whatever it produces.
    pub fn process(&mut self, report: &[u8]) {
        self.stats.reports += 1;
        let (next, messages) = self.translator.translate(self.state, report);
        if messages.is_empty() && next == self.state {
            trace!(len = report.len(), "report produced no change");
        }
        self.state = next;

        for message in &messages {
            match self.sink.send(message) {
                Ok(()) => {
                    self.stats.messages += 1;
                    debug!(
                        status = %format!("{:#04x}", message.status),
                        data1 = message.data1,
                        data2 = message.data2,
                        "sent"
                    );
                }
                Err(err) => {
                    self.stats.send_errors += 1;
                    warn!(error = %err, "MIDI send failed");
                }
            }
        }
    }
}
