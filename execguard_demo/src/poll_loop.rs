// execguard_demo/src/poll_loop.rs
//
// Consumer side of a subscription: drain, forward, sleep, repeat. Pacing
// here has no effect on the producer.

use crate::debug_hooks;
use crate::error::ExecGuardError;
use crate::settings::GatewaySettings;
use crate::subscription::{HandleState, SubscriptionHandle};
use std::thread;
use std::time::Duration;

pub use crate::subscription::TerminalReason as StopReason;

/// Where drained lines end up.
pub trait LineSink {
    fn line(&mut self, line: &str);
    fn error(&mut self, err: &ExecGuardError);
}

/// Prints lines to stdout and failures as `Error: ...` on stderr.
#[derive(Debug, Default)]
pub struct PrintSink;

impl LineSink for PrintSink {
    fn line(&mut self, line: &str) {
        println!("{line}");
    }

    fn error(&mut self, err: &ExecGuardError) {
        eprintln!("Error: {err}");
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub lines: Vec<String>,
    pub errors: Vec<ExecGuardError>,
}

impl LineSink for CollectSink {
    fn line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn error(&mut self, err: &ExecGuardError) {
        self.errors.push(err.clone());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStep {
    Rearm(Duration),
    Stop(StopReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSummary {
    pub cycles: u64,
    pub lines: u64,
    pub stop: StopReason,
}

pub struct PollLoop {
    interval: Duration,
    batch: usize,
    cycles: u64,
    lines: u64,
}

impl PollLoop {
    /// A zero `batch` is raised to one, so every cycle can observe the end
    /// of the stream.
    pub fn new(interval: Duration, batch: usize) -> Self {
        Self {
            interval,
            batch: batch.max(1),
            cycles: 0,
            lines: 0,
        }
    }

    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self::new(settings.poll_interval, settings.drain_batch)
    }

    /// One drain cycle.
    pub fn step(&mut self, handle: &mut SubscriptionHandle, sink: &mut dyn LineSink) -> PollStep {
        if let HandleState::Terminal(reason) = handle.state() {
            return PollStep::Stop(reason);
        }
        self.cycles += 1;

        match handle.drain(self.batch) {
            Ok(lines) => {
                for line in &lines {
                    debug_hooks::log_stream_line(handle.label(), line);
                    sink.line(line);
                }
                self.lines += lines.len() as u64;
                match handle.state() {
                    HandleState::Terminal(reason) => PollStep::Stop(reason),
                    _ => PollStep::Rearm(self.interval),
                }
            }
            Err(err) => {
                tracing::warn!(stream = handle.label(), "{err}");
                sink.error(&err);
                PollStep::Stop(StopReason::ReadFailed)
            }
        }
    }

    /// Steps until the handle stops, sleeping the re-arm delay in between.
    pub fn run(&mut self, handle: &mut SubscriptionHandle, sink: &mut dyn LineSink) -> PollSummary {
        loop {
            match self.step(handle, sink) {
                PollStep::Rearm(delay) => thread::sleep(delay),
                PollStep::Stop(stop) => {
                    return PollSummary {
                        cycles: self.cycles,
                        lines: self.lines,
                        stop,
                    }
                }
            }
        }
    }
}
