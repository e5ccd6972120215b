//! Transfer statistics for debugging sessions.
//!
//! A [`StatsRecorder`] wraps any [`TransportStatsSource`] the caller hands it,
//! samples the cumulative counters on every [`StatsRecorder::record`] tick and
//! renders a plain-text report once the transport is closed.

use rainway_demo_core::Timestamp;
use std::cell::Cell;
use std::fmt::Write;
use std::rc::Rc;

/// Cumulative transfer counters at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportSample {
    pub at_ms: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Something that can report cumulative transfer counters
pub trait TransportStatsSource {
    fn sample(&self) -> TransportSample;
}

/// Throughput between two consecutive samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalRate {
    pub duration_ms: u64,
    pub kbps_in: f64,
    pub kbps_out: f64,
}

/// Samples a transport and produces a downloadable report
#[derive(Debug)]
pub struct StatsRecorder<T> {
    source: T,
    samples: Vec<TransportSample>,
    report: Option<String>,
}

impl<T: TransportStatsSource> StatsRecorder<T> {
    /// Wrap `source`, taking the first sample right away
    pub fn new(source: T) -> Self {
        let first = source.sample();
        Self {
            source,
            samples: vec![first],
            report: None,
        }
    }

    /// Take a sample; ignored once the recorder is closed
    pub fn record(&mut self) {
        if self.report.is_some() {
            return;
        }
        self.samples.push(self.source.sample());
    }

    pub fn samples(&self) -> &[TransportSample] {
        &self.samples
    }

    pub fn intervals(&self) -> Vec<IntervalRate> {
        self.samples
            .windows(2)
            .map(|pair| {
                let duration_ms = pair[1].at_ms.saturating_sub(pair[0].at_ms);
                let received = pair[1].bytes_received.saturating_sub(pair[0].bytes_received);
                let sent = pair[1].bytes_sent.saturating_sub(pair[0].bytes_sent);
                IntervalRate {
                    duration_ms,
                    kbps_in: kbps(received, duration_ms),
                    kbps_out: kbps(sent, duration_ms),
                }
            })
            .collect()
    }

    /// Take a final sample and render the report. Closing twice returns the same report.
    pub fn close(&mut self) -> String {
        if let Some(report) = &self.report {
            return report.clone();
        }

        self.samples.push(self.source.sample());
        let report = self.render();
        tracing::debug!("Transport statistics recorded ({} samples)", self.samples.len());
        self.report = Some(report.clone());
        report
    }

    pub fn is_closed(&self) -> bool {
        self.report.is_some()
    }

    pub fn into_source(self) -> T {
        self.source
    }

    fn render(&self) -> String {
        let mut out = String::from("Transport statistics\n");
        out.push_str("interval\tduration_ms\tkbps_in\tkbps_out\n");

        for (i, rate) in self.intervals().iter().enumerate() {
            let _ = writeln!(
                out,
                "{}\t{}\t{:.2}\t{:.2}",
                i + 1,
                rate.duration_ms,
                rate.kbps_in,
                rate.kbps_out
            );
        }

        if let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) {
            let _ = writeln!(
                out,
                "total: received {} bytes, sent {} bytes over {} ms",
                last.bytes_received.saturating_sub(first.bytes_received),
                last.bytes_sent.saturating_sub(first.bytes_sent),
                last.at_ms.saturating_sub(first.at_ms)
            );
        }

        out
    }
}

/// Bytes per millisecond times eight is kilobits per second
fn kbps(bytes: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / duration_ms as f64
}

/// Shared byte counters for the chat data channels
#[derive(Debug, Clone, Default)]
pub struct TransferCounters {
    received: Rc<Cell<u64>>,
    sent: Rc<Cell<u64>>,
}

impl TransferCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_received(&self, bytes: usize) {
        self.received.set(self.received.get() + bytes as u64);
    }

    pub fn add_sent(&self, bytes: usize) {
        self.sent.set(self.sent.get() + bytes as u64);
    }
}

impl TransportStatsSource for TransferCounters {
    fn sample(&self) -> TransportSample {
        TransportSample {
            at_ms: Timestamp::now().as_millis(),
            bytes_received: self.received.get(),
            bytes_sent: self.sent.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Replays scripted samples
    struct Scripted(RefCell<Vec<TransportSample>>);

    impl Scripted {
        fn new(mut samples: Vec<TransportSample>) -> Self {
            samples.reverse();
            Self(RefCell::new(samples))
        }
    }

    impl TransportStatsSource for Scripted {
        fn sample(&self) -> TransportSample {
            self.0.borrow_mut().pop().unwrap_or_default()
        }
    }

    fn sample(at_ms: u64, bytes_received: u64, bytes_sent: u64) -> TransportSample {
        TransportSample {
            at_ms,
            bytes_received,
            bytes_sent,
        }
    }

    #[test]
    fn test_interval_rates() {
        let mut recorder = StatsRecorder::new(Scripted::new(vec![
            sample(0, 0, 0),
            sample(1000, 1000, 2000),
        ]));
        recorder.record();

        let intervals = recorder.intervals();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].duration_ms, 1000);
        assert!((intervals[0].kbps_in - 8.0).abs() < f64::EPSILON);
        assert!((intervals[0].kbps_out - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_totals() {
        let mut recorder = StatsRecorder::new(Scripted::new(vec![
            sample(0, 0, 0),
            sample(500, 100, 50),
            sample(1000, 300, 150),
        ]));
        recorder.record();

        let report = recorder.close();
        assert!(report.starts_with("Transport statistics"));
        assert!(report.contains("total: received 300 bytes, sent 150 bytes over 1000 ms"));
        assert!(recorder.is_closed());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut recorder = StatsRecorder::new(Scripted::new(vec![
            sample(0, 0, 0),
            sample(100, 10, 10),
        ]));

        let first = recorder.close();
        recorder.record();
        let second = recorder.close();

        assert_eq!(first, second);
        assert_eq!(recorder.samples().len(), 2);
    }

    #[test]
    fn test_zero_duration_interval() {
        assert_eq!(kbps(1000, 0), 0.0);
    }

    #[test]
    fn test_transfer_counters() {
        let counters = TransferCounters::new();
        let shared = counters.clone();

        shared.add_sent(5);
        shared.add_received(7);

        let sample = counters.sample();
        assert_eq!(sample.bytes_sent, 5);
        assert_eq!(sample.bytes_received, 7);
    }
}
