//! Export of buffered samples
//!
//! One call exports at most one batch from one channel: a data header,
//! up to `batch` records, and the batch terminator, handed to the sink in a
//! single write.
//!
//! ```text
//! <header>
//! 1700000000123, 8123\x1F\n\r
//! 1700000000140, 8120\x1F\n\r
//! \x1E
//! ```
//!
//! Samples leave the ring only after the sink accepts the batch. A refused
//! batch stays buffered and is offered again on the next call, so the
//! governor sees the refusal and the data survives it.

use core::fmt::Write;

use heapless::String;

use crate::buffer::ReadBatch;
use crate::calibration::{CalibrationTable, NEUTRAL_GAIN};
use crate::channel::{AnalogChannel, AnalogSample, DigitalChannel, DigitalSample};
use crate::constants::analog::SINGLE_ANALOG_WRITE_COUNT;
use crate::constants::command::{BATCH_TERMINATOR, RECORD_TERMINATOR, SIZE_TOSTRING_BUFFER};
use crate::errors::{FunctionError, FunctionResult, Subsystem};
use crate::governor::{ThroughputGovernor, SLOW_MODE_NOTICE};
use crate::traits::{NvStore, OutputSink};
use crate::command::response::{send, MessageKind};

/// Room for a header and a full batch of records
pub const BATCH_CAPACITY: usize = SIZE_TOSTRING_BUFFER * 2;

type BatchText = String<BATCH_CAPACITY>;

/// Result of one export attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing was buffered
    Empty,
    /// The sink took the batch; this many samples were released
    Delivered(usize),
    /// The sink refused the batch; the samples stay buffered
    Refused,
}

impl ExportOutcome {
    /// Whether this outcome says anything about the consumer
    pub fn attempted(&self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// True when the sink accepted the batch
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

/// Export one batch of analog samples
///
/// Codes are gain corrected with the factor for the channel's settings at
/// `temperature`; the cold junction, and any conversion made before the
/// board temperature is known, use the neutral factor.
pub fn export_analog<O, S>(
    channel: &AnalogChannel,
    table: &CalibrationTable,
    temperature: Option<f32>,
    store: &S,
    batch: usize,
    sink: &mut O,
) -> FunctionResult<ExportOutcome>
where
    O: OutputSink + ?Sized,
    S: NvStore + ?Sized,
{
    let mut pending: ReadBatch<AnalogSample, SINGLE_ANALOG_WRITE_COUNT> =
        channel.samples().peek_batch();
    pending.truncate(batch);
    if pending.is_empty() {
        return Ok(ExportOutcome::Empty);
    }

    let config = channel.config();
    let factor = match temperature {
        Some(celsius) if !channel.is_cold_junction() => {
            table.gain_correction_factor(config.rate, config.gain, config.buffer, celsius, store)
        }
        _ => NEUTRAL_GAIN,
    };

    let failed = FunctionError::FailedWrite(Subsystem::AnalogInput);
    let mut text = BatchText::new();
    channel.write_data_header(&mut text).map_err(|_| failed)?;
    for sample in pending.items() {
        let corrected = libm::roundf(factor * sample.code as f32) as i32;
        write!(text, "{}, {}{}\n\r", sample.timestamp, corrected, RECORD_TERMINATOR)
            .map_err(|_| failed)?;
    }
    text.push(BATCH_TERMINATOR).map_err(|_| failed)?;

    Ok(deliver(sink, &text, || {
        let released = channel.samples().commit(&pending);
        if released < pending.len() {
            log_warn!(
                "AIN {}: {} exported samples were overwritten before release",
                channel.id(),
                pending.len() - released
            );
        }
        released
    }))
}

/// Export one batch of digital readings
pub fn export_digital<O>(channel: &DigitalChannel, batch: usize, sink: &mut O) -> FunctionResult<ExportOutcome>
where
    O: OutputSink + ?Sized,
{
    let mut pending: ReadBatch<DigitalSample, SINGLE_ANALOG_WRITE_COUNT> =
        channel.samples().peek_batch();
    pending.truncate(batch);
    if pending.is_empty() {
        return Ok(ExportOutcome::Empty);
    }

    let failed = FunctionError::FailedWrite(Subsystem::DigitalInput);
    let mut text = BatchText::new();
    channel.write_data_header(&mut text).map_err(|_| failed)?;
    for sample in pending.items() {
        write!(text, "{}, {}{}\n\r", sample.timestamp, sample.level, RECORD_TERMINATOR)
            .map_err(|_| failed)?;
    }
    text.push(BATCH_TERMINATOR).map_err(|_| failed)?;

    Ok(deliver(sink, &text, || {
        let released = channel.samples().commit(&pending);
        if released < pending.len() {
            log_warn!(
                "DIN {}: {} exported readings were overwritten before release",
                channel.id(),
                pending.len() - released
            );
        }
        released
    }))
}

fn deliver<O, F>(sink: &mut O, text: &str, commit: F) -> ExportOutcome
where
    O: OutputSink + ?Sized,
    F: FnOnce() -> usize,
{
    match sink.write(text) {
        Ok(()) => ExportOutcome::Delivered(commit()),
        Err(_err) => {
            log_debug!("export batch refused: {}", _err);
            ExportOutcome::Refused
        }
    }
}

/// Send the slow mode notice if the governor raised it
///
/// The notice stays pending until the sink accepts it.
pub fn deliver_notice<O: OutputSink + ?Sized>(governor: &mut ThroughputGovernor, sink: &mut O) {
    if governor.notice_pending() && send(sink, MessageKind::Status, SLOW_MODE_NOTICE).is_ok() {
        governor.notice_delivered();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SampleRing;
    use crate::constants::analog::ANALOG_INPUT_BUFFER_SIZE;
    use crate::errors::SinkError;
    use crate::traits::{BufferSink, MemoryStore};

    fn channel_with(samples: &[(i32, u64)]) -> AnalogChannel {
        let mut channel = AnalogChannel::new(5);
        for (code, ts) in samples {
            channel.record(*code, *ts);
        }
        channel
    }

    #[test]
    fn analog_batch_has_header_records_and_terminator() {
        let channel = channel_with(&[(100, 1), (-7, 2)]);
        let store: MemoryStore<4> = MemoryStore::new();
        let mut sink: BufferSink<1024> = BufferSink::new();

        let outcome = export_analog(&channel, &CalibrationTable::new(), Some(25.0), &store, 10, &mut sink);
        assert_eq!(outcome, Ok(ExportOutcome::Delivered(2)));
        let text = sink.as_str();
        assert!(text.contains("Physical Input: 5"));
        assert!(text.contains("1, 100\u{1F}\n\r2, -7\u{1F}\n\r\u{1E}"));
        assert!(channel.samples().is_empty());
    }

    #[test]
    fn batch_cap_leaves_rest_buffered() {
        let samples: heapless::Vec<(i32, u64), 15> = (0..15).map(|i| (i, i as u64)).collect();
        let channel = channel_with(&samples);
        let store: MemoryStore<4> = MemoryStore::new();
        let mut sink: BufferSink<2048> = BufferSink::new();

        let first = export_analog(&channel, &CalibrationTable::new(), None, &store, 10, &mut sink);
        assert_eq!(first, Ok(ExportOutcome::Delivered(10)));
        assert_eq!(channel.samples().len(), 5);
        let second = export_analog(&channel, &CalibrationTable::new(), None, &store, 10, &mut sink);
        assert_eq!(second, Ok(ExportOutcome::Delivered(5)));
        let third = export_analog(&channel, &CalibrationTable::new(), None, &store, 10, &mut sink);
        assert_eq!(third, Ok(ExportOutcome::Empty));
    }

    #[test]
    fn refused_batch_stays_buffered() {
        let channel = channel_with(&[(1, 1), (2, 2), (3, 3)]);
        let store: MemoryStore<4> = MemoryStore::new();
        let mut tiny: BufferSink<16> = BufferSink::new();

        let outcome = export_analog(&channel, &CalibrationTable::new(), None, &store, 10, &mut tiny);
        assert_eq!(outcome, Ok(ExportOutcome::Refused));
        assert_eq!(channel.samples().len(), 3);
        assert!(tiny.as_str().is_empty());
    }

    /// Sink that lets the producer run while the batch is being written
    struct OverrunSink<'a> {
        ring: &'a SampleRing<AnalogSample, ANALOG_INPUT_BUFFER_SIZE>,
        extra: i32,
    }

    impl OutputSink for OverrunSink<'_> {
        fn write(&mut self, _text: &str) -> Result<(), SinkError> {
            for code in 0..self.extra {
                self.ring.write(AnalogSample { code, timestamp: 1_000 });
            }
            Ok(())
        }
    }

    #[test]
    fn overwritten_samples_are_not_counted_as_delivered() {
        let samples: heapless::Vec<(i32, u64), ANALOG_INPUT_BUFFER_SIZE> =
            (0..ANALOG_INPUT_BUFFER_SIZE).map(|i| (i as i32, i as u64)).collect();
        let channel = channel_with(&samples);
        let store: MemoryStore<4> = MemoryStore::new();
        let mut sink = OverrunSink { ring: channel.samples(), extra: 3 };

        let outcome = export_analog(&channel, &CalibrationTable::new(), None, &store, 10, &mut sink);
        assert_eq!(outcome, Ok(ExportOutcome::Delivered(7)));
        // three oldest of the batch were overwritten, the rest released
        assert_eq!(channel.samples().len(), ANALOG_INPUT_BUFFER_SIZE + 3 - 10);
    }

    #[test]
    fn digital_records_use_level_letters() {
        let mut channel = DigitalChannel::new(3);
        channel.record(crate::settings::Level::High, 10);
        channel.record(crate::settings::Level::Low, 20);
        let mut sink: BufferSink<512> = BufferSink::new();

        assert_eq!(export_digital(&channel, 10, &mut sink), Ok(ExportOutcome::Delivered(2)));
        assert!(sink.as_str().contains("10, H\u{1F}\n\r20, L\u{1F}\n\r\u{1E}"));
    }

    #[test]
    fn notice_is_sent_once() {
        let mut governor = ThroughputGovernor::default();
        governor.record_export(false, 0);
        let mut sink: BufferSink<512> = BufferSink::new();

        deliver_notice(&mut governor, &mut sink);
        assert!(sink.as_str().contains(SLOW_MODE_NOTICE));
        sink.clear();
        deliver_notice(&mut governor, &mut sink);
        assert!(sink.as_str().is_empty());
    }
}
