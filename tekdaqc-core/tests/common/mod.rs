//! Shared fixtures for the integration tests
//!
//! - [`mocks`]: scripted ADC, GPIO, sinks and a failing store
//! - helpers to build a board around them and drive it line by line

#![allow(dead_code)]

pub mod mocks;

use tekdaqc_core::time::FixedTime;
use tekdaqc_core::traits::MemoryStore;
use tekdaqc_core::{Board, BoardConfig, CommandResult, Handoff, ServiceReport};

pub use mocks::{CaptureErrors, CaptureSink, FailingStore, MockAdc, MockGpio};

/// Store large enough for a full calibration session
pub type TestStore = MemoryStore<1024>;

/// Board wired to the mocks, with a test-controlled clock
pub type TestBoard<'a, S = TestStore> =
    Board<MockAdc, MockGpio, S, &'a FixedTime, CaptureSink, CaptureErrors>;

/// Board with no settling delay around a fresh store
pub fn board(clock: &FixedTime) -> TestBoard<'_> {
    board_with(clock, BoardConfig::bench(), TestStore::new())
}

/// Board with an explicit configuration and store
pub fn board_with<S: tekdaqc_core::traits::NvStore>(
    clock: &FixedTime,
    config: BoardConfig,
    store: S,
) -> TestBoard<'_, S> {
    Board::new(
        config,
        MockAdc::default(),
        MockGpio::default(),
        store,
        clock,
        CaptureSink::default(),
        CaptureErrors::default(),
    )
}

/// Execute `line` with both sinks cleared first
pub fn run<S: tekdaqc_core::traits::NvStore>(
    board: &mut TestBoard<'_, S>,
    line: &str,
) -> CommandResult<Option<Handoff>> {
    board.output_mut().clear();
    board.errors_mut().clear();
    board.execute(line)
}

/// Type `text` into the receive path followed by a carriage return
pub fn type_line<S: tekdaqc_core::traits::NvStore>(board: &TestBoard<'_, S>, text: &str) {
    for byte in text.bytes().chain(core::iter::once(b'\r')) {
        board.receive(byte);
    }
}

/// Service the board `passes` times, advancing the clock `step_ms` each pass
pub fn pump<S: tekdaqc_core::traits::NvStore>(
    board: &mut TestBoard<'_, S>,
    clock: &FixedTime,
    passes: usize,
    step_ms: u64,
) -> Vec<ServiceReport> {
    (0..passes)
        .map(|_| {
            let report = board.service();
            clock.advance(step_ms);
            report
        })
        .collect()
}
