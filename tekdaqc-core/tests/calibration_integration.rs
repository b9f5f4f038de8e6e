//! Calibration sessions, validity and gain correction through the board

#![cfg(test)]

mod common;

use common::{board, board_with, pump, run, FailingStore, TestBoard, TestStore};
use tekdaqc_core::calibration::NEUTRAL_GAIN;
use tekdaqc_core::constants::calibration::ERASED_WORD;
use tekdaqc_core::time::FixedTime;
use tekdaqc_core::traits::{NvStore, PinGroup};
use tekdaqc_core::{BoardConfig, BufferSetting, CommandError, FunctionError, Gain, Rate};

/// Cold junction code for 25 C at its x4 gain
const CODE_25C: i32 = 1_677_721;
/// Cold junction code for 60 C at its x4 gain
const CODE_60C: i32 = 4_026_531;

fn calibrate(board: &mut TestBoard<'_>) {
    for line in [
        "ENTER_CALIBRATION_MODE",
        "WRITE_CALIBRATION_TEMP TEMPERATURE=20.0 INDEX=0",
        "WRITE_CALIBRATION_TEMP TEMPERATURE=30.0 INDEX=1",
        "WRITE_GAIN_CALIBRATION_VALUE VALUE=1.25 GAIN=1 RATE=60 BUFFER=DISABLED SCALE=ANALOG_SCALE_400V INDEX=0",
        "WRITE_GAIN_CALIBRATION_VALUE VALUE=1.5 GAIN=1 RATE=60 BUFFER=DISABLED SCALE=ANALOG_SCALE_400V INDEX=1",
        "WRITE_CALIBRATION_VALID",
        "EXIT_CALIBRATION_MODE",
    ] {
        assert_eq!(run(board, line), Ok(None), "{}", line);
    }
}

#[test]
fn full_session_marks_the_table_valid() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);

    run(&mut board, "GET_CALIBRATION_STATUS").unwrap();
    assert!(board.output().as_str().contains("Calibration Status: INVALID"));

    calibrate(&mut board);
    assert!(!board.table().in_calibration_mode());
    assert_eq!(board.table().read_entry(Rate::Sps60, Gain::X1, BufferSetting::Disabled), 1.25);

    run(&mut board, "GET_CALIBRATION_STATUS").unwrap();
    assert!(board.output().as_str().contains("Status Message\n\r\tMessage: Calibration Status: VALID"));
}

#[test]
fn writes_outside_a_session_are_refused() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);

    let refused = Err(CommandError::Function(FunctionError::CalibrationWriteFailed));
    assert_eq!(run(&mut board, "WRITE_CALIBRATION_TEMP TEMPERATURE=20 INDEX=0"), refused);
    assert_eq!(run(&mut board, "WRITE_CALIBRATION_VALID"), refused);
    assert!(board.errors().last().unwrap().contains("CALIBRATION: WRITE FAILED"));
    assert!(board.store().is_empty());
}

#[test]
fn temperature_bins_are_written_once_per_session() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);

    run(&mut board, "ENTER_CALIBRATION_MODE").unwrap();
    run(&mut board, "WRITE_CALIBRATION_TEMP TEMPERATURE=20 INDEX=3").unwrap();
    assert_eq!(
        run(&mut board, "WRITE_CALIBRATION_TEMP TEMPERATURE=21 INDEX=3"),
        Err(CommandError::Function(FunctionError::CalibrationWriteFailed))
    );
    assert_eq!(
        run(&mut board, "WRITE_CALIBRATION_TEMP TEMPERATURE=21 INDEX=8"),
        Err(CommandError::Function(FunctionError::CalibrationParseError))
    );
    assert_eq!(board.table().temperatures()[3], Some(20.0));

    // a new session erases the bins
    run(&mut board, "ENTER_CALIBRATION_MODE").unwrap();
    assert_eq!(board.table().temperatures()[3], None);
}

#[test]
fn malformed_calibration_arguments() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);
    run(&mut board, "ENTER_CALIBRATION_MODE").unwrap();

    assert_eq!(
        run(&mut board, "WRITE_GAIN_CALIBRATION_VALUE VALUE=1.1 GAIN=3 RATE=60 BUFFER=ON SCALE=ANALOG_SCALE_5V INDEX=0"),
        Err(CommandError::Function(FunctionError::CalibrationParseError))
    );
    assert_eq!(
        run(&mut board, "WRITE_CALIBRATION_TEMP INDEX=0"),
        Err(CommandError::Function(FunctionError::CalibrationMissingKey))
    );
}

#[test]
fn exported_codes_are_gain_corrected() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);
    calibrate(&mut board);
    board.adc_mut().script(&[CODE_25C, 1000]);

    run(&mut board, "ADD_ANALOG_INPUT INPUT=3").unwrap();
    run(&mut board, "READ_ANALOG_INPUT INPUT=3 NUMBER=1").unwrap();
    board.output_mut().clear();
    pump(&mut board, &clock, 10, 1);

    // halfway between the 20 C and 30 C factors
    assert!(board.output().as_str().contains(", 1375\u{1F}"));
    // the cold junction is never corrected
    assert!(board.output().as_str().contains(&format!(", {}\u{1F}", CODE_25C)));
}

#[test]
fn session_in_progress_disables_correction() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);
    calibrate(&mut board);
    run(&mut board, "ENTER_CALIBRATION_MODE").unwrap();

    let factor = board.table().gain_correction_factor(
        Rate::Sps60,
        Gain::X1,
        BufferSetting::Disabled,
        25.0,
        board.store(),
    );
    assert_eq!(factor, NEUTRAL_GAIN);
}

#[test]
fn overheating_invalidates_the_calibration() {
    let clock = FixedTime::new(0);
    let config = BoardConfig::default().with_mux_settle_ms(0);
    let mut board = board_with(&clock, config, TestStore::new());
    calibrate(&mut board);
    board.adc_mut().script(&[CODE_60C]);

    run(&mut board, "READ_ANALOG_INPUT NUMBER=1").unwrap();
    pump(&mut board, &clock, 10, 1);

    assert!(board.temperature().maximum().unwrap() > 50.0);
    assert!(!board.calibration_valid());
    run(&mut board, "GET_CALIBRATION_STATUS").unwrap();
    assert!(board.output().as_str().contains("Calibration Status: INVALID"));
}

#[test]
fn erased_flash_does_not_poison_the_temperature_record() {
    let clock = FixedTime::new(0);
    let mut store = TestStore::new();
    for key in 0..4 {
        store.write_word(key, ERASED_WORD).unwrap();
    }
    let mut board = board_with(&clock, BoardConfig::bench(), store);
    assert_eq!(board.temperature().maximum(), None);

    calibrate(&mut board);
    board.adc_mut().script(&[CODE_25C]);
    run(&mut board, "READ_ANALOG_INPUT NUMBER=1").unwrap();
    pump(&mut board, &clock, 10, 1);

    assert!((board.temperature().maximum().unwrap() - 25.0).abs() < 0.01);
    run(&mut board, "GET_CALIBRATION_STATUS").unwrap();
    assert!(board.output().as_str().contains("Calibration Status: VALID"));
}

#[test]
fn storage_failure_aborts_session_entry() {
    let clock = FixedTime::new(0);
    let mut board = board_with(&clock, BoardConfig::bench(), FailingStore);

    assert_eq!(
        run(&mut board, "ENTER_CALIBRATION_MODE"),
        Err(CommandError::Function(FunctionError::CalibrationModeFailed))
    );
    assert!(!board.table().in_calibration_mode());
}

#[test]
fn system_gain_calibration_routes_the_reference_input() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);

    run(&mut board, "SYSTEM_GCAL INPUT=32 GAIN=4").unwrap();
    assert_eq!(board.adc().gain_calibrations, 1);
    assert!(board.adc().configs.contains(&(Rate::Sps60, Gain::X4, BufferSetting::Disabled)));
    assert!(board
        .gpio_mut()
        .writes
        .iter()
        .any(|(group, _, _)| *group == PinGroup::CalibrationControl));

    assert_eq!(
        run(&mut board, "SYSTEM_GCAL GAIN=4"),
        Err(CommandError::Function(FunctionError::ParseMissingKey(
            tekdaqc_core::errors::Subsystem::AnalogInput
        )))
    );
}
