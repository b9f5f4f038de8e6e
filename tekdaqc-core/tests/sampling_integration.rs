//! Sampling, export and governor feedback through `Board::service`

#![cfg(test)]

mod common;

use common::{board, board_with, pump, run, TestStore};
use tekdaqc_core::governor::SLOW_MODE_NOTICE;
use tekdaqc_core::sampling::SampleEvent;
use tekdaqc_core::time::FixedTime;
use tekdaqc_core::BoardConfig;

fn position(reports: &[tekdaqc_core::ServiceReport], event: SampleEvent) -> usize {
    reports
        .iter()
        .position(|report| report.analog == event)
        .unwrap_or_else(|| panic!("{:?} never happened", event))
}

#[test]
fn conversion_waits_for_mux_settling() {
    let clock = FixedTime::new(0);
    let mut board = board_with(&clock, BoardConfig::bench().with_mux_settle_ms(100), TestStore::new());
    board.adc_mut().script(&[1_677_721, 1234]);

    run(&mut board, "ADD_ANALOG_INPUT INPUT=3 NAME=Thermo").unwrap();
    run(&mut board, "READ_ANALOG_INPUT INPUT=3 NUMBER=1").unwrap();
    let reports = pump(&mut board, &clock, 40, 10);

    let selected = position(&reports, SampleEvent::Selected(3));
    let converted = position(&reports, SampleEvent::Converted { id: 3, code: 1234 });
    assert!((converted - selected) * 10 >= 100, "converted {} passes after selection", converted - selected);
    assert_eq!(reports.last().unwrap().analog, SampleEvent::Stopped);
}

#[test]
fn cold_junction_updates_board_temperature() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);
    // 25 C at the cold junction's x4 gain
    board.adc_mut().script(&[1_677_721]);

    run(&mut board, "ADD_ANALOG_INPUT INPUT=0").unwrap();
    run(&mut board, "READ_ANALOG_INPUT NUMBER=1").unwrap();
    pump(&mut board, &clock, 10, 1);

    let celsius = board.temperature().current().unwrap();
    assert!((celsius - 25.0).abs() < 0.01, "{}", celsius);
}

#[test]
fn samples_are_exported_in_framed_batches() {
    let clock = FixedTime::new(1_000);
    let mut board = board(&clock);
    board.adc_mut().script(&[1_677_721, 1000, -2000]);

    run(&mut board, "ADD_ANALOG_INPUT INPUT=3 NAME=Thermo GAIN=x2").unwrap();
    run(&mut board, "READ_ANALOG_INPUT INPUT=3 NUMBER=2").unwrap();
    board.output_mut().clear();
    let reports = pump(&mut board, &clock, 20, 1);

    let text = board.output().as_str();
    assert!(text.contains("Analog Input\n\r\tName: Thermo\n\r\tPhysical Input: 3\n\r\tPGA: x2"));
    assert!(text.contains(", 1000\u{1F}\n\r"));
    assert!(text.contains(", -2000\u{1F}\n\r"));
    assert!(text.contains('\u{1E}'));
    assert!(board.analog().get(3).unwrap().samples().is_empty());
    // two conversions of input 3 and one cold junction read
    assert_eq!(reports.iter().map(|report| report.delivered).sum::<usize>(), 3);
}

#[test]
fn sample_command_covers_both_subsystems() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);

    run(&mut board, "ADD_ANALOG_INPUT INPUT=1").unwrap();
    run(&mut board, "ADD_DIGITAL_INPUT INPUT=2 NAME=Door").unwrap();
    board.gpio_mut().inputs[2] = true;
    run(&mut board, "SAMPLE NUMBER=1").unwrap();
    assert!(board.sampler().analog_active());
    assert!(board.sampler().digital_active());

    board.output_mut().clear();
    pump(&mut board, &clock, 20, 5);

    let text = board.output().as_str();
    assert!(text.contains("Physical Input: 1"));
    assert!(text.contains("Digital Input\n\r\tName: Door"));
    assert!(text.contains(", H\u{1F}"));
    assert!(!board.sampler().analog_active());
    assert!(!board.sampler().digital_active());
}

#[test]
fn halt_stops_continuous_sampling() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);

    run(&mut board, "ADD_ANALOG_INPUT INPUT=6").unwrap();
    run(&mut board, "READ_ANALOG_INPUT INPUT=6 NUMBER=0").unwrap();
    pump(&mut board, &clock, 30, 1);
    assert!(board.sampler().analog_active());

    run(&mut board, "HALT").unwrap();
    let conversions = board.adc().conversions;
    let reports = pump(&mut board, &clock, 10, 1);
    assert!(reports.iter().all(|report| report.analog == SampleEvent::Stopped));
    assert_eq!(board.adc().conversions, conversions);
}

#[test]
fn refused_exports_slow_the_digital_scan() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);

    run(&mut board, "ADD_DIGITAL_INPUT INPUT=0").unwrap();
    run(&mut board, "READ_DIGITAL_INPUT INPUT=0 NUMBER=0").unwrap();
    board.output_mut().clear();

    board.output_mut().refuse = true;
    let first = pump(&mut board, &clock, 1, 10);
    assert_eq!(first[0].refused, 1);
    assert!(board.governor().is_degraded());
    assert_eq!(board.digital().get(0).unwrap().samples().len(), 1);

    board.output_mut().refuse = false;
    let second = pump(&mut board, &clock, 1, 10);
    assert_eq!(second[0].delivered, 2);
    assert!(board.output().as_str().contains(SLOW_MODE_NOTICE));
    assert!(!board.governor().notice_pending());

    // the stretched period keeps the next scan well away
    let later = pump(&mut board, &clock, 50, 10);
    assert!(later
        .iter()
        .all(|report| !matches!(report.digital, SampleEvent::DigitalScan { .. })));
}

#[test]
fn slow_mode_notice_is_sent_once_per_episode() {
    let clock = FixedTime::new(0);
    let mut board = board(&clock);

    run(&mut board, "ADD_DIGITAL_INPUT INPUT=0").unwrap();
    run(&mut board, "READ_DIGITAL_INPUT INPUT=0 NUMBER=0").unwrap();
    board.output_mut().clear();

    board.output_mut().refuse = true;
    pump(&mut board, &clock, 1, 10);
    board.output_mut().refuse = false;
    pump(&mut board, &clock, 1, 10_000);
    board.output_mut().refuse = true;
    pump(&mut board, &clock, 1, 10);
    board.output_mut().refuse = false;
    pump(&mut board, &clock, 1, 10);

    assert_eq!(board.output().as_str().matches(SLOW_MODE_NOTICE).count(), 1);
}
