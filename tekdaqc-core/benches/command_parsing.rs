//! Criterion benchmarks for the command and export hot paths.
//!
//! Key metrics:
//! - Line parsing and request validation latency
//! - Byte-at-a-time line assembly through the shared buffer
//! - Export of a full analog batch
//!
//! Run with: cargo bench --bench command_parsing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tekdaqc_core::calibration::CalibrationTable;
use tekdaqc_core::channel::AnalogChannel;
use tekdaqc_core::command::{parse_line, Request, SharedLineBuffer};
use tekdaqc_core::export::export_analog;
use tekdaqc_core::traits::{BufferSink, MemoryStore};

/// Parse and validate representative command lines.
fn command_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_parse");

    let lines = [
        ("halt", "HALT"),
        ("add_analog", "ADD_ANALOG_INPUT INPUT=12 BUFFER=ENABLED RATE=7,500 GAIN=x16 NAME=Thermocouple_12"),
        ("read_range", "READ_ANALOG_INPUT INPUT=0-31 NUMBER=100"),
        (
            "write_gain",
            "WRITE_GAIN_CALIBRATION_VALUE VALUE=1.0003 GAIN=8 RATE=60 BUFFER=ON SCALE=ANALOG_SCALE_5V INDEX=3",
        ),
    ];

    for (name, line) in lines {
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_and_validate", name), line, |b, line| {
            b.iter(|| {
                let parsed = parse_line(black_box(line)).unwrap();
                black_box(Request::from_parsed(&parsed).unwrap());
            });
        });
    }

    group.finish();
}

/// Feed a line through the interrupt-safe buffer one byte at a time.
fn line_assembly(c: &mut Criterion) {
    let line = b"ADD_DIGITAL_INPUT   INPUT=7 NAME=Door_Sensor\r";
    let buffer = SharedLineBuffer::new();

    let mut group = c.benchmark_group("line_assembly");
    group.throughput(Throughput::Bytes(line.len() as u64));
    group.bench_function("push_and_take", |b| {
        b.iter(|| {
            for byte in line {
                buffer.push(black_box(*byte));
            }
            black_box(buffer.take_line())
        });
    });
    group.finish();
}

/// Format and deliver one full batch of analog samples.
fn analog_export(c: &mut Criterion) {
    let table = CalibrationTable::new();
    let store: MemoryStore<16> = MemoryStore::new();
    let mut sink: BufferSink<2048> = BufferSink::new();
    let mut channel = AnalogChannel::new(3);

    c.bench_function("export_analog_batch", |b| {
        b.iter(|| {
            for i in 0..10 {
                channel.record(8_000_000 - i, 1_700_000_000_000 + i as u64);
            }
            sink.clear();
            black_box(export_analog(&channel, &table, Some(25.0), &store, 10, &mut sink).unwrap())
        });
    });
}

criterion_group!(benches, command_parse, line_assembly, analog_export);
criterion_main!(benches);
