#![cfg(feature = "std")]

mod builder;

use std::{
    io,
    sync::{Arc, Mutex},
};

use builder::FitBuilder;
use freewheel::RecordStream;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn record_trace_names_its_message() {
    let capture = Capture::default();
    let writer = capture.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let data = FitBuilder::new()
        .definition(0, 20, &[(3, 1, 0x02)])
        .data(0, &[90])
        .build();

    tracing::subscriber::with_default(subscriber, || {
        let records: Vec<_> = RecordStream::new(data.as_slice())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    });

    let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    let line = output
        .lines()
        .find(|line| line.contains("Decoded record."))
        .unwrap();

    assert!(line.contains("global=20"));
    assert!(line.contains("message_name=\"record\""));
}
