#![cfg(feature = "std")]

use std::path::Path;

use csv::ReaderBuilder;
use freewheel::{
    StreamState,
    avec::{FromRecord, FromRecords},
    sans::{data::DecodedRecord, value::FieldValue},
};

const PATH: &str = "fixtures/synthetic-ride.fit";

#[test]
fn decode_slice_synthetic_ride() {
    let data = std::fs::read(PATH).unwrap();
    let mut validator = Validator::new(PATH);
    freewheel::avec::decode_slice(&data, &mut validator).unwrap();
    validator.finish();
}

#[test]
fn decode_reader_synthetic_ride() {
    let mut file = std::fs::File::open(PATH).unwrap();
    let mut validator = Validator::new(PATH);
    freewheel::avec::decode_reader(&mut file, &mut validator).unwrap();
    validator.finish();
}

#[test]
fn stream_synthetic_ride() {
    let data = std::fs::read(PATH).unwrap();
    let mut validator = Validator::new(PATH);

    let mut stream = freewheel::RecordStream::new(data.as_slice());
    for record in &mut stream {
        validator.add_record(&record.unwrap());
    }

    assert_eq!(stream.state(), StreamState::Finished);
    assert_eq!(stream.offset(), data.len());

    let header = stream.header().unwrap();
    assert_eq!(header.header_size, 14);
    assert_eq!(header.profile_version, 2132);
    assert_eq!(header.data_size as usize, data.len() - 16);

    validator.finish();
}

/// Checks received records against rows of `global, timestamp, (field,
/// value)*`, with fields in ascending order.
struct Validator(Vec<String>, Vec<Vec<String>>);

impl Validator {
    fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().with_extension("csv");

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .unwrap();

        let expected: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
            .collect();

        Self(vec![], expected)
    }

    fn finish(&self) {
        assert!(self.0.is_empty(), "unreceived fields: {:?}", self.0);
        assert!(self.1.is_empty(), "unreceived records: {:?}", self.1);
    }
}

impl FromRecords for Validator {
    fn add_record(&mut self, record: &DecodedRecord) {
        assert!(self.0.is_empty(), "unreceived fields: {:?}", self.0);

        self.0 = self.1.remove(0);
        assert_eq!(self.0.remove(0), record.global.to_string());

        let timestamp = record.timestamp.map(|t| t.to_string()).unwrap_or_default();
        assert_eq!(self.0.remove(0), timestamp);

        freewheel::avec::publish(record, self);
    }
}

impl FromRecord for Validator {
    fn add_field(&mut self, field: u8, value: &FieldValue) {
        assert_eq!(self.0.remove(0), field.to_string());
        assert_eq!(self.0.remove(0), value.to_string());
    }
}
