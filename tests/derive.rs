#![allow(dead_code, unused)]
#![cfg(all(feature = "derive", feature = "std"))]

mod builder;

use builder::FitBuilder;
use freewheel::avec::{FromRecord, FromRecords};

#[test]
fn decode_slice_synthetic_ride() {
    const PATH: &str = "fixtures/synthetic-ride.fit";
    let data = std::fs::read(PATH).unwrap();
    let mut records = ActivityRecordSet::default();
    freewheel::avec::decode_slice(&data, &mut records).unwrap();

    let file_id = records.file_id.unwrap();
    assert_eq!(file_id.type_, Some(4));
    assert_eq!(file_id.manufacturer, Some(1));
    assert_eq!(file_id.product, Some(3121));
    assert_eq!(file_id.serial_number, Some(3912345678));
    assert_eq!(file_id.time_created, Some(1000000000));

    let timestamps: Vec<_> = records.records.iter().map(|r| r.timestamp).collect();
    assert_eq!(
        timestamps,
        [
            Some(1000000000),
            Some(1000000001),
            Some(1000000003),
            Some(1000000033)
        ]
    );

    let first = &records.records[0];
    assert_eq!(first.heart_rate, Some(120));
    assert_eq!(first.altitude, Some(100.0));
    assert_eq!(first.distance, Some(123.45));
    assert_eq!(first.cycles, Some(250));
    assert_eq!(first.total_cycles, Some(250));
    assert_eq!(first.enhanced_altitude, Some(100.0));

    // Invalid values are skipped.
    assert_eq!(records.records[1].heart_rate, None);
    assert_eq!(records.records[1].cycles, Some(4));
    assert_eq!(records.records[1].total_cycles, Some(260));

    assert_eq!(records.events.len(), 1);
    assert_eq!(records.events[0].event_type, Some(EventType::Stop));
    assert_eq!(records.events[0].timestamp, Some(1000000040));
}

#[derive(Debug, Default, FromRecords)]
struct ActivityRecordSet {
    #[record(0)]
    file_id: Option<FileId>,
    #[record(20)]
    records: Vec<Record>,
    #[record(21)]
    events: Vec<Event>,
}

#[derive(Debug, Default, FromRecord)]
struct FileId {
    #[field(3)]
    serial_number: Option<u32>,
    #[field(4)]
    time_created: Option<u32>,
    #[field(1)]
    manufacturer: Option<u16>,
    #[field(2)]
    product: Option<u16>,
    #[field(0)]
    type_: Option<u8>,
}

#[derive(Debug, Default, FromRecord)]
struct Record {
    #[field(time)]
    timestamp: Option<u32>,
    #[field(3)]
    heart_rate: Option<u8>,
    #[field(2)]
    altitude: Option<f64>,
    #[field(5)]
    distance: Option<f64>,
    #[field(18)]
    cycles: Option<u8>,
    #[field(19)]
    total_cycles: Option<u64>,
    #[field(78)]
    enhanced_altitude: Option<f64>,
}

#[derive(Debug, Default, FromRecord)]
struct Event {
    #[field(time)]
    timestamp: Option<u32>,
    #[field(1, |e, x: u8| *e = EventType::from_raw(x))]
    event_type: Option<EventType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventType {
    Start,
    Stop,
    Marker,
}

impl EventType {
    fn from_raw(x: u8) -> Option<Self> {
        match x {
            0 => Some(Self::Start),
            4 => Some(Self::Stop),
            3 => Some(Self::Marker),
            _ => None,
        }
    }
}

#[test]
fn handlers_collect_array_elements() {
    let data = FitBuilder::new()
        .definition(0, 78, &[(0, 6, 0x84)])
        .data(0, &[0xE8, 0x03, 0xFF, 0xFF, 0xD0, 0x07])
        .data(0, &[0xB8, 0x0B, 0xFF, 0xFF, 0xFF, 0xFF])
        .build();

    let mut set = HrvSet::default();
    freewheel::avec::decode_slice(&data, &mut set).unwrap();

    assert_eq!(set.hrv.len(), 2);
    assert_eq!(set.hrv[0].intervals, [1.0, 2.0]);
    assert_eq!(set.hrv[1].intervals, [3.0]);
}

#[derive(Debug, Default, FromRecords)]
struct HrvSet {
    #[record(78)]
    hrv: Vec<Hrv>,
}

#[derive(Debug, Default, FromRecord)]
struct Hrv {
    #[field(0, |v, x: Vec<f64>| v.extend(x))]
    intervals: Vec<f64>,
}

#[test]
fn developer_fields_reach_receivers() {
    let data = FitBuilder::new()
        .developer_definition(0, 20, &[(3, 1, 0x02)], &[(1, 2, 0)])
        .data(0, &[90, 7, 0])
        .build();

    let mut set = DeveloperSet::default();
    freewheel::avec::decode_slice(&data, &mut set).unwrap();

    let record = set.record.unwrap();
    assert_eq!(record.heart_rate, Some(90));
    assert_eq!(record.developer, [(0, 1)]);
}

#[derive(Debug, Default, FromRecords)]
struct DeveloperSet {
    #[record(20)]
    record: Option<DeveloperRecord>,
}

#[derive(Debug, Default)]
struct DeveloperRecord {
    heart_rate: Option<u8>,
    developer: Vec<(u8, u8)>,
}

impl FromRecord for DeveloperRecord {
    fn add_field(&mut self, field: u8, value: &freewheel::sans::value::FieldValue) {
        if field == 3 {
            self.heart_rate = u8::try_from(value).ok();
        }
    }

    fn add_developer_field(&mut self, field: &freewheel::sans::data::DeveloperField) {
        self.developer
            .push((field.developer_data_index, field.number));
    }
}
