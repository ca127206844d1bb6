//! Convenience interfaces for common decoding patterns.
//!
//! The functions in this module decode every record of a document, publishing
//! to the [`FromRecords`] and [`FromRecord`] traits. They are suited to
//! collecting records of a known shape from files and data slices.
//!
//! In many cases, these traits can be derived. See the
//! [`FromRecords`](macro@FromRecords) and [`FromRecord`](macro@FromRecord)
//! macros for details.

#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

#[cfg(feature = "std")]
pub use reader::{ReadSource, decode as decode_reader};
pub use slice::decode as decode_slice;

use alloc::vec::Vec;

use crate::{
    error::Error,
    sans::{
        cursor::Source,
        data::{DecodedRecord, DeveloperField},
        value::FieldValue,
    },
    stream::{Options, RecordStream},
};

/// Derive [`FromRecords`] for a struct holding a collection of records.
///
/// _Requires Cargo feature `derive`._
///
/// # Example
///
/// To collect a single record, add the `record(N)` attribute to an `Option<T>`
/// struct field, where `N` is the global message number and `T` is a type
/// implementing [`FromRecord`] and [`Default`]. Additional records received
/// for the same message number will overwrite earlier ones. To collect
/// multiple occurrences of a record, apply the attribute to a `Vec<T>`
/// instead.
///
/// ```
/// #[derive(Debug, Default, FromRecords)]
/// struct ActivityRecordSet {
///     #[record(0)]
///     file_id: Option<FileId>,
///     #[record(20)]
///     records: Vec<Record>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use freewheel_derive::FromRecords;

/// Receive the records of a document.
///
/// See the [`FromRecords`](macro@FromRecords) derive macro for an automatic
/// implementation of this trait.
pub trait FromRecords {
    /// Receive a decoded data record.
    fn add_record(&mut self, record: &DecodedRecord);
}

impl FromRecords for Vec<DecodedRecord> {
    fn add_record(&mut self, record: &DecodedRecord) {
        self.push(record.clone());
    }
}

/// Derive [`FromRecord`] for a struct representing a single record.
///
/// _Requires Cargo feature `derive`._
///
/// # Examples
///
/// To receive a single value for a record field, add the `field(N)` attribute
/// to an `Option<T>` struct field, where `N` is the field number and `T` is a
/// type convertible from a [`FieldValue`] reference. Values of another type,
/// and invalid values, are skipped. Additional values received for the same
/// field will replace earlier ones.
///
/// To receive the record's timestamp (including timestamps expanded from
/// compressed record headers), supply `time` in place of a field number.
///
/// ```
/// #[derive(Debug, Default, FromRecord)]
/// struct Record {
///     #[field(time)]
///     timestamp: Option<u32>,
///     #[field(0)]
///     position_lat: Option<i32>,
///     #[field(1)]
///     position_long: Option<i32>,
///     #[field(2)]
///     altitude: Option<f64>,
/// }
/// ```
///
/// Scaled fields, such as `altitude` above, are received as `f64`.
///
/// To receive arbitrary types (for example, decoding directly into an
/// enumeration), supply a handler closure. The second argument must be typed,
/// and values are converted to that type before the handler is called.
///
/// ```
/// #[derive(Debug, Default, FromRecord)]
/// struct CoursePoint {
///     #[field(5, |p, x: u8| *p = CoursePointType::try_from(x).ok())]
///     type_: Option<CoursePointType>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use freewheel_derive::FromRecord;

/// Receive the values of a single record.
///
/// The default implementation of each method ignores received values.
///
/// See the [`FromRecord`](macro@FromRecord) derive macro for an automatic
/// implementation of this trait.
#[allow(unused_variables)]
pub trait FromRecord {
    /// Add the record's timestamp.
    fn add_timestamp(&mut self, timestamp: u32) {}
    /// Add a field value, including invalid values.
    fn add_field(&mut self, field: u8, value: &FieldValue) {}
    /// Add a developer field.
    fn add_developer_field(&mut self, field: &DeveloperField) {}
}

/// Publish every part of a record to a receiver.
pub fn publish(record: &DecodedRecord, o: &mut (impl FromRecord + ?Sized)) {
    if let Some(timestamp) = record.timestamp {
        o.add_timestamp(timestamp);
    }

    for (field, value) in &record.fields {
        o.add_field(*field, value);
    }

    for field in &record.developer_fields {
        o.add_developer_field(field);
    }
}

/// Decode every record from a source, publishing to a receiver.
pub fn decode_source(
    source: impl Source,
    options: Options,
    o: &mut (impl FromRecords + ?Sized),
) -> Result<(), Error> {
    for record in RecordStream::with_options(source, options) {
        o.add_record(&record?);
    }

    Ok(())
}
