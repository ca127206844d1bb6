#![no_std]

//! A streaming decoder for Garmin's Flexible and Interoperable Data Transfer
//! protocol.
//!
//! Freewheel turns the bytes of a FIT activity file into a lazy, ordered
//! sequence of [`DecodedRecord`](sans::data::DecodedRecord) values. Each record
//! carries its global message number, its fields resolved to typed values
//! (with profile scaling, accumulator unwrapping, component expansion and
//! sub-field selection applied), any developer fields, and its timestamp, including those carried by compressed record
//! headers.
//!
//! Most users should begin with [`RecordStream`], or with the functions and
//! derive macros in the [`avec`] module when decoding into structs of a known
//! shape. The building blocks of the decoder are exposed in the [`sans`]
//! module for applications needing finer control over internals.
//!
//! ```
//! let data = std::fs::read("activity.fit")?;
//!
//! for record in freewheel::RecordStream::new(data.as_slice()) {
//!     let record = record?;
//!     println!("{} {:?}", record.global, record.timestamp);
//! }
//! ```
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable derive macros (default).
//! - `std`: enable reader-based decoding (default).
//! - `serde`: implement `Serialize` for headers and decoded records.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod avec;
pub mod error;
pub mod sans;
pub mod stream;

pub use error::{Error, ErrorKind};
pub use stream::{Leniency, Options, RecordStream, StreamState};
