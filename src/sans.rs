//! Building blocks of the decoder, free of any I/O.
//!
//! This module is intended for advanced applications that need fine control
//! over decoder internals. See [`crate::RecordStream`] and [`crate::avec`] for
//! implementations covering common decoding patterns.
//!
//! # Architecture
//!
//! Every byte is read through a [`ByteCursor`](cursor::ByteCursor), which
//! tracks its offset into the document, the bytes remaining in the record
//! section, and a running cyclic redundancy check. A [`Source`](cursor::Source)
//! supplies the bytes: a slice, or (with the `std` feature) any reader.
//!
//! A document begins with a [`Header`](header::Header), followed by a sequence
//! of records, each introduced by a single header byte. Definition records
//! install a [`MessageDefinition`](definition::MessageDefinition) into the
//! [`DefinitionTable`](definition::DefinitionTable) under a local message
//! number. Data records are decoded against the definition bound to their
//! local message number, into a [`DecodedRecord`](data::DecodedRecord).
//!
//! Decoding a data record depends on state carried across records:
//!
//! - Accumulated fields are unwrapped against the previous raw value of the
//! same field, in [`AccumulatorState`](resolve::AccumulatorState).
//!
//! - Compressed timestamp headers carry a 5-bit offset against the last full
//! timestamp, in [`TimestampState`](resolve::TimestampState).
//!
//! - Developer fields are typed by earlier `field_description` messages, in
//! [`DeveloperRegistry`](developer::DeveloperRegistry).
//!
//! These are bundled into a [`Session`](resolve::Session), owned by exactly
//! one decode of one document.

pub mod base;
pub mod check;
pub mod cursor;
pub mod data;
pub mod definition;
pub mod developer;
pub mod header;
pub mod profile;
pub mod resolve;
pub mod value;
