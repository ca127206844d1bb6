//! Derive macros for the record receivers of `freewheel`.
//!
//! Use these through their re-exports in `freewheel::avec`, which document
//! the attributes each macro accepts.

use proc_macro::TokenStream;
use syn::{DeriveInput, Result, parse_macro_input};

mod from_record;
mod from_records;

/// Implement `FromRecord`, receiving `#[field(N)]` and `#[field(time)]` values.
#[proc_macro_derive(FromRecord, attributes(field))]
pub fn derive_from_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input, from_record::expand_from_record)
}

/// Implement `FromRecords`, routing `#[record(N)]` global messages to fields.
#[proc_macro_derive(FromRecords, attributes(record))]
pub fn derive_from_records(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input, from_records::expand_from_records)
}

fn expand(input: &DeriveInput, f: fn(&DeriveInput) -> Result<TokenStream>) -> TokenStream {
    f(input).unwrap_or_else(|err| err.to_compile_error().into())
}
