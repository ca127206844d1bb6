//! Slice-based decoder implementation.

use crate::{error::Error, stream::Options};

use super::{FromRecords, decode_source};

/// Decode records from a slice of a document, publishing to a receiver.
///
/// This method is also re-exported as `freewheel::avec::decode_slice`.
pub fn decode(r: &[u8], o: &mut impl FromRecords) -> Result<(), Error> {
    decode_source(r, Options::default(), o)
}
