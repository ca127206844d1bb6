//! Data records and their decoding.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use tracing::{debug, warn};

use crate::{error::Error, stream::Leniency};

use super::{
    base::BaseType,
    cursor::{ByteCursor, Source},
    definition::MessageDefinition,
    profile::{SubField, TIMESTAMP_FIELD},
    resolve::{Resolution, Session, expand_components, opaque},
    value::FieldValue,
};

/// A decoded data record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedRecord {
    /// Offset of the record header from the start of the document.
    pub offset: usize,
    pub local: u8,
    pub global: u16,
    /// The record's timestamp, from its timestamp field or expanded from a
    /// compressed record header.
    pub timestamp: Option<u32>,
    /// The 5-bit time offset of a compressed record header.
    pub time_offset: Option<u8>,
    /// Values by field number, including those expanded from components.
    pub fields: BTreeMap<u8, FieldValue>,
    /// Names of the sub-fields selected for fields, by field number.
    pub subfields: BTreeMap<u8, &'static str>,
    pub developer_fields: Vec<DeveloperField>,
}

impl DecodedRecord {
    /// The value of a field, if the record's definition declared it.
    pub fn field(&self, number: u8) -> Option<&FieldValue> {
        self.fields.get(&number)
    }

    /// The name of the sub-field selected for a field, if any.
    pub fn subfield(&self, number: u8) -> Option<&'static str> {
        self.subfields.get(&number).copied()
    }

    /// The value of a developer field, if the record's definition declared it.
    pub fn developer_field(&self, developer_data_index: u8, number: u8) -> Option<&DeveloperField> {
        self.developer_fields
            .iter()
            .find(|f| f.developer_data_index == developer_data_index && f.number == number)
    }
}

/// A decoded developer field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeveloperField {
    pub developer_data_index: u8,
    pub number: u8,
    /// Name from the field's description, if one was declared.
    pub name: Option<String>,
    pub units: Option<String>,
    /// The resolved value, or the raw bytes if the field was never described.
    pub value: FieldValue,
}

/// Decode a data record following its header byte.
///
/// `offset` is that of the record header, for error context. A compressed
/// record header's `time_offset` is expanded against the session's timestamp
/// reference before any field is read.
///
/// Fields with profile components also report each component as a field of
/// its own, unless the record carries that field itself. Fields with
/// sub-fields are re-read with the scale of the first sub-field whose
/// reference matches, once every field of the record is known.
pub fn decode<S: Source>(
    cursor: &mut ByteCursor<S>,
    offset: usize,
    definition: &MessageDefinition,
    time_offset: Option<u8>,
    session: &mut Session,
    leniency: Leniency,
) -> Result<DecodedRecord, Error> {
    let local = definition.local;

    let needed = definition.data_size();
    let remaining = cursor.remaining();
    if needed > remaining {
        Err(Error::TruncatedRecord {
            offset,
            local,
            needed,
            remaining,
        })?;
    }

    let mut timestamp = None;

    if let Some(time_offset) = time_offset {
        timestamp = session.timestamps.expand(time_offset);

        if timestamp.is_none() {
            warn!(offset, local, "Compressed timestamp precedes any full timestamp.");
        }
    }

    let mut fields = BTreeMap::new();
    let mut expanded = Vec::new();
    let mut dynamic = Vec::new();

    for field in &definition.fields {
        let size = usize::from(field.size);
        let r = cursor.take_vec(size)?;

        let width = field.base_type.width();
        if size % width != 0 && leniency == Leniency::Strict {
            Err(Error::MisalignedField {
                local,
                field: field.number,
                size: field.size,
                width,
            })?;
        }

        let resolution = Resolution {
            base_type: field.base_type,
            byte_order: definition.byte_order,
            scale: field.scale,
            accumulate: field.accumulate.then_some((local, field.number)),
        };

        let value = resolution.resolve(&r, &mut session.accumulators);

        if field.number == TIMESTAMP_FIELD {
            if let FieldValue::UInt32(t) = value {
                session.timestamps.observe(t);
                timestamp = Some(t);
            }
        }

        let whole = field.base_type == BaseType::Byte || size == width;
        if !field.components.is_empty() && whole && !value.is_invalid() {
            expanded.extend(expand_components(
                field.components,
                &r,
                definition.byte_order,
                local,
                &mut session.accumulators,
            ));
        }

        if !field.subfields.is_empty() {
            dynamic.push((field, r));
        }

        fields.insert(field.number, value);
    }

    // Fields present in the record take precedence over expanded components.
    for (number, value) in expanded {
        fields.entry(number).or_insert(value);
    }

    let mut subfields = BTreeMap::new();

    for (field, r) in dynamic {
        let Some(subfield) = select_subfield(field.subfields, &fields) else {
            debug!(local, field = field.number, "No sub-field matches its references.");
            continue;
        };

        if subfield.scale != field.scale {
            let resolution = Resolution {
                base_type: field.base_type,
                byte_order: definition.byte_order,
                scale: subfield.scale,
                accumulate: None,
            };
            fields.insert(field.number, resolution.resolve(&r, &mut session.accumulators));
        }

        subfields.insert(field.number, subfield.name);
    }

    let developer_fields = definition
        .developer_fields
        .iter()
        .map(|field| -> Result<DeveloperField, Error> {
            let r = cursor.take_vec(usize::from(field.size))?;
            let index = field.developer_data_index;

            let Some(description) = session.developer.description(index, field.number) else {
                debug!(
                    developer_data_index = index,
                    field = field.number,
                    "Developer field has no description."
                );

                return Ok(DeveloperField {
                    developer_data_index: index,
                    number: field.number,
                    name: None,
                    units: None,
                    value: opaque(&r),
                });
            };

            let width = description.base_type.width();
            if r.len() % width != 0 && leniency == Leniency::Strict {
                Err(Error::MisalignedField {
                    local,
                    field: field.number,
                    size: field.size,
                    width,
                })?;
            }

            let resolution = Resolution {
                base_type: description.base_type,
                byte_order: definition.byte_order,
                scale: description.scale,
                accumulate: None,
            };

            Ok(DeveloperField {
                developer_data_index: index,
                number: field.number,
                name: description.name.clone(),
                units: description.units.clone(),
                value: resolution.resolve(&r, &mut session.accumulators),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(DecodedRecord {
        offset,
        local,
        global: definition.global,
        timestamp,
        time_offset,
        fields,
        subfields,
        developer_fields,
    })
}

/// The first sub-field whose reference field holds one of its values.
fn select_subfield(
    subfields: &'static [SubField],
    fields: &BTreeMap<u8, FieldValue>,
) -> Option<&'static SubField> {
    subfields.iter().find(|subfield| {
        subfield
            .references
            .iter()
            .any(|&(number, value)| fields.get(&number).and_then(FieldValue::as_u64) == Some(value))
    })
}
