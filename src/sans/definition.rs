//! Definition records and the table binding them to local message numbers.

use alloc::vec::Vec;

use tracing::{trace, warn};
use zerocopy::FromBytes;

use crate::{error::Error, stream::Leniency};

use super::{
    base::{BaseType, ByteOrder},
    cursor::{ByteCursor, Source},
    profile::{Component, ProfileTable, Scale, SubField},
};

/// Number of local message numbers a document may bind at once.
pub const LOCAL_MESSAGES: usize = 16;

/// The layout of one field of a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDefinition {
    pub number: u8,
    /// Size in bytes, a multiple of the base type's width for valid fields.
    pub size: u8,
    pub base_type: BaseType,
    /// Profile scaling for this field of this message, if any.
    pub scale: Option<Scale>,
    /// Whether the profile marks this field as accumulating.
    pub accumulate: bool,
    /// Fields the profile expands this field's bits into.
    pub components: &'static [Component],
    pub subfields: &'static [SubField],
}

/// The layout of one developer field of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub number: u8,
    pub size: u8,
    pub developer_data_index: u8,
}

/// The schema bound to a local message number.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    pub local: u8,
    pub global: u16,
    pub byte_order: ByteOrder,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

impl MessageDefinition {
    /// Bytes following the record header of a data record with this
    /// definition.
    pub fn data_size(&self) -> usize {
        let fields = self.fields.iter().map(|f| usize::from(f.size));
        let developer = self.developer_fields.iter().map(|f| usize::from(f.size));
        fields.chain(developer).sum()
    }

    /// Decode a definition record following its header byte.
    ///
    /// `offset` is that of the record header, for error context. The profile
    /// supplies scaling, accumulation, components and sub-fields for each
    /// field.
    pub fn decode<S: Source>(
        cursor: &mut ByteCursor<S>,
        offset: usize,
        local: u8,
        has_developer_fields: bool,
        profile: &ProfileTable,
        leniency: Leniency,
    ) -> Result<Self, Error> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct DefinitionMessage {
            _reserved: u8,
            architecture: u8,
            global_message: [u8; 2],
            fields: u8,
        }

        let ensure = |cursor: &ByteCursor<S>, needed: usize| {
            let remaining = cursor.remaining();
            if needed > remaining {
                Err(Error::TruncatedRecord {
                    offset,
                    local,
                    needed,
                    remaining,
                })
            } else {
                Ok(())
            }
        };

        ensure(&*cursor, 5)?;

        let DefinitionMessage {
            architecture,
            global_message,
            fields,
            ..
        } = zerocopy::transmute!(cursor.take::<5>()?);

        let byte_order = ByteOrder::from_architecture(architecture).ok_or(
            Error::UnknownArchitectureByte {
                offset,
                local,
                value: architecture,
            },
        )?;

        let global = match byte_order {
            ByteOrder::Little => u16::from_le_bytes(global_message),
            ByteOrder::Big => u16::from_be_bytes(global_message),
        };

        ensure(&*cursor, usize::from(fields) * 3)?;

        let fields = (0..fields)
            .map(|_| -> Result<FieldDefinition, Error> {
                let [number, size, code] = cursor.take()?;

                let base_type = match (BaseType::from_code(code), leniency) {
                    (Some(base_type), _) => base_type,
                    (None, Leniency::Opaque) => {
                        warn!(
                            local,
                            global,
                            field = number,
                            name = profile.field_name(global, number),
                            code,
                            "Decoding unknown base type as bytes."
                        );
                        BaseType::Byte
                    }
                    (None, Leniency::Strict) => Err(Error::UnknownBaseType {
                        offset,
                        local,
                        field: number,
                        value: code,
                    })?,
                };

                let entry = profile.field(global, number);

                Ok(FieldDefinition {
                    number,
                    size,
                    base_type,
                    scale: entry.and_then(|e| e.scale),
                    accumulate: entry.is_some_and(|e| e.accumulate) && base_type.is_integer(),
                    components: entry.map(|e| e.components).unwrap_or_default(),
                    subfields: entry.map(|e| e.subfields).unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let developer_fields = if has_developer_fields {
            ensure(&*cursor, 1)?;
            let [count] = cursor.take()?;

            ensure(&*cursor, usize::from(count) * 3)?;

            (0..count)
                .map(|_| -> Result<DeveloperFieldDefinition, Error> {
                    let [number, size, developer_data_index] = cursor.take()?;

                    Ok(DeveloperFieldDefinition {
                        number,
                        size,
                        developer_data_index,
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?
        } else {
            Vec::new()
        };

        Ok(Self {
            local,
            global,
            byte_order,
            fields,
            developer_fields,
        })
    }
}

/// The definitions currently bound to each local message number.
#[derive(Debug, Default, Clone)]
pub struct DefinitionTable {
    slots: [Option<MessageDefinition>; LOCAL_MESSAGES],
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a definition to its local message number, returning the
    /// definition it replaces.
    pub fn install(&mut self, definition: MessageDefinition) -> Option<MessageDefinition> {
        trace!(
            local = definition.local,
            global = definition.global,
            fields = definition.fields.len(),
            developer_fields = definition.developer_fields.len(),
            "Installed definition."
        );

        let slot = &mut self.slots[usize::from(definition.local) % LOCAL_MESSAGES];
        slot.replace(definition)
    }

    /// The definition bound to a local message number.
    pub fn get(&self, local: u8) -> Option<&MessageDefinition> {
        self.slots.get(usize::from(local))?.as_ref()
    }

    /// Bound definitions, by local message number.
    pub fn iter(&self) -> impl Iterator<Item = &MessageDefinition> {
        self.slots.iter().flatten()
    }
}
