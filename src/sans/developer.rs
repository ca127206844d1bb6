//! Developer field descriptions declared within a document.
//!
//! Developer fields are typed by `field_description` messages rather than by
//! the profile. Each description belongs to a developer data index registered
//! by a `developer_data_id` message.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use tracing::{debug, warn};

use super::{
    base::BaseType,
    data::DecodedRecord,
    profile::{DEVELOPER_DATA_ID, FIELD_DESCRIPTION, Scale},
    value::FieldValue,
};

/// A developer field's type, as declared by a `field_description` message.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeveloperFieldDescription {
    pub developer_data_index: u8,
    pub field_number: u8,
    pub base_type: BaseType,
    pub name: Option<String>,
    pub units: Option<String>,
    pub scale: Option<Scale>,
}

/// A registered developer, as declared by a `developer_data_id` message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Developer {
    pub developer_id: Option<Vec<u8>>,
    pub application_id: Option<Vec<u8>>,
    pub application_version: Option<u32>,
}

/// Developers and their field descriptions seen so far in a document.
#[derive(Debug, Default, Clone)]
pub struct DeveloperRegistry {
    developers: BTreeMap<u8, Developer>,
    descriptions: BTreeMap<(u8, u8), DeveloperFieldDescription>,
}

impl DeveloperRegistry {
    /// Update the registry from a decoded record, if it declares developer
    /// metadata. Other records are ignored.
    pub fn observe(&mut self, record: &DecodedRecord) {
        match record.global {
            DEVELOPER_DATA_ID => self.register(record),
            FIELD_DESCRIPTION => self.describe(record),
            _ => {}
        }
    }

    /// The description of a developer field, if one has been declared.
    pub fn description(
        &self,
        developer_data_index: u8,
        field_number: u8,
    ) -> Option<&DeveloperFieldDescription> {
        self.descriptions.get(&(developer_data_index, field_number))
    }

    /// The developer registered at an index.
    pub fn developer(&self, developer_data_index: u8) -> Option<&Developer> {
        self.developers.get(&developer_data_index)
    }

    /// All declared descriptions, ordered by index then field number.
    pub fn descriptions(&self) -> impl Iterator<Item = &DeveloperFieldDescription> {
        self.descriptions.values()
    }

    /// Registering an index replaces its developer and forgets its earlier
    /// field descriptions.
    fn register(&mut self, record: &DecodedRecord) {
        let Some(index) = small(record.field(3)) else {
            warn!("Ignored developer_data_id without a developer data index.");
            return;
        };

        let bytes = |field| match record.field(field) {
            Some(FieldValue::Bytes(b)) => Some(b.clone()),
            Some(value @ FieldValue::Array(_)) => Vec::<u8>::try_from(value).ok(),
            _ => None,
        };

        let developer = Developer {
            developer_id: bytes(0),
            application_id: bytes(1),
            application_version: record.field(4).and_then(|v| u32::try_from(v).ok()),
        };

        self.descriptions.retain(|&(i, _), _| i != index);
        self.developers.insert(index, developer);

        debug!(developer_data_index = index, "Registered developer.");
    }

    fn describe(&mut self, record: &DecodedRecord) {
        let (Some(index), Some(field_number), Some(code)) = (
            small(record.field(0)),
            small(record.field(1)),
            small(record.field(2)),
        ) else {
            warn!("Ignored field_description without index, number or base type.");
            return;
        };

        let Some(base_type) = BaseType::from_code(code) else {
            warn!(
                developer_data_index = index,
                field_number, code, "Ignored field_description with unknown base type."
            );
            return;
        };

        let text = |field| record.field(field).and_then(|v| String::try_from(v).ok());

        let scale = small(record.field(6)).filter(|&s| s != 0).map(f64::from);
        let offset = record.field(7).and_then(|v| i64::try_from(v).ok());
        let scale = match (scale, offset) {
            (None, None) => None,
            (scale, offset) => Some(Scale::new(
                scale.unwrap_or(1.0),
                offset.unwrap_or(0) as f64,
            )),
        }
        .filter(|s| s.scale != 1.0 || s.offset != 0.0);

        let description = DeveloperFieldDescription {
            developer_data_index: index,
            field_number,
            base_type,
            name: text(3),
            units: text(8),
            scale,
        };

        debug!(
            developer_data_index = index,
            field_number,
            name = description.name.as_deref().unwrap_or(""),
            "Described developer field."
        );

        self.descriptions.insert((index, field_number), description);
    }
}

fn small(value: Option<&FieldValue>) -> Option<u8> {
    value.and_then(|v| u8::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::ToString, vec};

    fn record(global: u16, fields: &[(u8, FieldValue)]) -> DecodedRecord {
        DecodedRecord {
            offset: 0,
            local: 0,
            global,
            timestamp: None,
            time_offset: None,
            fields: fields.iter().cloned().collect(),
            subfields: Default::default(),
            developer_fields: vec![],
        }
    }

    fn description(index: u8, number: u8) -> DecodedRecord {
        record(
            FIELD_DESCRIPTION,
            &[
                (0, FieldValue::UInt8(index)),
                (1, FieldValue::UInt8(number)),
                (2, FieldValue::UInt8(0x84)),
                (3, FieldValue::String("power".to_string())),
                (6, FieldValue::UInt8(10)),
                (7, FieldValue::SInt8(-5)),
                (8, FieldValue::String("W".to_string())),
            ],
        )
    }

    #[test]
    fn describes_developer_fields() {
        let mut registry = DeveloperRegistry::default();
        registry.observe(&description(1, 4));

        let description = registry.description(1, 4).unwrap();
        assert_eq!(description.base_type, BaseType::UInt16);
        assert_eq!(description.name.as_deref(), Some("power"));
        assert_eq!(description.units.as_deref(), Some("W"));
        assert_eq!(description.scale, Some(Scale::new(10.0, -5.0)));

        assert!(registry.description(0, 4).is_none());
    }

    #[test]
    fn identity_scale_is_dropped() {
        let mut registry = DeveloperRegistry::default();
        registry.observe(&record(
            FIELD_DESCRIPTION,
            &[
                (0, FieldValue::UInt8(0)),
                (1, FieldValue::UInt8(0)),
                (2, FieldValue::UInt8(0x02)),
                (6, FieldValue::UInt8(1)),
            ],
        ));

        let description = registry.description(0, 0).unwrap();
        assert_eq!(description.scale, None);
        assert_eq!(description.name, None);
    }

    #[test]
    fn ignores_incomplete_descriptions() {
        let mut registry = DeveloperRegistry::default();
        registry.observe(&record(FIELD_DESCRIPTION, &[(0, FieldValue::UInt8(0))]));
        registry.observe(&record(
            FIELD_DESCRIPTION,
            &[
                (0, FieldValue::UInt8(0)),
                (1, FieldValue::UInt8(0)),
                (2, FieldValue::UInt8(0x1F)),
            ],
        ));

        assert_eq!(registry.descriptions().count(), 0);
    }

    #[test]
    fn registration_replaces_descriptions_of_its_index() {
        let mut registry = DeveloperRegistry::default();
        registry.observe(&description(0, 1));
        registry.observe(&description(1, 1));

        registry.observe(&record(
            DEVELOPER_DATA_ID,
            &[
                (0, FieldValue::Bytes(vec![0xAB; 16])),
                (3, FieldValue::UInt8(0)),
                (4, FieldValue::UInt32(12)),
            ],
        ));

        assert!(registry.description(0, 1).is_none());
        assert!(registry.description(1, 1).is_some());

        let developer = registry.developer(0).unwrap();
        assert_eq!(developer.developer_id, Some(vec![0xAB; 16]));
        assert_eq!(developer.application_version, Some(12));
    }
}
