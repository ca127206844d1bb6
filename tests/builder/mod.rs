#![allow(dead_code)]

use freewheel::sans::check::compute_crc;

/// Assembles documents record by record.
pub struct FitBuilder {
    header_size: u8,
    header_crc: Option<u16>,
    records: Vec<u8>,
}

impl FitBuilder {
    /// A document with a 14-byte header.
    pub fn new() -> Self {
        Self {
            header_size: 14,
            header_crc: None,
            records: vec![],
        }
    }

    /// Use a 12-byte header without a checksum.
    pub fn legacy_header(mut self) -> Self {
        self.header_size = 12;
        self
    }

    /// Store a fixed header checksum in place of the computed one.
    pub fn header_crc(mut self, crc: u16) -> Self {
        self.header_crc = Some(crc);
        self
    }

    /// A little endian definition of `(number, size, base type)` fields.
    pub fn definition(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_record(0x40 | local, 0, global.to_le_bytes(), fields, None)
    }

    pub fn big_endian_definition(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_record(0x40 | local, 1, global.to_be_bytes(), fields, None)
    }

    /// A definition with trailing `(number, size, developer data index)`
    /// developer fields.
    pub fn developer_definition(
        self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> Self {
        self.definition_record(0x60 | local, 0, global.to_le_bytes(), fields, Some(developer))
    }

    /// A data record with a normal header.
    pub fn data(mut self, local: u8, bytes: &[u8]) -> Self {
        self.records.push(local & 0x0F);
        self.records.extend_from_slice(bytes);
        self
    }

    /// A data record with a compressed timestamp header.
    pub fn compressed(mut self, local: u8, time_offset: u8, bytes: &[u8]) -> Self {
        self.records
            .push(0x80 | ((local & 0x03) << 5) | (time_offset & 0x1F));
        self.records.extend_from_slice(bytes);
        self
    }

    /// Bytes appended to the record section as they are.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.records.extend_from_slice(bytes);
        self
    }

    pub fn records(&self) -> &[u8] {
        &self.records
    }

    /// The document, declaring the length of its record section.
    pub fn build(&self) -> Vec<u8> {
        self.build_with_data_size(self.records.len() as u32)
    }

    /// The document, declaring an arbitrary record section length.
    pub fn build_with_data_size(&self, data_size: u32) -> Vec<u8> {
        let mut r = vec![self.header_size, 0x20];
        r.extend_from_slice(&2132u16.to_le_bytes());
        r.extend_from_slice(&data_size.to_le_bytes());
        r.extend_from_slice(b".FIT");

        if self.header_size == 14 {
            let crc = self.header_crc.unwrap_or_else(|| compute_crc(0, &r));
            r.extend_from_slice(&crc.to_le_bytes());
        }

        r.extend_from_slice(&self.records);

        let crc = compute_crc(0, &r);
        r.extend_from_slice(&crc.to_le_bytes());
        r
    }

    fn definition_record(
        mut self,
        header: u8,
        architecture: u8,
        global: [u8; 2],
        fields: &[(u8, u8, u8)],
        developer: Option<&[(u8, u8, u8)]>,
    ) -> Self {
        self.records.extend_from_slice(&[header, 0, architecture]);
        self.records.extend_from_slice(&global);
        self.records.push(fields.len() as u8);

        for &(number, size, base_type) in fields {
            self.records.extend_from_slice(&[number, size, base_type]);
        }

        if let Some(developer) = developer {
            self.records.push(developer.len() as u8);

            for &(number, size, index) in developer {
                self.records.extend_from_slice(&[number, size, index]);
            }
        }

        self
    }
}
