//! Cyclic redundancy checks over document bytes.

/// Nibble table of the CRC-16/ARC polynomial.
const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Accumulate a slice of bytes into a cyclic redundancy check value.
pub fn compute_crc(init: u16, r: &[u8]) -> u16 {
    r.iter().fold(init, |crc, &b| crc_byte(crc, b))
}

/// Accumulate a single byte, low nibble first.
fn crc_byte(crc: u16, b: u8) -> u16 {
    [b & 0x0F, b >> 4].into_iter().fold(crc, |crc, nibble| {
        let tmp = CRC_TABLE[usize::from(crc & 0x0F)];
        ((crc >> 4) & 0x0FFF) ^ tmp ^ CRC_TABLE[usize::from(nibble)]
    })
}

/// Running cyclic redundancy check over every byte consumed from a document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrcAccumulator(u16);

impl CrcAccumulator {
    pub fn new() -> Self {
        Self(0)
    }

    /// Accumulate consumed bytes.
    pub fn update(&mut self, r: &[u8]) {
        self.0 = compute_crc(self.0, r);
    }

    /// The value over all bytes accumulated so far.
    pub fn value(&self) -> u16 {
        self.0
    }
}
