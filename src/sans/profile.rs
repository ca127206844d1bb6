//! Static profile metadata: names, units, scaling and accumulation.
//!
//! The FIT profile assigns meaning to (global message, field number) pairs.
//! The decoder consults it only for the parts that affect decoding: the scale
//! and offset applied to raw values, whether a field accumulates, the
//! components a field's bits expand into, and the sub-fields that reinterpret
//! a field depending on another. Names and units are carried for diagnostics
//! and consumers.

/// Field number of the timestamp in every message.
pub const TIMESTAMP_FIELD: u8 = 253;

/// Global message number of `field_description`.
pub const FIELD_DESCRIPTION: u16 = 206;

/// Global message number of `developer_data_id`.
pub const DEVELOPER_DATA_ID: u16 = 207;

/// A linear transformation from a raw value, as `raw / scale - offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Scale {
    pub scale: f64,
    pub offset: f64,
}

impl Scale {
    pub const fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }

    pub fn apply(self, raw: f64) -> f64 {
        raw / self.scale - self.offset
    }
}

/// A run of bits within a field that is reported as another field of the
/// same message.
///
/// Components are taken from the low bits of the field's integer value
/// upwards, in the order they are listed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    /// The field the bits are reported as.
    pub field: u8,
    pub bits: u8,
    pub scale: Option<Scale>,
    pub accumulate: bool,
}

impl Component {
    pub const fn new(field: u8, bits: u8) -> Self {
        Self {
            field,
            bits,
            scale: None,
            accumulate: false,
        }
    }

    pub const fn scale(mut self, scale: f64, offset: f64) -> Self {
        self.scale = Some(Scale::new(scale, offset));
        self
    }

    pub const fn accumulate(mut self) -> Self {
        self.accumulate = true;
        self
    }

    /// The largest value the component can hold.
    pub fn mask(&self) -> u64 {
        u64::MAX.checked_shr(64 - u32::from(self.bits.min(64))).unwrap_or(0)
    }
}

/// An alternative meaning of a field, selected when another field of the
/// record holds one of the reference values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubField {
    pub name: &'static str,
    pub units: &'static str,
    pub scale: Option<Scale>,
    /// Pairs of (reference field number, value), any of which selects this
    /// sub-field.
    pub references: &'static [(u8, u64)],
}

impl SubField {
    pub const fn new(name: &'static str, references: &'static [(u8, u64)]) -> Self {
        Self {
            name,
            units: "",
            scale: None,
            references,
        }
    }

    pub const fn units(mut self, units: &'static str) -> Self {
        self.units = units;
        self
    }

    pub const fn scale(mut self, scale: f64, offset: f64) -> Self {
        self.scale = Some(Scale::new(scale, offset));
        self
    }
}

/// Profile metadata for one field of one message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileEntry {
    pub message: u16,
    pub field: u8,
    pub name: &'static str,
    pub units: &'static str,
    pub scale: Option<Scale>,
    pub accumulate: bool,
    pub components: &'static [Component],
    pub subfields: &'static [SubField],
}

impl ProfileEntry {
    pub const fn new(message: u16, field: u8, name: &'static str) -> Self {
        Self {
            message,
            field,
            name,
            units: "",
            scale: None,
            accumulate: false,
            components: &[],
            subfields: &[],
        }
    }

    pub const fn units(mut self, units: &'static str) -> Self {
        self.units = units;
        self
    }

    pub const fn scale(mut self, scale: f64, offset: f64) -> Self {
        self.scale = Some(Scale::new(scale, offset));
        self
    }

    pub const fn accumulate(mut self) -> Self {
        self.accumulate = true;
        self
    }

    pub const fn components(mut self, components: &'static [Component]) -> Self {
        self.components = components;
        self
    }

    pub const fn subfields(mut self, subfields: &'static [SubField]) -> Self {
        self.subfields = subfields;
        self
    }
}

/// A table of profile entries, sorted by message then field number.
#[derive(Debug, Clone, Copy)]
pub struct ProfileTable {
    messages: &'static [(u16, &'static str)],
    entries: &'static [ProfileEntry],
}

impl ProfileTable {
    /// A table applying no scaling or accumulation.
    pub const EMPTY: Self = Self::new(&[], &[]);

    /// Common entries of the published FIT profile.
    pub const STANDARD: Self = Self::new(STANDARD_MESSAGES, STANDARD_ENTRIES);

    /// Both slices must be sorted by their keys.
    pub const fn new(
        messages: &'static [(u16, &'static str)],
        entries: &'static [ProfileEntry],
    ) -> Self {
        Self { messages, entries }
    }

    /// Look up the entry for a field of a message.
    pub fn field(&self, message: u16, field: u8) -> Option<&'static ProfileEntry> {
        let entries = self.entries;
        let i = entries
            .binary_search_by_key(&(message, field), |e| (e.message, e.field))
            .ok()?;
        Some(&entries[i])
    }

    /// Name of a field, falling back to `timestamp` for field 253.
    pub fn field_name(&self, message: u16, field: u8) -> Option<&'static str> {
        match self.field(message, field) {
            Some(entry) => Some(entry.name),
            None if field == TIMESTAMP_FIELD => Some("timestamp"),
            None => None,
        }
    }

    /// Name of a message.
    pub fn message_name(&self, message: u16) -> Option<&'static str> {
        let messages = self.messages;
        let i = messages.binary_search_by_key(&message, |m| m.0).ok()?;
        Some(messages[i].1)
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

const STANDARD_MESSAGES: &[(u16, &str)] = &[
    (0, "file_id"),
    (18, "session"),
    (19, "lap"),
    (20, "record"),
    (21, "event"),
    (23, "device_info"),
    (34, "activity"),
    (78, "hrv"),
    (206, "field_description"),
    (207, "developer_data_id"),
];

type E = ProfileEntry;
type C = Component;
type S = SubField;

const GARMIN_MANUFACTURERS: &[(u8, u64)] = &[(1, 1), (1, 13), (1, 15), (1, 89)];
const FILE_PRODUCT: &[SubField] = &[S::new("garmin_product", GARMIN_MANUFACTURERS)];
const DEVICE_MANUFACTURERS: &[(u8, u64)] = &[(2, 1), (2, 13), (2, 15), (2, 89)];
const DEVICE_PRODUCT: &[SubField] = &[S::new("garmin_product", DEVICE_MANUFACTURERS)];

const SESSION_AVG_SPEED: &[Component] = &[C::new(124, 16).scale(1000.0, 0.0)];
const SESSION_MAX_SPEED: &[Component] = &[C::new(125, 16).scale(1000.0, 0.0)];
const LAP_AVG_SPEED: &[Component] = &[C::new(110, 16).scale(1000.0, 0.0)];
const LAP_MAX_SPEED: &[Component] = &[C::new(111, 16).scale(1000.0, 0.0)];

const RECORD_ALTITUDE: &[Component] = &[C::new(78, 16).scale(5.0, 500.0)];
const RECORD_SPEED: &[Component] = &[C::new(73, 16).scale(1000.0, 0.0)];
const RECORD_SPEED_DISTANCE: &[Component] = &[
    C::new(6, 12).scale(100.0, 0.0),
    C::new(5, 12).scale(16.0, 0.0).accumulate(),
];
const RECORD_CYCLES: &[Component] = &[C::new(19, 8).accumulate()];
const RECORD_POWER: &[Component] = &[C::new(29, 16).accumulate()];

const EVENT_DATA: &[SubField] = &[
    S::new("timer_trigger", &[(0, 0)]),
    S::new("course_point_index", &[(0, 10)]),
    S::new("battery_level", &[(0, 11)]).units("V").scale(1000.0, 0.0),
    S::new("virtual_partner_speed", &[(0, 12)]).units("m/s").scale(1000.0, 0.0),
    S::new("hr_high_alert", &[(0, 13)]).units("bpm"),
    S::new("hr_low_alert", &[(0, 14)]).units("bpm"),
    S::new("speed_high_alert", &[(0, 15)]).units("m/s").scale(1000.0, 0.0),
    S::new("speed_low_alert", &[(0, 16)]).units("m/s").scale(1000.0, 0.0),
    S::new("power_high_alert", &[(0, 19)]).units("watts"),
    S::new("power_low_alert", &[(0, 20)]).units("watts"),
    S::new("gear_change_data", &[(0, 42), (0, 43)]),
    S::new("rider_position", &[(0, 44)]),
];

const STANDARD_ENTRIES: &[ProfileEntry] = &[
    // file_id
    E::new(0, 0, "type"),
    E::new(0, 1, "manufacturer"),
    E::new(0, 2, "product").subfields(FILE_PRODUCT),
    E::new(0, 3, "serial_number"),
    E::new(0, 4, "time_created"),
    E::new(0, 5, "number"),
    E::new(0, 8, "product_name"),
    // session
    E::new(18, 0, "event"),
    E::new(18, 1, "event_type"),
    E::new(18, 2, "start_time"),
    E::new(18, 3, "start_position_lat").units("semicircles"),
    E::new(18, 4, "start_position_long").units("semicircles"),
    E::new(18, 5, "sport"),
    E::new(18, 6, "sub_sport"),
    E::new(18, 7, "total_elapsed_time").units("s").scale(1000.0, 0.0),
    E::new(18, 8, "total_timer_time").units("s").scale(1000.0, 0.0),
    E::new(18, 9, "total_distance").units("m").scale(100.0, 0.0),
    E::new(18, 10, "total_cycles").units("cycles"),
    E::new(18, 11, "total_calories").units("kcal"),
    E::new(18, 14, "avg_speed")
        .units("m/s")
        .scale(1000.0, 0.0)
        .components(SESSION_AVG_SPEED),
    E::new(18, 15, "max_speed")
        .units("m/s")
        .scale(1000.0, 0.0)
        .components(SESSION_MAX_SPEED),
    E::new(18, 16, "avg_heart_rate").units("bpm"),
    E::new(18, 17, "max_heart_rate").units("bpm"),
    E::new(18, 18, "avg_cadence").units("rpm"),
    E::new(18, 19, "max_cadence").units("rpm"),
    E::new(18, 20, "avg_power").units("watts"),
    E::new(18, 21, "max_power").units("watts"),
    E::new(18, 22, "total_ascent").units("m"),
    E::new(18, 23, "total_descent").units("m"),
    E::new(18, 124, "enhanced_avg_speed").units("m/s").scale(1000.0, 0.0),
    E::new(18, 125, "enhanced_max_speed").units("m/s").scale(1000.0, 0.0),
    // lap
    E::new(19, 0, "event"),
    E::new(19, 1, "event_type"),
    E::new(19, 2, "start_time"),
    E::new(19, 3, "start_position_lat").units("semicircles"),
    E::new(19, 4, "start_position_long").units("semicircles"),
    E::new(19, 5, "end_position_lat").units("semicircles"),
    E::new(19, 6, "end_position_long").units("semicircles"),
    E::new(19, 7, "total_elapsed_time").units("s").scale(1000.0, 0.0),
    E::new(19, 8, "total_timer_time").units("s").scale(1000.0, 0.0),
    E::new(19, 9, "total_distance").units("m").scale(100.0, 0.0),
    E::new(19, 10, "total_cycles").units("cycles"),
    E::new(19, 11, "total_calories").units("kcal"),
    E::new(19, 13, "avg_speed")
        .units("m/s")
        .scale(1000.0, 0.0)
        .components(LAP_AVG_SPEED),
    E::new(19, 14, "max_speed")
        .units("m/s")
        .scale(1000.0, 0.0)
        .components(LAP_MAX_SPEED),
    E::new(19, 15, "avg_heart_rate").units("bpm"),
    E::new(19, 16, "max_heart_rate").units("bpm"),
    E::new(19, 17, "avg_cadence").units("rpm"),
    E::new(19, 18, "max_cadence").units("rpm"),
    E::new(19, 19, "avg_power").units("watts"),
    E::new(19, 20, "max_power").units("watts"),
    E::new(19, 21, "total_ascent").units("m"),
    E::new(19, 22, "total_descent").units("m"),
    E::new(19, 110, "enhanced_avg_speed").units("m/s").scale(1000.0, 0.0),
    E::new(19, 111, "enhanced_max_speed").units("m/s").scale(1000.0, 0.0),
    // record
    E::new(20, 0, "position_lat").units("semicircles"),
    E::new(20, 1, "position_long").units("semicircles"),
    E::new(20, 2, "altitude")
        .units("m")
        .scale(5.0, 500.0)
        .components(RECORD_ALTITUDE),
    E::new(20, 3, "heart_rate").units("bpm"),
    E::new(20, 4, "cadence").units("rpm"),
    E::new(20, 5, "distance").units("m").scale(100.0, 0.0),
    E::new(20, 6, "speed")
        .units("m/s")
        .scale(1000.0, 0.0)
        .components(RECORD_SPEED),
    E::new(20, 7, "power").units("watts").components(RECORD_POWER),
    E::new(20, 8, "compressed_speed_distance").components(RECORD_SPEED_DISTANCE),
    E::new(20, 9, "grade").units("%").scale(100.0, 0.0),
    E::new(20, 10, "resistance"),
    E::new(20, 11, "time_from_course").units("s").scale(1000.0, 0.0),
    E::new(20, 12, "cycle_length").units("m").scale(100.0, 0.0),
    E::new(20, 13, "temperature").units("C"),
    E::new(20, 18, "cycles").units("cycles").components(RECORD_CYCLES),
    E::new(20, 19, "total_cycles").units("cycles"),
    E::new(20, 29, "accumulated_power").units("watts"),
    E::new(20, 30, "left_right_balance"),
    E::new(20, 73, "enhanced_speed").units("m/s").scale(1000.0, 0.0),
    E::new(20, 78, "enhanced_altitude").units("m").scale(5.0, 500.0),
    // event
    E::new(21, 0, "event"),
    E::new(21, 1, "event_type"),
    E::new(21, 3, "data").subfields(EVENT_DATA),
    E::new(21, 4, "event_group"),
    // device_info
    E::new(23, 0, "device_index"),
    E::new(23, 1, "device_type"),
    E::new(23, 2, "manufacturer"),
    E::new(23, 3, "serial_number"),
    E::new(23, 4, "product").subfields(DEVICE_PRODUCT),
    E::new(23, 5, "software_version").scale(100.0, 0.0),
    E::new(23, 6, "hardware_version"),
    E::new(23, 10, "battery_voltage").units("V").scale(256.0, 0.0),
    E::new(23, 11, "battery_status"),
    // activity
    E::new(34, 0, "total_timer_time").units("s").scale(1000.0, 0.0),
    E::new(34, 1, "num_sessions"),
    E::new(34, 2, "type"),
    E::new(34, 3, "event"),
    E::new(34, 4, "event_type"),
    E::new(34, 5, "local_timestamp"),
    // hrv
    E::new(78, 0, "time").units("s").scale(1000.0, 0.0),
    // field_description
    E::new(206, 0, "developer_data_index"),
    E::new(206, 1, "field_definition_number"),
    E::new(206, 2, "fit_base_type_id"),
    E::new(206, 3, "field_name"),
    E::new(206, 6, "scale"),
    E::new(206, 7, "offset"),
    E::new(206, 8, "units"),
    // developer_data_id
    E::new(207, 0, "developer_id"),
    E::new(207, 1, "application_id"),
    E::new(207, 2, "manufacturer_id"),
    E::new(207, 3, "developer_data_index"),
    E::new(207, 4, "application_version"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tables_are_sorted() {
        let entries = ProfileTable::STANDARD.entries;
        assert!(
            entries
                .windows(2)
                .all(|w| (w[0].message, w[0].field) < (w[1].message, w[1].field))
        );

        let messages = ProfileTable::STANDARD.messages;
        assert!(messages.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn looks_up_scaling() {
        let altitude = ProfileTable::STANDARD.field(20, 2).unwrap();
        assert_eq!(altitude.name, "altitude");
        assert_eq!(altitude.scale.unwrap().apply(2600.0), 20.0);

        assert!(ProfileTable::STANDARD.field(20, 200).is_none());
        assert!(ProfileTable::EMPTY.field(20, 2).is_none());
    }

    #[test]
    fn names_timestamps_in_every_message() {
        let profile = ProfileTable::STANDARD;
        assert_eq!(profile.field_name(20, 253), Some("timestamp"));
        assert_eq!(profile.field_name(0xFF00, 253), Some("timestamp"));
        assert_eq!(profile.message_name(20), Some("record"));
        assert_eq!(profile.message_name(0xFF00), None);
    }
}
