//! Configuration variable schema
//!
//! The set of CVs a decoder build understands is data, not code: hardware
//! and CV-numbering revisions swap in a different table through
//! [`DecoderConfig`](crate::DecoderConfig) instead of forking sources.

/// Capacity bound for the cached CV values.
pub const MAX_CVS: usize = 32;

/// One configuration variable in the decoder schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvDefinition {
    /// CV number as used on the wire
    pub id: u16,
    /// Whether the Protocol Link may write this CV
    pub writable: bool,
    /// Whether a factory reset restores the default value
    pub restore_on_reset: bool,
    /// Value applied at first power on and after a factory reset
    pub default_value: u8,
}

impl CvDefinition {
    /// Create a new CV definition
    pub const fn new(id: u16, writable: bool, restore_on_reset: bool, default_value: u8) -> Self {
        Self {
            id,
            writable,
            restore_on_reset,
            default_value,
        }
    }
}

/// Standard CV numbers understood by the stock schema.
pub const CV_PRIMARY_ADDRESS: u16 = 1;
pub const CV_MANUFACTURER_VERSION: u16 = 7;
pub const CV_MANUFACTURER_ID: u16 = 8;
pub const CV_EXTENDED_ADDRESS_MSB: u16 = 17;
pub const CV_EXTENDED_ADDRESS_LSB: u16 = 18;
pub const CV_CONSIST_ADDRESS: u16 = 19;
pub const CV_MODE_CONTROL: u16 = 29;
pub const CV_BRIGHTNESS_1: u16 = 1000;
pub const CV_CCT_1: u16 = 1001;
pub const CV_TRIGGER_1: u16 = 1002;
pub const CV_BRIGHTNESS_2: u16 = 1003;
pub const CV_CCT_2: u16 = 1004;
pub const CV_TRIGGER_2: u16 = 1005;
pub const CV_LIGHT_TEST: u16 = 1010;

/// The stock schema: NMRA-mandated identification CVs plus the light
/// parameters of both profiles.
///
/// Entries must only ever be appended. The schema index doubles as the
/// persistent store address of each CV, so reordering would scramble
/// every already-programmed device on the next firmware upgrade.
pub const STANDARD_SCHEMA: [CvDefinition; 14] = [
    CvDefinition::new(CV_PRIMARY_ADDRESS, true, true, 3),
    CvDefinition::new(CV_MANUFACTURER_VERSION, false, false, 0),
    CvDefinition::new(CV_MANUFACTURER_ID, false, false, 0),
    CvDefinition::new(CV_EXTENDED_ADDRESS_MSB, true, true, 0),
    CvDefinition::new(CV_EXTENDED_ADDRESS_LSB, true, true, 0),
    CvDefinition::new(CV_CONSIST_ADDRESS, true, true, 0),
    CvDefinition::new(CV_MODE_CONTROL, true, true, 2),
    CvDefinition::new(CV_BRIGHTNESS_1, true, true, 50),
    CvDefinition::new(CV_CCT_1, true, true, 255),
    CvDefinition::new(CV_TRIGGER_1, true, true, 1),
    CvDefinition::new(CV_BRIGHTNESS_2, true, true, 30),
    CvDefinition::new(CV_CCT_2, true, true, 255),
    CvDefinition::new(CV_TRIGGER_2, true, true, 20),
    CvDefinition::new(CV_LIGHT_TEST, true, true, 0),
];
