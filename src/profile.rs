//! Light profiles and profile selection
//!
//! A profile is a brightness/CCT pair activated by a locomotive
//! function. Profile 1's trigger is the master light enable; profile 2
//! overrides it (e.g. a "night mode" function) once the master gate is
//! open.

use crate::functions::FunctionCache;

/// Trigger value marking a profile as unused.
pub const TRIGGER_UNUSED: u8 = 255;

/// Brightness/CCT parameter set snapshot assembled from three CVs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightProfile {
    /// Perceived brightness, 0..=255
    pub brightness: u8,
    /// Color temperature, 0 = warmest, 255 = coolest
    pub cct: u8,
    /// Function number activating this profile, or [`TRIGGER_UNUSED`]
    pub trigger_function: u8,
}

/// Which parameter set currently drives the lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSelection {
    /// Both channels forced to zero duty
    Off,
    Profile1,
    Profile2,
}

/// Decide which profile applies given the current function states.
///
/// Profile 1's trigger gates everything: inactive means dark regardless
/// of profile 2. With the gate open, profile 2 wins iff its trigger is
/// assigned and active.
pub const fn select_active_profile(
    functions: &FunctionCache,
    profile1: &LightProfile,
    profile2: &LightProfile,
) -> ProfileSelection {
    if !functions.is_active(profile1.trigger_function) {
        return ProfileSelection::Off;
    }
    if profile2.trigger_function != TRIGGER_UNUSED && functions.is_active(profile2.trigger_function)
    {
        return ProfileSelection::Profile2;
    }
    ProfileSelection::Profile1
}
