//! Locomotive function state cache
//!
//! Packed record of the F0..F28 on/off states, grouped the way the DCC
//! function packets deliver them. The record persists across power
//! cycles so the lights come up in their last state before the first
//! packet arrives.

/// Number of locomotive functions (F0..F28).
pub const FUNCTION_COUNT: u8 = 29;

/// Number of function groups; also the size of the persisted record.
pub const FUNCTION_GROUPS: usize = 5;

/// Locate the group byte and bit mask of a function number.
///
/// The layout mirrors the DCC function group packets: F0 rides at bit 4
/// of the first group with F1..F4 below it, later groups pack their
/// functions at ascending offsets.
const fn location(function: u8) -> Option<(usize, u8)> {
    match function {
        0 => Some((0, 1 << 4)),
        1..=4 => Some((0, 1 << (function - 1))),
        5..=8 => Some((1, 1 << (function - 5))),
        9..=12 => Some((2, 1 << (function - 9))),
        13..=20 => Some((3, 1 << (function - 13))),
        21..=28 => Some((4, 1 << (function - 21))),
        _ => None,
    }
}

/// Cached on/off state of all 29 locomotive functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionCache {
    groups: [u8; FUNCTION_GROUPS],
}

impl FunctionCache {
    /// Create a cache with every function off.
    pub const fn new() -> Self {
        Self {
            groups: [0; FUNCTION_GROUPS],
        }
    }

    /// Rebuild the cache from a persisted record.
    pub const fn from_bytes(groups: [u8; FUNCTION_GROUPS]) -> Self {
        Self { groups }
    }

    /// The persisted record, one byte per group.
    pub const fn as_bytes(&self) -> [u8; FUNCTION_GROUPS] {
        self.groups
    }

    /// Replace one group byte. Returns whether the cache changed.
    ///
    /// Equal bits and out-of-range group indexes are no-ops, so
    /// redundant packets cause no store traffic.
    pub fn update(&mut self, group: u8, bits: u8) -> bool {
        let Some(slot) = self.groups.get_mut(group as usize) else {
            return false;
        };
        if *slot == bits {
            return false;
        }
        *slot = bits;
        true
    }

    /// Whether a function is on. Out-of-range numbers read as off.
    ///
    /// Functions are addressed indirectly through CV values, so a
    /// misconfigured trigger CV must degrade to "inactive".
    pub const fn is_active(&self, function: u8) -> bool {
        match location(function) {
            Some((group, mask)) => self.groups[group] & mask != 0,
            None => false,
        }
    }

    /// Turn a single function on or off.
    pub fn set(&mut self, function: u8, active: bool) {
        let Some((group, mask)) = location(function) else {
            return;
        };
        if active {
            self.groups[group] |= mask;
        } else {
            self.groups[group] &= !mask;
        }
    }
}
