//! Primitive types of the binding model
//!
//! Wraps the raw numbers the X server hands out so that a keysym can't be
//! passed where a keycode is expected, and so out-of-range groups and levels
//! can't be represented at all.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use crate::constants::{model, modifiers};

/// Physical key identity as reported in key events (0-255)
pub type Keycode = u8;

/// Symbolic key meaning, independent of physical position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Keysym(pub u32);

impl Keysym {
    /// `NoSymbol`: an empty slot in the layout
    pub const NONE: Keysym = Keysym(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for Keysym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Keyboard group (layout) index, always below [`model::MAX_GROUPS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Group(u8);

impl Group {
    pub const FIRST: Group = Group(0);

    /// Returns `None` when the index is outside the modeled range
    pub fn new(index: u8) -> Option<Self> {
        ((index as usize) < model::MAX_GROUPS).then_some(Self(index))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All modeled groups in ascending order
    pub fn all() -> impl Iterator<Item = Group> {
        (0..model::MAX_GROUPS as u8).map(Group)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shift level of a key. Levels above the shifted one are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Base,
    Shifted,
}

impl Level {
    pub const ALL: [Level; model::MAX_LEVELS] = [Level::Base, Level::Shifted];

    pub fn index(self) -> usize {
        match self {
            Level::Base => 0,
            Level::Shifted => 1,
        }
    }

    /// Level selected by a modifier state: only the shift bit matters
    pub fn from_modifiers(mods: Modifiers) -> Self {
        if mods.contains(Modifiers::SHIFT) {
            Level::Shifted
        } else {
            Level::Base
        }
    }
}

/// Bitset over shift, lock, control and mod1-mod5
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u16);

/// Config-file spelling of each modifier bit, in bit order
const MODIFIER_NAMES: [(&str, Modifiers); 8] = [
    ("shift", Modifiers::SHIFT),
    ("lock", Modifiers::LOCK),
    ("ctrl", Modifiers::CONTROL),
    ("mod1", Modifiers::MOD1),
    ("mod2", Modifiers::MOD2),
    ("mod3", Modifiers::MOD3),
    ("mod4", Modifiers::MOD4),
    ("mod5", Modifiers::MOD5),
];

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(modifiers::SHIFT);
    pub const LOCK: Modifiers = Modifiers(modifiers::LOCK);
    pub const CONTROL: Modifiers = Modifiers(modifiers::CONTROL);
    pub const MOD1: Modifiers = Modifiers(modifiers::MOD1);
    pub const MOD2: Modifiers = Modifiers(modifiers::MOD2);
    pub const MOD3: Modifiers = Modifiers(modifiers::MOD3);
    pub const MOD4: Modifiers = Modifiers(modifiers::MOD4);
    pub const MOD5: Modifiers = Modifiers(modifiers::MOD5);

    /// Keep only the bits relevant to binding lookup from a raw event state
    pub fn from_event_state(state: u16) -> Self {
        Self(state & modifiers::RELEVANT_BITS)
    }

    /// Look up a modifier by its config-file name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        MODIFIER_NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, bit)| *bit)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<Modifiers> for u16 {
    fn from(mods: Modifiers) -> u16 {
        mods.0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Modifiers {
    type Output = Modifiers;

    fn bitand(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 & rhs.0)
    }
}

impl fmt::Display for Modifiers {
    /// Renders as the config-file spelling, e.g. `ctrl+mod4`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = MODIFIER_NAMES
            .iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(name, _)| *name)
            .collect();

        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("+"))
        }
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers({self}, 0x{:02x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_names() {
        assert_eq!(Modifiers::from_name("shift"), Some(Modifiers::SHIFT));
        assert_eq!(Modifiers::from_name("CTRL"), Some(Modifiers::CONTROL));
        assert_eq!(Modifiers::from_name("Mod4"), Some(Modifiers::MOD4));
        assert_eq!(Modifiers::from_name("alt"), None);
        assert_eq!(Modifiers::from_name("shiftx"), None);
    }

    #[test]
    fn test_modifier_bits_follow_core_protocol() {
        assert_eq!(Modifiers::SHIFT.bits(), 0x01);
        assert_eq!(Modifiers::LOCK.bits(), 0x02);
        assert_eq!(Modifiers::CONTROL.bits(), 0x04);
        assert_eq!(Modifiers::MOD5.bits(), 0x80);
    }

    #[test]
    fn test_event_state_masks_buttons_and_group() {
        // Control + Button1 + XKB group 2
        let state = 0x0004 | 0x0100 | 0x4000;
        assert_eq!(Modifiers::from_event_state(state), Modifiers::CONTROL);
    }

    #[test]
    fn test_level_from_modifiers() {
        assert_eq!(Level::from_modifiers(Modifiers::NONE), Level::Base);
        assert_eq!(Level::from_modifiers(Modifiers::CONTROL), Level::Base);
        assert_eq!(
            Level::from_modifiers(Modifiers::SHIFT | Modifiers::MOD1),
            Level::Shifted
        );
    }

    #[test]
    fn test_group_range() {
        assert!(Group::new(3).is_some());
        assert!(Group::new(4).is_none());
        assert_eq!(Group::all().count(), 4);
    }

    #[test]
    fn test_modifier_display() {
        assert_eq!((Modifiers::CONTROL | Modifiers::SHIFT).to_string(), "shift+ctrl");
        assert_eq!(Modifiers::NONE.to_string(), "none");
    }
}
