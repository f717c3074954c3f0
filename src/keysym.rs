//! Keysym name resolution
//!
//! Translates the key names written in the config file (`Return`, `a`,
//! `Cyrillic_ef`, `XF86AudioMute`, `U+0444`, `0xff1b`, ...) to X keysym
//! values through the xkbcommon keysym database, and back for display.
//! Matching is case-insensitive; when several names differ only in case
//! (`eacute`/`Eacute`), the lowercase keysym wins.
//!
//! The server's layout stores legacy keysyms where one exists (`Cyrillic_ef`
//! is `0x6c6`, not the Unicode keysym `0x1000444`), so Unicode names are
//! folded onto the legacy keysym for the same character.

use xkbcommon::xkb;

use crate::keymap::Keysym;

/// Offset of the Unicode keysym block
const UNICODE_OFFSET: u32 = 0x0100_0000;
const UNICODE_MAX: u32 = 0x0010_ffff;

/// Resolve a key name to its keysym
pub fn from_name(name: &str) -> Option<Keysym> {
    if name.is_empty() {
        return None;
    }

    // xkbcommon spells Unicode names without the `+`
    let name = match name.strip_prefix("U+").or_else(|| name.strip_prefix("u+")) {
        Some(hex) => format!("U{hex}"),
        None => name.to_string(),
    };

    match xkb::keysym_from_name(&name, xkb::KEYSYM_CASE_INSENSITIVE).raw() {
        0 => None,
        sym => Some(Keysym(to_legacy(sym))),
    }
}

/// Legacy keysym for a Unicode keysym, if the character has one
fn to_legacy(sym: u32) -> u32 {
    match sym.checked_sub(UNICODE_OFFSET) {
        Some(code_point) if code_point <= UNICODE_MAX => {
            match xkb::utf32_to_keysym(code_point).raw() {
                0 => sym,
                legacy => legacy,
            }
        }
        _ => sym,
    }
}

/// Canonical name of a keysym, for display
pub fn to_name(sym: Keysym) -> Option<String> {
    let name = xkb::keysym_get_name(xkb::Keysym::new(sym.0));
    (!name.is_empty()).then_some(name)
}
