//! X11/XKB backend
//!
//! Owns the X connection and provides all three collaborator roles:
//! - [`XkbLayout`]: a snapshot of the server's XKB client map
//! - [`X11Grabber`]: core `GrabKey` registration on the root window
//! - [`X11Session`] as [`EventSource`]: key presses, XKB group changes and
//!   mapping changes decoded from the event queue
//!
//! Grabs use the exact modifier mask of each binding. Lock and NumLock are
//! real modifiers here, so `ctrl+a` does not fire while CapsLock is on.

use std::os::unix::io::{AsRawFd, RawFd};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::Event;
use x11rb::protocol::xkb::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{ConnectionExt as _, Grab, GrabMode, ModMask, Window};
use x11rb::rust_connection::RustConnection;

use super::backend::{EventSource, InputEvent, KeyGrabber, KeyboardLayout};
use crate::keymap::{Group, Keycode, Keysym, Level, Modifiers};

/// XKB version the daemon negotiates
const XKB_MAJOR_VERSION: u16 = 1;
const XKB_MINOR_VERSION: u16 = 0;

fn core_keyboard() -> xkb::DeviceSpec {
    xkb::ID::USE_CORE_KBD.into()
}

/// Connection to the X server with XKB initialized
pub struct X11Session {
    conn: RustConnection,
    root: Window,
    min_keycode: Keycode,
    max_keycode: Keycode,
}

impl X11Session {
    /// Connect to `$DISPLAY` and set up XKB for grabbing.
    ///
    /// Grabs follow the XKB state, lookups use the state at grab time and
    /// auto-repeat is detectable. The client listens for state, map and
    /// new-keyboard notifications on the core keyboard.
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 display")?;

        let setup = conn.setup();
        let root = setup.roots[screen_num].root;
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        if conn
            .extension_information(xkb::X11_EXTENSION_NAME)
            .context("Failed to query XKB extension")?
            .is_none()
        {
            bail!("X server does not support the XKB extension");
        }

        let version = conn
            .xkb_use_extension(XKB_MAJOR_VERSION, XKB_MINOR_VERSION)?
            .reply()
            .context("Failed to negotiate XKB extension")?;
        if !version.supported {
            bail!(
                "XKB {}.{} not supported by server (has {}.{})",
                XKB_MAJOR_VERSION,
                XKB_MINOR_VERSION,
                version.server_major,
                version.server_minor
            );
        }

        let flags = xkb::PerClientFlag::GRABS_USE_XKB_STATE
            | xkb::PerClientFlag::LOOKUP_STATE_WHEN_GRABBED
            | xkb::PerClientFlag::DETECTABLE_AUTO_REPEAT;
        conn.xkb_per_client_flags(
            core_keyboard(),
            flags,
            flags,
            xkb::BoolCtrl::from(0u32),
            xkb::BoolCtrl::from(0u32),
            xkb::BoolCtrl::from(0u32),
        )?
        .reply()
        .context("Failed to set XKB per-client flags")?;

        let events = xkb::EventType::STATE_NOTIFY
            | xkb::EventType::MAP_NOTIFY
            | xkb::EventType::NEW_KEYBOARD_NOTIFY;
        conn.xkb_select_events(
            core_keyboard(),
            xkb::EventType::from(0u16),
            events,
            xkb::MapPart::from(0u16),
            xkb::MapPart::from(0u16),
            &xkb::SelectEventsAux::new(),
        )?
        .check()
        .context("Failed to select XKB events")?;

        info!(
            screen = screen_num,
            min_keycode = min_keycode,
            max_keycode = max_keycode,
            "Connected to X11 display with XKB"
        );

        Ok(Self {
            conn,
            root,
            min_keycode,
            max_keycode,
        })
    }

    /// Fetch the key types and key symbol maps of the core keyboard
    pub fn layout(&self) -> Result<XkbLayout> {
        let count = self.max_keycode.saturating_sub(self.min_keycode).saturating_add(1);
        let zero = xkb::MapPart::from(0u16);

        let reply = self
            .conn
            .xkb_get_map(
                core_keyboard(),
                xkb::MapPart::KEY_TYPES | xkb::MapPart::KEY_SYMS,
                zero,
                0,
                0,
                self.min_keycode,
                count,
                0,
                0,
                0,
                0,
                xkb::VMod::from(0u16),
                0,
                0,
                0,
                0,
                0,
                0,
            )?
            .reply()
            .context("Failed to fetch XKB keyboard map")?;

        let type_levels: Vec<u8> = reply
            .map
            .types_rtrn
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|key_type| key_type.num_levels)
            .collect();
        let sym_maps = reply.map.syms_rtrn.as_deref().unwrap_or_default();

        let layout = XkbLayout::new(reply.first_key_sym, &type_levels, sym_maps);
        debug!(
            key_types = type_levels.len(),
            keys = sym_maps.len(),
            "Fetched XKB keyboard map"
        );
        Ok(layout)
    }

    /// Group currently locked on the core keyboard
    pub fn current_group(&self) -> Result<Group> {
        let state = self
            .conn
            .xkb_get_state(core_keyboard())?
            .reply()
            .context("Failed to query XKB state")?;

        let raw = u8::from(state.group);
        Group::new(raw).with_context(|| format!("Server reported unsupported group {}", raw))
    }

    pub fn grabber(&self) -> X11Grabber<'_> {
        X11Grabber {
            conn: &self.conn,
            root: self.root,
        }
    }
}

/// Decode an X event into something the dispatcher understands
fn translate(event: Event) -> Option<InputEvent> {
    match event {
        Event::KeyPress(key_event) => Some(InputEvent::KeyPress {
            keycode: key_event.detail,
            state: u16::from(key_event.state),
        }),
        Event::XkbStateNotify(state) => Some(InputEvent::GroupChanged(u8::from(state.group))),
        Event::MappingNotify(_) | Event::XkbMapNotify(_) | Event::XkbNewKeyboardNotify(_) => {
            Some(InputEvent::MappingChanged)
        }
        Event::Error(e) => {
            warn!(error = ?e, "X11 error");
            None
        }
        _ => None,
    }
}

impl EventSource for X11Session {
    fn raw_fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }

    fn next_event(&self) -> Result<Option<InputEvent>> {
        while let Some(event) = self
            .conn
            .poll_for_event()
            .context("Lost connection to X11 display")?
        {
            if let Some(input) = translate(event) {
                return Ok(Some(input));
            }
        }
        Ok(None)
    }
}

/// Registers key grabs on the root window
pub struct X11Grabber<'a> {
    conn: &'a RustConnection,
    root: Window,
}

impl KeyGrabber for X11Grabber<'_> {
    fn grab_key(&mut self, keycode: Keycode, modifiers: Modifiers) -> Result<()> {
        let modmask = ModMask::from(u16::from(modifiers));
        self.conn
            .grab_key(
                false, // owner_events: events go to the root grab, not the focused client
                self.root,
                modmask,
                keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )
            .with_context(|| {
                format!(
                    "Failed to grab key: keycode={}, modifiers={}",
                    keycode, modifiers
                )
            })?;

        debug!(keycode = keycode, modmask = ?modmask, "Grabbed key");
        Ok(())
    }

    fn ungrab_all(&mut self) -> Result<()> {
        self.conn
            .ungrab_key(Grab::ANY, self.root, ModMask::ANY)
            .context("Failed to release key grabs")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }
}

/// Symbols of one key: `syms[group * width + level]`
#[derive(Debug, Clone, Default)]
struct KeyEntry {
    groups: usize,
    width: usize,
    levels: [usize; 4],
    syms: Vec<u32>,
}

/// Snapshot of the XKB client map
#[derive(Debug, Clone)]
pub struct XkbLayout {
    keys: Vec<KeyEntry>,
}

impl XkbLayout {
    /// `sym_maps[i]` describes keycode `first_keycode + i`; each key's level
    /// count per group comes from the key type it names in `type_levels`
    pub fn new(first_keycode: Keycode, type_levels: &[u8], sym_maps: &[xkb::KeySymMap]) -> Self {
        let mut keys = vec![KeyEntry::default(); 256];

        for (offset, map) in sym_maps.iter().enumerate() {
            let Some(entry) = keys.get_mut(first_keycode as usize + offset) else {
                break;
            };

            let mut levels = [0usize; 4];
            for (group_levels, type_index) in levels.iter_mut().zip(map.kt_index) {
                *group_levels = type_levels
                    .get(type_index as usize)
                    .map_or(0, |&n| n as usize);
            }

            *entry = KeyEntry {
                // Low nibble of group_info is the group count
                groups: (map.group_info & 0x0f) as usize,
                width: map.width as usize,
                levels,
                syms: map.syms.clone(),
            };
        }

        Self { keys }
    }
}

impl KeyboardLayout for XkbLayout {
    fn num_groups_for_key(&self, keycode: Keycode) -> usize {
        self.keys[keycode as usize].groups
    }

    fn num_levels_for_key(&self, keycode: Keycode, group: Group) -> usize {
        let entry = &self.keys[keycode as usize];
        if group.index() >= entry.groups {
            return 0;
        }
        entry.levels[group.index()].min(entry.width)
    }

    fn symbol_for_level(&self, keycode: Keycode, group: Group, level: Level) -> Option<Keysym> {
        let entry = &self.keys[keycode as usize];
        if group.index() >= entry.groups || level.index() >= entry.width {
            return None;
        }

        entry
            .syms
            .get(group.index() * entry.width + level.index())
            .copied()
            .filter(|&sym| sym != 0)
            .map(Keysym)
    }
}
