/*!
 * List Presenter
 * Row model for the device list: icon, name and bond label
 */

use bondscan_bluez::class::{audio_video, major};
use bondscan_bluez::{BondState, DeviceClass, DeviceHandle};

use crate::registry::DeviceRegistry;

pub const UNNAMED: &str = "Unnamed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceIcon {
    Headset,
    Computer,
    Phone,
    Health,
    Camera,
    Car,
    Loudspeaker,
    Microphone,
    Printer,
    SetTopBox,
    Meeting,
    Tv,
    Game,
    Wearable,
    Bluetooth,
}

impl DeviceIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            DeviceIcon::Headset => "🎧",
            DeviceIcon::Computer => "💻",
            DeviceIcon::Phone => "📱",
            DeviceIcon::Health => "🩺",
            DeviceIcon::Camera => "📹",
            DeviceIcon::Car => "🚗",
            DeviceIcon::Loudspeaker => "🔊",
            DeviceIcon::Microphone => "🎤",
            DeviceIcon::Printer => "🖨",
            DeviceIcon::SetTopBox => "📦",
            DeviceIcon::Meeting => "👥",
            DeviceIcon::Tv => "📺",
            DeviceIcon::Game => "🎮",
            DeviceIcon::Wearable => "⌚",
            DeviceIcon::Bluetooth => "ᛒ",
        }
    }
}

/// Fixed class-to-icon table. Specific audio/video codes are checked before
/// the major class.
pub fn icon_for(class: DeviceClass) -> DeviceIcon {
    match class.device() {
        audio_video::HEADPHONES
        | audio_video::WEARABLE_HEADSET
        | audio_video::HANDSFREE
        | audio_video::UNCATEGORIZED => return DeviceIcon::Headset,
        audio_video::CAMCORDER | audio_video::VCR => return DeviceIcon::Camera,
        audio_video::CAR_AUDIO => return DeviceIcon::Car,
        audio_video::LOUDSPEAKER => return DeviceIcon::Loudspeaker,
        audio_video::MICROPHONE => return DeviceIcon::Microphone,
        // Portable audio shows the printer icon
        audio_video::PORTABLE_AUDIO => return DeviceIcon::Printer,
        audio_video::SET_TOP_BOX => return DeviceIcon::SetTopBox,
        audio_video::VIDEO_CONFERENCING => return DeviceIcon::Meeting,
        audio_video::VIDEO_DISPLAY_AND_LOUDSPEAKER => return DeviceIcon::Tv,
        audio_video::VIDEO_GAMING_TOY => return DeviceIcon::Game,
        audio_video::VIDEO_MONITOR => return DeviceIcon::Wearable,
        _ => {}
    }

    match class.major() {
        major::AUDIO_VIDEO => DeviceIcon::Headset,
        major::COMPUTER => DeviceIcon::Computer,
        major::PHONE => DeviceIcon::Phone,
        major::HEALTH => DeviceIcon::Health,
        _ => DeviceIcon::Bluetooth,
    }
}

pub fn bond_label(code: i32) -> &'static str {
    match code {
        BondState::NONE_CODE => "Unpaired",
        BondState::BONDING_CODE => "Pairing...",
        BondState::BONDED_CODE => "Paired",
        _ => "Unpaired",
    }
}

pub fn display_name(device: &DeviceHandle) -> &str {
    device.name.as_deref().unwrap_or(UNNAMED)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub icon: DeviceIcon,
    pub name: String,
    pub address: String,
    pub bond_state: BondState,
    pub bond_label: &'static str,
}

impl Row {
    pub fn from_device(device: &DeviceHandle) -> Self {
        Self {
            icon: icon_for(device.class),
            name: display_name(device).to_string(),
            address: device.address.clone(),
            bond_state: device.bond_state,
            bond_label: bond_label(device.bond_state.code()),
        }
    }
}

/// Selection state over the registry's rows.
#[derive(Debug, Default)]
pub struct ListPresenter {
    selected: usize,
}

impl ListPresenter {
    pub fn rows(&self, registry: &DeviceRegistry) -> Vec<Row> {
        registry.devices().iter().map(Row::from_device).collect()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn previous(&mut self, len: usize) {
        if len > 0 {
            self.selected = if self.selected == 0 {
                len - 1
            } else {
                self.selected - 1
            };
        }
    }

    /// Keep the selection valid after the list changed underneath it.
    pub fn refresh(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn reset(&mut self) {
        self.selected = 0;
    }

    /// Row click: the position of the selected row, if there is one.
    pub fn click(&self, len: usize) -> Option<usize> {
        (self.selected < len).then_some(self.selected)
    }
}
