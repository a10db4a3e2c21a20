/*!
 * Device handles
 * Snapshot of an org.bluez.Device1 object as the app sees it
 */

use std::collections::HashMap;

use dbus::arg::{prop_cast, PropMap};
use dbus::Path;

use crate::class::DeviceClass;
use crate::DEVICE_INTERFACE;

/// Bond state, numbered like the platform bond codes the UI maps to labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondState {
    #[default]
    None,
    Bonding,
    Bonded,
}

impl BondState {
    pub const NONE_CODE: i32 = 10;
    pub const BONDING_CODE: i32 = 11;
    pub const BONDED_CODE: i32 = 12;

    pub fn code(self) -> i32 {
        match self {
            BondState::None => Self::NONE_CODE,
            BondState::Bonding => Self::BONDING_CODE,
            BondState::Bonded => Self::BONDED_CODE,
        }
    }

    /// Unknown codes collapse to `None`.
    pub fn from_code(code: i32) -> Self {
        match code {
            Self::BONDING_CODE => BondState::Bonding,
            Self::BONDED_CODE => BondState::Bonded,
            _ => BondState::None,
        }
    }

    /// BlueZ reports `Paired` and, since 5.65, `Bonded`. Either one counts.
    pub fn from_flags(paired: bool, bonded: bool) -> Self {
        if paired || bonded {
            BondState::Bonded
        } else {
            BondState::None
        }
    }
}

/// A remote device. Identity is the Bluetooth address; everything else is
/// whatever BlueZ reported when the snapshot was taken.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    pub path: Path<'static>,
    pub address: String,
    pub name: Option<String>,
    pub bond_state: BondState,
    pub class: DeviceClass,
}

impl DeviceHandle {
    pub fn new(
        path: Path<'static>,
        address: impl Into<String>,
        name: Option<String>,
        bond_state: BondState,
        class: DeviceClass,
    ) -> Self {
        Self {
            path,
            address: address.into(),
            name,
            bond_state,
            class,
        }
    }

    /// Build a handle from a `Device1` property map. Returns `None` when the
    /// object carries no address.
    pub fn from_props(path: Path<'static>, props: &PropMap) -> Option<Self> {
        let address = prop_cast::<String>(props, "Address").cloned()?;
        // Alias always falls back to the address, so only Name tells us
        // whether the remote actually advertised one.
        let name = prop_cast::<String>(props, "Name")
            .cloned()
            .filter(|name| !name.is_empty());
        let paired = prop_cast::<bool>(props, "Paired").copied().unwrap_or(false);
        let bonded = prop_cast::<bool>(props, "Bonded").copied().unwrap_or(false);
        let class = prop_cast::<u32>(props, "Class").copied().unwrap_or(0);

        Some(Self {
            path,
            address,
            name,
            bond_state: BondState::from_flags(paired, bonded),
            class: DeviceClass::new(class),
        })
    }

    /// Same as [`DeviceHandle::from_props`] but starting from the full
    /// interface map an ObjectManager reports for a path.
    pub fn from_interfaces(
        path: Path<'static>,
        interfaces: &HashMap<String, PropMap>,
    ) -> Option<Self> {
        interfaces
            .get(DEVICE_INTERFACE)
            .and_then(|props| Self::from_props(path, props))
    }

    pub fn same_device(&self, other: &DeviceHandle) -> bool {
        self.address == other.address
    }
}
