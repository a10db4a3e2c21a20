/*!
 * bondscan BlueZ layer
 * Discovery, bonding and broadcast events via BlueZ D-Bus
 */

pub mod adapter;
pub mod class;
pub mod device;
pub mod error;
pub mod listener;
pub mod session;

use std::time::Duration;

pub use adapter::{Bluetooth, BluezAdapter};
pub use class::DeviceClass;
pub use device::{BondState, DeviceHandle};
pub use error::{BluezError, BondError};
pub use listener::{BluetoothEvent, EventListener};
pub use session::{BluezPlatform, Platform, PlatformSettings};

pub const BLUEZ_DBUS: &str = "org.bluez";

pub const ADAPTER_INTERFACE: &str = "org.bluez.Adapter1";
pub const DEVICE_INTERFACE: &str = "org.bluez.Device1";
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
pub const OBJECT_MANAGER_INTERFACE: &str = "org.freedesktop.DBus.ObjectManager";

pub const DEFAULT_DBUS_TIMEOUT: Duration = Duration::from_secs(30);
