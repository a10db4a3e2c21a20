/*!
 * Device Registry
 * Session-only, insertion-ordered list of devices unique by address
 */

use bondscan_bluez::{BondState, DeviceHandle};

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<DeviceHandle>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `device` unless it has no name or is already listed.
    /// Returns whether it was added.
    pub fn insert(&mut self, device: DeviceHandle) -> bool {
        if device.name.is_none() || self.contains(&device.address) {
            return false;
        }
        self.devices.push(device);
        true
    }

    pub fn contains(&self, address: &str) -> bool {
        self.devices.iter().any(|d| d.address == address)
    }

    pub fn remove(&mut self, address: &str) -> Option<DeviceHandle> {
        let index = self.devices.iter().position(|d| d.address == address)?;
        Some(self.devices.remove(index))
    }

    /// Update the stored bond state in place. Unknown addresses are ignored.
    pub fn set_bond_state(&mut self, address: &str, state: BondState) -> bool {
        match self.devices.iter_mut().find(|d| d.address == address) {
            Some(device) => {
                device.bond_state = state;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn get(&self, index: usize) -> Option<&DeviceHandle> {
        self.devices.get(index)
    }

    pub fn devices(&self) -> &[DeviceHandle] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
