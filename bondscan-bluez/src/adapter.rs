/*!
 * Bluetooth Adapter
 * Powered state, discovery and bonding on an org.bluez.Adapter1 object
 */

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dbus::arg::PropMap;
use dbus::nonblock::stdintf::org_freedesktop_dbus::{ObjectManager, Properties};
use dbus::nonblock::{Proxy, SyncConnection};
use dbus::Path;
use tracing::{debug, info, warn};

use crate::device::{BondState, DeviceHandle};
use crate::error::{BluezError, BondError};
use crate::{ADAPTER_INTERFACE, BLUEZ_DBUS};

pub type ManagedObjects = HashMap<Path<'static>, HashMap<String, PropMap>>;

fn path_str<'a>(path: &'a Path<'_>) -> &'a str {
    path
}

/// BlueZ refuses a second StartDiscovery from a client that is already
/// discovering.
fn already_discovering(error: &dbus::Error) -> bool {
    error.name() == Some("org.bluez.Error.InProgress")
}

/// The adapter operations the screen controller relies on.
///
/// Futures are `Send` so that long calls (pairing blocks until the remote
/// answers) can be moved onto their own task.
pub trait Bluetooth: Clone + Send + Sync + 'static {
    fn is_enabled(&self) -> impl Future<Output = Result<bool, BluezError>> + Send;

    /// Power the adapter on. Answers the "enable Bluetooth?" prompt.
    fn request_enable(&self) -> impl Future<Output = Result<(), BluezError>> + Send;

    /// Start a time-boxed discovery. Progress is reported through
    /// `DiscoveryStarted`/`DiscoveryFinished` events, not through this future.
    fn start_discovery(&self) -> impl Future<Output = Result<(), BluezError>> + Send;

    fn bonded_devices(&self) -> impl Future<Output = Result<Vec<DeviceHandle>, BluezError>> + Send;

    fn create_bond(&self, device: &DeviceHandle) -> impl Future<Output = Result<(), BondError>> + Send;

    fn remove_bond(&self, device: &DeviceHandle) -> impl Future<Output = Result<(), BondError>> + Send;
}

#[derive(Clone)]
pub struct BluezAdapter {
    connection: Arc<SyncConnection>,
    path: Path<'static>,
    dbus_timeout: Duration,
    pair_timeout: Duration,
    discovery_timeout: Duration,
}

impl BluezAdapter {
    pub fn new(
        connection: Arc<SyncConnection>,
        path: Path<'static>,
        dbus_timeout: Duration,
        pair_timeout: Duration,
        discovery_timeout: Duration,
    ) -> Self {
        Self {
            connection,
            path,
            dbus_timeout,
            pair_timeout,
            discovery_timeout,
        }
    }

    pub fn path(&self) -> &Path<'static> {
        &self.path
    }

    fn proxy(&self) -> Proxy<'_, Arc<SyncConnection>> {
        Proxy::new(BLUEZ_DBUS, self.path.clone(), self.dbus_timeout, self.connection.clone())
    }

    /// First adapter in the managed object tree, which is what BlueZ treats
    /// as the default one.
    pub fn default_path(objects: &ManagedObjects) -> Option<Path<'static>> {
        let mut adapters: Vec<&Path<'static>> = objects
            .iter()
            .filter(|(_, interfaces)| interfaces.contains_key(ADAPTER_INTERFACE))
            .map(|(path, _)| path)
            .collect();
        adapters.sort_by(|a, b| path_str(a).cmp(path_str(b)));
        adapters.first().map(|path| (*path).clone())
    }

    /// Devices owned by the adapter at `adapter` that are paired or bonded,
    /// in object path order.
    pub fn bonded_from_objects(adapter: &Path<'static>, objects: &ManagedObjects) -> Vec<DeviceHandle> {
        let prefix = format!("{}/", adapter);
        let mut devices: Vec<DeviceHandle> = objects
            .iter()
            .filter(|(path, _)| path.starts_with(&prefix))
            .filter_map(|(path, interfaces)| DeviceHandle::from_interfaces(path.clone(), interfaces))
            .filter(|device| device.bond_state == BondState::Bonded)
            .collect();
        devices.sort_by(|a, b| path_str(&a.path).cmp(path_str(&b.path)));
        devices
    }
}

impl Bluetooth for BluezAdapter {
    fn is_enabled(&self) -> impl Future<Output = Result<bool, BluezError>> + Send {
        let adapter = self.clone();
        async move {
            let powered: bool = adapter.proxy().get(ADAPTER_INTERFACE, "Powered").await?;
            Ok(powered)
        }
    }

    fn request_enable(&self) -> impl Future<Output = Result<(), BluezError>> + Send {
        let adapter = self.clone();
        async move {
            info!("Powering on adapter {}", adapter.path);
            adapter.proxy().set(ADAPTER_INTERFACE, "Powered", true).await?;
            Ok(())
        }
    }

    fn start_discovery(&self) -> impl Future<Output = Result<(), BluezError>> + Send {
        let adapter = self.clone();
        async move {
            let started = adapter
                .proxy()
                .method_call::<(), _, _, _>(ADAPTER_INTERFACE, "StartDiscovery", ())
                .await;
            match started {
                Ok(()) => {}
                // Our own earlier run is still going; its stop timer stays armed.
                Err(e) if already_discovering(&e) => {
                    debug!("Discovery already running on {}", adapter.path);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
            info!("Discovery started on {} for {:?}", adapter.path, adapter.discovery_timeout);

            // BlueZ keeps discovering until told otherwise; stop it ourselves
            // so the scan is time-boxed.
            let stopper = adapter.clone();
            tokio::spawn(async move {
                tokio::time::sleep(stopper.discovery_timeout).await;
                let result = stopper
                    .proxy()
                    .method_call::<(), _, _, _>(ADAPTER_INTERFACE, "StopDiscovery", ())
                    .await;
                match result {
                    Ok(()) => debug!("Discovery stopped on {}", stopper.path),
                    Err(e) => warn!("Failed to stop discovery on {}: {}", stopper.path, e),
                }
            });
            Ok(())
        }
    }

    fn bonded_devices(&self) -> impl Future<Output = Result<Vec<DeviceHandle>, BluezError>> + Send {
        let adapter = self.clone();
        async move {
            let root = Proxy::new(BLUEZ_DBUS, "/", adapter.dbus_timeout, adapter.connection.clone());
            let objects = root.get_managed_objects().await?;
            Ok(Self::bonded_from_objects(&adapter.path, &objects))
        }
    }

    fn create_bond(&self, device: &DeviceHandle) -> impl Future<Output = Result<(), BondError>> + Send {
        let connection = self.connection.clone();
        let timeout = self.pair_timeout;
        let path = device.path.clone();
        let address = device.address.clone();
        async move {
            info!("Pairing with device: {}", address);
            let proxy = Proxy::new(BLUEZ_DBUS, path, timeout, connection);
            match proxy
                .method_call::<(), _, _, _>(crate::DEVICE_INTERFACE, "Pair", ())
                .await
            {
                Ok(()) => Ok(()),
                // Already paired counts as success
                Err(e) if e.name() == Some("org.bluez.Error.AlreadyExists") => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn remove_bond(&self, device: &DeviceHandle) -> impl Future<Output = Result<(), BondError>> + Send {
        let adapter = self.clone();
        let device_path = device.path.clone();
        let address = device.address.clone();
        async move {
            info!("Removing bond with device: {}", address);
            adapter
                .proxy()
                .method_call::<(), _, _, _>(ADAPTER_INTERFACE, "RemoveDevice", (device_path,))
                .await?;
            Ok(())
        }
    }
}
