/*!
 * Platform session
 * System bus connection, default adapter lookup and listener lifecycle
 */

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dbus::nonblock::stdintf::org_freedesktop_dbus::ObjectManager;
use dbus::nonblock::{Proxy, SyncConnection};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::adapter::{Bluetooth, BluezAdapter};
use crate::error::BluezError;
use crate::listener::{BluetoothEvent, EventListener};
use crate::{BLUEZ_DBUS, DEFAULT_DBUS_TIMEOUT};

/// Bring-up and tear-down of the host Bluetooth stack.
pub trait Platform {
    type Adapter: Bluetooth;

    /// Register for the four event kinds and look up the default adapter.
    /// `Ok(None)` means the machine has no Bluetooth.
    fn initialize(
        &mut self,
        events: UnboundedSender<BluetoothEvent>,
    ) -> impl Future<Output = Result<Option<Self::Adapter>, BluezError>>;

    /// Deregister the event listener.
    fn shutdown(&mut self) -> impl Future<Output = ()>;
}

#[derive(Debug, Clone, Copy)]
pub struct PlatformSettings {
    pub dbus_timeout: Duration,
    pub pair_timeout: Duration,
    pub discovery_timeout: Duration,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            dbus_timeout: DEFAULT_DBUS_TIMEOUT,
            pair_timeout: Duration::from_secs(60),
            discovery_timeout: Duration::from_secs(12),
        }
    }
}

pub struct BluezPlatform {
    settings: PlatformSettings,
    connection: Option<Arc<SyncConnection>>,
    listener: Option<EventListener>,
}

impl BluezPlatform {
    pub fn new(settings: PlatformSettings) -> Self {
        Self {
            settings,
            connection: None,
            listener: None,
        }
    }

    fn connect(&mut self) -> Result<Arc<SyncConnection>, BluezError> {
        if let Some(connection) = &self.connection {
            return Ok(connection.clone());
        }

        let (resource, connection) = dbus_tokio::connection::new_system_sync()?;
        tokio::spawn(async move {
            let err = resource.await;
            error!("Lost connection to the system bus: {}", err);
        });

        self.connection = Some(connection.clone());
        Ok(connection)
    }
}

impl Platform for BluezPlatform {
    type Adapter = BluezAdapter;

    fn initialize(
        &mut self,
        events: UnboundedSender<BluetoothEvent>,
    ) -> impl Future<Output = Result<Option<BluezAdapter>, BluezError>> {
        async move {
            let connection = self.connect()?;
            let settings = self.settings;

            let listener =
                EventListener::register(connection.clone(), events, settings.dbus_timeout).await?;
            self.listener = Some(listener);

            let root = Proxy::new(BLUEZ_DBUS, "/", settings.dbus_timeout, connection.clone());
            let objects = match root.get_managed_objects().await {
                Ok(objects) => objects,
                // bluetoothd not running or not installed
                Err(e) if e.name() == Some("org.freedesktop.DBus.Error.ServiceUnknown") => {
                    warn!("BlueZ is not available on the system bus");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            let adapter = BluezAdapter::default_path(&objects).map(|path| {
                info!("Using Bluetooth adapter {}", path);
                BluezAdapter::new(
                    connection,
                    path,
                    settings.dbus_timeout,
                    settings.pair_timeout,
                    settings.discovery_timeout,
                )
            });
            Ok(adapter)
        }
    }

    fn shutdown(&mut self) -> impl Future<Output = ()> {
        async move {
            if let Some(listener) = self.listener.take() {
                listener.unregister().await;
            }
        }
    }
}
