/*!
 * Broadcast Listener
 * Turns BlueZ D-Bus signals into the four events the screen reacts to
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dbus::arg::{prop_cast, PropMap};
use dbus::channel::Token;
use dbus::message::MatchRule;
use dbus::nonblock::stdintf::org_freedesktop_dbus::Properties;
use dbus::nonblock::{Proxy, SyncConnection};
use dbus::{Message, Path};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::device::{BondState, DeviceHandle};
use crate::error::BluezError;
use crate::{
    ADAPTER_INTERFACE, BLUEZ_DBUS, DEVICE_INTERFACE, OBJECT_MANAGER_INTERFACE,
    PROPERTIES_INTERFACE,
};

#[derive(Debug, Clone)]
pub enum BluetoothEvent {
    DeviceFound(DeviceHandle),
    BondStateChanged { address: String, state: BondState },
    DiscoveryStarted,
    DiscoveryFinished,
    Unknown(String),
}

/// What a single signal translates to. `Refresh` means the signal only told
/// us a device was seen again and its properties have to be read back.
/// `RecheckBond` means one bond flag went false while the other is unknown.
#[derive(Debug)]
pub(crate) enum Translation {
    Event(BluetoothEvent),
    Refresh(Path<'static>),
    RecheckBond(Path<'static>),
    Ignore,
}

pub(crate) fn translate_interfaces_added(
    path: Path<'static>,
    interfaces: &HashMap<String, PropMap>,
) -> Translation {
    match DeviceHandle::from_interfaces(path, interfaces) {
        Some(device) => Translation::Event(BluetoothEvent::DeviceFound(device)),
        None => Translation::Ignore,
    }
}

pub(crate) fn translate_properties_changed(
    path: Path<'static>,
    interface: &str,
    changed: &PropMap,
) -> Translation {
    match interface {
        ADAPTER_INTERFACE => match prop_cast::<bool>(changed, "Discovering") {
            Some(true) => Translation::Event(BluetoothEvent::DiscoveryStarted),
            Some(false) => Translation::Event(BluetoothEvent::DiscoveryFinished),
            None => Translation::Ignore,
        },
        DEVICE_INTERFACE => {
            let paired = prop_cast::<bool>(changed, "Paired").copied();
            let bonded = prop_cast::<bool>(changed, "Bonded").copied();
            if paired.is_some() || bonded.is_some() {
                let address = match address_from_path(&path) {
                    Some(address) => address,
                    None => return Translation::Ignore,
                };
                match (paired, bonded) {
                    (Some(true), _) | (_, Some(true)) => Translation::Event(BluetoothEvent::BondStateChanged {
                        address,
                        state: BondState::Bonded,
                    }),
                    (Some(false), Some(false)) => Translation::Event(BluetoothEvent::BondStateChanged {
                        address,
                        state: BondState::None,
                    }),
                    _ => Translation::RecheckBond(path),
                }
            } else if changed.contains_key("RSSI") {
                Translation::Refresh(path)
            } else {
                Translation::Ignore
            }
        }
        _ => Translation::Ignore,
    }
}

/// BlueZ names device objects `.../dev_AA_BB_CC_DD_EE_FF`.
pub(crate) fn address_from_path(path: &str) -> Option<String> {
    let leaf = path.rsplit('/').next()?;
    let raw = leaf.strip_prefix("dev_")?;
    if raw.len() != 17 {
        return None;
    }
    Some(raw.replace('_', ":"))
}

/// Holds the match rules registered on the bus. Dropping the listener does
/// not remove them; call [`EventListener::unregister`].
pub struct EventListener {
    connection: Arc<SyncConnection>,
    tokens: Vec<Token>,
}

impl EventListener {
    pub async fn register(
        connection: Arc<SyncConnection>,
        events: UnboundedSender<BluetoothEvent>,
        dbus_timeout: Duration,
    ) -> Result<Self, BluezError> {
        let mut tokens = Vec::new();

        let added_rule = MatchRule::new_signal(OBJECT_MANAGER_INTERFACE, "InterfacesAdded")
            .with_sender(BLUEZ_DBUS);
        let tx = events.clone();
        let added = connection
            .add_match(added_rule)
            .await?
            .msg_cb(move |msg: Message| {
                let translation = match msg.read2::<Path<'static>, HashMap<String, PropMap>>() {
                    Ok((path, interfaces)) => translate_interfaces_added(path, &interfaces),
                    Err(e) => {
                        Translation::Event(BluetoothEvent::Unknown(format!("InterfacesAdded: {}", e)))
                    }
                };
                deliver(&tx, translation);
                true
            });
        tokens.push(added.token());

        let changed_rule = MatchRule::new_signal(PROPERTIES_INTERFACE, "PropertiesChanged")
            .with_sender(BLUEZ_DBUS);
        let tx = events;
        let conn = connection.clone();
        let changed = connection
            .add_match(changed_rule)
            .await?
            .msg_cb(move |msg: Message| {
                let path = match msg.path() {
                    Some(path) => path.into_static(),
                    None => {
                        deliver(&tx, Translation::Event(BluetoothEvent::Unknown(
                            "PropertiesChanged without object path".to_string(),
                        )));
                        return true;
                    }
                };
                let translation = match msg.read2::<String, PropMap>() {
                    Ok((interface, changed)) => translate_properties_changed(path, &interface, &changed),
                    Err(e) => Translation::Event(BluetoothEvent::Unknown(format!(
                        "PropertiesChanged on {}: {}",
                        path, e
                    ))),
                };
                match translation {
                    Translation::Refresh(path) => refresh_device(conn.clone(), path, tx.clone(), dbus_timeout),
                    Translation::RecheckBond(path) => recheck_bond(conn.clone(), path, tx.clone(), dbus_timeout),
                    other => deliver(&tx, other),
                }
                true
            });
        tokens.push(changed.token());

        debug!("Registered {} BlueZ signal matches", tokens.len());
        Ok(Self { connection, tokens })
    }

    pub async fn unregister(self) {
        for token in self.tokens {
            if let Err(e) = self.connection.remove_match(token).await {
                warn!("Failed to remove D-Bus match: {}", e);
            }
        }
        debug!("BlueZ signal matches removed");
    }
}

fn deliver(tx: &UnboundedSender<BluetoothEvent>, translation: Translation) {
    if let Translation::Event(event) = translation {
        // Receiver gone means the screen is shutting down.
        let _ = tx.send(event);
    }
}

/// Re-read a device that showed up again during discovery and report it as
/// found.
fn refresh_device(
    connection: Arc<SyncConnection>,
    path: Path<'static>,
    tx: UnboundedSender<BluetoothEvent>,
    dbus_timeout: Duration,
) {
    tokio::spawn(async move {
        let proxy = Proxy::new(BLUEZ_DBUS, path.clone(), dbus_timeout, connection);
        match proxy.get_all(DEVICE_INTERFACE).await {
            Ok(props) => {
                if let Some(device) = DeviceHandle::from_props(path, &props) {
                    let _ = tx.send(BluetoothEvent::DeviceFound(device));
                }
            }
            Err(e) => debug!("Could not read properties of {}: {}", path, e),
        }
    });
}

/// Read both bond flags back when a signal only carried one of them.
fn recheck_bond(
    connection: Arc<SyncConnection>,
    path: Path<'static>,
    tx: UnboundedSender<BluetoothEvent>,
    dbus_timeout: Duration,
) {
    tokio::spawn(async move {
        let proxy = Proxy::new(BLUEZ_DBUS, path.clone(), dbus_timeout, connection);
        match proxy.get_all(DEVICE_INTERFACE).await {
            Ok(props) => {
                if let Some(device) = DeviceHandle::from_props(path, &props) {
                    let _ = tx.send(BluetoothEvent::BondStateChanged {
                        address: device.address,
                        state: device.bond_state,
                    });
                }
            }
            Err(e) => debug!("Could not re-read bond flags of {}: {}", path, e),
        }
    });
}
