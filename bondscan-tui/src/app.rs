use std::time::{Duration, Instant};

use bondscan_bluez::{Bluetooth, BluetoothEvent, BondState, DeviceHandle, Platform};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::presenter::{display_name, ListPresenter, Row};
use crate::registry::DeviceRegistry;

pub const MSG_PERMISSION_DENIED: &str = "Scan permission not granted";
pub const MSG_UNSUPPORTED: &str = "This machine does not support Bluetooth";
pub const MSG_NOT_INITIALIZED: &str = "Bluetooth is not initialized";
pub const MSG_DISCOVERY_FAILED: &str = "Could not start discovery";
pub const MSG_NOT_ENABLED: &str = "Bluetooth was not turned on";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Permission,
    EnableBluetooth,
    Unpair { address: String, name: String },
}

impl Dialog {
    pub fn prompt(&self) -> String {
        match self {
            Dialog::Permission => {
                "Scanning reveals nearby devices and, with them, your location. Allow scanning?"
                    .to_string()
            }
            Dialog::EnableBluetooth => "Bluetooth is off. Turn it on?".to_string(),
            Dialog::Unpair { name, .. } => format!("Remove pairing with {}?", name),
        }
    }
}

#[derive(Debug)]
enum BluetoothState<A> {
    Uninitialized,
    Unsupported,
    Ready(A),
}

#[derive(Debug)]
struct Toast {
    message: String,
    expires: Instant,
}

#[derive(Debug, Clone, Copy)]
pub struct ScreenSettings {
    pub require_permission: bool,
    pub toast_duration: Duration,
}

/// The screen controller. Owns the registry, the selection and every piece
/// of transient UI state; all of it is only touched from the main loop.
pub struct App<P: Platform> {
    platform: P,
    bluetooth: BluetoothState<P::Adapter>,
    registry: DeviceRegistry,
    presenter: ListPresenter,
    loading: bool,
    dialog: Option<Dialog>,
    toast: Option<Toast>,
    has_results: bool,
    settings: ScreenSettings,
    events: UnboundedSender<BluetoothEvent>,
}

impl<P: Platform> App<P> {
    pub fn new(platform: P, settings: ScreenSettings) -> (Self, UnboundedReceiver<BluetoothEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let app = Self {
            platform,
            bluetooth: BluetoothState::Uninitialized,
            registry: DeviceRegistry::new(),
            presenter: ListPresenter::default(),
            loading: false,
            dialog: None,
            toast: None,
            has_results: false,
            settings,
            events,
        };
        (app, rx)
    }

    pub async fn start(&mut self) {
        if self.settings.require_permission {
            self.dialog = Some(Dialog::Permission);
        } else {
            self.init_bluetooth().await;
        }
    }

    pub async fn on_permission_result(&mut self, granted: bool) {
        if granted {
            info!("Scan permission granted");
            self.init_bluetooth().await;
        } else {
            info!("Scan permission denied");
            self.show_toast(MSG_PERMISSION_DENIED);
        }
    }

    async fn init_bluetooth(&mut self) {
        match self.platform.initialize(self.events.clone()).await {
            Ok(Some(adapter)) => {
                self.bluetooth = BluetoothState::Ready(adapter);
            }
            Ok(None) => {
                info!("No Bluetooth adapter found");
                self.bluetooth = BluetoothState::Unsupported;
            }
            Err(e) => {
                warn!("Bluetooth initialization failed: {}", e);
                self.show_toast(format!("Bluetooth initialization failed: {}", e));
            }
        }
    }

    fn adapter(&self) -> Option<P::Adapter> {
        match &self.bluetooth {
            BluetoothState::Ready(adapter) => Some(adapter.clone()),
            _ => None,
        }
    }

    pub async fn scan(&mut self) {
        let adapter = match &self.bluetooth {
            BluetoothState::Ready(adapter) => adapter.clone(),
            BluetoothState::Unsupported => return self.show_toast(MSG_UNSUPPORTED),
            BluetoothState::Uninitialized => return self.show_toast(MSG_NOT_INITIALIZED),
        };

        match adapter.is_enabled().await {
            Ok(true) => {}
            Ok(false) => {
                self.dialog = Some(Dialog::EnableBluetooth);
                return;
            }
            Err(e) => {
                warn!("Could not read adapter state: {}", e);
                return self.show_toast("Could not read adapter state");
            }
        }

        if let Err(e) = adapter.start_discovery().await {
            warn!("Failed to start discovery: {}", e);
            return self.show_toast(MSG_DISCOVERY_FAILED);
        }

        // Found events are only drained after this returns, so clearing here
        // cannot drop a device from the new run.
        if self.has_results {
            self.registry.clear();
            self.presenter.reset();
        }
    }

    pub fn on_enable_result(&mut self, enabled: bool) {
        if enabled {
            info!("Adapter powered on");
            self.show_toast("Bluetooth is on, press s to scan");
        } else {
            warn!("Adapter was not powered on");
            self.show_toast(MSG_NOT_ENABLED);
        }
    }

    pub async fn handle_event(&mut self, event: BluetoothEvent) {
        match event {
            BluetoothEvent::DeviceFound(device) => self.show_devices(device).await,
            BluetoothEvent::BondStateChanged { address, state } => {
                debug!("Bond state of {} is now {:?}", address, state);
                self.registry.set_bond_state(&address, state);
                self.presenter.refresh(self.registry.len());
            }
            BluetoothEvent::DiscoveryStarted => self.loading = true,
            BluetoothEvent::DiscoveryFinished => self.loading = false,
            BluetoothEvent::Unknown(what) => debug!("Ignoring unknown event: {}", what),
        }
    }

    async fn show_devices(&mut self, found: DeviceHandle) {
        // Discovery re-reports listed devices on every advertisement.
        if self.registry.contains(&found.address) {
            return;
        }

        if let Some(adapter) = self.adapter() {
            match adapter.bonded_devices().await {
                Ok(bonded) => {
                    for device in bonded {
                        self.registry.insert(device);
                    }
                }
                Err(e) => warn!("Could not list bonded devices: {}", e),
            }
        }

        if self.registry.insert(found.clone()) {
            debug!("Listed {} ({})", display_name(&found), found.address);
        }
        self.has_results = true;
        self.presenter.refresh(self.registry.len());
    }

    /// Row click on the selected row. Returns the pair task if a pair request
    /// was issued.
    pub fn activate_selected(&mut self) -> Option<JoinHandle<()>> {
        let position = self.presenter.click(self.registry.len())?;
        let device = self.registry.get(position)?.clone();
        let adapter = self.adapter()?;

        if device.bond_state == BondState::None {
            Some(self.request_pair(adapter, device))
        } else {
            self.dialog = Some(Dialog::Unpair {
                name: display_name(&device).to_string(),
                address: device.address,
            });
            None
        }
    }

    fn request_pair(&self, adapter: P::Adapter, device: DeviceHandle) -> JoinHandle<()> {
        let events = self.events.clone();
        let _ = events.send(BluetoothEvent::BondStateChanged {
            address: device.address.clone(),
            state: BondState::Bonding,
        });

        tokio::spawn(async move {
            if let Err(e) = adapter.create_bond(&device).await {
                warn!(kind = e.kind(), "Pair request for {} failed: {}", device.address, e);
                let _ = events.send(BluetoothEvent::BondStateChanged {
                    address: device.address.clone(),
                    state: device.bond_state,
                });
            }
        })
    }

    async fn unpair(&mut self, address: &str) {
        let Some(adapter) = self.adapter() else {
            return;
        };
        let Some(device) = self.registry.devices().iter().find(|d| d.address == address).cloned() else {
            return;
        };

        match adapter.remove_bond(&device).await {
            Ok(()) => {
                // Dropped right away; the bond-state event may still be in flight.
                self.registry.remove(address);
                self.presenter.refresh(self.registry.len());
                info!("Removed bond with {}", address);
            }
            Err(e) => warn!(kind = e.kind(), "Unpair request for {} failed: {}", address, e),
        }
    }

    pub async fn confirm_dialog(&mut self) {
        match self.dialog.take() {
            Some(Dialog::Permission) => self.on_permission_result(true).await,
            Some(Dialog::EnableBluetooth) => {
                if let Some(adapter) = self.adapter() {
                    let result = adapter.request_enable().await;
                    if let Err(e) = &result {
                        warn!("Enable request failed: {}", e);
                    }
                    self.on_enable_result(result.is_ok());
                }
            }
            Some(Dialog::Unpair { address, .. }) => self.unpair(&address).await,
            None => {}
        }
    }

    pub async fn dismiss_dialog(&mut self) {
        match self.dialog.take() {
            Some(Dialog::Permission) => self.on_permission_result(false).await,
            Some(Dialog::EnableBluetooth) => self.on_enable_result(false),
            Some(Dialog::Unpair { .. }) | None => {}
        }
    }

    pub fn next_device(&mut self) {
        self.presenter.next(self.registry.len());
    }

    pub fn previous_device(&mut self) {
        self.presenter.previous(self.registry.len());
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            expires: Instant::now() + self.settings.toast_duration,
        });
    }

    /// Expire the toast once its time is up.
    pub fn tick(&mut self) {
        if self.toast.as_ref().is_some_and(|t| Instant::now() >= t.expires) {
            self.toast = None;
        }
    }

    pub async fn shutdown(&mut self) {
        self.platform.shutdown().await;
        self.bluetooth = BluetoothState::Uninitialized;
        info!("Screen torn down");
    }

    pub fn rows(&self) -> Vec<Row> {
        self.presenter.rows(&self.registry)
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn selected(&self) -> usize {
        self.presenter.selected()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast.as_ref().map(|t| t.message.as_str())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.bluetooth, BluetoothState::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::device;
    use bondscan_bluez::{BluezError, BondError};
    use std::future::Future;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeState {
        enabled: bool,
        bonded: Vec<DeviceHandle>,
        pair_calls: Vec<String>,
        unpair_calls: Vec<String>,
        discovery_starts: usize,
        enable_requests: usize,
        bonded_reads: usize,
        discovery_error: Option<&'static str>,
        enable_error: Option<&'static str>,
        pair_error: Option<BondError>,
        unpair_error: Option<BondError>,
    }

    #[derive(Clone, Default)]
    struct FakeAdapter {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeAdapter {
        fn enabled() -> Self {
            let adapter = Self::default();
            adapter.state().enabled = true;
            adapter
        }

        fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
            self.state.lock().unwrap()
        }
    }

    fn dbus_error(name: &str) -> BluezError {
        BluezError::DBus(dbus::Error::new_custom(name, "fake failure"))
    }

    impl Bluetooth for FakeAdapter {
        fn is_enabled(&self) -> impl Future<Output = Result<bool, BluezError>> + Send {
            let enabled = self.state().enabled;
            async move { Ok(enabled) }
        }

        fn request_enable(&self) -> impl Future<Output = Result<(), BluezError>> + Send {
            let mut state = self.state();
            state.enable_requests += 1;
            let result = match state.enable_error {
                Some(name) => Err(dbus_error(name)),
                None => {
                    state.enabled = true;
                    Ok(())
                }
            };
            async move { result }
        }

        fn start_discovery(&self) -> impl Future<Output = Result<(), BluezError>> + Send {
            let mut state = self.state();
            state.discovery_starts += 1;
            let result = state.discovery_error.map_or(Ok(()), |name| Err(dbus_error(name)));
            async move { result }
        }

        fn bonded_devices(&self) -> impl Future<Output = Result<Vec<DeviceHandle>, BluezError>> + Send {
            let mut state = self.state();
            state.bonded_reads += 1;
            let bonded = state.bonded.clone();
            async move { Ok(bonded) }
        }

        fn create_bond(&self, device: &DeviceHandle) -> impl Future<Output = Result<(), BondError>> + Send {
            let mut state = self.state();
            state.pair_calls.push(device.address.clone());
            let result = state.pair_error.clone().map_or(Ok(()), Err);
            async move { result }
        }

        fn remove_bond(&self, device: &DeviceHandle) -> impl Future<Output = Result<(), BondError>> + Send {
            let mut state = self.state();
            state.unpair_calls.push(device.address.clone());
            let result = state.unpair_error.clone().map_or(Ok(()), Err);
            async move { result }
        }
    }

    struct FakePlatform {
        adapter: Option<FakeAdapter>,
        init_error: Option<&'static str>,
        initialized: Arc<AtomicBool>,
        shut_down: Arc<AtomicBool>,
    }

    impl FakePlatform {
        fn with(adapter: Option<FakeAdapter>) -> Self {
            Self {
                adapter,
                init_error: None,
                initialized: Arc::new(AtomicBool::new(false)),
                shut_down: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl Platform for FakePlatform {
        type Adapter = FakeAdapter;

        fn initialize(
            &mut self,
            _events: UnboundedSender<BluetoothEvent>,
        ) -> impl Future<Output = Result<Option<FakeAdapter>, BluezError>> {
            self.initialized.store(true, Ordering::SeqCst);
            let result = match self.init_error {
                Some(name) => Err(dbus_error(name)),
                None => Ok(self.adapter.clone()),
            };
            async move { result }
        }

        fn shutdown(&mut self) -> impl Future<Output = ()> {
            self.shut_down.store(true, Ordering::SeqCst);
            async {}
        }
    }

    const PHONE: &str = "AA:00:00:00:00:01";
    const SPEAKER: &str = "AA:00:00:00:00:02";
    const LAPTOP: &str = "AA:00:00:00:00:03";

    fn settings(require_permission: bool) -> ScreenSettings {
        ScreenSettings {
            require_permission,
            toast_duration: Duration::from_secs(3),
        }
    }

    async fn ready_app(adapter: FakeAdapter) -> (App<FakePlatform>, UnboundedReceiver<BluetoothEvent>) {
        let (mut app, rx) = App::new(FakePlatform::with(Some(adapter)), settings(false));
        app.start().await;
        assert!(app.is_ready());
        (app, rx)
    }

    fn found(address: &str, name: Option<&str>, state: BondState) -> BluetoothEvent {
        BluetoothEvent::DeviceFound(device(address, name, state))
    }

    #[tokio::test]
    async fn permission_prompt_gates_initialization() {
        let platform = FakePlatform::with(Some(FakeAdapter::enabled()));
        let initialized = platform.initialized.clone();
        let (mut app, _rx) = App::new(platform, settings(true));

        app.start().await;
        assert_eq!(app.dialog(), Some(&Dialog::Permission));
        assert!(!initialized.load(Ordering::SeqCst));

        app.confirm_dialog().await;
        assert!(initialized.load(Ordering::SeqCst));
        assert!(app.is_ready());
        assert!(app.dialog().is_none());
    }

    #[tokio::test]
    async fn permission_denied_leaves_bluetooth_uninitialized() {
        let platform = FakePlatform::with(Some(FakeAdapter::enabled()));
        let initialized = platform.initialized.clone();
        let (mut app, _rx) = App::new(platform, settings(true));

        app.start().await;
        app.dismiss_dialog().await;

        assert!(!initialized.load(Ordering::SeqCst));
        assert_eq!(app.toast(), Some(MSG_PERMISSION_DENIED));

        app.scan().await;
        assert_eq!(app.toast(), Some(MSG_NOT_INITIALIZED));
        assert!(!app.is_ready());
    }

    #[tokio::test]
    async fn scan_without_adapter_reports_unsupported() {
        let (mut app, _rx) = App::new(FakePlatform::with(None), settings(false));
        app.start().await;
        app.scan().await;
        assert_eq!(app.toast(), Some(MSG_UNSUPPORTED));
    }

    #[tokio::test]
    async fn scan_with_disabled_adapter_prompts_enable() {
        let adapter = FakeAdapter::default();
        let (mut app, _rx) = ready_app(adapter.clone()).await;

        app.scan().await;
        assert_eq!(app.dialog(), Some(&Dialog::EnableBluetooth));
        assert_eq!(adapter.state().discovery_starts, 0);

        app.confirm_dialog().await;
        assert_eq!(adapter.state().enable_requests, 1);
        assert!(app.toast().is_some());

        app.scan().await;
        assert_eq!(adapter.state().discovery_starts, 1);
    }

    #[tokio::test]
    async fn declining_enable_does_not_scan() {
        let adapter = FakeAdapter::default();
        let (mut app, _rx) = ready_app(adapter.clone()).await;

        app.scan().await;
        app.dismiss_dialog().await;
        assert_eq!(adapter.state().enable_requests, 0);
        assert_eq!(adapter.state().discovery_starts, 0);
        assert_eq!(app.toast(), Some(MSG_NOT_ENABLED));
    }

    #[tokio::test]
    async fn failed_enable_reports_not_turned_on() {
        let adapter = FakeAdapter::default();
        adapter.state().enable_error = Some("org.bluez.Error.Failed");
        let (mut app, _rx) = ready_app(adapter.clone()).await;

        app.scan().await;
        app.confirm_dialog().await;
        assert_eq!(adapter.state().enable_requests, 1);
        assert_eq!(app.toast(), Some(MSG_NOT_ENABLED));

        // still off, so the next scan prompts again instead of discovering
        app.scan().await;
        assert_eq!(app.dialog(), Some(&Dialog::EnableBluetooth));
        assert_eq!(adapter.state().discovery_starts, 0);
    }

    #[tokio::test]
    async fn failed_initialization_stays_uninitialized() {
        let mut platform = FakePlatform::with(Some(FakeAdapter::enabled()));
        platform.init_error = Some("org.freedesktop.DBus.Error.NoServer");
        let (mut app, _rx) = App::new(platform, settings(false));

        app.start().await;
        assert!(!app.is_ready());
        let toast = app.toast().unwrap_or_default();
        assert!(toast.starts_with("Bluetooth initialization failed"), "toast: {toast}");

        app.scan().await;
        assert_eq!(app.toast(), Some(MSG_NOT_INITIALIZED));
    }

    #[tokio::test]
    async fn failed_discovery_keeps_prior_results() {
        let adapter = FakeAdapter::enabled();
        let (mut app, _rx) = ready_app(adapter.clone()).await;
        app.handle_event(found(PHONE, Some("Phone"), BondState::None)).await;

        adapter.state().discovery_error = Some("org.bluez.Error.NotReady");
        app.scan().await;

        assert_eq!(app.toast(), Some(MSG_DISCOVERY_FAILED));
        assert_eq!(app.registry().len(), 1);
        assert_eq!(adapter.state().discovery_starts, 1);
    }

    #[tokio::test]
    async fn listed_device_seen_again_skips_bonded_lookup() {
        let adapter = FakeAdapter::enabled();
        let (mut app, _rx) = ready_app(adapter.clone()).await;

        app.handle_event(found(PHONE, Some("Phone"), BondState::None)).await;
        app.handle_event(found(PHONE, Some("Phone"), BondState::None)).await;
        assert_eq!(adapter.state().bonded_reads, 1);

        app.handle_event(found(LAPTOP, Some("Laptop"), BondState::None)).await;
        assert_eq!(adapter.state().bonded_reads, 2);
        assert_eq!(app.registry().len(), 2);
    }

    #[tokio::test]
    async fn found_events_merge_bonded_then_found_without_duplicates() {
        let adapter = FakeAdapter::enabled();
        adapter.state().bonded = vec![device(SPEAKER, Some("Speaker"), BondState::Bonded)];
        let (mut app, _rx) = ready_app(adapter).await;

        app.handle_event(found(PHONE, Some("Phone"), BondState::None)).await;
        app.handle_event(found(PHONE, Some("Phone"), BondState::None)).await;
        app.handle_event(found(SPEAKER, Some("Speaker"), BondState::Bonded)).await;

        let addresses: Vec<_> = app.registry().devices().iter().map(|d| d.address.as_str()).collect();
        assert_eq!(addresses, vec![SPEAKER, PHONE]);
    }

    #[tokio::test]
    async fn unnamed_found_devices_are_skipped() {
        let (mut app, _rx) = ready_app(FakeAdapter::enabled()).await;
        app.handle_event(found(PHONE, None, BondState::None)).await;
        assert!(app.registry().is_empty());
    }

    #[tokio::test]
    async fn new_scan_clears_prior_results() {
        let adapter = FakeAdapter::enabled();
        let (mut app, _rx) = ready_app(adapter.clone()).await;

        // first scan with nothing listed keeps the registry as is
        app.scan().await;
        app.handle_event(found(PHONE, Some("Phone"), BondState::None)).await;
        app.handle_event(found(LAPTOP, Some("Laptop"), BondState::None)).await;
        app.next_device();
        assert_eq!(app.registry().len(), 2);

        app.scan().await;
        assert!(app.registry().is_empty());
        assert_eq!(app.selected(), 0);
        assert_eq!(adapter.state().discovery_starts, 2);
    }

    #[tokio::test]
    async fn discovery_events_toggle_loading() {
        let (mut app, _rx) = ready_app(FakeAdapter::enabled()).await;
        app.handle_event(BluetoothEvent::DiscoveryStarted).await;
        assert!(app.loading());
        app.handle_event(BluetoothEvent::DiscoveryFinished).await;
        assert!(!app.loading());
    }

    #[tokio::test]
    async fn unknown_events_change_nothing() {
        let (mut app, _rx) = ready_app(FakeAdapter::enabled()).await;
        app.handle_event(found(PHONE, Some("Phone"), BondState::None)).await;
        app.handle_event(BluetoothEvent::Unknown("stray signal".into())).await;
        assert_eq!(app.registry().len(), 1);
        assert!(!app.loading());
        assert!(app.toast().is_none());
    }

    #[tokio::test]
    async fn tapping_unbonded_device_issues_pair_and_leaves_registry() {
        let adapter = FakeAdapter::enabled();
        let (mut app, mut rx) = ready_app(adapter.clone()).await;
        app.handle_event(found(PHONE, Some("Phone"), BondState::None)).await;

        let task = app.activate_selected().expect("pair task");
        task.await.unwrap();

        assert_eq!(adapter.state().pair_calls, vec![PHONE.to_string()]);
        assert!(app.dialog().is_none());
        assert_eq!(app.registry().get(0).map(|d| d.bond_state), Some(BondState::None));

        // the registry only moves once the bond-state event is handled
        let event = rx.recv().await.unwrap();
        app.handle_event(event).await;
        assert_eq!(app.rows()[0].bond_label, "Pairing...");
        app.handle_event(BluetoothEvent::BondStateChanged {
            address: PHONE.into(),
            state: BondState::Bonded,
        })
        .await;
        assert_eq!(app.rows()[0].bond_label, "Paired");
    }

    #[tokio::test]
    async fn failed_pair_is_swallowed_and_restores_state() {
        let adapter = FakeAdapter::enabled();
        adapter.state().pair_error = Some(BondError::classify("org.bluez.Error.AuthenticationFailed", ""));
        let (mut app, mut rx) = ready_app(adapter).await;
        app.handle_event(found(PHONE, Some("Phone"), BondState::None)).await;

        app.activate_selected().unwrap().await.unwrap();
        while let Ok(event) = rx.try_recv() {
            app.handle_event(event).await;
        }

        assert_eq!(app.registry().get(0).map(|d| d.bond_state), Some(BondState::None));
        assert!(app.toast().is_none());
    }

    #[tokio::test]
    async fn tapping_bonded_device_confirms_then_removes_immediately() {
        let adapter = FakeAdapter::enabled();
        let (mut app, _rx) = ready_app(adapter.clone()).await;
        app.handle_event(found(SPEAKER, Some("Speaker"), BondState::Bonded)).await;

        assert!(app.activate_selected().is_none());
        assert_eq!(
            app.dialog(),
            Some(&Dialog::Unpair { address: SPEAKER.into(), name: "Speaker".into() })
        );
        assert!(adapter.state().unpair_calls.is_empty());

        app.confirm_dialog().await;
        assert_eq!(adapter.state().unpair_calls, vec![SPEAKER.to_string()]);
        assert!(app.registry().is_empty());
    }

    #[tokio::test]
    async fn cancelled_unpair_keeps_device() {
        let adapter = FakeAdapter::enabled();
        let (mut app, _rx) = ready_app(adapter.clone()).await;
        app.handle_event(found(SPEAKER, Some("Speaker"), BondState::Bonded)).await;

        app.activate_selected();
        app.dismiss_dialog().await;
        assert!(adapter.state().unpair_calls.is_empty());
        assert_eq!(app.registry().len(), 1);
    }

    #[tokio::test]
    async fn failed_unpair_keeps_device() {
        let adapter = FakeAdapter::enabled();
        adapter.state().unpair_error =
            Some(BondError::classify("org.freedesktop.DBus.Error.AccessDenied", "denied"));
        let (mut app, _rx) = ready_app(adapter).await;
        app.handle_event(found(SPEAKER, Some("Speaker"), BondState::Bonded)).await;

        app.activate_selected();
        app.confirm_dialog().await;
        assert_eq!(app.registry().len(), 1);
        assert!(app.toast().is_none());
    }

    #[tokio::test]
    async fn activating_empty_list_does_nothing() {
        let (mut app, _rx) = ready_app(FakeAdapter::enabled()).await;
        assert!(app.activate_selected().is_none());
        assert!(app.dialog().is_none());
    }

    #[tokio::test]
    async fn shutdown_deregisters_listener() {
        let platform = FakePlatform::with(Some(FakeAdapter::enabled()));
        let shut_down = platform.shut_down.clone();
        let (mut app, _rx) = App::new(platform, settings(false));
        app.start().await;

        app.shutdown().await;
        assert!(shut_down.load(Ordering::SeqCst));
        assert!(!app.is_ready());
    }

    #[tokio::test]
    async fn toast_expires_on_tick() {
        let (mut app, _rx) = App::new(
            FakePlatform::with(None),
            ScreenSettings { require_permission: false, toast_duration: Duration::ZERO },
        );
        app.show_toast("hello");
        app.tick();
        assert!(app.toast().is_none());
    }
}
