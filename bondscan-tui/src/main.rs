/*!
 * bondscan
 * Terminal Bluetooth scanner: discover, pair and unpair devices via BlueZ
 */

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{interval, Duration};
use tracing::info;

mod app;
mod config;
mod logging;
mod presenter;
mod registry;
mod ui;

use app::{App, ScreenSettings};
use bondscan_bluez::{BluetoothEvent, BluezPlatform};
use config::Config;
use ui::render_ui;

#[derive(Parser)]
#[command(name = "bondscan")]
#[command(about = "Scan, pair and unpair Bluetooth devices")]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Skip the scan permission prompt
    #[arg(long)]
    no_permission_prompt: bool,

    /// Seconds before a discovery run is stopped
    #[arg(long)]
    discovery_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if cli.no_permission_prompt {
        config.bluetooth.require_scan_permission = false;
    }
    if let Some(secs) = cli.discovery_timeout {
        config.bluetooth.discovery_timeout_secs = secs;
    }

    let _log_guard = logging::init_logger(&config.log, cli.debug)?;
    info!("bondscan starting with config {}", config_path.display());

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!("bondscan exited with error: {:#}", e);
    }
    result
}

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

async fn run(terminal: &mut Tui, config: &Config) -> Result<()> {
    let platform = BluezPlatform::new(config.platform_settings());
    let settings = ScreenSettings {
        require_permission: config.bluetooth.require_scan_permission,
        toast_duration: config.toast_duration(),
    };
    let (mut app, mut events) = App::new(platform, settings);
    app.start().await;

    let result = event_loop(terminal, &mut app, &mut events, config.tick()).await;

    app.shutdown().await;
    result
}

async fn event_loop(
    terminal: &mut Tui,
    app: &mut App<BluezPlatform>,
    events: &mut UnboundedReceiver<BluetoothEvent>,
    tick: Duration,
) -> Result<()> {
    let mut ticker = interval(tick);
    let mut frame: usize = 0;

    loop {
        // Handle key input
        if event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.dialog().is_some() {
                        match key.code {
                            KeyCode::Char('y') | KeyCode::Enter => app.confirm_dialog().await,
                            KeyCode::Char('n') | KeyCode::Esc => app.dismiss_dialog().await,
                            _ => {}
                        }
                    } else {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                            KeyCode::Char('s') => app.scan().await,
                            KeyCode::Up | KeyCode::Char('k') => app.previous_device(),
                            KeyCode::Down | KeyCode::Char('j') => app.next_device(),
                            KeyCode::Enter => {
                                app.activate_selected();
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        // Deliver Bluetooth events in arrival order
        while let Ok(event) = events.try_recv() {
            app.handle_event(event).await;
        }

        ticker.tick().await;
        app.tick();
        frame = frame.wrapping_add(1);

        // Render UI
        terminal.draw(|f| render_ui(f, app, frame))?;
    }
}
