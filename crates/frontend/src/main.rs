//! Marquee launcher binary.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::cursor::Show;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use marquee::app::{AppState, Sources};
use marquee::config::Config;
use marquee::input::read_keys;
use marquee::layout_file::{find_layout, load_layout};
use marquee::server::{
    bind_ipc, run_ipc_server, spawn_forwarding_thread, spawn_frame_timer, LauncherEvent,
    EVENT_CHANNEL_CAPACITY,
};
use marquee::terminal::TerminalCompositor;
use marquee_core_layout::LayoutDescription;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::{self, File};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(author, version, about = "Fullscreen kiosk application launcher")]
struct Args {
    /// Configuration file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Layout file (default: `layout.file` from the config, then search)
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Do not listen for remote control commands
    #[arg(long)]
    no_ipc: bool,
}

type PreviewCompositor = TerminalCompositor<CrosstermBackend<Stdout>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (needed for log level)
    let mut config = Config::load_or_search(args.config.as_deref()).unwrap_or_else(|e| {
        // Can't use tracing yet, fall back to eprintln
        eprintln!("Failed to load configuration: {:#}. Using defaults.", e);
        Config::default()
    });

    init_logging(&config)?;

    // Validate and clamp config values
    for w in config.validate() {
        warn!("Config: {} - {}", w.field, w.message);
    }

    info!("Marquee starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let layout_path = find_layout(args.layout.as_deref(), config.layout.file.as_deref())?;
    let description = load_layout(&layout_path)?;
    let sources = Sources {
        config: args.config,
        layout: args.layout,
    };

    let listener = if config.ipc.enabled && !args.no_ipc {
        let listener = bind_ipc(&config.ipc.address).await?;
        info!("IPC server listening on {}", config.ipc.address);
        Some(listener)
    } else {
        info!("IPC disabled");
        None
    };

    let compositor = enter_terminal(&config)?;

    // Restore the terminal on crash so the panic message is readable
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));

    let result = run(config, sources, &description, compositor, listener).await;
    restore_terminal();
    if let Err(e) = &result {
        tracing::error!("Marquee failed: {:#}", e);
    }
    result
}

fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_file();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;

    // The terminal belongs to the preview, so logs go to a file
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn enter_terminal(config: &Config) -> Result<PreviewCompositor> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if config.behavior.mouse_select {
        execute!(stdout, EnableMouseCapture)?;
    }
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(TerminalCompositor::new(
        terminal,
        config.display.width,
        config.display.height,
    ))
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen, Show);
}

async fn run(
    config: Config,
    sources: Sources,
    description: &LayoutDescription,
    compositor: PreviewCompositor,
    listener: Option<TcpListener>,
) -> Result<()> {
    let fps = config.display.fps;
    let mouse = config.behavior.mouse_select;
    let mut state = AppState::new(config, sources, description, compositor)?;

    // Create event channel
    let (event_tx, mut event_rx) = mpsc::channel::<LauncherEvent>(EVENT_CHANNEL_CAPACITY);

    // Terminal input is read on a plain thread and forwarded to the loop
    let (key_tx, key_rx) = std::sync::mpsc::channel::<String>();
    std::thread::Builder::new()
        .name("input".to_string())
        .spawn(move || read_keys(key_tx, mouse))
        .context("Failed to spawn input thread")?;
    let _input_fwd = spawn_forwarding_thread("input-fwd", key_rx, event_tx.clone(), LauncherEvent::Key)?;

    if let Some(listener) = listener {
        tokio::spawn(run_ipc_server(listener, event_tx.clone()));
    }

    // Install Ctrl+C handler so a terminal kill triggers graceful shutdown
    {
        let shutdown_tx = event_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Ctrl+C received, initiating shutdown...");
                let _ = shutdown_tx.send(LauncherEvent::Shutdown).await;
            }
        });
    }

    let frame_timer = spawn_frame_timer(fps, event_tx.clone());
    info!("Ready. Use marquee-cli to send commands.");

    // Main event loop
    while let Some(event) = event_rx.recv().await {
        match event {
            LauncherEvent::IpcCommand { cmd, responder } => {
                let now = state.now();
                let response = state.handle_ipc(cmd, now);
                // Log if client disconnected before receiving response
                if responder.send(response).is_err() {
                    debug!("Client disconnected before receiving IPC response");
                }
            }
            LauncherEvent::Key(key) => {
                let now = state.now();
                state.handle_key(&key, now);
            }
            LauncherEvent::Frame => {
                let now = state.now();
                state.frame(now)?;
            }
            LauncherEvent::Shutdown => break,
        }

        if state.quit_requested() {
            break;
        }
    }

    info!("Shutting down...");
    frame_timer.abort();
    drop(state.shutdown());
    Ok(())
}
