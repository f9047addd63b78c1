//! Application context: everything the event loop mutates.

use anyhow::{bail, Context, Result};
use marquee_core_layout::{
    Compositor, Layout, LayoutDescription, Screensaver, SelectionMode,
};
use marquee_ipc::{Focus, IpcCommand, IpcResponse, MenuCursor};
use marquee_platform::{LaunchStatus, Launcher};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::commands::{classify_binding, classify_command, Action, Command};
use crate::config::Config;
use crate::layout_file::{find_layout, load_layout};

/// Files given on the command line; reload reads from the same places.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub config: Option<PathBuf>,
    pub layout: Option<PathBuf>,
}

/// Outcome of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Drawn,
    /// A launched application is running; nothing was drawn.
    Suspended,
}

/// Where a command string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// A card or sidebar command fired by the layout.
    Layout,
    Key,
    Remote,
}

/// Launcher state, owned by the event loop.
pub struct AppState<C: Compositor> {
    compositor: C,
    config: Config,
    sources: Sources,
    layout: Layout,
    screensaver: Option<Screensaver>,
    launcher: Launcher,
    width: i32,
    height: i32,
    clock: Instant,
    last_input: u64,
    quit_requested: bool,
}

impl<C: Compositor> AppState<C> {
    /// Build the layout for `description` on a screen of the configured size.
    pub fn new(
        config: Config,
        sources: Sources,
        description: &LayoutDescription,
        mut compositor: C,
    ) -> Result<Self> {
        let width = config.display.width;
        let height = config.display.height;
        let (layout, screensaver) =
            build_layout(&config, description, width, height, &mut compositor)?;
        Ok(Self {
            compositor,
            config,
            sources,
            layout,
            screensaver,
            launcher: Launcher::new(),
            width,
            height,
            clock: Instant::now(),
            last_input: 0,
            quit_requested: false,
        })
    }

    /// Milliseconds since startup.
    pub fn now(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    pub fn screensaver(&self) -> Option<&Screensaver> {
        self.screensaver.as_ref()
    }

    pub fn is_application_running(&self) -> bool {
        self.launcher.is_running()
    }

    /// `:quit` or a stop request was received.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Handle a key press from the terminal.
    pub fn handle_key(&mut self, key: &str, now: u64) {
        if self.register_input(now) {
            debug!("Key {} woke the screensaver", key);
            return;
        }
        if let Some(command) = self.launcher.command() {
            debug!("Ignoring key {} while '{}' is running", key, command);
            return;
        }
        let Some(binding) = self.config.keybindings.bindings.get(key).cloned() else {
            trace!("Unbound key {}", key);
            return;
        };
        if let Err(e) = self.dispatch(classify_binding(&binding), now, Origin::Key) {
            error!("Key {} failed: {:#}", key, e);
        }
    }

    /// Handle a command from the IPC server.
    pub fn handle_ipc(&mut self, cmd: IpcCommand, now: u64) -> IpcResponse {
        debug!("IPC command: {:?}", cmd);
        let result = match cmd {
            IpcCommand::QueryState => return self.state_response(),
            IpcCommand::Stop => {
                info!("Stop requested over IPC");
                self.quit_requested = true;
                Ok(())
            }
            IpcCommand::MoveUp => self.remote_action(Action::MoveUp, now),
            IpcCommand::MoveDown => self.remote_action(Action::MoveDown, now),
            IpcCommand::MoveLeft => self.remote_action(Action::MoveLeft, now),
            IpcCommand::MoveRight => self.remote_action(Action::MoveRight, now),
            IpcCommand::Select => self.remote_action(Action::Select, now),
            IpcCommand::Reload => self.remote_action(Action::Reload, now),
            IpcCommand::Execute { command } => {
                self.register_input(now);
                self.execute(&command, now, Origin::Remote)
            }
        };
        match result {
            Ok(()) => IpcResponse::Ok,
            Err(e) => IpcResponse::error(format!("{:#}", e)),
        }
    }

    /// Advance animations and draw one frame.
    pub fn frame(&mut self, now: u64) -> Result<FrameStatus> {
        match self.launcher.poll() {
            Ok(LaunchStatus::Running) => return Ok(FrameStatus::Suspended),
            Ok(LaunchStatus::Exited { .. }) | Ok(LaunchStatus::FailedToStart { .. }) => {
                // Coming back from an application counts as activity
                self.last_input = now;
            }
            Ok(LaunchStatus::Idle) => {}
            Err(e) => warn!("Failed to poll launched application: {}", e),
        }

        let mut commands = Vec::new();
        self.layout.tick(now, &mut commands);
        self.run_layout_commands(commands, now);

        if let Some(screensaver) = &mut self.screensaver {
            screensaver.update(now, self.last_input);
        }

        self.layout.draw(&mut self.compositor);
        if let Some(screensaver) = &self.screensaver {
            screensaver.draw(&mut self.compositor);
        }
        self.compositor
            .present()
            .context("Failed to present frame")?;
        Ok(FrameStatus::Drawn)
    }

    /// Reread the configuration and layout, replacing the current layout.
    ///
    /// The display size is fixed at startup. On failure the old layout stays.
    pub fn reload(&mut self) -> Result<()> {
        let mut config = Config::load_or_search(self.sources.config.as_deref())?;
        for w in config.validate() {
            warn!("Config: {} - {}", w.field, w.message);
        }
        if (config.display.width, config.display.height) != (self.width, self.height) {
            warn!("Display size changes take effect after a restart");
        }
        let path = find_layout(self.sources.layout.as_deref(), config.layout.file.as_deref())?;
        let description = load_layout(&path)?;
        self.replace_layout(config, &description)
    }

    /// Swap in a new configuration and layout description.
    pub fn replace_layout(&mut self, config: Config, description: &LayoutDescription) -> Result<()> {
        let (layout, screensaver) = build_layout(
            &config,
            description,
            self.width,
            self.height,
            &mut self.compositor,
        )?;
        let old = std::mem::replace(&mut self.layout, layout);
        old.release(&mut self.compositor);
        if let Some(mut old) = std::mem::replace(&mut self.screensaver, screensaver) {
            old.release(&mut self.compositor);
        }
        self.config = config;
        info!("Layout reloaded");
        Ok(())
    }

    /// Return every texture to the compositor.
    pub fn shutdown(mut self) -> C {
        if let Some(mut screensaver) = self.screensaver.take() {
            screensaver.release(&mut self.compositor);
        }
        self.layout.release(&mut self.compositor);
        self.compositor
    }

    /// Record input; returns true when it only woke the screensaver.
    fn register_input(&mut self, now: u64) -> bool {
        self.last_input = now;
        match &mut self.screensaver {
            Some(screensaver) if screensaver.is_active() => {
                screensaver.update(now, now);
                true
            }
            _ => false,
        }
    }

    fn remote_action(&mut self, action: Action, now: u64) -> Result<()> {
        self.register_input(now);
        self.perform(action, now)
    }

    fn perform(&mut self, action: Action, now: u64) -> Result<()> {
        trace!("Action {:?}", action);
        match action {
            Action::MoveUp => self.layout.move_up(now),
            Action::MoveDown => self.layout.move_down(now),
            Action::MoveLeft => self.layout.move_left(now),
            Action::MoveRight => self.layout.move_right(now),
            Action::Select => {
                let mut commands = Vec::new();
                self.layout.select(now, &mut commands);
                self.run_layout_commands(commands, now);
            }
            Action::Reload => self.reload()?,
            Action::Quit => {
                info!("Quit requested");
                self.quit_requested = true;
            }
            Action::Power(command) => command.run()?,
        }
        Ok(())
    }

    fn run_layout_commands(&mut self, commands: Vec<String>, now: u64) {
        for command in commands {
            if let Err(e) = self.execute(&command, now, Origin::Layout) {
                error!("Command '{}' failed: {:#}", command, e);
            }
        }
    }

    fn execute(&mut self, command: &str, now: u64, origin: Origin) -> Result<()> {
        self.dispatch(classify_command(command), now, origin)
    }

    fn dispatch(&mut self, command: Command<'_>, now: u64, origin: Origin) -> Result<()> {
        match command {
            Command::Internal(Action::Select) if origin == Origin::Layout => {
                // A selected entry selecting again would loop
                warn!("Ignoring ':select' fired by a selected entry");
                Ok(())
            }
            Command::Internal(action) => self.perform(action, now),
            Command::UnknownInternal(name) => bail!("Unknown internal command ':{}'", name),
            Command::External(program) => {
                self.launcher.launch(program)?;
                Ok(())
            }
        }
    }

    fn state_response(&self) -> IpcResponse {
        let entry = self.layout.current_entry();
        let menu = self.layout.current_menu().map(|menu| {
            let current = menu.current_entry();
            MenuCursor {
                title: entry.title.clone(),
                row: menu.row,
                column: menu.column,
                entry: current,
                entry_title: menu
                    .entries
                    .get(current)
                    .map(|e| e.title.clone())
                    .unwrap_or_default(),
            }
        });
        IpcResponse::State {
            focus: match self.layout.selection_mode() {
                SelectionMode::Sidebar => Focus::Sidebar,
                SelectionMode::Menu => Focus::Menu,
            },
            sidebar_index: self.layout.sidebar_pos(),
            sidebar_title: entry.title.clone(),
            menu,
            animating: self.layout.is_animating(),
            application_running: self.launcher.is_running(),
        }
    }
}

fn build_layout<C: Compositor>(
    config: &Config,
    description: &LayoutDescription,
    width: i32,
    height: i32,
    compositor: &mut C,
) -> Result<(Layout, Option<Screensaver>)> {
    let layout = Layout::new(
        description,
        config.layout_options(),
        width,
        height,
        compositor,
    )
    .context("Failed to build layout")?;

    let screensaver = if config.screensaver.enabled {
        let mut screensaver = Screensaver::new(
            config.screensaver.idle_time_secs * 1000,
            config.screensaver.intensity,
        );
        match screensaver.load(compositor, width, height) {
            Ok(()) => Some(screensaver),
            Err(e) => {
                warn!("Failed to create screensaver overlay: {}. Screensaver disabled.", e);
                None
            }
        }
    } else {
        None
    };

    Ok((layout, screensaver))
}
