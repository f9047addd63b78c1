//! Marquee CLI
//!
//! Command-line interface for controlling a running Marquee launcher.
//!
//! Commands are sent to the launcher over its loopback IPC socket.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use marquee_ipc::{
    decode_line, encode_line, Focus, IpcCommand, IpcResponse, DEFAULT_IPC_ADDR, IPC_READ_TIMEOUT,
    MAX_IPC_MESSAGE_SIZE,
};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "marquee-cli")]
#[command(author, version, about = "Control a running Marquee launcher")]
struct Cli {
    /// Launcher IPC address
    #[arg(short, long, default_value = DEFAULT_IPC_ADDR)]
    address: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move the selection
    Move {
        #[arg(value_enum)]
        direction: MoveDirection,
    },
    /// Activate the highlighted item
    Select,
    /// Run a command through the launcher (`:quit`, `:reload`, a program...)
    Exec {
        /// Command string; quote it when it contains spaces
        command: String,
    },
    /// Print the navigation state
    Query {
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
    /// Reload configuration and layout
    Reload,
    /// Stop the launcher
    Stop,
}

#[derive(Clone, Copy, ValueEnum)]
enum MoveDirection {
    Up,
    Down,
    Left,
    Right,
}

impl Commands {
    fn to_ipc(&self) -> IpcCommand {
        match self {
            Commands::Move { direction } => match direction {
                MoveDirection::Up => IpcCommand::MoveUp,
                MoveDirection::Down => IpcCommand::MoveDown,
                MoveDirection::Left => IpcCommand::MoveLeft,
                MoveDirection::Right => IpcCommand::MoveRight,
            },
            Commands::Select => IpcCommand::Select,
            Commands::Exec { command } => IpcCommand::Execute {
                command: command.clone(),
            },
            Commands::Query { .. } => IpcCommand::QueryState,
            Commands::Reload => IpcCommand::Reload,
            Commands::Stop => IpcCommand::Stop,
        }
    }
}

/// Send one command and wait for the response.
async fn send_command(address: &str, cmd: &IpcCommand) -> Result<IpcResponse> {
    let stream = tokio::time::timeout(IPC_READ_TIMEOUT, TcpStream::connect(address))
        .await
        .context("Timed out connecting to the launcher")?
        .with_context(|| format!("Failed to connect to the launcher at {} (is it running?)", address))?;
    let (reader, mut writer) = stream.into_split();

    writer.write_all(encode_line(cmd)?.as_bytes()).await?;

    let mut reader = BufReader::new(reader.take(MAX_IPC_MESSAGE_SIZE));
    let mut line = String::new();
    tokio::time::timeout(IPC_READ_TIMEOUT, reader.read_line(&mut line))
        .await
        .context("Timed out waiting for the launcher")??;
    Ok(decode_line(&line)?)
}

fn print_state(response: &IpcResponse) {
    let IpcResponse::State {
        focus,
        sidebar_index,
        sidebar_title,
        menu,
        animating,
        application_running,
    } = response
    else {
        return;
    };
    let focus = match focus {
        Focus::Sidebar => "sidebar",
        Focus::Menu => "menu",
    };
    println!("Focus:       {}", focus);
    println!("Sidebar:     #{} {}", sidebar_index, sidebar_title);
    if let Some(menu) = menu {
        println!(
            "Card:        #{} {} (row {}, column {})",
            menu.entry, menu.entry_title, menu.row, menu.column
        );
    }
    println!("Animating:   {}", animating);
    println!("Application: {}", if *application_running { "running" } else { "none" });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.to_ipc();
    let response = send_command(&cli.address, &cmd).await?;

    match (&cli.command, &response) {
        (_, IpcResponse::Error { message }) => bail!("{}", message),
        (Commands::Query { json: true }, _) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        (_, IpcResponse::State { .. }) => print_state(&response),
        (_, IpcResponse::Ok) => {}
    }

    Ok(())
}
