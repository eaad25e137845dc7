use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use shellstream::agent::{AgentClient, AgentSession, Role, SessionUpdate};
use shellstream::config::{Config, TerminalConfig};
use shellstream::logging::init_tracing;
use shellstream::terminal::{Direction, Terminal};
use shellstream::transport::oneshot::output_lines;
use shellstream::transport::{classify, LineKind, OneShotClient, OutputLine, TransportKind};

#[derive(Parser, Debug)]
#[command(
    name = "shellstream",
    about = "Run commands on a remote shell and follow build-agent sessions",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (default: <config dir>/shellstream/config.toml)"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a terminal on a websocket shell (ws://) or one-shot endpoint (http://)
    Shell {
        /// Overrides `terminal.address`
        address: Option<String>,
    },
    /// Run a single command through the one-shot endpoint
    Run {
        #[arg(long, help = "One-shot endpoint (default: terminal.address)")]
        address: Option<String>,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Send a message to the build agent and follow its progress
    Agent {
        #[arg(long, value_name = "ID", help = "Continue an existing session")]
        session: Option<String>,
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Check that the one-shot endpoint is up
    Health {
        /// Overrides `terminal.address`
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };

    match cli.command {
        Command::Shell { address } => shell(config.terminal, address).await,
        Command::Run { address, command } => run(config.terminal, address, &command.join(" ")).await,
        Command::Agent { session, message } => agent(config, session, &message.join(" ")).await,
        Command::Health { address } => health(config.terminal, address).await,
    }
}

async fn shell(settings: TerminalConfig, address: Option<String>) -> Result<()> {
    let address = address.unwrap_or_else(|| settings.address.clone());
    let mut terminal = Terminal::new(settings);
    terminal.connect(&address);
    flush(&mut terminal);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let live = terminal.transport_kind() == Some(TransportKind::Interactive);
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if !handle_input(&mut terminal, &address, &line).await {
                    break;
                }
            }
            _ = terminal.pump(), if live => {}
        }
        flush(&mut terminal);
    }

    terminal.disconnect();
    flush(&mut terminal);
    Ok(())
}

/// Apply one line of user input. Returns `false` to leave the shell.
async fn handle_input(terminal: &mut Terminal, address: &str, input: &str) -> bool {
    match input.trim() {
        ":quit" | ":q" => return false,
        ":prev" => show_history(terminal.navigate_history(Direction::Prev)),
        ":next" => show_history(terminal.navigate_history(Direction::Next)),
        ":clear" => terminal.clear(),
        ":disconnect" => terminal.disconnect(),
        ":reconnect" => terminal.connect(address),
        _ => terminal.execute_command(input).await,
    }
    true
}

fn show_history(entry: Option<String>) {
    match entry {
        Some(entry) if !entry.is_empty() => eprintln!("history: {entry}"),
        Some(_) => eprintln!("history: (empty line)"),
        None => eprintln!("history: (none)"),
    }
}

fn flush(terminal: &mut Terminal) {
    for line in terminal.log_mut().take_unseen() {
        print_line(&line);
    }
}

fn print_line(line: &OutputLine) {
    match line.kind {
        LineKind::Command => println!("$ {}", line.text),
        LineKind::Output => println!("{}", line.text),
        LineKind::Error => eprintln!("{}", line.text),
        LineKind::Prompt => eprintln!("* {}", line.text),
    }
}

fn one_shot_client(settings: &TerminalConfig, address: Option<String>) -> Result<OneShotClient> {
    let address = address.unwrap_or_else(|| settings.address.clone());
    if classify(&address) != TransportKind::OneShot {
        bail!("'{address}' is not an http(s) address; use `shell` for websocket shells");
    }
    let client = OneShotClient::new(
        &address,
        settings.timeout_seconds,
        settings.cwd.clone(),
        Duration::from_secs(u64::from(settings.connect_timeout_seconds)),
    )?;
    Ok(client)
}

async fn run(settings: TerminalConfig, address: Option<String>, command: &str) -> Result<()> {
    let client = one_shot_client(&settings, address)?;
    let response = client.run(command, settings.timeout_seconds).await?;
    for line in output_lines(&response) {
        print_line(&line);
    }
    if response.exit_code != 0 {
        std::process::exit(response.exit_code);
    }
    Ok(())
}

async fn health(settings: TerminalConfig, address: Option<String>) -> Result<()> {
    let client = one_shot_client(&settings, address)?;
    let status = client.health().await?;
    println!("{} {}", client.base_url(), status);
    Ok(())
}

async fn agent(config: Config, session_id: Option<String>, message: &str) -> Result<()> {
    let client = AgentClient::new(&config.agent)?;
    let mut session = match session_id {
        Some(id) => AgentSession::resume(client, id),
        None => AgentSession::new(client),
    };

    if session.session_id().is_some() {
        session.send_message(message).await?;
    } else {
        session.start_session(message).await?;
    }
    if let Some(id) = session.session_id() {
        eprintln!("* session {id}");
    }

    let cancel = session.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    session
        .run_until_idle(|update| match update {
            SessionUpdate::Log(entry) => {
                eprintln!("[{}] {}", entry.level.as_deref().unwrap_or("info"), entry.message)
            }
            SessionUpdate::Error(message) => eprintln!("agent error: {message}"),
            SessionUpdate::Failed(message) => eprintln!("log stream failed: {message}"),
            SessionUpdate::Ended => eprintln!("* log stream closed"),
            SessionUpdate::Reply(_) => {}
        })
        .await;
    interrupt.abort();

    if let Some(reply) = session.conversation().last().filter(|m| m.role == Role::Assistant) {
        println!("{}", reply.content);
        for tool in reply.tool_summary.iter().flatten() {
            eprintln!("  tool: {tool}");
        }
    }
    Ok(())
}
