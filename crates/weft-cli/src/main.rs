//! Weft - streaming chat client for the weft backend.
//!
//! This is the entry point for the `weft` binary.

use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use weft_cli::controller::TurnController;
use weft_cli::view::TurnOutcome;
use weft_client::{BackendClient, ChannelEvent, CommandSender, MemoryCategory, Role};
use weft_core::{SessionId, TurnEvent};

/// Weft - streaming chat client.
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend URL.
    #[arg(long, env = "WEFT_BACKEND", default_value = "http://localhost:5000")]
    backend: String,

    /// Fail a streaming turn after this many seconds of silence.
    #[arg(long)]
    stall_timeout: Option<u64>,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.debug {
        tracing_subscriber::fmt()
            .with_env_filter("weft=debug,warn")
            .with_writer(std::io::stderr)
            .init();
    }

    let client = BackendClient::new(&args.backend);

    // REST bootstrap: make sure the backend is reachable before connecting
    // the event channel.
    let sessions = client.list_sessions().await?;
    println!("Connected to {} ({} sessions)", client.base_url(), sessions.len());

    let (sender, receiver) = weft_client::connect(&client.ws_url()).await?;

    let stall_timeout = args.stall_timeout.map(Duration::from_secs);
    let mut controller = TurnController::new(stall_timeout);

    run_event_loop(&mut controller, &client, &sender, receiver).await
}

/// Main loop over stdin lines, channel events, and the watchdog tick.
async fn run_event_loop(
    controller: &mut TurnController,
    client: &BackendClient,
    sender: &CommandSender,
    mut receiver: tokio::sync::mpsc::Receiver<ChannelEvent>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut watchdog = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_line(controller, client, sender, line.trim()).await? {
                    break;
                }
            }

            event = receiver.recv() => {
                match event {
                    Some(ChannelEvent::Open) => {
                        tracing::debug!("channel open");
                    }
                    Some(ChannelEvent::Event(event)) => {
                        let is_thinking = matches!(event, TurnEvent::Thinking { .. });
                        print_event_progress(controller, &event);
                        controller.handle_event(event);
                        if is_thinking {
                            print_thinking_progress(controller);
                        }
                    }
                    Some(ChannelEvent::Closed) | None => {
                        eprintln!("Connection closed");
                        break;
                    }
                }
            }

            _ = watchdog.tick() => {
                if controller.poll_stall() {
                    print_last_outcome(controller);
                }
            }
        }
    }

    Ok(())
}

/// Print streamed text and terminal outcomes as events arrive.
fn print_event_progress(controller: &TurnController, event: &TurnEvent) {
    use std::io::Write;

    if !controller.is_streaming() {
        return;
    }
    match event {
        TurnEvent::Stream { content } => {
            print!("{content}");
            let _ = std::io::stdout().flush();
        }
        TurnEvent::Thinking { .. } | TurnEvent::SessionCreated { .. } => {}
        TurnEvent::ToolCall { name, .. } => {
            println!("\n[tool: {name}]");
        }
        TurnEvent::ToolResult { name, .. } => {
            println!("[tool done: {name}]");
        }
        TurnEvent::StreamEnd { duration, .. } => {
            println!("\n[done in {duration:.1}s]");
        }
        TurnEvent::Stopped {} => {
            println!("\n[stopped]");
        }
        TurnEvent::Error { message } => {
            println!("\n[error: {message}]");
        }
    }
}

/// Overwrite the status line with the live reasoning character count.
fn print_thinking_progress(controller: &TurnController) {
    use std::io::Write;

    if let Some(label) = controller
        .view()
        .live()
        .and_then(weft_cli::view::LiveCell::reasoning_label)
    {
        eprint!("\r{label}");
        let _ = std::io::stderr().flush();
    }
}

/// Report the outcome of a turn the watchdog just failed.
fn print_last_outcome(controller: &TurnController) {
    if let Some(turn) = controller.view().turns().last() {
        if turn.outcome == TurnOutcome::Failed {
            println!("\n[error: stream stalled]");
        }
    }
}

/// Dispatch one input line. Returns `false` to quit.
async fn handle_line(
    controller: &mut TurnController,
    client: &BackendClient,
    sender: &CommandSender,
    line: &str,
) -> anyhow::Result<bool> {
    if line.is_empty() {
        return Ok(true);
    }

    if let Some(command) = line.strip_prefix('/') {
        return handle_command(controller, client, sender, command).await;
    }

    match controller.send(line) {
        Some(command) => sender.send(&command).await?,
        None => eprintln!("A response is still streaming ( /stop to cancel )"),
    }
    Ok(true)
}

/// Handle a slash command. Returns `false` to quit.
#[allow(clippy::too_many_lines)]
async fn handle_command(
    controller: &mut TurnController,
    client: &BackendClient,
    sender: &CommandSender,
    command: &str,
) -> anyhow::Result<bool> {
    let (name, arg) = match command.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "q" => return Ok(false),

        "sessions" => match client.list_sessions().await {
            Ok(sessions) => {
                for session in sessions {
                    println!("{}  {}", session.id.as_str(), session.title);
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        },

        "new" => {
            if controller.is_streaming() {
                eprintln!("A response is still streaming");
            } else {
                controller.reset_session();
                println!("New conversation; a session is created on first message");
            }
        }

        "switch" => match SessionId::new(arg) {
            Ok(session_id) => match client.get_session(&session_id).await {
                Ok(detail) => {
                    if controller.switch_session(session_id, &detail.messages) {
                        println!("Switched to: {}", detail.title);
                        print_history(controller);
                    } else {
                        eprintln!("A response is still streaming");
                    }
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            Err(e) => eprintln!("Usage: /switch <session-id> ({e})"),
        },

        "rename" => match controller.active_session() {
            Some(session_id) if !arg.is_empty() => {
                match client.rename_session(session_id, arg).await {
                    Ok(()) => println!("Renamed"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Some(_) => eprintln!("Usage: /rename <title>"),
            None => eprintln!("No active session"),
        },

        "delete" => match controller.active_session() {
            Some(session_id) => {
                let session_id = session_id.clone();
                match client.delete_session(&session_id).await {
                    Ok(()) => {
                        controller.reset_session();
                        println!("Deleted");
                    }
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            None => eprintln!("No active session"),
        },

        "models" => match client.list_models().await {
            Ok(models) => {
                for model in models {
                    let f = model.features;
                    let mut flags = Vec::new();
                    if f.vision {
                        flags.push("vision");
                    }
                    if f.tools {
                        flags.push("tools");
                    }
                    if f.reasoning {
                        flags.push("reasoning");
                    }
                    if f.fast {
                        flags.push("fast");
                    }
                    println!("{}  [{}]", model.id, flags.join(", "));
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        },

        "model" => {
            if arg.is_empty() {
                eprintln!("Usage: /model <model-id>");
            } else {
                sender.switch_model(arg).await?;
                println!("Switching model to {arg}");
            }
        }

        "memories" => {
            let category = match arg {
                "" | "long" => MemoryCategory::Long,
                "working" => MemoryCategory::Working,
                "short" => MemoryCategory::Short,
                other => {
                    eprintln!("Unknown memory tier: {other} (long | working | short)");
                    return Ok(true);
                }
            };
            match client.list_memories(category).await {
                Ok(memories) => {
                    for memory in memories {
                        println!("{}  {}", memory.id, memory.content);
                    }
                }
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        "memstats" => match client.memory_stats().await {
            Ok(stats) => println!(
                "long: {}  working: {}  short: {}  total: {}",
                stats.long_term, stats.working, stats.short_term, stats.total
            ),
            Err(e) => eprintln!("Error: {e}"),
        },

        "prompt" => {
            if arg.is_empty() {
                match client.get_prompt().await {
                    Ok(prompt) => println!("{}", prompt.prompt),
                    Err(e) => eprintln!("Error: {e}"),
                }
            } else {
                match client.save_prompt(arg).await {
                    Ok(()) => println!("Prompt updated"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
        }

        "config" => match arg {
            "" => match client.get_config().await {
                Ok(config) => {
                    println!("model: {}", config.current_model);
                    println!("base_url: {}", config.base_url);
                    println!("memory: {}", if config.memory_enabled { "on" } else { "off" });
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            "memory on" | "memory off" => match client.get_config().await {
                Ok(mut config) => {
                    config.memory_enabled = arg == "memory on";
                    match client.save_config(&config).await {
                        Ok(()) => println!("Memory {}", if config.memory_enabled { "enabled" } else { "disabled" }),
                        Err(e) => eprintln!("Error: {e}"),
                    }
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            _ => eprintln!("Usage: /config [memory on|off]"),
        },

        "regen" => match controller.regenerate() {
            Some(command) => sender.send(&command).await?,
            None => eprintln!("Nothing to regenerate"),
        },

        "stop" => match controller.cancel() {
            Some(command) => sender.send(&command).await?,
            None => eprintln!("Nothing to stop"),
        },

        "export" => {
            let path = if arg.is_empty() { "weft-export.html" } else { arg };
            let document = controller.view().to_html_document("Weft conversation");
            match tokio::fs::write(path, document).await {
                Ok(()) => println!("Exported to {path}"),
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        other => eprintln!("Unknown command: /{other}"),
    }

    Ok(true)
}

/// Print the hydrated history of a freshly switched session.
fn print_history(controller: &TurnController) {
    for turn in controller.view().turns() {
        let prefix = match turn.role {
            Role::User => ">",
            Role::Assistant => "<",
        };
        println!("{prefix} {}", turn.raw_text);
    }
}
