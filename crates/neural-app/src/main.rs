//! Neural Chat application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Open the settings document and build the conversation controller
//! 4. Render controller events to the terminal in a background task
//! 5. Run the line-oriented REPL until `/quit`, EOF or Ctrl-C

mod cli;
mod commands;
mod render;

use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::Local;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use neural_chat::{
    ChatError, ControllerOptions, ConversationController, InputLevel, TracingEffects,
    UnsupportedRecognizer, VoiceCapture,
};
use neural_core::{
    format_relative_time, ChatEvent, ChatMessage, FileSettingsStorage, NeuralConfig, NoticeLevel,
    Sender,
};

use crate::cli::CliArgs;
use crate::commands::{parse_line, Command, HELP};
use crate::render::RevealLines;

/// Whether the REPL keeps running after a command.
enum Flow {
    Continue,
    Quit,
}

fn print_message(message: &ChatMessage, show_timestamps: bool) {
    let stamp = if show_timestamps {
        format!(
            "[{}] ",
            message.timestamp.with_timezone(&Local).format("%H:%M")
        )
    } else {
        String::new()
    };
    let who = match message.sender {
        Sender::User => "あなた",
        Sender::Assistant => "Neural",
    };
    println!("{}{}: {}", stamp, who, message.content);
}

/// Reveal state shared by the renderer task and the REPL.
type SharedReveal = Arc<Mutex<RevealLines>>;

/// Terminate any half-printed reply line.
fn close_reveal_line(reveal: &SharedReveal) {
    if let Ok(mut lines) = reveal.lock() {
        if lines.abandon() {
            println!();
        }
    }
}

/// Render controller events until the channel closes.
async fn render_events(controller: ConversationController, reveal: SharedReveal) {
    let mut rx = controller.subscribe();

    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Renderer lagged behind controller events");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let settings = match controller.settings() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Renderer could not read settings");
                break;
            }
        };

        match event {
            ChatEvent::MessageAppended { message, .. } => match message.sender {
                Sender::User => {}
                Sender::Assistant if settings.show_typing => {
                    if let Ok(mut lines) = reveal.lock() {
                        print!("{}", lines.start(message.id, &message.content));
                    }
                    let _ = std::io::stdout().flush();
                }
                Sender::Assistant => print_message(&message, settings.show_timestamps),
            },
            ChatEvent::RevealProgress {
                message_id,
                visible,
                total,
            } => {
                let chunk = reveal
                    .lock()
                    .ok()
                    .and_then(|mut lines| lines.progress(message_id, visible, total));
                if let Some(chunk) = chunk {
                    print!("{}", chunk);
                    let _ = std::io::stdout().flush();
                }
            }
            ChatEvent::ThinkingStateChanged { thinking: true } => println!("(考え中...)"),
            ChatEvent::Notice { level, text } => {
                // A cancelled reveal leaves a dangling line.
                close_reveal_line(&reveal);
                let tag = match level {
                    NoticeLevel::Info => "i",
                    NoticeLevel::Success => "✓",
                    NoticeLevel::Warning => "!",
                    NoticeLevel::Error => "✗",
                };
                println!("[{}] {}", tag, text);
            }
            _ => {}
        }
    }
}

fn execute(
    controller: &ConversationController,
    reveal: &SharedReveal,
    command: Command,
) -> Result<Flow, ChatError> {
    match command {
        Command::Message(text) => {
            let status = controller.input_status(text.trim());
            if status.level != InputLevel::Normal {
                println!(
                    "({}/{})",
                    status.count,
                    controller.options().max_message_length
                );
            }
            controller.submit_user_message(&text)?;
        }
        Command::NewSession => {
            controller.request_new_session()?;
        }
        Command::ListSessions => {
            let now = chrono::Utc::now();
            for (i, session) in controller.list_sessions().iter().enumerate() {
                println!(
                    "{} {}. {} - {} ({})",
                    if session.active { "*" } else { " " },
                    i + 1,
                    session.title,
                    session.preview,
                    format_relative_time(session.last_activity, now)
                );
            }
        }
        Command::Switch(n) => {
            let Some(id) = controller.list_sessions().get(n - 1).map(|s| s.id) else {
                println!("[!] no session #{}", n);
                return Ok(Flow::Continue);
            };
            controller.request_session_switch(id)?;
            close_reveal_line(reveal);
            let show_timestamps = controller.settings()?.show_timestamps;
            for message in controller.messages(id)? {
                print_message(&message, show_timestamps);
            }
        }
        Command::Clear => controller.clear_active_session()?,
        Command::ShowSettings => {
            let s = controller.settings()?;
            println!("personality     = {}", s.personality);
            println!("length          = {}", s.response_length);
            println!("speed           = {}", s.response_speed);
            println!("typing          = {}", s.show_typing);
            println!("timestamps      = {}", s.show_timestamps);
            println!("sound           = {}", s.sound_effects);
            println!("language        = {}", s.language);
            println!("dark theme      = {}", s.is_dark_theme);
        }
        Command::Set(patch) => {
            controller.update_settings(&patch)?;
        }
        Command::Theme => {
            controller.toggle_theme()?;
        }
        Command::Reset => {
            controller.reset_settings()?;
        }
        Command::Voice => {
            let language = controller.settings()?.language;
            let mut capture = VoiceCapture::new(UnsupportedRecognizer);
            capture.start(&language)?;
            if let Some(transcript) = capture.stop()? {
                controller.submit_transcript(&transcript)?;
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = NeuralConfig::load_or_default(&config_file);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }

    // Tracing. Logs go to stderr so they don't interleave with the chat.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Neural Chat v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Controller.
    let settings_path = config.settings_path();
    tracing::info!(path = %settings_path.display(), "Using settings document");
    let storage = Arc::new(FileSettingsStorage::new(settings_path));

    let mut builder = ConversationController::builder(storage)
        .options(ControllerOptions::from(&config.chat))
        .effects(Arc::new(TracingEffects));
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let controller = builder.build();

    if let Some(warning) = controller.settings_warning() {
        println!("[!] {}", warning);
    }

    let reveal: SharedReveal = Arc::new(Mutex::new(RevealLines::new()));
    let renderer = tokio::spawn(render_events(controller.clone(), Arc::clone(&reveal)));

    println!("Neural Chatへようこそ！ (/help でコマンド一覧)");

    // REPL.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                None
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_line(&line) {
            Ok(c) => c,
            Err(e) => {
                println!("[!] {}", e);
                continue;
            }
        };

        match execute(&controller, &reveal, command) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("[!] {}", e),
        }
    }

    controller.shutdown();
    renderer.abort();
    tracing::info!("Neural Chat stopped");
    Ok(())
}
