//! Parsing of REPL input lines into commands.
//!
//! Lines starting with `/` are commands; anything else is a chat message.

use neural_core::{Personality, ResponseLength, SettingsPatch};

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Message(String),
    NewSession,
    ListSessions,
    /// Switch to the session at a 1-based position in the listing.
    Switch(usize),
    Clear,
    ShowSettings,
    Set(SettingsPatch),
    Theme,
    Reset,
    Voice,
    Help,
    Quit,
}

pub const HELP: &str = "\
/new                 新しいチャットを開始
/sessions            チャット履歴を表示
/switch <番号>       チャットを切り替え
/clear               現在のチャットを削除
/settings            設定を表示
/set <キー>=<値>     設定を変更 (personality, length, speed, typing, timestamps, sound, language)
/theme               テーマを切り替え
/reset               設定をリセット
/voice               音声入力
/quit                終了";

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Command::Message(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "new" => Ok(Command::NewSession),
        "sessions" | "history" => Ok(Command::ListSessions),
        "switch" => arg
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .map(Command::Switch)
            .ok_or_else(|| format!("invalid session number: {:?}", arg)),
        "clear" => Ok(Command::Clear),
        "settings" => Ok(Command::ShowSettings),
        "set" => parse_assignment(arg).map(Command::Set),
        "theme" => Ok(Command::Theme),
        "reset" => Ok(Command::Reset),
        "voice" => Ok(Command::Voice),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: /{}", other)),
    }
}

/// Parse `key=value` into a single-field settings patch.
pub fn parse_assignment(arg: &str) -> Result<SettingsPatch, String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", arg))?;
    let (key, value) = (key.trim(), value.trim());
    let mut patch = SettingsPatch::default();

    match key {
        "personality" => {
            patch.personality = Some(value.parse::<Personality>().map_err(|e| e.to_string())?)
        }
        "length" | "responseLength" => {
            patch.response_length =
                Some(value.parse::<ResponseLength>().map_err(|e| e.to_string())?)
        }
        "speed" | "responseSpeed" => {
            patch.response_speed = Some(
                value
                    .parse::<u8>()
                    .map_err(|_| format!("invalid speed: {:?}", value))?,
            )
        }
        "typing" | "showTyping" => patch.show_typing = Some(parse_bool(value)?),
        "timestamps" | "showTimestamps" => patch.show_timestamps = Some(parse_bool(value)?),
        "sound" | "soundEffects" => patch.sound_effects = Some(parse_bool(value)?),
        "language" => patch.language = Some(value.to_string()),
        other => return Err(format!("unknown setting: {}", other)),
    }

    Ok(patch)
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("expected on/off, got {:?}", value)),
    }
}
