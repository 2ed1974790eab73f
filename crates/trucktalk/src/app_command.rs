/// Commands accepted by the practice console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Print the command list.
    Help,
    /// Speak a line through the synthesis dispatcher.
    Say {
        /// The literal text to synthesize.
        text: String,
    },
    /// Start a recording take.
    Record,
    /// Stop the current take early.
    Stop,
    /// Play back the recorded take.
    Replay,
    /// Stop playback of the recorded take.
    Pause,
    /// Discard the take and return to idle.
    Reset,
    /// Print recorder and permission status.
    Status,
    /// Leave the console.
    Quit,
}

impl AppCommand {
    /// Parse one console line. Returns `None` for empty or unknown input.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let head = parts.next()?;
        let rest = parts.next().map(str::trim).unwrap_or("");

        match head {
            "help" => Some(Self::Help),
            "say" if !rest.is_empty() => Some(Self::Say {
                text: rest.to_string(),
            }),
            "record" => Some(Self::Record),
            "stop" => Some(Self::Stop),
            "replay" | "play" => Some(Self::Replay),
            "pause" => Some(Self::Pause),
            "reset" => Some(Self::Reset),
            "status" => Some(Self::Status),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}
