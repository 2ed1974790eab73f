use crate::{AppCommand, AppResult, RecorderWidget, widget::WidgetEvent};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, instrument};
use trucktalk_core::{PlaybackDispatcher, RecorderSnapshot, RecorderState};
use uuid::Uuid;

/// Whether the console loop should keep running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// The practice console.
///
/// Fans in three event sources: console lines, recorder snapshots, and
/// widget events. One recorder widget and one dispatcher per console.
pub struct App {
    dispatcher: PlaybackDispatcher,
    widget: RecorderWidget,
    widget_events: mpsc::Receiver<WidgetEvent>,
}

impl App {
    /// Assemble the console from its already-wired parts.
    pub fn new(
        dispatcher: PlaybackDispatcher,
        widget: RecorderWidget,
        widget_events: mpsc::Receiver<WidgetEvent>,
    ) -> Self {
        Self {
            dispatcher,
            widget,
            widget_events,
        }
    }

    /// Run the console loop until `quit` or end of input.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> AppResult<()> {
        println!("TruckTalk practice console. Type 'help' for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut snapshots = self.widget.subscribe();
        // Suppress the meter's high-rate republishes: only state or
        // elapsed changes are worth a console line.
        let mut last_rendered: Option<(RecorderState, u32)> = None;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if self.handle_line(line.trim()).await == Flow::Quit {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => return Err(e.into()),
                    }
                }

                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    let key = (snapshot.state, snapshot.elapsed_seconds);
                    if last_rendered != Some(key) {
                        render_snapshot(&snapshot);
                        last_rendered = Some(key);
                    }
                }

                Some(event) = self.widget_events.recv() => {
                    match event {
                        WidgetEvent::Completed { byte_len, path } => {
                            println!("Saved practice clip ({} bytes): {}", byte_len, path.display());
                        }
                        WidgetEvent::PermissionDenied => {
                            println!("Microphone denied. Check system settings, then 'record' to retry.");
                        }
                    }
                }
            }
        }

        info!("Practice console closed");
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Flow {
        let Some(command) = AppCommand::parse(line) else {
            if !line.is_empty() {
                println!("Unknown command. Type 'help' for commands.");
            }
            return Flow::Continue;
        };

        match command {
            AppCommand::Help => print_help(),
            AppCommand::Say { text } => {
                let identifier = Uuid::new_v4().to_string();
                self.dispatcher.play_text(&text, &identifier).await;
                if let Some(error) = self
                    .dispatcher
                    .status(&identifier)
                    .and_then(|status| status.error)
                {
                    println!("Playback failed: {}", error);
                }
            }
            AppCommand::Record => {
                if let Some(text) = self.widget.expected_text() {
                    println!("Say: {}", text);
                }
                self.widget.record().await;
            }
            AppCommand::Stop => self.widget.stop().await,
            AppCommand::Replay => self.widget.replay().await,
            AppCommand::Pause => self.widget.pause().await,
            AppCommand::Reset => self.widget.reset().await,
            AppCommand::Status => {
                let snapshot = self.widget.snapshot().await;
                println!(
                    "state={:?} elapsed={}s level={} microphone={:?}",
                    snapshot.state,
                    snapshot.elapsed_seconds,
                    snapshot.audio_level,
                    snapshot.permission_status
                );
            }
            AppCommand::Quit => return Flow::Quit,
        }

        Flow::Continue
    }
}

fn render_snapshot(snapshot: &RecorderSnapshot) {
    match snapshot.state {
        RecorderState::Recording => {
            let filled = usize::from(snapshot.audio_level / 10);
            println!(
                "[recording] {:>3}s |{}{}|",
                snapshot.elapsed_seconds,
                "#".repeat(filled),
                "-".repeat(10 - filled)
            );
        }
        state => println!("[{:?}] {}s", state, snapshot.elapsed_seconds),
    }
}

fn print_help() {
    println!("  say <text>   speak a line");
    println!("  record       start a practice take");
    println!("  stop         stop the take early");
    println!("  replay       play the recorded take");
    println!("  pause        stop playback");
    println!("  reset        discard the take");
    println!("  status       show recorder state");
    println!("  quit         leave the console");
}
