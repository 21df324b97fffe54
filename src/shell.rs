use std::io::Write;

use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

use crate::commands::{execute, AppState, Command, Reply, HELP};
use crate::log_warn;
use crate::stretch::desk_stretch;
use crate::timer::{Phase, TimerEvent};

const ENABLE_LOGS: bool = true;
const BELL: char = '\x07';

/// Render one timer event, or `None` for events not worth a line. A break
/// coming up gets a stretch suggestion picked with `rng`.
pub fn render_event<R: Rng + ?Sized>(event: &TimerEvent, rng: &mut R) -> Option<String> {
    match event {
        TimerEvent::Tick { remaining_seconds } if remaining_seconds % 60 == 0 => Some(format!(
            "{:02}:00",
            remaining_seconds / 60
        )),
        TimerEvent::Tick { .. } => None,
        TimerEvent::PhaseCompleted {
            finished,
            next,
            remaining_seconds,
        } => {
            let mut line = format!(
                "{BELL}{} finished. Next: {} ({} min)",
                finished.label(),
                next.label(),
                remaining_seconds / 60
            );
            if matches!(next, Phase::Rest | Phase::LongRest) {
                line.push_str("\nStretch: ");
                line.push_str(desk_stretch(rng));
            }
            Some(line)
        }
        TimerEvent::PersistenceFailed { message } => {
            Some(format!("warning: session not saved: {message}"))
        }
    }
}

fn spawn_printer(mut events: broadcast::Receiver<TimerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = render_event(&event, &mut rng) {
                        println!("{line}");
                        let _ = std::io::stdout().flush();
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log_warn!("event printer skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run_shell(app: AppState) -> Result<()> {
    let printer = spawn_printer(app.timer.subscribe());
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match execute(&app, command).await {
            Ok(Reply::Text(reply)) => println!("{reply}"),
            Ok(Reply::Quit) => break,
            Err(err) => println!("error: {err:#}"),
        }
    }

    app.timer.pause().await;
    printer.abort();
    Ok(())
}
