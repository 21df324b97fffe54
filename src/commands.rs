//! Text commands accepted by the shell, and what each one does.

use std::sync::Arc;

use anyhow::Result;

use crate::{
    db::{Feeling, SessionRecord, SettingKey, DEFAULT_REPORT_LIMIT},
    settings::SettingsStore,
    stats::{day_progress, StatsAggregator},
    timer::{Clock, TimerConfig, TimerController, TimerError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Toggle,
    Reset,
    Adjust(i32),
    Feedback(Feeling),
    Status,
    Snapshot,
    Stats,
    Heatmap,
    Report(usize),
    Config,
    Set(SettingKey, i64),
    Defaults,
    Help,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut words = input.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Toggle);
        };
        let rest: Vec<&str> = words.collect();

        if let Some(sign) = head.chars().next().filter(|c| *c == '+' || *c == '-') {
            let minutes: i32 = head[1..]
                .parse()
                .map_err(|_| format!("expected minutes after '{sign}', got '{head}'"))?;
            return Ok(Command::Adjust(if sign == '-' { -minutes } else { minutes }));
        }

        let command = match head.to_ascii_lowercase().as_str() {
            "start" | "s" => Command::Start,
            "pause" | "p" => Command::Pause,
            "toggle" | "t" => Command::Toggle,
            "reset" | "r" => Command::Reset,
            "happy" => Command::Feedback(Feeling::Happy),
            "sad" => Command::Feedback(Feeling::Sad),
            "status" => Command::Status,
            "snapshot" | "json" => Command::Snapshot,
            "stats" => Command::Stats,
            "heatmap" => Command::Heatmap,
            "report" => match rest.first() {
                Some(limit) => Command::Report(
                    limit
                        .parse()
                        .map_err(|_| format!("report limit must be a number, got '{limit}'"))?,
                ),
                None => Command::Report(DEFAULT_REPORT_LIMIT),
            },
            "config" => Command::Config,
            "set" => {
                let [key, value] = rest.as_slice() else {
                    return Err("usage: set <key> <value>".into());
                };
                let key = SettingKey::from_str(key).ok_or_else(|| {
                    let known: Vec<&str> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
                    format!("unknown setting '{key}' (one of {})", known.join(", "))
                })?;
                let value = value
                    .parse()
                    .map_err(|_| format!("setting value must be a whole number, got '{value}'"))?;
                Command::Set(key, value)
            }
            "defaults" => Command::Defaults,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command '{other}', try 'help'")),
        };
        Ok(command)
    }
}

pub enum Reply {
    Text(String),
    Quit,
}

pub const HELP: &str = "\
start | pause | toggle (or empty line) | reset
+N / -N          adjust the countdown by N minutes
happy | sad      close the running focus session with feedback
status | snapshot | stats | heatmap | report [N] | config
set <key> <value>   focus_duration, short_break_duration, long_break_duration (seconds),
                    sessions_before_long_break
defaults         drop stored settings
quit";

/// Everything a command can touch.
#[derive(Clone)]
pub struct AppState {
    pub timer: TimerController,
    pub settings: SettingsStore,
    pub stats: StatsAggregator,
    pub clock: Arc<dyn Clock>,
}

fn describe_config(config: &TimerConfig) -> String {
    format!(
        "focus {}s, rest {}s, long rest {}s, long rest every {} sessions",
        config.focus_duration_seconds,
        config.rest_duration_seconds,
        config.long_rest_duration_seconds,
        config.sessions_before_long_rest
    )
}

fn describe_session(record: &SessionRecord) -> String {
    let start = record.start_time.format("%Y-%m-%d %H:%M");
    match (record.duration_minutes(), record.feeling) {
        (None, _) => format!("{start}  (open)"),
        (Some(minutes), None) => format!("{start}  {minutes:>3} min"),
        (Some(minutes), Some(feeling)) => {
            format!("{start}  {minutes:>3} min  {}", feeling.as_str())
        }
    }
}

fn timer_reply(outcome: Result<bool, TimerError>, done: &str, noop: &str) -> Result<Reply> {
    match outcome {
        Ok(true) => Ok(Reply::Text(done.into())),
        Ok(false) => Ok(Reply::Text(noop.into())),
        // The state change happened; the event printer has reported the write.
        Err(TimerError::Persistence(_)) => Ok(Reply::Text(done.into())),
        Err(err) => Err(err.into()),
    }
}

fn text(reply: String) -> Result<Reply> {
    Ok(Reply::Text(reply))
}

pub async fn execute(app: &AppState, command: Command) -> Result<Reply> {
    match command {
        Command::Start => timer_reply(app.timer.start().await, "started", "already running"),
        Command::Pause => {
            let paused = app.timer.pause().await;
            text(if paused { "paused" } else { "not running" }.into())
        }
        Command::Toggle => timer_reply(app.timer.toggle().await, "ok", "nothing to do"),
        Command::Reset => {
            app.timer.reset(false).await;
            let snapshot = app.timer.snapshot().await;
            text(format!("reset to {} {}", snapshot.label, snapshot.countdown))
        }
        Command::Adjust(delta) => {
            app.timer.adjust(delta).await;
            text(app.timer.snapshot().await.countdown)
        }
        Command::Feedback(feeling) => timer_reply(
            app.timer.record_feedback(feeling).await,
            "session closed",
            "no focus session to rate",
        ),
        Command::Status => {
            let snapshot = app.timer.snapshot().await;
            let state = &snapshot.state;
            text(format!(
                "{}  {}  {}  completed {}  day {}%",
                snapshot.label,
                snapshot.countdown,
                if state.is_running { "running" } else { "paused" },
                state.completed_focus_sessions,
                day_progress(app.clock.now()),
            ))
        }
        Command::Snapshot => {
            let snapshot = app.timer.snapshot().await;
            text(serde_json::to_string_pretty(&snapshot)?)
        }
        Command::Stats => {
            let summary = app.stats.summary(app.clock.now().date()).await?;
            text(format!(
                "today {} min, yesterday {} min, 7-day average {:.1} min",
                summary.today_minutes, summary.yesterday_minutes, summary.last_7_days_average
            ))
        }
        Command::Heatmap => {
            let heatmap = app.stats.heatmap(app.clock.now().date()).await?;
            text(heatmap.render())
        }
        Command::Report(limit) => {
            let sessions = app.stats.recent_sessions(limit).await?;
            if sessions.is_empty() {
                return text("no sessions yet".into());
            }
            let lines: Vec<String> = sessions.iter().map(describe_session).collect();
            text(lines.join("\n"))
        }
        Command::Config => text(describe_config(&app.timer.snapshot().await.config)),
        Command::Set(key, value) => {
            let config = app.settings.set(key, value).await?;
            app.timer.apply_config(config).await?;
            text(describe_config(&config))
        }
        Command::Defaults => {
            let config = app.settings.reset().await?;
            app.timer.apply_config(config).await?;
            text(describe_config(&config))
        }
        Command::Help => text(HELP.into()),
        Command::Quit => Ok(Reply::Quit),
    }
}
