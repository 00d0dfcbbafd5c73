use colored::{ColoredString, Colorize};
use std::{fmt, time::Duration};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Durations above which elapsed times are highlighted in yellow, then red.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingThresholds {
    pub slow: Duration,
    pub very_slow: Duration,
}

impl TimingThresholds {
    /// Minified one-off builds.
    pub const BUILD: Self = Self {
        slow: Duration::from_millis(100),
        very_slow: Duration::from_millis(500),
    };

    /// Unminified rebuilds in watch mode only stand out once they take seconds.
    pub const REBUILD: Self = Self {
        slow: Duration::from_secs(1),
        very_slow: Duration::from_secs(3),
    };
}

impl Default for TimingThresholds {
    fn default() -> Self {
        Self::BUILD
    }
}

pub fn format_elapsed_time(elapsed: Duration, thresholds: TimingThresholds) -> ColoredString {
    let text = human_duration(elapsed);

    if elapsed > thresholds.very_slow {
        text.red()
    } else if elapsed > thresholds.slow {
        text.yellow()
    } else {
        text.dimmed()
    }
}

fn human_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else if elapsed.as_millis() > 0 {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{}μs", elapsed.as_micros())
    }
}

pub struct EventLoggerFormatter;

impl<S, N> FormatEvent<S, N> for EventLoggerFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        if event.metadata().name() == "SKIP_FORMAT" {
            ctx.field_format().format_fields(writer.by_ref(), event)?;
            return writeln!(writer);
        }

        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string().dimmed();
        let event_name = event.metadata().name();

        // Events without an explicit `name:` get tracing's "event file:line" default
        let label = if event_name.is_empty() || event_name.starts_with("event ") {
            String::new()
        } else {
            let name = event_name.to_ascii_lowercase();
            let name = match *event.metadata().level() {
                tracing::Level::ERROR => name.bold().red(),
                tracing::Level::WARN => name.bold().yellow(),
                _ => name.bold().bright_yellow(),
            };
            format!(" {}", name)
        };

        write!(writer, "{}{} ", timestamp, label)?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

pub fn init_logging() {
    let tracing_formatter = tracing_subscriber::fmt::layer().event_format(EventLoggerFormatter);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_formatter)
        .init();
}
