//! Terminal output: timestamped, coloured log lines and interactive prompts.

use crate::select::Prompt;
use ansi_term::Colour;
use anyhow::Error;
use chrono::Local;
use std::fmt;
use std::io::{self, BufRead, Write};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Filter used when `RUST_LOG` is not set. HTTP libraries log every request at `info`.
const DEFAULT_FILTER: &str = "info,surf=warn,isahc=warn,tide=warn";

/// Install the global `tracing` subscriber.
///
/// Every event is printed to standard output as `YYYY-mm-dd HH:MM:SS | message`, coloured by
/// level unless `NO_COLOR` is set.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stdout)
        .event_format(ConsoleFormat::new(use_colour()))
        .try_init();
}

/// Log an error and exit with a failure status when the user presses Ctrl+C.
///
/// Partially downloaded files are left in place and resumed on the next run.
pub fn exit_on_interrupt() -> Result<(), Error> {
    ctrlc::set_handler(|| {
        tracing::error!("Exiting due to user request (Ctrl+C)!");
        std::process::exit(1);
    })?;
    Ok(())
}

fn use_colour() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn level_colour(level: Level) -> Colour {
    match level {
        Level::ERROR => Colour::Red,
        Level::WARN => Colour::Yellow,
        Level::INFO => Colour::Green,
        Level::DEBUG | Level::TRACE => Colour::Cyan,
    }
}

/// Event formatter producing `timestamp | message` lines.
pub struct ConsoleFormat {
    colour: bool,
}

impl ConsoleFormat {
    pub fn new(colour: bool) -> Self {
        Self { colour }
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = String::new();
        ctx.format_fields(Writer::new(&mut fields), event)?;
        let line = format!("{} | {fields}", timestamp());
        if self.colour {
            writeln!(writer, "{}", level_colour(*event.metadata().level()).paint(line))
        } else {
            writeln!(writer, "{line}")
        }
    }
}

/// Reads answers from standard input, printing prompts in the same style as log lines.
pub struct StdinPrompt {
    colour: bool,
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self {
            colour: use_colour(),
        }
    }
}

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> Result<Option<String>, Error> {
        let prompt = format!("{} | {question}", timestamp());
        let mut stdout = io::stdout().lock();
        if self.colour {
            write!(stdout, "{}", Colour::Cyan.paint(prompt))?;
        } else {
            write!(stdout, "{prompt}")?;
        }
        stdout.flush()?;

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer)? == 0 {
            return Ok(None);
        }
        Ok(Some(answer.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert_eq!(ts.len(), 19, "{ts}");
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[13..14], ":");
    }

    #[test]
    fn test_exit_on_interrupt() {
        exit_on_interrupt().unwrap();
        // There is only one handler per process.
        exit_on_interrupt().unwrap_err();
    }

    #[test]
    fn test_level_colour() {
        assert_eq!(level_colour(Level::ERROR), Colour::Red);
        assert_eq!(level_colour(Level::WARN), Colour::Yellow);
        assert_eq!(level_colour(Level::INFO), Colour::Green);
    }
}
