use std::io::{self, Write};

use serde::Serialize;

use crate::app::{EventKind, ProgressEvent, ProgressSink, RunReport};

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    Json,
}

/// Human-readable progress on stdout.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_summary(report: &RunReport) {
        println!();
        println!(
            "{GREEN}Downloaded {} of {} tracks.{RESET}",
            report.downloaded.len(),
            report.total
        );
        if report.is_complete() {
            println!("{GREEN}Enjoy!{RESET}");
            return;
        }
        println!("{YELLOW}{} track(s) failed:{RESET}", report.failed.len());
        for failure in &report.failed {
            println!(
                "{RED}  {:02} - {}: {}{RESET}",
                failure.number, failure.name, failure.error
            );
        }
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        let (prefix, color) = match event.kind {
            EventKind::Info => ("", CYAN),
            EventKind::Notice => ("[!] ", YELLOW),
            EventKind::TrackStarted => ("", CYAN),
            EventKind::TrackDone => ("✔ ", GREEN),
            EventKind::TrackFailed => ("✖ ", RED),
            EventKind::Finished => ("\n", GREEN),
        };
        match event.elapsed {
            Some(elapsed) if event.kind != EventKind::Finished => println!(
                "{color}{prefix}{} ({:.1}s){RESET}",
                event.message,
                elapsed.as_secs_f64()
            ),
            _ => println!("{color}{prefix}{}{RESET}", event.message),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}
