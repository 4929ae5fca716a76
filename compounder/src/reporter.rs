use std::io::{self, Write};

use chrono::Local;
use common::log::{debug, info, warn};

const TAG: &str = "GNAC:";
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Console display: one status line that gets overwritten, followed by every
/// event seen so far. The whole screen is redrawn on each call.
pub struct Reporter<W: Write> {
    out: W,
    status: String,
    events: Vec<String>,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, status: String::new(), events: Vec::new() }
    }

    /// Replaces the status line.
    pub fn status(&mut self, message: &str) {
        debug!("{}", message);
        self.status = stamp(message);
        self.redraw();
    }

    /// Appends to the event history.
    pub fn event(&mut self, message: &str) {
        info!("{}", message);
        self.events.push(stamp(message));
        self.redraw();
    }

    pub fn status_line(&self) -> &str {
        &self.status
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn redraw(&mut self) {
        if let Err(e) = self.render() {
            warn!("Failed to draw console: {}", e);
        }
    }

    fn render(&mut self) -> io::Result<()> {
        write!(self.out, "{}", CLEAR_SCREEN)?;
        writeln!(self.out, "{}", self.status)?;
        for event in &self.events {
            writeln!(self.out, "{}", event)?;
        }
        self.out.flush()
    }
}

fn stamp(message: &str) -> String {
    format!("{} {} {}", Local::now().format("%Y-%m-%d %H:%M:%S"), TAG, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_of(line: &str) -> &str {
        let (_, message) = line.split_once(TAG).expect("Line is not tagged");
        message.trim_start()
    }

    #[test]
    fn test_status_is_overwritten() {
        let mut reporter = Reporter::new(Vec::new());
        reporter.status("waiting");
        reporter.status("still waiting");

        assert_eq!(message_of(reporter.status_line()), "still waiting");
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn test_events_are_kept_in_order() {
        let mut reporter = Reporter::new(Vec::new());
        reporter.event("first");
        reporter.status("waiting");
        reporter.event("second");

        let events: Vec<_> = reporter.events().iter().map(|e| message_of(e)).collect();
        assert_eq!(events, vec!["first", "second"]);
    }

    #[test]
    fn test_lines_are_timestamped() {
        let mut reporter = Reporter::new(Vec::new());
        reporter.event("hello");

        let line = &reporter.events()[0];
        let (timestamp, _) = line.split_once(" GNAC:").expect("Line is not tagged");
        assert!(chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn test_redraw_prints_status_then_history() {
        let mut reporter = Reporter::new(Vec::new());
        reporter.event("one");
        reporter.event("two");
        reporter.status("now");

        let out = String::from_utf8(reporter.into_inner()).expect("Output is not utf8");
        let last_frame = out.rsplit(CLEAR_SCREEN).next().expect("Nothing drawn");
        let lines: Vec<_> = last_frame.lines().map(message_of).collect();

        assert_eq!(lines, vec!["now", "one", "two"]);
        assert_eq!(out.matches(CLEAR_SCREEN).count(), 3);
    }
}
