//! Progress model for one transfer: percentage, rate and ETA parsed from tool output.
//!
//! Fields are overwritten independently; a line that only carries a rate leaves the
//! percentage alone. There is deliberately no monotonic clamp, so a later line with a
//! smaller percentage moves the bar backwards.

mod lines;
mod scan;

pub use lines::ProgressLines;

/// Width of the text progress bar, in cells.
pub const BAR_WIDTH: usize = 20;
const BAR_FULL: char = '#';
const BAR_EMPTY: char = '-';

/// Snapshot of one transfer's progress (display-friendly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    /// Display name (usually the source basename).
    pub name: String,
    /// Percent complete in [0, 100].
    pub percentage: u32,
    /// Rate token as printed by the tool, e.g. `12.3MB/s`. Empty until seen.
    pub rate: String,
    /// ETA token as printed by the tool, e.g. `0:01:23`. Empty until seen.
    pub eta: String,
}

impl ProgressState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            percentage: 0,
            rate: String::new(),
            eta: String::new(),
        }
    }

    /// Update fields from one line of tool output. First match per field wins.
    pub fn update(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        if let Some(pct) = scan::percentage(line) {
            self.percentage = pct;
        }
        if let Some(rate) = scan::rate(line) {
            self.rate = rate.to_string();
        }
        if let Some(eta) = scan::eta(line) {
            self.eta = eta.to_string();
        }
    }

    pub fn mark_complete(&mut self) {
        self.percentage = 100;
    }

    pub fn is_complete(&self) -> bool {
        self.percentage == 100
    }

    /// One display line: error, completed, or bar with optional rate/ETA.
    pub fn render_line(&self, error: &str) -> String {
        if !error.is_empty() {
            return format!("{}: ERROR - {}", self.name, error);
        }
        if self.is_complete() {
            return format!("{}: Completed (100%)", self.name);
        }
        let mut line = format!("{}: [{}] {}%", self.name, self.bar(), self.percentage);
        if !self.rate.is_empty() {
            line.push_str(&format!(" [{}]", self.rate));
        }
        if !self.eta.is_empty() {
            line.push_str(&format!(" [ETA: {}]", self.eta));
        }
        line
    }

    fn bar(&self) -> String {
        let filled = (self.percentage.min(100) as usize * BAR_WIDTH) / 100;
        let mut bar = String::with_capacity(BAR_WIDTH);
        bar.extend(std::iter::repeat(BAR_FULL).take(filled));
        bar.extend(std::iter::repeat(BAR_EMPTY).take(BAR_WIDTH - filled));
        bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_three_tokens() {
        let mut p = ProgressState::new("data");
        p.update("  45%  12.3MB/s  0:01:23  ");
        assert_eq!(p.percentage, 45);
        assert_eq!(p.rate, "12.3MB/s");
        assert_eq!(p.eta, "0:01:23");
    }

    #[test]
    fn rsync_progress2_line() {
        let mut p = ProgressState::new("data");
        p.update("    1,238,099,968  57%   11.83MB/s    0:01:02 (xfr#3, to-chk=2/6)");
        assert_eq!(p.percentage, 57);
        assert_eq!(p.rate, "11.83MB/s");
        assert_eq!(p.eta, "0:01:02");
    }

    #[test]
    fn unmatched_fields_are_kept() {
        let mut p = ProgressState::new("data");
        p.update("  45%  12.3MB/s  0:01:23");
        p.update("  50%");
        assert_eq!(p.percentage, 50);
        assert_eq!(p.rate, "12.3MB/s");
        assert_eq!(p.eta, "0:01:23");
        p.update("sending incremental file list");
        p.update("");
        assert_eq!(p.percentage, 50);
        p.update("1.5kB/s");
        assert_eq!(p.rate, "1.5kB/s");
        assert_eq!(p.eta, "0:01:23");
    }

    #[test]
    fn percentage_can_go_backwards() {
        let mut p = ProgressState::new("data");
        p.update("80%");
        p.update("20%");
        assert_eq!(p.percentage, 20);
    }

    #[test]
    fn mark_complete_is_idempotent() {
        let mut p = ProgressState::new("photos");
        p.update("3%  1.0MB/s  0:10:00");
        p.mark_complete();
        p.mark_complete();
        assert!(p.is_complete());
        assert_eq!(p.percentage, 100);
        assert_eq!(p.render_line(""), "photos: Completed (100%)");
    }

    #[test]
    fn error_takes_precedence_in_render() {
        let mut p = ProgressState::new("photos");
        p.mark_complete();
        assert_eq!(p.render_line("disk full"), "photos: ERROR - disk full");
    }

    #[test]
    fn render_bar_and_optional_segments() {
        let mut p = ProgressState::new("a");
        assert_eq!(p.render_line(""), "a: [--------------------] 0%");
        p.update("45%");
        assert_eq!(p.render_line(""), "a: [#########-----------] 45%");
        p.update("12.3MB/s");
        assert_eq!(p.render_line(""), "a: [#########-----------] 45% [12.3MB/s]");
        p.update("0:01:23");
        assert_eq!(
            p.render_line(""),
            "a: [#########-----------] 45% [12.3MB/s] [ETA: 0:01:23]"
        );
    }

    #[test]
    fn eta_without_rate() {
        let mut p = ProgressState::new("a");
        p.update("99% 0:00:01");
        assert_eq!(p.render_line(""), "a: [###################-] 99% [ETA: 0:00:01]");
    }
}
