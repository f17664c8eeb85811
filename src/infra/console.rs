use chrono::Local;

use crate::usecase::ports::notify::OutcomeSink;

/// Prints commit outcomes for the interactive host.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl OutcomeSink for ConsoleSink {
    fn report_outcome(&mut self, success: bool, summary: &str, details: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        let status = if success { "ok" } else { "FAILED" };
        println!("[{stamp}] {status}: {summary}");
        for line in details.lines() {
            println!("    {line}");
        }
    }
}
