/// Receives the result of a manual commit.
pub trait OutcomeSink {
    fn report_outcome(&mut self, success: bool, summary: &str, details: &str);
}
