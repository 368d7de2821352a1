//! Human review of task results

use crewcraft_error::{Error, Result};
use std::io::{BufRead, Write};

/// Looks at a task result and either approves it (`None` or empty feedback)
/// or returns feedback for another attempt.
pub trait HumanReview: Send + Sync {
    fn review(&self, task: &str, output: &str) -> Result<Option<String>>;
}

/// Asks on the terminal
pub struct StdinReview;

impl HumanReview for StdinReview {
    fn review(&self, task: &str, output: &str) -> Result<Option<String>> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "\n## Task\n{}\n\n## Result\n{}\n", task, output)?;
        writeln!(
            out,
            "Provide feedback on the result above, or press Enter to accept it:"
        )?;
        out.flush()?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| Error::from(e).with_operation("review::stdin"))?;

        Ok(feedback(&line))
    }
}

fn feedback(line: &str) -> Option<String> {
    let trimmed = line.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
