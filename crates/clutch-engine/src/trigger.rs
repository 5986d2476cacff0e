//! Operator-paced stepping.
//!
//! [`PromptTrigger`] is the console "next step" button: it prompts, then
//! blocks on one line of input. An empty line (or anything else) runs the
//! next tick; `q`, `quit`, or end of input stops the run.

use std::io::{BufRead, Write};

use clutch_core::runner::{StepSignal, StepTrigger};
use tracing::warn;

const PROMPT: &str = "[Enter] next step, [q] quit > ";

/// Step trigger driven by lines read from `input`.
pub struct PromptTrigger<R, W> {
    input: R,
    prompt: W,
}

impl<R: BufRead, W: Write> PromptTrigger<R, W> {
    /// Read commands from `input`, writing prompts to `prompt`.
    pub const fn new(input: R, prompt: W) -> Self {
        Self { input, prompt }
    }
}

impl<R: BufRead, W: Write> StepTrigger for PromptTrigger<R, W> {
    fn wait_for_step(&mut self) -> StepSignal {
        if let Err(e) = write!(self.prompt, "{PROMPT}").and_then(|()| self.prompt.flush()) {
            warn!(error = %e, "failed to write step prompt");
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => StepSignal::Stop,
            Ok(_) => match line.trim() {
                "q" | "quit" => StepSignal::Stop,
                _ => StepSignal::Step,
            },
            Err(e) => {
                warn!(error = %e, "failed to read operator input, stopping");
                StepSignal::Stop
            }
        }
    }
}
