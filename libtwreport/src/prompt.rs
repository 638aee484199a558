//! Interactive yes/no confirmation before each action

use std::io::{BufRead, Stderr, StdinLock, Write};

use crate::error::{PromptError, Result};

const REPROMPT: &str = "Please type y (for yes) or n (for no) and then press enter: ";

/// Asks the operator whether to go ahead with one row
pub trait ConfirmationGate {
    /// Blocks until the operator answers yes or no. Unrecognised answers
    /// re-issue the prompt.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Line-oriented prompt over any reader/writer pair
pub struct TerminalGate<R, W> {
    input: R,
    output: W,
}

impl TerminalGate<StdinLock<'static>, Stderr> {
    /// Answers from stdin, questions on stderr (stdout is kept for the
    /// run summary)
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{}", text).map_err(PromptError::Io)?;
        self.output.flush().map_err(PromptError::Io)?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> ConfirmationGate for TerminalGate<R, W> {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.say(prompt)?;

        loop {
            let mut line = String::new();
            let read = self.input.read_line(&mut line).map_err(PromptError::Io)?;
            if read == 0 {
                return Err(PromptError::Closed.into());
            }

            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => self.say(REPROMPT)?,
            }
        }
    }
}

/// Case-insensitive y/yes/n/no
pub fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
