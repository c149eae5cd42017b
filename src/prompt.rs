//! Console prompts for the interactive menu.

use crate::bootstrap::Confirm;
use crate::{Error, Result};
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Line-oriented console over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label`, read one trimmed line. `None` at end of input.
    pub fn ask_line(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask for text; empty input takes `default`.
    pub fn ask_text(&mut self, label: &str, default: &str) -> Result<String> {
        let answer = self.ask_line(&format!("{} [{}]: ", label, default))?;
        Ok(answer
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// Show numbered choices and return the one picked, `None` at end of input.
    pub fn menu(&mut self, title: &str, choices: &[(&str, &str)]) -> Result<Option<String>> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", title)?;
        for (key, label) in choices {
            writeln!(self.output, "  {}. {}", key, label)?;
        }
        loop {
            let Some(answer) = self.ask_line("Choose: ")? else {
                return Ok(None);
            };
            if choices.iter().any(|(key, _)| *key == answer) {
                return Ok(Some(answer));
            }
            writeln!(self.output, "Unknown choice '{}'", answer)?;
        }
    }

    /// Ask for a count of at least 1, asking again on 0. Empty or unparsable
    /// input, or end of input, takes `default`.
    pub fn ask_count<T>(&mut self, label: &str, default: T) -> Result<T>
    where
        T: FromStr + Copy + std::fmt::Display + PartialOrd + From<u8>,
    {
        loop {
            let Some(answer) = self.ask_line(&format!("{} [{}]: ", label, default))? else {
                return Ok(default);
            };
            match answer.parse::<T>() {
                Ok(n) if n < T::from(1) => {
                    writeln!(self.output, "Enter a number of at least 1")?;
                }
                Ok(n) => return Ok(n),
                Err(_) => return Ok(default),
            }
        }
    }
}

impl<R: BufRead, W: Write> Confirm for Console<R, W> {
    fn confirm(&mut self, message: &str) -> Result<()> {
        writeln!(self.output)?;
        match self.ask_line(&format!("{} ", message))? {
            Some(_) => Ok(()),
            None => Err(Error::EnvironmentUnavailable(
                "console input closed before the login was confirmed".into(),
            )),
        }
    }
}
