use anyhow::Result;
use serde::Serialize;
use starry_core::ConsoleState;

/// JSON on stdout, notices on stderr
pub struct Output {
    pretty: bool,
    failed: bool,
}

impl Output {
    pub fn new(pretty: bool) -> Self {
        Self {
            pretty,
            failed: false,
        }
    }

    pub fn print<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{}", text);
        Ok(())
    }

    /// One compact JSON document per line, for streaming
    pub fn line<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string(value)?);
        Ok(())
    }

    /// Print `value` unless the command already raised an error notice
    pub fn print_unless_failed<T: Serialize + ?Sized>(
        &self,
        state: &ConsoleState,
        value: &T,
    ) -> Result<()> {
        if self.failed || state.notifications.has_errors() {
            return Ok(());
        }
        self.print(value)
    }

    /// Move queued notices to stderr
    pub fn notices(&mut self, state: &mut ConsoleState) {
        for notice in state.notifications.drain() {
            if notice.is_error() {
                self.failed = true;
            }
            eprintln!("{} {}", notice.level.icon(), notice.message);
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.failed
    }
}
