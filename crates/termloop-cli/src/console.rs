use anyhow::Result;
use chrono::Local;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use termloop_runtime::{ConsoleEngine, CrosstermTerminal};
use termloop_types::ConsoleConfig;

/// Line-oriented console façade.
///
/// Interactive mode runs the full engine over a raw-mode terminal: queued
/// output, auto-flush, shell-style history. Plain mode is the degraded
/// fallback for redirected streams: line-buffered stdin, direct stdout, no
/// history or cursor work.
pub struct Console {
    backend: Backend,
    timestamps: bool,
    color: bool,
    output_poll: Duration,
}

enum Backend {
    Interactive(ConsoleEngine),
    Plain,
}

impl Console {
    /// Full engine over the process terminal. Requires a real TTY.
    pub fn interactive(config: &ConsoleConfig) -> Result<Self> {
        let terminal = CrosstermTerminal::new()?;
        let engine = ConsoleEngine::start(Box::new(terminal), config)?;
        Ok(Self {
            backend: Backend::Interactive(engine),
            timestamps: config.timestamps,
            color: io::stdout().is_terminal(),
            output_poll: config.output_poll(),
        })
    }

    /// Line-buffered fallback for non-interactive streams.
    pub fn plain(config: &ConsoleConfig) -> Self {
        Self {
            backend: Backend::Plain,
            timestamps: config.timestamps,
            color: false,
            output_poll: config.output_poll(),
        }
    }

    /// Interactive when both stdin and stdout are terminals, plain otherwise.
    pub fn auto(config: &ConsoleConfig) -> Result<Self> {
        if io::stdin().is_terminal() && io::stdout().is_terminal() {
            Self::interactive(config)
        } else {
            Ok(Self::plain(config))
        }
    }

    /// Wrap an already-started engine. Used by tests to drive the façade
    /// over a scripted terminal.
    pub fn with_engine(engine: ConsoleEngine, config: &ConsoleConfig) -> Self {
        Self {
            backend: Backend::Interactive(engine),
            timestamps: config.timestamps,
            color: false,
            output_poll: config.output_poll(),
        }
    }

    pub fn engine(&self) -> Option<&ConsoleEngine> {
        match &self.backend {
            Backend::Interactive(engine) => Some(engine),
            Backend::Plain => None,
        }
    }

    /// Timestamped status line.
    pub fn log_notice(&self, text: &str) -> Result<()> {
        let line = if self.timestamps {
            let stamp = Local::now().format("%H:%M:%S").to_string();
            if self.color {
                format!("{} {}", stamp.dimmed(), text)
            } else {
                format!("{} {}", stamp, text)
            }
        } else {
            text.to_string()
        };
        self.emit(line, false)
    }

    /// Error line, flushed on the next output cycle.
    pub fn log_error(&self, text: &str) -> Result<()> {
        let line = if self.color {
            format!("{} {}", "error:".red(), text)
        } else {
            format!("error: {}", text)
        };
        self.emit(line, true)
    }

    /// Raw data line, no prefix, no color.
    pub fn log_data(&self, text: &str) -> Result<()> {
        self.emit(text.to_string(), false)
    }

    fn emit(&self, line: String, immediate: bool) -> Result<()> {
        match &self.backend {
            Backend::Interactive(engine) => engine.queue_output(line, immediate)?,
            Backend::Plain => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                writeln!(handle, "{}", line)?;
            }
        }
        Ok(())
    }

    pub fn request_flush(&self) -> Result<()> {
        match &self.backend {
            Backend::Interactive(engine) => engine.request_flush()?,
            Backend::Plain => io::stdout().flush()?,
        }
        Ok(())
    }

    /// Block until the user commits a line.
    pub fn read_line(&self) -> Result<String> {
        match &self.backend {
            Backend::Interactive(engine) => Ok(engine.read_line()?),
            Backend::Plain => {
                let mut line = String::new();
                let read = io::stdin().lock().read_line(&mut line)?;
                if read == 0 {
                    anyhow::bail!("end of input");
                }
                Ok(line.trim_end_matches(['\r', '\n']).to_string())
            }
        }
    }

    /// Write a prompt line, flush, then block for input.
    pub fn read_line_with_prompt(&self, prompt: &str) -> Result<String> {
        self.log_data(prompt)?;
        self.request_flush()?;
        self.read_line()
    }

    /// Numbered menu with a validated 1-based selection; returns the 0-based
    /// index. Out-of-range or non-numeric entries re-prompt.
    pub fn show_menu_dialog(&self, prompt: &str, options: &[&str]) -> Result<usize> {
        loop {
            self.log_data(prompt)?;
            for (i, option) in options.iter().enumerate() {
                self.log_data(&format!("  {}) {}", i + 1, option))?;
            }
            let line =
                self.read_line_with_prompt(&format!("Select an option (1-{}):", options.len()))?;
            match line.trim().parse::<usize>() {
                Ok(choice) if (1..=options.len()).contains(&choice) => return Ok(choice - 1),
                _ => self.log_error(&format!("invalid selection {:?}", line.trim()))?,
            }
        }
    }

    /// Yes/no prompt; anything other than y/yes/n/no re-prompts.
    pub fn show_confirmation_dialog(&self, prompt: &str) -> Result<bool> {
        loop {
            let line = self.read_line_with_prompt(&format!("{} [y/n]", prompt))?;
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                other => self.log_error(&format!("answer y or n, not {:?}", other))?,
            }
        }
    }

    pub fn history_len(&self) -> Result<usize> {
        match &self.backend {
            Backend::Interactive(engine) => Ok(engine.history_len()?),
            Backend::Plain => Ok(0),
        }
    }

    /// Drop queued output on the floor until unmuted. No-op in plain mode.
    pub fn set_output_muted(&self, muted: bool) -> Result<()> {
        if let Backend::Interactive(engine) = &self.backend {
            engine.set_register_state(true, !muted)?;
        }
        Ok(())
    }

    /// Ask for a flush and wait until the queue drains, bounded at half a
    /// second. Called before exit so the last lines actually appear.
    pub fn drain(&self) -> Result<()> {
        let Backend::Interactive(engine) = &self.backend else {
            return Ok(());
        };
        engine.request_flush()?;
        let deadline = std::time::Instant::now() + Duration::from_millis(500);
        while engine.output_len()? > 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(self.output_poll);
        }
        Ok(())
    }
}
