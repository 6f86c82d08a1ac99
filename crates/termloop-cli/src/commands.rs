use crate::args::Cli;
use crate::config;
use crate::console::Console;
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

pub fn run(cli: Cli) -> Result<()> {
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(capacity) = cli.capacity {
        config.history_capacity = capacity;
    }
    if cli.no_timestamps {
        config.timestamps = false;
    }

    let console = if cli.plain {
        Console::plain(&config)
    } else {
        Console::auto(&config)?
    };
    let console = Arc::new(console);

    // Raw mode swallows SIGINT from the keyboard, but external signals still
    // need to put the terminal back before we die
    ctrlc::set_handler(|| {
        let _ = crossterm::terminal::disable_raw_mode();
        std::process::exit(130);
    })?;

    console.log_notice("console ready, type 'help' for commands")?;

    let stop = Arc::new(AtomicBool::new(false));
    let producer = if cli.no_producer {
        None
    } else {
        Some(spawn_producer(Arc::clone(&console), Arc::clone(&stop))?)
    };

    repl(&console)?;

    stop.store(true, Ordering::Relaxed);
    if let Some(handle) = producer {
        let _ = handle.join();
    }
    console.log_notice("shutting down")?;
    console.drain()?;
    Ok(())
}

/// Queues a heartbeat notice every couple of seconds while the prompt is
/// live, demonstrating that background producers never corrupt the line the
/// user is typing.
fn spawn_producer(console: Arc<Console>, stop: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("notice-producer".to_string())
        .spawn(move || {
            let mut beat = 0u64;
            while !stop.load(Ordering::Relaxed) {
                beat += 1;
                let _ = console.log_notice(&format!("background worker heartbeat #{}", beat));
                for _ in 0..20 {
                    if stop.load(Ordering::Relaxed) {
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        })?;
    Ok(handle)
}

fn repl(console: &Console) -> Result<()> {
    loop {
        // EOF (plain mode) or disposal ends the session
        let Ok(line) = console.read_line() else {
            break;
        };
        match line.trim() {
            "" => {}
            "help" => print_help(console)?,
            "history" => {
                let kept = console.history_len()?;
                console.log_notice(&format!(
                    "{} line(s) held for history browsing (arrow keys)",
                    kept
                ))?;
            }
            "menu" => {
                let picked =
                    console.show_menu_dialog("Pick a color", &["red", "green", "blue"])?;
                console.log_notice(&format!("you picked option {}", picked + 1))?;
            }
            "confirm" => {
                let confirmed = console.show_confirmation_dialog("Carry on?")?;
                console.log_notice(if confirmed { "confirmed" } else { "declined" })?;
            }
            "mute" => {
                console.log_notice("output muted, 'unmute' to restore")?;
                console.request_flush()?;
                console.set_output_muted(true)?;
            }
            "unmute" => {
                console.set_output_muted(false)?;
                console.log_notice("output restored")?;
            }
            "quit" | "exit" => break,
            line if line.starts_with("echo ") => {
                console.log_data(line.trim_start_matches("echo "))?;
            }
            other => {
                console.log_error(&format!("unknown command {:?} (try 'help')", other))?;
            }
        }
    }
    Ok(())
}

fn print_help(console: &Console) -> Result<()> {
    for line in [
        "commands:",
        "  help       show this help",
        "  echo TEXT  queue TEXT as a raw data line",
        "  history    report how many lines the history buffer holds",
        "  menu       demo of the numbered menu dialog",
        "  confirm    demo of the yes/no dialog",
        "  mute       drop queued output until 'unmute'",
        "  unmute     accept queued output again",
        "  quit       leave",
        "",
        "up/down arrows browse previous lines; backspace edits in place",
    ] {
        console.log_data(line)?;
    }
    console.request_flush()?;
    Ok(())
}
