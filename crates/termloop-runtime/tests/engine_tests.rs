use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use termloop_runtime::{ConsoleEngine, Terminal};
use termloop_testing::{ScriptedTerminal, TerminalOp, TerminalProbe, wait_until};
use termloop_types::{ConsoleConfig, Error, Key, Result};

const WAIT: Duration = Duration::from_secs(2);

fn fast_config() -> ConsoleConfig {
    ConsoleConfig {
        history_capacity: 10,
        input_poll_ms: 1,
        output_poll_ms: 5,
        ..ConsoleConfig::default()
    }
}

fn start_engine() -> (ConsoleEngine, TerminalProbe) {
    let (terminal, probe) = ScriptedTerminal::idle();
    let engine =
        ConsoleEngine::start(Box::new(terminal), &fast_config()).expect("engine should start");
    (engine, probe)
}

#[test]
fn flush_writes_lines_in_enqueue_order() {
    let (engine, probe) = start_engine();

    engine.queue_output("A", false).unwrap();
    engine.queue_output("B", false).unwrap();
    engine.queue_output("C", false).unwrap();
    engine.request_flush().unwrap();

    assert!(wait_until(WAIT, || probe.written_lines().len() == 3));
    assert_eq!(probe.written_lines(), vec!["A", "B", "C"]);
}

#[test]
fn concurrent_producers_keep_per_thread_order() {
    let (engine, probe) = start_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..3)
        .map(|producer| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for i in 0..20 {
                    engine
                        .queue_output(format!("p{}-{:02}", producer, i), false)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(wait_until(WAIT, || probe.written_lines().len() == 60));

    let lines = probe.written_lines();
    for producer in 0..3 {
        let prefix = format!("p{}-", producer);
        let mine: Vec<&String> = lines.iter().filter(|l| l.starts_with(&prefix)).collect();
        assert_eq!(mine.len(), 20);
        for (i, line) in mine.iter().enumerate() {
            assert_eq!(**line, format!("p{}-{:02}", producer, i));
        }
    }
}

#[test]
fn flush_clears_and_rewrites_a_partial_input_line() {
    let (engine, probe) = start_engine();

    probe.push_keys("hi".chars().map(Key::Char));
    assert!(wait_until(WAIT, || {
        engine.input_buffer().unwrap() == "hi"
    }));

    engine.queue_output("log line", true).unwrap();
    assert!(wait_until(WAIT, || !probe.written_lines().is_empty()));

    let ops = probe.ops();
    let clear_at = ops
        .iter()
        .position(|op| *op == TerminalOp::ClearLine)
        .expect("partial line should be cleared before the flush");
    let line_at = ops
        .iter()
        .position(|op| *op == TerminalOp::WriteLine("log line".to_string()))
        .unwrap();
    let rewrite_at = ops
        .iter()
        .rposition(|op| *op == TerminalOp::Write("hi".to_string()))
        .expect("input buffer should be rewritten after the flush");
    assert!(clear_at < line_at);
    assert!(line_at < rewrite_at);
    assert_eq!(engine.input_buffer().unwrap(), "hi");
}

#[test]
fn read_line_returns_the_committed_line_and_restores_auto_flush() {
    let (engine, probe) = start_engine();

    probe.type_line("status");
    assert_eq!(engine.read_line().unwrap(), "status");
    assert!(engine.is_auto_flush().unwrap());
    assert_eq!(engine.history_len().unwrap(), 1);
}

#[test]
fn consecutive_identical_commits_are_stored_once() {
    let (engine, probe) = start_engine();

    probe.type_line("same");
    probe.type_line("same");
    assert_eq!(engine.read_line().unwrap(), "same");
    assert_eq!(engine.read_line().unwrap(), "same");
    assert_eq!(engine.history_len().unwrap(), 1);
}

#[test]
fn history_browsing_replays_older_entries() {
    let (engine, probe) = start_engine();

    probe.type_line("one");
    probe.type_line("two");
    assert_eq!(engine.read_line().unwrap(), "one");
    assert_eq!(engine.read_line().unwrap(), "two");
    assert_eq!(engine.history_len().unwrap(), 2);

    // Browse two steps back: the synthetic entry goes in, "one" is shown
    probe.push_keys([Key::Up, Key::Up]);
    assert!(wait_until(WAIT, || {
        engine.input_buffer().unwrap() == "one"
    }));

    // Committing mid-browse consumes the browsed-through entries
    probe.push_keys([Key::Enter]);
    assert_eq!(engine.read_line().unwrap(), "one");
    assert_eq!(engine.history_len().unwrap(), 1);
}

#[test]
fn backspace_edits_the_buffer_and_erases_the_glyph() {
    let (engine, probe) = start_engine();

    probe.push_keys("ab".chars().map(Key::Char));
    probe.push_keys([Key::Backspace]);
    assert!(wait_until(WAIT, || engine.input_buffer().unwrap() == "a"));

    let ops = probe.ops();
    assert!(ops.contains(&TerminalOp::MoveLeft(1)));
    assert!(ops.contains(&TerminalOp::Write(" ".to_string())));
}

#[test]
fn muted_input_discards_pending_keys() {
    let (engine, probe) = start_engine();

    engine.set_register_state(false, true).unwrap();
    probe.push_keys("abc".chars().map(Key::Char));
    assert!(wait_until(WAIT, || probe.pending_keys() == 0));
    assert_eq!(engine.input_buffer().unwrap(), "");

    engine.set_register_state(true, true).unwrap();
    probe.push_keys([Key::Char('z')]);
    assert!(wait_until(WAIT, || engine.input_buffer().unwrap() == "z"));
}

#[test]
fn muted_output_drops_queued_lines() {
    let (engine, probe) = start_engine();

    engine.set_register_state(true, false).unwrap();
    engine.queue_output("dropped", true).unwrap();
    engine.set_register_state(true, true).unwrap();
    engine.queue_output("kept", true).unwrap();

    assert!(wait_until(WAIT, || !probe.written_lines().is_empty()));
    assert_eq!(probe.written_lines(), vec!["kept"]);
}

#[test]
fn input_buffer_flush_and_clear() {
    let (engine, probe) = start_engine();

    probe.push_keys("abc".chars().map(Key::Char));
    assert!(wait_until(WAIT, || engine.input_buffer().unwrap() == "abc"));

    assert_eq!(engine.flush_input_buffer().unwrap(), "abc");
    assert_eq!(engine.input_buffer().unwrap(), "");

    probe.push_keys("xy".chars().map(Key::Char));
    assert!(wait_until(WAIT, || engine.input_buffer().unwrap() == "xy"));
    engine.clear_input_buffer().unwrap();
    assert_eq!(engine.input_buffer().unwrap(), "");
}

#[test]
fn disposed_engine_rejects_every_operation() {
    let (mut engine, probe) = start_engine();
    engine.dispose().unwrap();

    assert!(matches!(
        engine.queue_output("x", true),
        Err(Error::Disposed)
    ));
    assert!(matches!(engine.request_flush(), Err(Error::Disposed)));
    assert!(matches!(engine.input_buffer(), Err(Error::Disposed)));
    assert!(matches!(engine.read_line(), Err(Error::Disposed)));
    assert!(matches!(engine.try_read_line(), Err(Error::Disposed)));
    assert!(matches!(engine.dispose(), Err(Error::Disposed)));

    // The rejected line must never reach the terminal
    std::thread::sleep(Duration::from_millis(50));
    assert!(probe.written_lines().is_empty());
}

#[test]
fn try_read_line_returns_immediately_while_read_line_is_pending() {
    let (engine, probe) = start_engine();
    let engine = Arc::new(engine);

    let reader = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || engine.read_line())
    };
    // Give the reader time to reach its blocking wait
    std::thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    assert_eq!(engine.try_read_line().unwrap(), None);
    assert!(started.elapsed() < Duration::from_millis(200));

    probe.type_line("done");
    assert_eq!(reader.join().unwrap().unwrap(), "done");
}

#[test]
fn ignored_keys_still_commit_an_active_browse() {
    let (engine, probe) = start_engine();

    probe.type_line("one");
    probe.type_line("two");
    assert_eq!(engine.read_line().unwrap(), "one");
    assert_eq!(engine.read_line().unwrap(), "two");

    probe.push_keys([Key::Up]);
    assert!(wait_until(WAIT, || engine.input_buffer().unwrap() == "two"));

    // Esc is not echoed, but as a non-navigation key it commits the browse:
    // the synthetic entry and the browsed-through "two" are consumed
    probe.push_keys([Key::Esc]);
    assert!(wait_until(WAIT, || engine.history_len().unwrap() == 1));
    assert_eq!(engine.input_buffer().unwrap(), "two");

    // Browsing starts over from the remaining entry
    probe.push_keys([Key::Up]);
    assert!(wait_until(WAIT, || engine.input_buffer().unwrap() == "one"));
}

/// Terminal whose single key becomes readable only after the test releases
/// it, pinning down the window between polling a key and registering it.
struct GatedTerminal {
    release: mpsc::Receiver<()>,
    delivered: bool,
}

impl Terminal for GatedTerminal {
    fn poll_key(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(!self.delivered)
    }

    fn read_key(&mut self) -> Result<Key> {
        let _ = self.release.recv();
        self.delivered = true;
        Ok(Key::Char('a'))
    }

    fn write_text(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn write_line(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn clear_line(&mut self) -> Result<()> {
        Ok(())
    }

    fn move_to_column(&mut self, _column: u16) -> Result<()> {
        Ok(())
    }

    fn move_left(&mut self, _count: u16) -> Result<()> {
        Ok(())
    }

    fn move_right(&mut self, _count: u16) -> Result<()> {
        Ok(())
    }

    fn cursor_column(&mut self) -> Result<u16> {
        Ok(0)
    }

    fn width(&mut self) -> u16 {
        80
    }
}

#[test]
fn key_polled_before_muting_is_not_registered() {
    let (release_tx, release_rx) = mpsc::channel();
    let terminal = GatedTerminal {
        release: release_rx,
        delivered: false,
    };
    let engine = ConsoleEngine::start(Box::new(terminal), &fast_config()).unwrap();

    // The input loop is now inside read_key, waiting on the gate; muting
    // lands between the poll and the key being applied
    std::thread::sleep(Duration::from_millis(50));
    engine.set_register_state(false, true).unwrap();
    release_tx.send(()).unwrap();

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(engine.input_buffer().unwrap(), "");
}

#[test]
fn try_read_line_is_non_blocking() {
    let (engine, probe) = start_engine();

    assert_eq!(engine.try_read_line().unwrap(), None);
    probe.type_line("later");
    assert!(wait_until(WAIT, || {
        engine.try_read_line().unwrap() == Some("later".to_string())
    }));
}
