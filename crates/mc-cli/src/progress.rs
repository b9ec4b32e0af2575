//! Terminal spinner shown while long shell steps run.
//!
//! The spinner draws on stderr from its own thread and is cleared and
//! joined when the guarded closure returns, whatever it returned.

use is_terminal::IsTerminal;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const FRAMES_UNICODE: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAMES_ASCII: &[char] = &['-', '\\', '|', '/'];
const TICK: Duration = Duration::from_millis(80);

#[derive(Debug, Clone)]
pub struct Spinner {
    current: usize,
    message: String,
}

impl Spinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            current: 0,
            message: message.into(),
        }
    }

    pub fn tick(&mut self) {
        self.current = self.current.wrapping_add(1);
    }

    pub fn render(&self, unicode: bool) -> String {
        let frames = if unicode { FRAMES_UNICODE } else { FRAMES_ASCII };
        format!("{} {}", frames[self.current % frames.len()], self.message)
    }
}

fn supports_unicode() -> bool {
    !cfg!(windows)
}

/// Run `f` with a spinner on stderr. With `enabled` false, or when stderr
/// is not a terminal, `f` runs without one.
pub fn with_spinner<T>(message: &str, enabled: bool, f: impl FnOnce() -> T) -> T {
    if !enabled || !std::io::stderr().is_terminal() {
        return f();
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    let mut spinner = Spinner::new(message);
    let width = spinner.render(false).chars().count();
    let handle = thread::spawn(move || {
        let unicode = supports_unicode();
        let mut err = std::io::stderr();
        while flag.load(Ordering::Relaxed) {
            let _ = write!(err, "\r{}", spinner.render(unicode));
            let _ = err.flush();
            spinner.tick();
            thread::sleep(TICK);
        }
        let _ = write!(err, "\r{}\r", " ".repeat(width));
        let _ = err.flush();
    });

    let out = f();
    running.store(false, Ordering::Relaxed);
    if handle.join().is_err() {
        tracing::debug!("spinner thread panicked");
    }
    out
}
