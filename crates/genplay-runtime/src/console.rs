//! Process-wide console sink.
//!
//! Program output goes to a single shared sink. By default the sink is the
//! real standard output; a [`ConsoleCapture`] swaps in a buffer for as long
//! as it is alive. Captures are serialized: a second capture blocks until
//! the first is dropped, and dropping always restores the previous sink,
//! whether the run returned normally, failed or panicked.

use parking_lot::{const_mutex, Mutex, MutexGuard};
use std::io::Write;

static GATE: Mutex<()> = const_mutex(());
static SINK: Mutex<Option<String>> = const_mutex(None);

/// Write to the current sink.
pub fn write(text: &str) {
    let mut sink = SINK.lock();
    match sink.as_mut() {
        Some(buffer) => buffer.push_str(text),
        None => {
            drop(sink);
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(text.as_bytes());
            let _ = stdout.flush();
        }
    }
}

/// Scoped redirection of the console sink into a buffer.
#[must_use = "output is only captured while the guard is alive"]
pub struct ConsoleCapture {
    previous: Option<String>,
    _gate: MutexGuard<'static, ()>,
}

impl ConsoleCapture {
    /// Wait for exclusive use of the sink and start capturing.
    pub fn begin() -> Self {
        let gate = GATE.lock();
        let previous = SINK.lock().replace(String::new());
        Self {
            previous,
            _gate: gate,
        }
    }

    /// Text captured so far, leaving the buffer empty.
    pub fn take(&self) -> String {
        SINK.lock().as_mut().map(std::mem::take).unwrap_or_default()
    }
}

impl Drop for ConsoleCapture {
    fn drop(&mut self) {
        *SINK.lock() = self.previous.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_collects_text() {
        let capture = ConsoleCapture::begin();
        write("hello ");
        write("world");
        assert_eq!(capture.take(), "hello world");
        assert_eq!(capture.take(), "");
    }

    #[test]
    fn test_restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            let _capture = ConsoleCapture::begin();
            write("lost");
            panic!("user code exploded");
        });
        assert!(result.is_err());
        let capture = ConsoleCapture::begin();
        assert_eq!(capture.take(), "");
    }

    #[test]
    fn test_captures_are_serialized() {
        let first = ConsoleCapture::begin();
        let handle = std::thread::spawn(|| {
            let capture = ConsoleCapture::begin();
            write("second");
            capture.take()
        });
        write("first");
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(first.take(), "first");
        drop(first);
        assert_eq!(handle.join().unwrap(), "second");
    }
}
