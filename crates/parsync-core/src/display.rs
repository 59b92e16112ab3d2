//! In-place multi-line terminal display: one line per transfer, redrawn on a timer.

use anyhow::Result;
use std::io::{self, Write};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::scheduler::Summary;

/// Move the cursor to the start of the line `n` lines up.
fn cursor_prev_lines(n: usize) -> String {
    format!("\x1b[{}F", n)
}
const ERASE_LINE: &str = "\x1b[2K";

struct Frame {
    lines: Vec<String>,
    out: Box<dyn Write + Send>,
    /// Terminal columns; lines are cut short of this so they never wrap.
    width: Option<usize>,
}

impl Frame {
    fn draw(&mut self) -> io::Result<()> {
        if self.lines.is_empty() {
            return Ok(());
        }
        let mut buf = cursor_prev_lines(self.lines.len());
        for line in &self.lines {
            buf.push_str(ERASE_LINE);
            match self.width {
                Some(w) => buf.push_str(&console::truncate_str(line, w.saturating_sub(1), "")),
                None => buf.push_str(line),
            }
            buf.push('\n');
        }
        self.out.write_all(buf.as_bytes())?;
        self.out.flush()
    }
}

/// Live view over N line slots. Writers only set text; a background thread draws.
pub struct DisplayRenderer {
    frame: Arc<Mutex<Frame>>,
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl DisplayRenderer {
    /// Render to stdout, truncating to the terminal width when stdout is a terminal.
    pub fn stdout(line_count: usize, interval: Duration) -> io::Result<Self> {
        let term = console::Term::stdout();
        let width = term.size_checked().map(|(_rows, cols)| cols as usize);
        Self::start(Box::new(io::stdout()), line_count, interval, width)
    }

    /// Reserve `line_count` blank lines on `out` and start redrawing every `interval`.
    pub fn start(
        mut out: Box<dyn Write + Send>,
        line_count: usize,
        interval: Duration,
        width: Option<usize>,
    ) -> io::Result<Self> {
        out.write_all("\n".repeat(line_count).as_bytes())?;
        out.flush()?;

        let frame = Arc::new(Mutex::new(Frame {
            lines: vec![String::new(); line_count],
            out,
            width,
        }));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread = {
            let frame = Arc::clone(&frame);
            thread::Builder::new()
                .name("parsync-display".into())
                .spawn(move || loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            if let Err(e) = lock(&frame).draw() {
                                tracing::debug!("display redraw failed: {}", e);
                            }
                        }
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                })?
        };

        Ok(Self {
            frame,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    pub fn line_count(&self) -> usize {
        lock(&self.frame).lines.len()
    }

    /// Set the pending text for slot `index`. Does not draw.
    pub fn update_line(&self, index: usize, text: String) -> Result<()> {
        let mut frame = self
            .frame
            .lock()
            .map_err(|_| anyhow::anyhow!("display state poisoned"))?;
        let count = frame.lines.len();
        let slot = frame
            .lines
            .get_mut(index)
            .ok_or_else(|| anyhow::anyhow!("display line {} out of range ({} lines)", index, count))?;
        *slot = text;
        Ok(())
    }

    /// Draw the current frame now.
    pub fn redraw(&self) -> io::Result<()> {
        lock(&self.frame).draw()
    }

    /// Print `text` under the current frame and start a fresh frame below it.
    pub fn notice(&self, text: &str) -> io::Result<()> {
        let mut frame = lock(&self.frame);
        frame.draw()?;
        let reserve = "\n".repeat(frame.lines.len());
        write!(frame.out, "{}\n{}", text, reserve)?;
        frame.out.flush()
    }

    /// Stop the timer, draw the final frame, then print the summary line.
    pub fn stop(mut self, summary: &Summary) -> io::Result<()> {
        self.halt();
        let mut frame = lock(&self.frame);
        frame.draw()?;
        writeln!(frame.out, "\n{}", summary)?;
        frame.out.flush()
    }

    fn halt(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::warn!("display thread panicked");
            }
        }
    }
}

impl Drop for DisplayRenderer {
    fn drop(&mut self) {
        self.halt();
    }
}

fn lock(frame: &Mutex<Frame>) -> MutexGuard<'_, Frame> {
    frame.lock().unwrap_or_else(|e| e.into_inner())
}
