//! Split tool output on `\n` and `\r`.
//!
//! rsync's `--info=progress2` rewrites one line with carriage returns, so a plain
//! `BufRead::lines` would only yield once the whole transfer finishes.

use std::io::{self, BufRead};

pub struct ProgressLines<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> ProgressLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            done: false,
        }
    }

    fn take_line(&mut self) -> String {
        let bytes = std::mem::take(&mut self.buf);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl<R: BufRead> Iterator for ProgressLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let (consumed, found) = {
                let available = match self.reader.fill_buf() {
                    Ok(b) => b,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Some(Err(e)),
                };
                if available.is_empty() {
                    self.done = true;
                    if self.buf.is_empty() {
                        return None;
                    }
                    return Some(Ok(self.take_line()));
                }
                match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
                    Some(pos) => {
                        self.buf.extend_from_slice(&available[..pos]);
                        (pos + 1, true)
                    }
                    None => {
                        self.buf.extend_from_slice(available);
                        (available.len(), false)
                    }
                }
            };
            self.reader.consume(consumed);
            // "\r\n" and blank lines carry nothing.
            if found && !self.buf.is_empty() {
                return Some(Ok(self.take_line()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> Vec<String> {
        ProgressLines::new(input).map(|l| l.unwrap()).collect()
    }

    #[test]
    fn splits_on_carriage_return_and_newline() {
        let out = collect(b"  10%\r  20%\r  30%\nsent 1 bytes\r\n");
        assert_eq!(out, vec!["  10%", "  20%", "  30%", "sent 1 bytes"]);
    }

    #[test]
    fn yields_unterminated_tail() {
        assert_eq!(collect(b"a\nb"), vec!["a", "b"]);
        assert!(collect(b"").is_empty());
        assert!(collect(b"\n\r\n").is_empty());
    }

    #[test]
    fn line_spanning_buffer_refills() {
        let data = b"0123456789%\n";
        let reader = io::BufReader::with_capacity(3, &data[..]);
        let out: Vec<String> = ProgressLines::new(reader).map(|l| l.unwrap()).collect();
        assert_eq!(out, vec!["0123456789%"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let out = collect(b"\xff 5%\n");
        assert_eq!(out.len(), 1);
        assert!(out[0].ends_with(" 5%"));
    }
}
