use std::io::{BufRead, Split};

/// Reads a column-aligned text report such as `jstat -gc` or `df -k`.
///
/// The first line is always taken to be the header and is dropped. Every
/// line after it comes back as its whitespace-separated tokens; a blank line
/// yields an empty `Vec`, which consumers are expected to skip. Rows are not
/// checked against the header width.
///
/// Lines are decoded lossily: a mount point with non-UTF-8 bytes must not
/// hide the ASCII numbers next to it.
pub struct TableScanner<R> {
    lines:          Split<R>,
    header_skipped: bool,
    done:           bool,
}

impl<R: BufRead> TableScanner<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.split(b'\n'), header_skipped: false, done: false }
    }

    fn next_line(&mut self) -> Option<String> {
        if self.done { return None; }
        match self.lines.next() {
            Some(Ok(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Some(Err(e)) => {
                tracing::debug!("stopped reading report: {}", e);
                self.done = true;
                None
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for TableScanner<R> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.header_skipped {
            self.header_skipped = true;
            self.next_line()?;
        }
        let line = self.next_line()?;
        Some(line.split_whitespace().map(str::to_string).collect())
    }
}
