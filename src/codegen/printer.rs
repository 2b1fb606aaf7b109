//! Indenting text builder used by every target

/// Line-oriented pretty printer
pub struct CodeWriter {
    buf: String,
    depth: usize,
    unit: &'static str,
}

impl CodeWriter {
    /// `unit` is one level of indentation
    pub fn new(unit: &'static str) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            unit,
        }
    }

    /// Write one line at the current indentation; empty text writes a bare newline
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(self.unit);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    pub fn lines<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.line(line);
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    /// `open`, indented body, `close`
    pub fn block(&mut self, open: impl AsRef<str>, close: &str, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self.line(close)
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
