//! The single-line text input and its command history.

#[derive(Debug, Clone, Default)]
pub struct InputLine {
    text: String,
    history: Vec<String>,
    limit: usize,
    /// Position while walking the history; `None` when editing a fresh line
    cursor: Option<usize>,
}

impl InputLine {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = None;
    }

    /// Take the line for submission, leaving the input empty
    pub fn take(&mut self) -> String {
        self.cursor = None;
        std::mem::take(&mut self.text)
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Remember a submitted command. Blank lines and immediate repeats are
    /// skipped; the oldest entries fall off past the limit.
    pub fn record(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.history.last().is_some_and(|last| last == line) {
            return;
        }
        self.history.push(line.to_string());
        if self.history.len() > self.limit {
            let excess = self.history.len() - self.limit;
            self.history.drain(..excess);
        }
        self.cursor = None;
    }

    /// Up: step back to an older command
    pub fn previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.cursor {
            None => self.history.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.cursor = Some(index);
        self.text = self.history[index].clone();
    }

    /// Down: step forward; past the newest entry the line is cleared
    pub fn next(&mut self) {
        match self.cursor {
            None => {}
            Some(i) if i + 1 < self.history.len() => {
                self.cursor = Some(i + 1);
                self.text = self.history[i + 1].clone();
            }
            Some(_) => {
                self.cursor = None;
                self.text.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(input: &mut InputLine, s: &str) {
        for c in s.chars() {
            input.push(c);
        }
    }

    #[test]
    fn test_typing_and_take() {
        let mut input = InputLine::new(50);
        typed(&mut input, "addx");
        input.backspace();
        assert_eq!(input.text(), "add");
        assert_eq!(input.take(), "add");
        assert!(input.is_empty());
    }

    #[test]
    fn test_history_dedups_consecutive_and_caps() {
        let mut input = InputLine::new(3);
        for line in ["a", "a", "b", "", "c", "d"] {
            input.record(line);
        }
        assert_eq!(input.history(), ["b", "c", "d"]);
    }

    #[test]
    fn test_walk_history() {
        let mut input = InputLine::new(50);
        input.record("r1");
        input.record("add");

        input.previous();
        assert_eq!(input.text(), "add");
        input.previous();
        assert_eq!(input.text(), "r1");
        input.previous();
        assert_eq!(input.text(), "r1");

        input.next();
        assert_eq!(input.text(), "add");
        input.next();
        assert_eq!(input.text(), "");
        input.next();
        assert_eq!(input.text(), "");
    }

    #[test]
    fn test_previous_on_empty_history_is_noop() {
        let mut input = InputLine::new(50);
        typed(&mut input, "x");
        input.previous();
        assert_eq!(input.text(), "x");
    }
}
