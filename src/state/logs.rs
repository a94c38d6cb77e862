//! Bounded log ring buffer

use std::collections::VecDeque;

/// Default number of log lines kept per stream
pub const DEFAULT_MAX_LINES: usize = 1000;

/// Lines of the followed log stream, oldest first.
///
/// A placeholder line ("Loading...") may occupy the buffer until the first
/// real line arrives; it is dropped rather than scrolled away.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    max_lines: usize,
    placeholder: bool,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

impl LogBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
            placeholder: false,
        }
    }

    /// Drop everything and show `text` until real lines arrive
    pub fn reset(&mut self, text: &str) {
        self.lines.clear();
        self.lines.push_back(text.to_string());
        self.placeholder = true;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.placeholder = false;
    }

    pub fn push(&mut self, line: String) {
        if self.placeholder {
            self.lines.clear();
            self.placeholder = false;
        }
        self.lines.push_back(line);
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        for line in lines {
            self.push(line);
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// True when the buffer holds nothing but the placeholder `text`
    pub fn shows_placeholder(&self, text: &str) -> bool {
        self.placeholder && self.lines.len() == 1 && self.lines[0] == text
    }

    /// Swap the whole content for `lines`; false if it was already that
    pub fn replace(&mut self, lines: Vec<String>) -> bool {
        let start = lines.len().saturating_sub(self.max_lines);
        let lines = &lines[start..];
        if !self.placeholder && self.lines.iter().eq(lines.iter()) {
            return false;
        }
        self.lines = lines.iter().cloned().collect();
        self.placeholder = false;
        true
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_oldest_beyond_capacity() {
        let mut buf = LogBuffer::new(3);
        buf.extend((1..=5).map(|i| format!("line {}", i)));
        assert_eq!(buf.to_vec(), vec!["line 3", "line 4", "line 5"]);
    }

    #[test]
    fn test_placeholder_replaced_by_first_line() {
        let mut buf = LogBuffer::new(10);
        buf.reset("Loading...");
        assert!(buf.is_placeholder());
        assert_eq!(buf.to_vec(), vec!["Loading..."]);

        buf.push("hello".to_string());
        assert!(!buf.is_placeholder());
        assert_eq!(buf.to_vec(), vec!["hello"]);
    }

    #[test]
    fn test_replace_swaps_content_and_reports_change() {
        let mut buf = LogBuffer::new(3);
        buf.extend(["a1".to_string(), "a2".to_string()]);

        let replay = vec!["a1".to_string(), "a2".to_string()];
        assert!(!buf.replace(replay));
        assert_eq!(buf.to_vec(), vec!["a1", "a2"]);

        let longer: Vec<String> = (1..=5).map(|i| format!("b{}", i)).collect();
        assert!(buf.replace(longer));
        assert_eq!(buf.to_vec(), vec!["b3", "b4", "b5"]);

        buf.reset("Loading...");
        assert!(buf.shows_placeholder("Loading..."));
        assert!(!buf.shows_placeholder("Other"));
        assert!(buf.replace(vec!["Loading...".to_string()]));
        assert!(!buf.is_placeholder());
    }

    #[test]
    fn test_reset_discards_previous_stream() {
        let mut buf = LogBuffer::new(10);
        buf.extend(vec!["a".to_string(), "b".to_string()]);
        buf.reset("Loading...");
        buf.push("c".to_string());
        assert_eq!(buf.to_vec(), vec!["c"]);
    }

    #[test]
    fn test_zero_capacity_keeps_one_line() {
        let mut buf = LogBuffer::new(0);
        buf.push("a".to_string());
        buf.push("b".to_string());
        assert_eq!(buf.to_vec(), vec!["b"]);
    }
}
