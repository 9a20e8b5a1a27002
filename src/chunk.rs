use itertools::Itertools;

pub const DEFAULT_LINES_PER_CHUNK: usize = 10;

/// Fraction of the visible chunk the cursor must pass before the next chunk is shown.
const ADVANCE_THRESHOLD: f64 = 0.8;

/// Bounded, forward-only view over a long practice text.
///
/// Only `lines_per_chunk` lines are ever rendered. The window tracks the
/// absolute character offset of its first line so the session cursor, which
/// knows nothing about windowing, can be mapped into the visible slice.
///
/// Offsets count every preceding line as `len + 1` (its newline), including
/// when the window sits on the last line of a text without a trailing newline.
#[derive(Debug, Clone)]
pub struct ChunkWindow {
    lines: Vec<String>,
    lines_per_chunk: usize,
    start_line: usize,
    char_offset: usize,
    chunk_text: String,
    chunk_len: usize,
}

impl ChunkWindow {
    pub fn new(text: &str, lines_per_chunk: usize) -> Self {
        if lines_per_chunk == 0 {
            log::warn!("lines per chunk must be positive, using 1");
        }

        let mut window = Self {
            lines: text.split('\n').map(String::from).collect(),
            lines_per_chunk: lines_per_chunk.max(1),
            start_line: 0,
            char_offset: 0,
            chunk_text: String::new(),
            chunk_len: 0,
        };
        window.rebuild();
        window
    }

    pub fn current_chunk_text(&self) -> &str {
        &self.chunk_text
    }

    /// Maps an absolute text position into the current chunk.
    ///
    /// Not clamped: negative or `>= chunk_char_len()` results are outside the chunk.
    pub fn position_in_chunk(&self, absolute_position: usize) -> isize {
        absolute_position as isize - self.char_offset as isize
    }

    /// Moves the window one chunk forward once the cursor is past 80% of the
    /// visible text. The final window never advances. Returns whether it moved.
    pub fn maybe_advance(&mut self, absolute_position: usize) -> bool {
        let progress = self.position_in_chunk(absolute_position);
        let threshold = self.chunk_len as f64 * ADVANCE_THRESHOLD;

        if self.chunk_len > 0
            && progress as f64 > threshold
            && self.start_line + self.lines_per_chunk < self.lines.len()
        {
            self.start_line += self.lines_per_chunk;
            self.rebuild();
            log::debug!(
                "chunk advanced to line {} (offset {})",
                self.start_line,
                self.char_offset
            );
            return true;
        }

        false
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// One past the last line shown
    pub fn end_line(&self) -> usize {
        (self.start_line + self.lines_per_chunk).min(self.lines.len())
    }

    pub fn char_offset(&self) -> usize {
        self.char_offset
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines_per_chunk(&self) -> usize {
        self.lines_per_chunk
    }

    /// Length of the current chunk in characters
    pub fn chunk_char_len(&self) -> usize {
        self.chunk_len
    }

    fn rebuild(&mut self) {
        let end = self.end_line();
        self.chunk_text = self.lines[self.start_line..end].iter().join("\n");
        self.chunk_len = self.chunk_text.chars().count();
        self.char_offset = self.lines[..self.start_line]
            .iter()
            .map(|line| line.chars().count() + 1)
            .sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(count: usize) -> String {
        (0..count).map(|i| format!("line {i:02}")).join("\n")
    }

    #[test]
    fn test_initial_window() {
        let text = numbered_lines(25);
        let window = ChunkWindow::new(&text, 10);

        assert_eq!(window.start_line(), 0);
        assert_eq!(window.char_offset(), 0);
        assert_eq!(window.line_count(), 25);
        assert_eq!(window.end_line(), 10);
        assert_eq!(window.current_chunk_text(), numbered_lines(10));
        // 10 lines of 7 chars plus 9 separators
        assert_eq!(window.chunk_char_len(), 79);
    }

    #[test]
    fn test_short_text_fits_in_one_chunk() {
        let window = ChunkWindow::new("one\ntwo", DEFAULT_LINES_PER_CHUNK);
        assert_eq!(window.current_chunk_text(), "one\ntwo");
        assert_eq!(window.end_line(), 2);
    }

    #[test]
    fn test_no_advance_at_threshold() {
        let text = numbered_lines(25);
        let mut window = ChunkWindow::new(&text, 10);

        // 0.8 * 79 = 63.2; 63 is not past it
        assert!(!window.maybe_advance(63));
        assert_eq!(window.start_line(), 0);
    }

    #[test]
    fn test_advance_past_threshold() {
        let text = numbered_lines(25);
        let mut window = ChunkWindow::new(&text, 10);

        assert!(window.maybe_advance(64));
        assert_eq!(window.start_line(), 10);
        assert_eq!(window.char_offset(), 10 * 8);
        assert!(window.current_chunk_text().starts_with("line 10\n"));
        assert!(window.current_chunk_text().ends_with("line 19"));
    }

    #[test]
    fn test_never_advances_past_final_window() {
        let text = numbered_lines(25);
        let mut window = ChunkWindow::new(&text, 10);

        assert!(window.maybe_advance(64));
        assert!(window.maybe_advance(80 + 64));
        assert_eq!(window.start_line(), 20);
        assert_eq!(window.char_offset(), 20 * 8);
        assert_eq!(window.current_chunk_text().lines().count(), 5);

        // 20 + 10 is not < 25
        assert!(!window.maybe_advance(text.chars().count()));
        assert_eq!(window.start_line(), 20);
    }

    #[test]
    fn test_advance_is_one_chunk_per_call() {
        let text = numbered_lines(40);
        let mut window = ChunkWindow::new(&text, 10);

        // Far beyond the first chunk still moves a single step
        assert!(window.maybe_advance(300));
        assert_eq!(window.start_line(), 10);
    }

    #[test]
    fn test_position_before_window_does_not_advance() {
        let text = numbered_lines(25);
        let mut window = ChunkWindow::new(&text, 10);
        window.maybe_advance(64);

        assert!(!window.maybe_advance(10));
        assert_eq!(window.start_line(), 10);
    }

    #[test]
    fn test_position_in_chunk_is_linear() {
        let text = numbered_lines(25);
        let mut window = ChunkWindow::new(&text, 10);
        window.maybe_advance(70);

        let offset = window.char_offset();
        for k in 0..100 {
            assert_eq!(window.position_in_chunk(offset + k), k as isize);
        }
        assert_eq!(window.position_in_chunk(offset - 5), -5);
        assert_eq!(window.position_in_chunk(0), -(offset as isize));
    }

    #[test]
    fn test_offset_counts_chars_not_bytes() {
        let text = "héé\nb\nc";
        let mut window = ChunkWindow::new(text, 1);

        // chunk "héé" has 3 chars, threshold 2.4
        assert!(window.maybe_advance(3));
        assert_eq!(window.char_offset(), 4);
        assert_eq!(window.current_chunk_text(), "b");
    }

    #[test]
    fn test_empty_lines_keep_offsets_aligned() {
        let text = "a\n\n\nb\nc";
        let mut window = ChunkWindow::new(text, 2);

        assert_eq!(window.current_chunk_text(), "a\n");
        assert!(window.maybe_advance(2));
        assert_eq!(window.start_line(), 2);
        assert_eq!(window.char_offset(), 3);
        assert_eq!(window.current_chunk_text(), "\nb");
    }

    #[test]
    fn test_empty_chunk_never_advances() {
        let text = "\n\nabc";
        let mut window = ChunkWindow::new(text, 1);

        assert_eq!(window.chunk_char_len(), 0);
        assert!(!window.maybe_advance(5));
        assert_eq!(window.start_line(), 0);
    }

    #[test]
    fn test_zero_lines_per_chunk_clamped() {
        let window = ChunkWindow::new("a\nb", 0);
        assert_eq!(window.lines_per_chunk(), 1);
        assert_eq!(window.current_chunk_text(), "a");
    }
}
