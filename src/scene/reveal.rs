use std::time::Duration;

/// First line of the reveal.
pub const LINE_ONE: &str = "A new kind of";
/// Second line of the reveal.
pub const LINE_TWO: &str = "design tool";
/// Delay between two revealed characters.
pub const CHAR_DELAY: Duration = Duration::from_millis(100);
/// Extra wait before the second line starts.
pub const LINE_DELAY: Duration = Duration::from_millis(400);

/// Typewriter reveal of two text lines.
///
/// Time is passed in explicitly. Characters that fell due between two updates are all appended
/// on the later update, each stamped with its due time, so the cadence does not depend on how
/// often `update` is called.
#[derive(Clone, Debug)]
pub struct TextReveal {
    targets: [String; 2],
    shown: [usize; 2],
    last_char_at: Duration,
    running: bool,
}

impl Default for TextReveal {
    fn default() -> Self {
        Self::new(LINE_ONE, LINE_TWO)
    }
}

impl TextReveal {
    /// A halted reveal of `first` then `second`, with nothing shown yet.
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            targets: [first.into(), second.into()],
            shown: [0, 0],
            last_char_at: Duration::ZERO,
            running: false,
        }
    }

    /// Clear both lines and start revealing from `now`.
    pub fn restart(&mut self, now: Duration) {
        self.shown = [0, 0];
        self.last_char_at = now;
        self.running = true;
    }

    /// Freeze the reveal; what is shown stays shown.
    pub fn halt(&mut self) {
        self.running = false;
    }

    /// Whether characters are still being appended.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether both lines are fully shown.
    pub fn is_complete(&self) -> bool {
        self.shown[0] == self.targets[0].chars().count()
            && self.shown[1] == self.targets[1].chars().count()
    }

    /// Append every character due at `now`. Returns `true` if anything changed.
    pub fn update(&mut self, now: Duration) -> bool {
        if !self.running {
            return false;
        }
        let mut changed = false;
        while let Some((line, due)) = self.next_due() {
            if now < due {
                break;
            }
            self.shown[line] += 1;
            self.last_char_at = due;
            changed = true;
        }
        changed
    }

    fn next_due(&self) -> Option<(usize, Duration)> {
        let [len1, len2] = [
            self.targets[0].chars().count(),
            self.targets[1].chars().count(),
        ];
        if self.shown[0] < len1 {
            return Some((0, self.last_char_at + CHAR_DELAY));
        }
        if self.shown[1] < len2 {
            let delay = if self.shown[1] == 0 && len1 > 0 {
                LINE_DELAY
            } else {
                CHAR_DELAY
            };
            return Some((1, self.last_char_at + delay));
        }
        None
    }

    /// Currently shown part of the first line.
    pub fn line_one(&self) -> &str {
        char_prefix(&self.targets[0], self.shown[0])
    }

    /// Currently shown part of the second line.
    pub fn line_two(&self) -> &str {
        char_prefix(&self.targets[1], self.shown[1])
    }

    /// Both shown lines.
    pub fn lines(&self) -> [&str; 2] {
        [self.line_one(), self.line_two()]
    }
}

fn char_prefix(s: &str, chars: usize) -> &str {
    match s.char_indices().nth(chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/reveal.rs"]
mod tests;
