use std::collections::HashSet;

/// A fixed set of characters used by the scanning primitives.
#[derive(Debug, Clone, Default)]
pub struct CharacterSet {
    chars: HashSet<char>,
}

impl CharacterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every character between `start` and `end`, inclusive.
    pub fn with_range(mut self, start: char, end: char) -> Self {
        self.chars.extend(start..=end);
        self
    }

    pub fn with_chars(mut self, chars: &str) -> Self {
        self.chars.extend(chars.chars());
        self
    }

    pub fn union(&self, other: &CharacterSet) -> CharacterSet {
        CharacterSet {
            chars: self.chars.union(&other.chars).copied().collect(),
        }
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }
}

impl From<&str> for CharacterSet {
    fn from(chars: &str) -> Self {
        CharacterSet::new().with_chars(chars)
    }
}

/// The pause and end characters of a `parse_until` scan, with their union
/// worked out once up front.
#[derive(Debug, Clone, Default)]
pub struct ScanStops {
    pause: CharacterSet,
    pause_and_end: CharacterSet,
}

impl ScanStops {
    pub fn new(pause: CharacterSet, end: &CharacterSet) -> Self {
        let pause_and_end = pause.union(end);
        Self {
            pause,
            pause_and_end,
        }
    }

    pub fn pausing_at(pause: CharacterSet) -> Self {
        Self::new(pause, &CharacterSet::new())
    }

    pub fn ending_at(end: CharacterSet) -> Self {
        Self::new(CharacterSet::new(), &end)
    }

    pub fn is_pause(&self, ch: char) -> bool {
        self.pause.contains(ch)
    }

    pub fn pause_and_end(&self) -> &CharacterSet {
        &self.pause_and_end
    }
}
