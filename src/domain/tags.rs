use thiserror::Error;

pub const MAX_ENTRIES: usize = 1000;
pub const MAX_TEXT_BYTES: usize = 1023;

const SUBSTITUTION_MARKER: char = '$';
const ESCAPE: char = '\\';

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TagEntry {
    seconds: i64,
    text: String,
}

impl TagEntry {
    pub fn new(seconds: i64, text: &str) -> Self {
        Self {
            seconds: seconds.max(0),
            text: truncate_text(text),
        }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TagError {
    #[error("Invalid tag index {0}.")]
    InvalidIndex(usize),

    #[error("Maximum number of entries ({max}) reached.")]
    CapacityExceeded { max: usize },

    #[error("No tags to adjust.")]
    EmptyStore,

    #[error("Adjustment would result in negative timestamp for tag {index}.")]
    NegativeResult { index: usize },

    #[error("Adjustment would overflow the timestamp of tag {index}.")]
    Overflow { index: usize },
}

/// Result of shifting every tag at once.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OffsetAllOutcome {
    /// 1-based indices whose result went negative and were pinned to zero.
    pub clamped: Vec<usize>,
}

/// Ordered, bounded list of tags. Indices on the public API are 1-based.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TagStore {
    entries: Vec<TagEntry>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_ENTRIES
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<&TagEntry> {
        index
            .checked_sub(1)
            .and_then(|position| self.entries.get(position))
    }

    pub fn append(&mut self, seconds: i64, text: &str) -> Result<usize, TagError> {
        if self.is_full() {
            return Err(TagError::CapacityExceeded { max: MAX_ENTRIES });
        }
        self.entries.push(TagEntry::new(seconds, text));
        Ok(self.entries.len())
    }

    /// Replaces the text of tag `index`, expanding `$` to the previous text.
    pub fn edit_text(&mut self, index: usize, replacement: &str) -> Result<&TagEntry, TagError> {
        let position = self.position(index)?;
        let entry = &mut self.entries[position];
        entry.text = truncate_text(&substitute_previous(replacement, &entry.text));
        Ok(&*entry)
    }

    pub fn delete(&mut self, index: usize) -> Result<TagEntry, TagError> {
        let position = self.position(index)?;
        Ok(self.entries.remove(position))
    }

    pub fn offset_one(&mut self, index: usize, delta: i64) -> Result<&TagEntry, TagError> {
        let position = self.position(index)?;
        let entry = &mut self.entries[position];
        let shifted = entry
            .seconds
            .checked_add(delta)
            .ok_or(TagError::Overflow { index })?;
        if shifted < 0 {
            return Err(TagError::NegativeResult { index });
        }
        entry.seconds = shifted;
        Ok(&*entry)
    }

    /// Returns the 1-based index of the adjusted tag alongside it.
    pub fn offset_last(&mut self, delta: i64) -> Result<(usize, &TagEntry), TagError> {
        let index = self.entries.len();
        if index == 0 {
            return Err(TagError::EmptyStore);
        }
        let entry = self.offset_one(index, delta)?;
        Ok((index, entry))
    }

    /// Shifts every tag; results below zero are clamped rather than rejected.
    pub fn offset_all(&mut self, delta: i64) -> Result<OffsetAllOutcome, TagError> {
        if self.entries.is_empty() {
            return Err(TagError::EmptyStore);
        }

        let mut shifted = Vec::with_capacity(self.entries.len());
        for (position, entry) in self.entries.iter().enumerate() {
            let value = entry.seconds.checked_add(delta).ok_or(TagError::Overflow {
                index: position + 1,
            })?;
            shifted.push(value);
        }

        let mut outcome = OffsetAllOutcome::default();
        for (position, (entry, value)) in self.entries.iter_mut().zip(shifted).enumerate() {
            if value < 0 {
                entry.seconds = 0;
                outcome.clamped.push(position + 1);
            } else {
                entry.seconds = value;
            }
        }
        Ok(outcome)
    }

    fn position(&self, index: usize) -> Result<usize, TagError> {
        if index == 0 || index > self.entries.len() {
            return Err(TagError::InvalidIndex(index));
        }
        Ok(index - 1)
    }
}

impl FromIterator<TagEntry> for TagStore {
    fn from_iter<I: IntoIterator<Item = TagEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().take(MAX_ENTRIES).collect(),
        }
    }
}

fn substitute_previous(replacement: &str, previous: &str) -> String {
    let mut out = String::with_capacity(replacement.len() + previous.len());
    let mut chars = replacement.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE if chars.peek() == Some(&SUBSTITUTION_MARKER) => {
                out.push(SUBSTITUTION_MARKER);
                chars.next();
            }
            SUBSTITUTION_MARKER => out.push_str(previous),
            other => out.push(other),
        }
    }
    out
}

pub fn truncate_text(text: &str) -> String {
    if text.len() <= MAX_TEXT_BYTES {
        return text.to_string();
    }
    let mut end = MAX_TEXT_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
