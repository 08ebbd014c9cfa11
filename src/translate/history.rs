/// Append-only translation history for one client session.
///
/// Entries are formatted `"<input> -> <output>"` strings. No deduplication
/// and no size bound; the list lives and dies with the owning session.
#[derive(Debug, Default)]
pub struct TranslationHistory {
    entries: Vec<String>,
}

impl TranslationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one successful translation, returning the formatted entry.
    pub fn record(&mut self, input: &str, output: &str) -> &str {
        self.entries.push(format!("{} -> {}", input, output));
        self.entries.last().expect("just pushed")
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_formats_and_appends() {
        let mut history = TranslationHistory::new();
        assert_eq!(history.record("Hello", "Hola"), "Hello -> Hola");
        assert_eq!(history.entries(), ["Hello -> Hola"]);
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let mut history = TranslationHistory::new();
        history.record("Hello", "Hola");
        history.record("Bye", "Adios");
        history.record("Hello", "Hola");
        assert_eq!(history.len(), 3);
        assert_eq!(history.entries()[2], "Hello -> Hola");
    }
}
