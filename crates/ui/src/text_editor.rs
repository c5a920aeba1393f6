use egui::{Response, TextEdit, Ui};

/// Multi-line input with a placeholder and a small character/word counter.
#[derive(Clone, Debug, Default)]
pub struct TextEditorState {
    text: String,
    hint: String,
}

impl TextEditorState {
    pub fn with_hint(hint: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            hint: hint.into(),
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Draws the editor. When `enabled` is false the text stays visible but
    /// cannot be changed.
    pub fn ui(
        &mut self,
        ui: &mut Ui,
        id_source: impl std::hash::Hash,
        rows: usize,
        enabled: bool,
    ) -> Response {
        let output = TextEdit::multiline(&mut self.text)
            .id_source(id_source)
            .hint_text(self.hint.as_str())
            .desired_rows(rows)
            .desired_width(f32::INFINITY)
            .interactive(enabled)
            .show(ui);
        output.response
    }

    pub fn counter_label(&self) -> String {
        format!("{} characters, {} words", self.char_count(), self.word_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_characters_and_words() {
        let mut editor = TextEditorState::with_hint("hint");
        assert_eq!(editor.counter_label(), "0 characters, 0 words");
        editor.set_text("déjà vu  again\n");
        assert_eq!(editor.char_count(), 15);
        assert_eq!(editor.word_count(), 3);
        assert_eq!(editor.counter_label(), "15 characters, 3 words");
        editor.clear();
        assert_eq!(editor.text(), "");
    }
}
