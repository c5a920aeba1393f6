use std::fmt;
use std::str::FromStr;

use crate::prompts::{PromptError, PromptRegistry};

pub const INTERPRET_EXPAND_KEY: &str = "interpret_expand";
pub const IMPROVE_GRAMMAR_KEY: &str = "improve_grammar";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RewriteStyle {
    #[default]
    InterpretExpand,
    ImproveGrammar,
    /// Free-text system prompt, used verbatim (even when empty).
    Custom(String),
}

impl RewriteStyle {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InterpretExpand => "Interpret and expand",
            Self::ImproveGrammar => "Improve coherence and grammar",
            Self::Custom(_) => "Custom prompt",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for RewriteStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStyle(pub String);

impl fmt::Display for UnknownStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown style `{}` (expected `interpret`, `grammar` or `custom`)",
            self.0
        )
    }
}

impl std::error::Error for UnknownStyle {}

/// Parses the built-in style names. `custom` yields an empty custom prompt;
/// callers fill in the text separately.
impl FromStr for RewriteStyle {
    type Err = UnknownStyle;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "interpret" | "expand" | "interpret_expand" => Ok(Self::InterpretExpand),
            "grammar" | "improve" | "improve_grammar" => Ok(Self::ImproveGrammar),
            "custom" => Ok(Self::Custom(String::new())),
            _ => Err(UnknownStyle(input.to_string())),
        }
    }
}

/// Resolves a [`RewriteStyle`] to the system prompt sent with the draft.
///
/// The default texts are looked up once when the selector is built, so
/// [`PromptSelector::system_prompt`] itself cannot fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptSelector {
    interpret_expand: String,
    improve_grammar: String,
}

impl PromptSelector {
    pub fn new(interpret_expand: impl Into<String>, improve_grammar: impl Into<String>) -> Self {
        Self {
            interpret_expand: interpret_expand.into(),
            improve_grammar: improve_grammar.into(),
        }
    }

    pub fn from_registry(registry: &PromptRegistry) -> Result<Self, PromptError> {
        Ok(Self::new(
            registry.text(INTERPRET_EXPAND_KEY)?,
            registry.text(IMPROVE_GRAMMAR_KEY)?,
        ))
    }

    pub fn system_prompt<'a>(&'a self, style: &'a RewriteStyle) -> &'a str {
        match style {
            RewriteStyle::InterpretExpand => &self.interpret_expand,
            RewriteStyle::ImproveGrammar => &self.improve_grammar,
            RewriteStyle::Custom(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> PromptSelector {
        PromptSelector::from_registry(&PromptRegistry::new().unwrap()).unwrap()
    }

    #[test]
    fn built_in_styles_map_to_registry_texts() {
        let registry = PromptRegistry::new().unwrap();
        let selector = selector();
        assert_eq!(
            selector.system_prompt(&RewriteStyle::InterpretExpand),
            registry.text(INTERPRET_EXPAND_KEY).unwrap()
        );
        assert_eq!(
            selector.system_prompt(&RewriteStyle::ImproveGrammar),
            registry.text(IMPROVE_GRAMMAR_KEY).unwrap()
        );
    }

    #[test]
    fn custom_text_passes_through_unchanged() {
        let selector = selector();
        let style = RewriteStyle::Custom("  Write like a pirate.\n".into());
        assert_eq!(selector.system_prompt(&style), "  Write like a pirate.\n");
        assert_eq!(selector.system_prompt(&RewriteStyle::Custom(String::new())), "");
    }

    #[test]
    fn interpret_is_the_default_style() {
        assert_eq!(RewriteStyle::default(), RewriteStyle::InterpretExpand);
        assert!(!RewriteStyle::default().is_custom());
    }

    #[test]
    fn parses_style_names() {
        assert_eq!(
            "Grammar".parse::<RewriteStyle>().unwrap(),
            RewriteStyle::ImproveGrammar
        );
        assert_eq!(
            "interpret".parse::<RewriteStyle>().unwrap(),
            RewriteStyle::InterpretExpand
        );
        assert!("custom".parse::<RewriteStyle>().unwrap().is_custom());
        assert_eq!(
            "poem".parse::<RewriteStyle>().unwrap_err(),
            UnknownStyle("poem".into())
        );
    }
}
