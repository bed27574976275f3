//! Inline keyboard data model.

use serde::{Deserialize, Serialize};

/// One inline button: a label and the callback data it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub action: String,
}

impl Button {
    pub fn new(text: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: action.into(),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// An empty keyboard (no buttons shown).
    pub fn none() -> Self {
        Self::default()
    }

    /// Builder-style row append.
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }

    /// Iterates all buttons, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_appends_rows() {
        let keyboard = Keyboard::none()
            .row(vec![Button::new("✅ Confirm", "kitchen_confirm:x")])
            .row(vec![Button::new("❌ Cancel", "kitchen_cancel:x")]);

        assert_eq!(keyboard.rows.len(), 2);
        assert_eq!(keyboard.buttons().count(), 2);
        assert!(!keyboard.is_empty());
        assert!(Keyboard::none().is_empty());
    }
}
