//! Keyboard bindings for race control

use serde::{Deserialize, Serialize};

/// Race actions a key can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceKey {
    Start,
    TogglePause,
}

/// Key values (as reported by the webview `KeyboardEvent.key`) per action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub start: String,
    pub pause: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            start: "s".into(),
            pause: "p".into(),
        }
    }
}

impl KeyBindings {
    /// Map a pressed key to its action; matching is case-sensitive
    pub fn resolve(&self, key: &str) -> Option<RaceKey> {
        if key == self.start {
            Some(RaceKey::Start)
        } else if key == self.pause {
            Some(RaceKey::TogglePause)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("s", Some(RaceKey::Start))]
    #[case("p", Some(RaceKey::TogglePause))]
    #[case("S", None)]
    #[case("Enter", None)]
    fn default_bindings(#[case] key: &str, #[case] expected: Option<RaceKey>) {
        assert_eq!(KeyBindings::default().resolve(key), expected);
    }
}
