use std::collections::HashMap;
use std::path::Path;

use anyhow::{ensure, Context};
use serde::Deserialize;

/// Keyboard character to keypad value, laid out on the left-hand side of a qwerty keyboard
const CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('1', 0x1), // 1 -> 1
    ('2', 0x2), // 2 -> 2
    ('3', 0x3), // 3 -> 3
    ('4', 0xC), // 4 -> C
    ('q', 0x4), // Q -> 4
    ('w', 0x5), // W -> 5
    ('e', 0x6), // E -> 6
    ('r', 0xD), // R -> D
    ('a', 0x7), // A -> 7
    ('s', 0x8), // S -> 8
    ('d', 0x9), // D -> 9
    ('f', 0xE), // F -> E
    ('z', 0xA), // Z -> A
    ('x', 0x0), // X -> 0
    ('c', 0xB), // C -> B
    ('v', 0xF), // V -> F
];

/// Bindings as written in the file, before labels and values are checked
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawBindings(HashMap<String, u8>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings(HashMap<char, u8>);

impl Default for KeyBindings {
    fn default() -> Self {
        Self(HashMap::from(CONVENTIONAL_KEYMAP))
    }
}

impl KeyBindings {
    /// Parse a JSON object such as `{"1": 1, "q": 4, "x": 0}`
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let RawBindings(raw) = serde_json::from_str(json).context("parse key bindings")?;
        let mut bindings = HashMap::with_capacity(raw.len());
        for (label, value) in raw {
            let mut chars = label.chars();
            let (Some(key), None) = (chars.next(), chars.next()) else {
                anyhow::bail!("key binding {:?} must be a single character", label);
            };
            ensure!(
                value <= 0xF,
                "key binding {:?} maps to {:#x}, which is not a keypad value",
                label,
                value
            );
            bindings.insert(key.to_ascii_lowercase(), value);
        }
        Ok(Self(bindings))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read key bindings from {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn lookup(&self, key: char) -> Option<u8> {
        self.0.get(&key.to_ascii_lowercase()).copied()
    }
}
