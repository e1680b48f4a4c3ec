//! Keyboard mapping

/// Keys the minigame reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Forward,
    Exit,
}

/// Map a DOM `KeyboardEvent.key` value
pub fn map_key(key: &str) -> Option<Key> {
    match key {
        "ArrowUp" | "w" | "W" => Some(Key::Forward),
        "Escape" => Some(Key::Exit),
        _ => None,
    }
}
