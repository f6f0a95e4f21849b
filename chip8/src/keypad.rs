use std::collections::VecDeque;

use crate::KEY_COUNT;

/// Presses nobody has asked for yet are dropped oldest-first beyond this many
const MAX_PENDING_PRESSES: usize = KEY_COUNT;

/// A hexadecimal keypad containing 16 key states labelled 0 through F
pub struct Keypad {
    pub(crate) keys: [bool; KEY_COUNT],
    /// Fresh presses waiting to be picked up by a blocking key read
    pub(crate) presses: VecDeque<u8>,
}

impl Keypad {
    pub fn new() -> Self {
        Self {
            keys: [false; KEY_COUNT],
            presses: VecDeque::new(),
        }
    }

    /// Mark a key as held. Only the transition from up to down counts as a press.
    pub fn keydown(&mut self, key: u8) {
        let key = key & 0xF;
        if !self.keys[key as usize] {
            self.queue_press(key);
        }
        self.keys[key as usize] = true;
    }

    /// Mark a key as held and always count it as a press, even if it was already down.
    /// For input sources that report every stroke but not every release.
    pub fn press(&mut self, key: u8) {
        let key = key & 0xF;
        self.queue_press(key);
        self.keys[key as usize] = true;
    }

    /// Release a key. Presses of it that were never picked up are forgotten.
    pub fn keyup(&mut self, key: u8) {
        let key = key & 0xF;
        self.keys[key as usize] = false;
        self.presses.retain(|&pending| pending != key);
    }

    pub fn is_key_down(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// The oldest press that has not been consumed yet
    pub fn next_press(&mut self) -> Option<u8> {
        self.presses.pop_front()
    }

    /// Forget presses nobody asked for, so the next `next_press` only sees new ones
    pub fn clear_presses(&mut self) {
        self.presses.clear();
    }

    fn queue_press(&mut self, key: u8) {
        if self.presses.len() == MAX_PENDING_PRESSES {
            self.presses.pop_front();
        }
        self.presses.push_back(key);
    }
}

#[cfg(test)]
mod tests {
    use super::{Keypad, MAX_PENDING_PRESSES};

    #[test]
    fn test_presses_are_queued_once() {
        let mut keypad = Keypad::new();
        keypad.keydown(0xA);
        keypad.keydown(0xA);
        keypad.keydown(0x3);
        assert!(keypad.is_key_down(0xA));
        assert_eq!(keypad.next_press(), Some(0xA));
        assert_eq!(keypad.next_press(), Some(0x3));
        assert_eq!(keypad.next_press(), None);

        keypad.keyup(0xA);
        assert!(!keypad.is_key_down(0xA));

        keypad.keydown(0xA);
        keypad.clear_presses();
        assert_eq!(keypad.next_press(), None);
        assert!(keypad.is_key_down(0xA));
    }

    #[test]
    fn test_press_while_held_is_queued() {
        let mut keypad = Keypad::new();
        keypad.press(0x5);
        assert_eq!(keypad.next_press(), Some(0x5));

        // the key never went up, but a second stroke still counts
        keypad.press(0x5);
        assert!(keypad.is_key_down(0x5));
        assert_eq!(keypad.next_press(), Some(0x5));
        assert_eq!(keypad.next_press(), None);
    }

    #[test]
    fn test_released_press_is_forgotten() {
        let mut keypad = Keypad::new();
        keypad.keydown(0x5);
        keypad.keydown(0x2);
        keypad.keyup(0x5);
        assert_eq!(keypad.next_press(), Some(0x2));
        assert_eq!(keypad.next_press(), None);
    }

    #[test]
    fn test_pending_presses_are_bounded() {
        let mut keypad = Keypad::new();
        for _ in 0..MAX_PENDING_PRESSES + 3 {
            keypad.press(0x1);
        }
        keypad.press(0x9);
        assert_eq!(keypad.presses.len(), MAX_PENDING_PRESSES);
        assert_eq!(keypad.presses.back(), Some(&0x9));
    }
}
