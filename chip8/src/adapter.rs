use crate::display::Display;
use crate::keypad::Keypad;
use crate::stop::StopToken;

/// The capabilities the interpreter needs from the outside world.
///
/// Only copied values cross this boundary: the interpreter never hands out its registers,
/// memory or stack, and the adapter never reaches into them.
pub trait Adapter {
    /// Reset the frame buffer to all-off
    fn clear_screen(&mut self);

    /// XOR one 8-pixel row onto the frame buffer at (x mod 64, y mod 32)
    fn draw_sprite(&mut self, sprite: u8, x: u8, y: u8);

    /// Report whether drawing the row would switch off any pixel that is currently on
    fn check_collision(&self, sprite: u8, x: u8, y: u8) -> bool;

    /// Non-blocking poll of key `key` (0..=0xF)
    fn is_key_pressed(&mut self, key: u8) -> anyhow::Result<bool>;

    /// Block until a key is pressed and return its keypad value.
    /// Returns `Ok(None)` if `stop` was cancelled while waiting.
    fn wait_for_input(&mut self, stop: &StopToken) -> anyhow::Result<Option<u8>>;

    /// Fire-and-forget request to sound a tone for `duration_ticks / 60` seconds
    fn play_tone(&mut self, duration_ticks: u8);

    /// Called by the run loop after every instruction, e.g. to present the frame or pump events
    fn refresh(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// An adapter with no terminal or window attached; key presses are scripted and tones recorded
pub struct Headless {
    pub display: Display,
    pub keypad: Keypad,
    pub tones: Vec<u8>,
}

impl Headless {
    pub fn new() -> Self {
        Self {
            display: Display::new(),
            keypad: Keypad::new(),
            tones: Vec::new(),
        }
    }
}

impl Default for Headless {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for Headless {
    fn clear_screen(&mut self) {
        self.display.clear();
    }

    fn draw_sprite(&mut self, sprite: u8, x: u8, y: u8) {
        self.display.draw_row(sprite, x, y);
    }

    fn check_collision(&self, sprite: u8, x: u8, y: u8) -> bool {
        self.display.collides(sprite, x, y)
    }

    fn is_key_pressed(&mut self, key: u8) -> anyhow::Result<bool> {
        Ok(self.keypad.is_key_down(key))
    }

    /// Presses queued with `Keypad::keydown` act as a script and are consumed in order.
    /// A key released before the wait forgets its press. Nothing can press a key while a
    /// headless machine is blocked, so an empty queue is reported the same way as a
    /// cancelled wait.
    fn wait_for_input(&mut self, _stop: &StopToken) -> anyhow::Result<Option<u8>> {
        Ok(self.keypad.next_press())
    }

    fn play_tone(&mut self, duration_ticks: u8) {
        self.tones.push(duration_ticks);
    }
}
