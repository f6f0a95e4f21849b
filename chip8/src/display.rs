use std::fmt::Display as FmtDisplay;

use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub type FrameBuffer = [[u8; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// A 64x32 monochrome frame buffer that adapters can draw sprite rows onto
pub struct Display {
    /// One byte per pixel, each either on (1) or off (0)
    pub(crate) fb: FrameBuffer,
    pub(crate) dirty: bool,
}

impl Display {
    pub fn new() -> Self {
        Self {
            fb: [[0; SCREEN_WIDTH]; SCREEN_HEIGHT],
            dirty: false,
        }
    }

    /// Take a copy of the frame buffer and mark it as presented
    pub fn fb(&mut self) -> FrameBuffer {
        self.dirty = false;
        self.fb
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Toggle the pixel at the coordinates and return true if it was already on
    /// This function marks the display as dirty, causing it to be re-rendered on the next update
    pub fn toggle(&mut self, x: usize, y: usize) -> bool {
        let (x, y) = (x % SCREEN_WIDTH, y % SCREEN_HEIGHT);
        self.dirty = true;
        let prev = self.fb[y][x];
        self.fb[y][x] ^= 1;
        prev == 1
    }

    /// XOR the 8 bits of `sprite` onto the row starting at (x, y), wrapping around both edges.
    /// Returns true if any pixel that was on got switched off.
    pub fn draw_row(&mut self, sprite: u8, x: u8, y: u8) -> bool {
        let mut collision = false;
        for col in 0..8 {
            if (sprite >> (7 - col)) & 0x1 == 1 {
                collision |= self.toggle(x as usize + col, y as usize);
            }
        }
        collision
    }

    /// Report whether drawing `sprite` at (x, y) would switch off a pixel that is currently on
    pub fn collides(&self, sprite: u8, x: u8, y: u8) -> bool {
        let row = &self.fb[y as usize % SCREEN_HEIGHT];
        (0..8).any(|col| {
            (sprite >> (7 - col)) & 0x1 == 1 && row[(x as usize + col) % SCREEN_WIDTH] == 1
        })
    }

    /// Clear the display contents by zeroing out the framebuffer
    /// This function marks the display as dirty, causing it to be re-rendered on the next update
    pub fn clear(&mut self) {
        self.dirty = true;
        for row in self.fb.iter_mut() {
            row.fill(0);
        }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.fb[y % SCREEN_HEIGHT][x % SCREEN_WIDTH] == 1
    }
}

impl FmtDisplay for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.fb.iter() {
            for pixel in row {
                write!(f, "{}", if *pixel == 1 { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
