use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use anyhow::Context;
use chip8::{Adapter, Display, Keypad, StopToken, KEY_COUNT, SCREEN_HEIGHT, SCREEN_WIDTH};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use log::{debug, warn};

use crate::audio::Tone;
use crate::keymap::KeyBindings;

const FRAME_INTERVAL: Duration = Duration::new(0, 1_000_000_000u32 / 60);
/// Terminals report presses and repeats but rarely releases, so a key counts as held this long
const KEY_HOLD: Duration = Duration::from_millis(150);
const WAIT_POLL: Duration = Duration::from_millis(20);

/// Adapter that draws into the terminal with half-block characters and reads the keyboard
pub struct Terminal {
    stdout: Stdout,
    display: Display,
    keypad: Keypad,
    held_until: [Option<Instant>; KEY_COUNT],
    bindings: KeyBindings,
    tone: Tone,
    stop: StopToken,
    last_frame: Option<Instant>,
}

impl Terminal {
    pub fn new(bindings: KeyBindings, tone: Tone) -> anyhow::Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("enable raw mode")?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))
            .context("enter alternate screen")?;

        Ok(Self {
            stdout,
            display: Display::new(),
            keypad: Keypad::new(),
            held_until: [None; KEY_COUNT],
            bindings,
            tone,
            stop: StopToken::new(),
            last_frame: None,
        })
    }

    /// Share the machine's stop token so Esc can end the run loop
    pub fn set_stop_token(&mut self, stop: StopToken) {
        self.stop = stop;
    }

    /// Drain pending terminal events without blocking
    fn pump_events(&mut self) -> anyhow::Result<()> {
        while poll(Duration::ZERO).context("poll terminal events")? {
            self.handle_event(read().context("read terminal event")?);
        }
        self.release_expired(Instant::now());
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event
        else {
            return;
        };

        match code {
            KeyCode::Esc => self.stop.cancel(),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => self.stop.cancel(),
            KeyCode::Char(c) => match self.bindings.lookup(c) {
                Some(key) if kind == KeyEventKind::Release => {
                    self.keypad.keyup(key);
                    self.held_until[key as usize] = None;
                }
                // repeats arrive as presses too, and each one may satisfy a blocking key read
                Some(key) => {
                    self.keypad.press(key);
                    self.held_until[key as usize] = Some(Instant::now() + KEY_HOLD);
                }
                None => debug!("{:?} is not bound to a keypad key", c),
            },
            _ => (),
        }
    }

    fn release_expired(&mut self, now: Instant) {
        for key in 0..KEY_COUNT {
            if matches!(self.held_until[key], Some(until) if until <= now) {
                self.held_until[key] = None;
                self.keypad.keyup(key as u8);
            }
        }
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let fb = self.display.fb();
        // each character cell covers two pixel rows
        for row in 0..SCREEN_HEIGHT / 2 {
            let line: String = (0..SCREEN_WIDTH)
                .map(|x| match (fb[row * 2][x], fb[row * 2 + 1][x]) {
                    (1, 1) => '█',
                    (1, _) => '▀',
                    (_, 1) => '▄',
                    _ => ' ',
                })
                .collect();
            queue!(self.stdout, MoveTo(0, row as u16), Print(line))?;
        }
        self.stdout.flush()?;
        self.last_frame = Some(Instant::now());
        Ok(())
    }

    fn render_if_due(&mut self) -> anyhow::Result<()> {
        let due = self
            .last_frame
            .map_or(true, |last| last.elapsed() >= FRAME_INTERVAL);
        if self.display.is_dirty() && due {
            self.render().context("draw frame")?;
        }
        Ok(())
    }
}

impl Adapter for Terminal {
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
        self.pump_events()?;
        Ok(self.keypad.is_key_down(key))
    }

    fn wait_for_input(&mut self, stop: &StopToken) -> anyhow::Result<Option<u8>> {
        if self.display.is_dirty() {
            self.render().context("draw frame")?;
        }
        self.pump_events()?;
        self.keypad.clear_presses();

        while !stop.is_cancelled() && !self.stop.is_cancelled() {
            if poll(WAIT_POLL).context("poll terminal events")? {
                self.handle_event(read().context("read terminal event")?);
            }
            self.release_expired(Instant::now());
            if let Some(key) = self.keypad.next_press() {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn play_tone(&mut self, duration_ticks: u8) {
        self.tone.play(duration_ticks);
    }

    fn refresh(&mut self) -> anyhow::Result<()> {
        self.pump_events()?;
        self.render_if_due()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(e) = execute!(self.stdout, Show, LeaveAlternateScreen) {
            warn!("failed to leave alternate screen: {}", e);
        }
        if let Err(e) = disable_raw_mode() {
            warn!("failed to disable raw mode: {}", e);
        }
    }
}
