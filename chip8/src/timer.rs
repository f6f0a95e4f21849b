use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

pub const TIMER_HZ: u32 = 60;

/// An 8-bit countdown register that a background thread decrements at a fixed rate.
///
/// The value is the only state shared between the interpreter thread and the ticking thread,
/// so it lives in an atomic cell and every decrement is a single compare-and-swap.
pub struct Timer {
    name: &'static str,
    value: Arc<AtomicU8>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    /// Start a timer that ticks `hz` times per second on its own thread
    pub fn start(name: &'static str, hz: u32) -> std::io::Result<Self> {
        let mut timer = Self::manual(name);
        let value = timer.value.clone();
        let running = timer.running.clone();
        running.store(true, Ordering::SeqCst);

        let period = Duration::from_secs(1) / hz.max(1);
        let handle = thread::Builder::new()
            .name(format!("{}-timer", name))
            .spawn(move || {
                let mut next = Instant::now() + period;
                while running.load(Ordering::SeqCst) {
                    let now = Instant::now();
                    if next > now {
                        spin_sleep::sleep(next - now);
                    }
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    decrement(&value);
                    // schedule off the previous deadline rather than the wakeup so ticks don't drift
                    next += period;
                }
            })?;

        debug!("{} timer started at {} Hz", name, hz);
        timer.handle = Some(handle);
        Ok(timer)
    }

    /// A timer with no background thread; it only moves when `tick` is called
    pub fn manual(name: &'static str) -> Self {
        Self {
            name,
            value: Arc::new(AtomicU8::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn get(&self) -> u8 {
        self.value.load(Ordering::SeqCst)
    }

    pub fn set(&self, value: u8) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Store `value` and return what it replaced, in one step with respect to the ticking thread
    pub fn swap(&self, value: u8) -> u8 {
        self.value.swap(value, Ordering::SeqCst)
    }

    /// Apply a single countdown step, saturating at zero
    pub fn tick(&self) {
        decrement(&self.value);
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop the ticking thread and wait for it to exit. The value stops changing afterwards.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("{} timer thread panicked", self.name);
            }
            debug!("{} timer stopped", self.name);
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn decrement(value: &AtomicU8) {
    let _ = value.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1));
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::{Timer, TIMER_HZ};

    #[test]
    fn test_manual_tick_saturates() {
        let timer = Timer::manual("delay");
        timer.set(2);
        timer.tick();
        assert_eq!(timer.get(), 1);
        timer.tick();
        timer.tick();
        assert_eq!(timer.get(), 0);
    }

    #[test]
    fn test_swap_returns_previous_value() {
        let timer = Timer::manual("sound");
        assert_eq!(timer.swap(4), 0);
        timer.tick();
        assert_eq!(timer.swap(9), 3);
        assert_eq!(timer.get(), 9);
    }

    #[test]
    fn test_instances_are_independent() {
        let delay = Timer::manual("delay");
        let sound = Timer::manual("sound");
        delay.set(10);
        sound.set(3);
        delay.tick();
        assert_eq!(delay.get(), 9);
        assert_eq!(sound.get(), 3);
    }

    #[test]
    fn test_running_timer_reaches_zero() {
        let mut timer = Timer::start("delay", TIMER_HZ).unwrap();
        assert!(timer.is_running());
        timer.set(6);
        // 6 ticks at 60 Hz is 100ms; leave plenty of slack for a loaded machine
        thread::sleep(Duration::from_millis(400));
        assert_eq!(timer.get(), 0);
        timer.stop();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_stopped_timer_holds_value() {
        let mut timer = Timer::start("sound", TIMER_HZ).unwrap();
        timer.stop();
        timer.set(5);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(timer.get(), 5);
    }
}
