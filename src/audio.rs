use std::time::Duration;

use log::{debug, warn};
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};

const TONE_HZ: f32 = 440.0;
const TONE_VOLUME: f32 = 0.2;

/// Plays fixed-pitch beeps. Without an output device every tone is dropped.
pub struct Tone {
    // the stream has to outlive every sink playing on it
    output: Option<(OutputStream, OutputStreamHandle)>,
}

impl Tone {
    pub fn new(muted: bool) -> Self {
        if muted {
            return Self::mute();
        }
        match OutputStream::try_default() {
            Ok(output) => Self {
                output: Some(output),
            },
            Err(e) => {
                warn!("no audio output, tones are disabled: {}", e);
                Self::mute()
            }
        }
    }

    pub fn mute() -> Self {
        Self { output: None }
    }

    /// Start a tone lasting `ticks / 60` seconds and return immediately
    pub fn play(&self, ticks: u8) {
        let duration = Duration::from_secs(ticks as u64) / 60;
        let Some((_, handle)) = &self.output else {
            debug!("muted tone for {:?}", duration);
            return;
        };

        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(
                    SineWave::new(TONE_HZ)
                        .take_duration(duration)
                        .amplify(TONE_VOLUME),
                );
                sink.detach();
            }
            Err(e) => warn!("failed to play tone: {}", e),
        }
    }
}
