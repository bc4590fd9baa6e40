/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Build without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_draw: Arc<Vec<u8>>,
        sfx_claim: Arc<Vec<u8>>,
        sfx_death: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
        sfx_start: Arc<Vec<u8>>,
        sfx_powerup: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_draw: Arc::new(make_wav(&gen_draw())),
                sfx_claim: Arc::new(make_wav(&gen_claim())),
                sfx_death: Arc::new(make_wav(&gen_death())),
                sfx_win: Arc::new(make_wav(&gen_win())),
                sfx_start: Arc::new(make_wav(&gen_start())),
                sfx_powerup: Arc::new(make_wav(&gen_powerup())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_draw(&self) { self.play(&self.sfx_draw); }
        pub fn play_claim(&self) { self.play(&self.sfx_claim); }
        pub fn play_death(&self) { self.play(&self.sfx_death); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
        pub fn play_start(&self) { self.play(&self.sfx_start); }
        pub fn play_powerup(&self) { self.play(&self.sfx_powerup); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn tone(samples: &mut Vec<f32>, freq: f32, duration: f32, volume: f32) {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.5);
            // Sine + 3rd harmonic for a square-ish retro timbre
            let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
            samples.push(wave * env * volume);
        }
    }

    /// Trail tick: a single very short high blip.
    fn gen_draw() -> Vec<f32> {
        let mut s = Vec::new();
        tone(&mut s, 880.0, 0.03, 0.12);
        s
    }

    /// Capture: quick ascending arpeggio C6→E6→G6.
    fn gen_claim() -> Vec<f32> {
        let mut s = Vec::new();
        for &freq in &[1047.0_f32, 1319.0, 1568.0] {
            tone(&mut s, freq, 0.05, 0.25);
        }
        s
    }

    /// Power-up capture: two-note chime G5→C6.
    fn gen_powerup() -> Vec<f32> {
        let mut s = Vec::new();
        tone(&mut s, 784.0, 0.07, 0.25);
        tone(&mut s, 1047.0, 0.12, 0.25);
        s
    }

    /// Death: sad descending run.
    fn gen_death() -> Vec<f32> {
        let mut s = Vec::new();
        for &freq in &[440.0_f32, 370.0, 311.0, 261.0] {
            tone(&mut s, freq, 0.11, 0.3);
        }
        s
    }

    /// Sector secured: ascending fanfare with a sustained top note.
    fn gen_win() -> Vec<f32> {
        let mut s = Vec::new();
        for &freq in &[523.0_f32, 659.0, 784.0] {
            tone(&mut s, freq, 0.09, 0.3);
        }
        tone(&mut s, 1047.0, 0.3, 0.3);
        s
    }

    /// Level start: two short rising notes.
    fn gen_start() -> Vec<f32> {
        let mut s = Vec::new();
        tone(&mut s, 523.0, 0.08, 0.25);
        tone(&mut s, 784.0, 0.14, 0.25);
        s
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let byte_rate = SAMPLE_RATE * u32::from(CHANNELS) * u32::from(BITS) / 8;
        let block_align = CHANNELS * BITS / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_draw(&self) {}
    pub fn play_claim(&self) {}
    pub fn play_death(&self) {}
    pub fn play_win(&self) {}
    pub fn play_start(&self) {}
    pub fn play_powerup(&self) {}
}
