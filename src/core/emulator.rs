use std::time::Duration;

use log::*;

use crate::core::{
    Cartridge, CartridgeError, Controller, FrameBuffer, Nes, Settings, CPU_CLOCK_SPEED,
    CYCLES_PER_FRAME,
};

/// How long one frame takes on real hardware, in seconds.
pub const FRAME_PERIOD: f64 = CYCLES_PER_FRAME / CPU_CLOCK_SPEED as f64;
// Backlog at which a frame is dropped instead of rendered
const DROP_THRESHOLD: f64 = 1.9 * FRAME_PERIOD;
// Backlog at which emulation gives up and pauses
const STALL_THRESHOLD: f64 = 1.0;
// Duration quantizes to whole nanoseconds, so a dt of exactly one frame
// period arrives a fraction of a nanosecond short of the boundary
const PERIOD_EPSILON: f64 = 1e-9;

/// Receives each rendered frame from [Emulator::advance].
///
/// The frame is handed over as a reference; implementations that need to keep
/// it (e.g. to upload to the GPU later) should convert it with
/// [FrameBuffer::write_rgba] or copy it.
pub trait VideoSink {
    fn frame(&mut self, frame: &FrameBuffer);
}

/// Receives the audio samples generated while emulating, at
/// [SAMPLE_RATE](crate::core::SAMPLE_RATE) hertz.
pub trait AudioSink {
    fn samples(&mut self, samples: Vec<f32>);
}

/// What the emulator is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Powered off; [Emulator::advance] does nothing
    Stopped,
    /// Running in real time
    Running,
    /// Powered on but frozen, e.g. by the user or after a stall
    Paused,
}

/// Real-time pacing on top of the raw machine state in [Nes].
///
/// The console itself has no clock; [Nes] just advances when told to. This
/// type owns a [Nes] and converts wall-clock time into emulated frames:
/// the embedding application calls [Emulator::advance] once per iteration of
/// its event loop with the time elapsed since the last call, and the emulator
/// runs however many frames that much time is worth, handing the output to
/// the provided sinks.
pub struct Emulator {
    /// The console being paced
    pub nes: Nes,
    /// Settings passed through to the console
    pub settings: Settings,
    state: RunState,
    // Wall-clock time not yet emulated, in seconds
    accumulator: f64,
    frame_count: u64,
    dropped_frames: u64,
}

impl Emulator {
    pub fn new(settings: Settings) -> Emulator {
        Emulator {
            nes: Nes::new(),
            settings,
            state: RunState::Stopped,
            accumulator: 0.0,
            frame_count: 0,
            dropped_frames: 0,
        }
    }
    /// Parse an iNES file and start running it.
    ///
    /// `savedata` is previously persisted battery-backed RAM, if any. On a
    /// parse error the console keeps whatever cartridge it had.
    pub fn load_cartridge(
        &mut self,
        bytes: &[u8],
        savedata: Option<Vec<u8>>,
    ) -> Result<(), CartridgeError> {
        let cartridge = Cartridge::parse(bytes, savedata)?;
        self.nes.insert_cartridge(cartridge);
        self.power_on();
        Ok(())
    }
    /// Remove the cartridge and stop, returning the cartridge so its
    /// savedata can be persisted.
    pub fn unload_cartridge(&mut self) -> Cartridge {
        self.power_off();
        self.nes.remove_cartridge()
    }
    /// Power the console on and start running in real time.
    pub fn power_on(&mut self) {
        self.nes.power_on(&self.settings);
        self.state = RunState::Running;
        self.accumulator = 0.0;
        self.frame_count = 0;
        self.dropped_frames = 0;
    }
    /// Power the console off. The machine state is left as-is but
    /// [Emulator::advance] stops doing anything.
    pub fn power_off(&mut self) {
        self.state = RunState::Stopped;
        self.accumulator = 0.0;
    }
    /// Freeze emulation without losing any state.
    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
        }
    }
    /// Resume from a pause. Time spent paused is not emulated.
    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
            self.accumulator = 0.0;
        }
    }
    /// Press the console's reset button.
    pub fn reset(&mut self) {
        self.nes.reset();
    }
    /// Update a controller's state, see [Nes::set_controller_state].
    pub fn set_controller_state(&mut self, num: usize, state: Controller) {
        self.nes.set_controller_state(num, state);
    }
    pub fn state(&self) -> RunState {
        self.state
    }
    /// Frames rendered since power-on.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
    /// Frames dropped since power-on because the host fell behind.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Advance emulation by `dt` of wall-clock time.
    ///
    /// Call once per iteration of the host's event loop with the time
    /// elapsed since the previous call. Runs zero or more frames depending
    /// on the accumulated backlog:
    /// * Less than one frame period accumulated: runs nothing, the backlog
    ///   carries over to the next call.
    /// * At least one frame period: runs a frame and hands it to the sinks,
    ///   repeating while a full period remains.
    /// * Nearly two periods: the host missed a deadline. One frame's worth
    ///   of backlog is dropped so emulation stays at real-time speed rather
    ///   than trying to catch up with a burst.
    /// * More than a second: the host stalled outright (e.g. the machine
    ///   suspended). The backlog is discarded and the emulator pauses.
    pub fn advance(&mut self, dt: Duration, video: &mut impl VideoSink, audio: &mut impl AudioSink) {
        if self.state != RunState::Running {
            return;
        }
        self.accumulator += dt.as_secs_f64();
        if self.accumulator > STALL_THRESHOLD {
            warn!(
                "Host stalled for {:.3}s, discarding the backlog and pausing",
                self.accumulator
            );
            self.accumulator = 0.0;
            self.state = RunState::Paused;
            return;
        }
        if self.accumulator >= DROP_THRESHOLD {
            debug!(
                "Host fell {:.1} frames behind, dropping",
                self.accumulator / FRAME_PERIOD
            );
            self.dropped_frames += 1;
            self.accumulator = FRAME_PERIOD;
        }
        while self.accumulator >= FRAME_PERIOD - PERIOD_EPSILON {
            self.nes.run(CYCLES_PER_FRAME, &self.settings);
            video.frame(self.nes.ppu.frame());
            audio.samples(self.nes.apu.sample_queue());
            self.frame_count += 1;
            self.accumulator = (self.accumulator - FRAME_PERIOD).max(0.0);
        }
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Emulator::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSink {
        frames: usize,
        samples: usize,
    }
    impl VideoSink for CountingSink {
        fn frame(&mut self, _frame: &FrameBuffer) {
            self.frames += 1;
        }
    }
    impl AudioSink for CountingSink {
        fn samples(&mut self, samples: Vec<f32>) {
            self.samples += samples.len();
        }
    }

    fn running_emulator() -> Emulator {
        let mut emulator = Emulator::default();
        emulator.power_on();
        emulator
    }
    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_one_period_runs_one_frame() {
        let mut emulator = running_emulator();
        let mut video = CountingSink::default();
        let mut audio = CountingSink::default();
        emulator.advance(secs(FRAME_PERIOD), &mut video, &mut audio);
        assert_eq!(video.frames, 1);
        assert_eq!(emulator.frame_count(), 1);
        assert_eq!(emulator.dropped_frames(), 0);
        assert!(audio.samples > 0);
    }
    #[test]
    fn test_quantized_dt_does_not_fall_behind() {
        // Each exact-period dt is a fraction of a nanosecond short once
        // quantized; the deficit must not accumulate into a missed frame
        let mut emulator = running_emulator();
        let mut video = CountingSink::default();
        let mut audio = CountingSink::default();
        (0..3).for_each(|_| emulator.advance(secs(FRAME_PERIOD), &mut video, &mut audio));
        assert_eq!(video.frames, 3);
        assert_eq!(emulator.dropped_frames(), 0);
    }
    #[test]
    fn test_half_period_accumulates() {
        let mut emulator = running_emulator();
        let mut video = CountingSink::default();
        let mut audio = CountingSink::default();
        emulator.advance(secs(FRAME_PERIOD / 2.0), &mut video, &mut audio);
        assert_eq!(video.frames, 0);
        emulator.advance(secs(FRAME_PERIOD / 2.0), &mut video, &mut audio);
        assert_eq!(video.frames, 1);
    }
    #[test]
    fn test_missed_deadline_drops_a_frame() {
        let mut emulator = running_emulator();
        let mut video = CountingSink::default();
        let mut audio = CountingSink::default();
        emulator.advance(secs(1.99 * FRAME_PERIOD), &mut video, &mut audio);
        assert_eq!(video.frames, 1);
        assert_eq!(emulator.dropped_frames(), 1);
    }
    #[test]
    fn test_stall_discards_and_pauses() {
        let mut emulator = running_emulator();
        let mut video = CountingSink::default();
        let mut audio = CountingSink::default();
        emulator.advance(secs(2.0), &mut video, &mut audio);
        assert_eq!(video.frames, 0);
        assert_eq!(emulator.state(), RunState::Paused);
        // Resuming starts from a clean slate
        emulator.resume();
        emulator.advance(secs(FRAME_PERIOD), &mut video, &mut audio);
        assert_eq!(video.frames, 1);
    }
    #[test]
    fn test_paused_emulator_does_not_advance() {
        let mut emulator = running_emulator();
        let mut video = CountingSink::default();
        let mut audio = CountingSink::default();
        emulator.pause();
        emulator.advance(secs(10.0 * FRAME_PERIOD), &mut video, &mut audio);
        assert_eq!(video.frames, 0);
        assert_eq!(emulator.state(), RunState::Paused);
    }
    #[test]
    fn test_audio_keeps_pace_with_video() {
        let mut emulator = running_emulator();
        let mut video = CountingSink::default();
        let mut audio = CountingSink::default();
        (0..60).for_each(|_| emulator.advance(secs(FRAME_PERIOD), &mut video, &mut audio));
        assert_eq!(video.frames, 60);
        // A second of frames should produce about a second of audio
        let expected = crate::core::SAMPLE_RATE as f64 * 60.0 * FRAME_PERIOD;
        assert!((audio.samples as f64 - expected).abs() < 100.0);
    }
}
