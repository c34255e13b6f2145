use serde::{Deserialize, Serialize};

use super::{envelope::Envelope, length_counter::LengthCounter, sweep::Sweep};
use std::fmt::Debug;

const DUTY_CYCLES: [[u32; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

#[derive(Clone, Copy, Serialize, Deserialize)]
/// One of the APU's two pulse channels.
/// Outputs a pulse (rectangle) wave.
pub struct PulseRegister {
    /// The index of the duty cycle to use
    pub duty: u32,
    /// The period of the pulse wave
    pub timer: usize,
    // The amount to reload the timer with when it hits 0
    pub timer_reload: usize,
    pub envelope: Envelope,
    pub length_counter: LengthCounter,
    pub sweep: Sweep,
    // Whether the channel is enabled
    pub enabled: bool,
    // Index of the duty cycle value currently being sent to the mixer
    pub sequencer: usize,
}
impl PulseRegister {
    /// * `ones_complement`: set for pulse 1, whose sweep negates differently
    pub fn new(ones_complement: bool) -> PulseRegister {
        PulseRegister {
            duty: 0,
            timer: 0,
            timer_reload: 0,
            envelope: Envelope::default(),
            length_counter: LengthCounter::default(),
            sweep: Sweep::new(ones_complement),
            enabled: false,
            sequencer: 0,
        }
    }
    pub fn muted(&self) -> bool {
        !self.enabled || self.length_counter.muted() || self.sweep.muted(self.timer_reload)
    }
    pub fn value(&self) -> u32 {
        if self.muted() || DUTY_CYCLES[self.duty as usize][self.sequencer] == 0 {
            0
        } else {
            self.envelope.value()
        }
    }
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !self.enabled {
            self.length_counter.load = 0;
        }
    }
    /// Clock the channel's timer, done every other CPU cycle.
    /// The timer runs for `timer_reload + 1` ticks per period.
    pub fn clock_timer(&mut self) {
        self.timer = (self.timer + 1) % (self.timer_reload + 1);
        if self.timer == 0 {
            self.sequencer = (self.sequencer + 1) % 8;
        }
        self.sweep.update_target(self.timer_reload);
    }
    /// Clock the length counter and sweep unit on a half-frame signal
    pub fn on_half_frame(&mut self) {
        self.length_counter.clock();
        if let Some(period) = self.sweep.clock(self.timer_reload) {
            self.timer_reload = period;
        }
    }
}
impl Debug for PulseRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "on={} timer={:3X} duty={:X} length=[{:?}] sweep=[{:?}]",
            self.enabled, self.timer_reload, self.duty, self.length_counter, self.sweep
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_period_is_reload_plus_one() {
        let mut reg = PulseRegister::new(false);
        reg.timer_reload = 3;
        // The sequencer only steps on the (reload + 1)th tick
        (0..3).for_each(|_| reg.clock_timer());
        assert_eq!(reg.sequencer, 0);
        reg.clock_timer();
        assert_eq!(reg.sequencer, 1);
    }
}
