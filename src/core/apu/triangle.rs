use serde::{Deserialize, Serialize};

use super::length_counter::LengthCounter;
use std::fmt::Debug;

/// The APU's triangle channel.
///
/// A 32-step sequencer outputs the ramp 15..0 then 0..15. Duration is gated
/// twice, by the shared length counter and by a higher-precision linear
/// counter clocked on quarter frames.
#[derive(Clone, Copy, Default, Serialize, Deserialize)]
pub struct TriangleRegister {
    pub length_counter: LengthCounter,
    pub linear_counter: usize,
    // Linear counter reload value
    pub linear_counter_reload: usize,
    pub reload_flag: bool,
    pub timer_reload: u32,
    pub enabled: bool,
    pub sequencer: u32,
    pub timer: u32,
}
impl TriangleRegister {
    pub fn muted(&self) -> bool {
        !self.enabled
            || self.length_counter.muted()
            || self.timer_reload < 2
            || self.linear_counter == 0
    }
    pub fn value(&self) -> u32 {
        if self.sequencer < 16 {
            15 - self.sequencer
        } else {
            self.sequencer - 16
        }
    }
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if self.enabled {
            self.timer = 0;
        } else {
            self.length_counter.load = 0;
        }
    }
    /// Clock the channel's timer, done every CPU cycle.
    /// A muted channel finishes its current wave rather than cutting off
    /// mid-ramp, which avoids an audible click.
    pub fn clock_timer(&mut self) {
        self.timer = (self.timer + 1) % (self.timer_reload + 1);
        if self.timer == 0 {
            self.sequencer = (self.sequencer + 1) % 32;
            if self.muted() && self.sequencer == 1 {
                self.sequencer = 0;
            }
        }
    }
    /// Clock the linear counter on a quarter-frame signal
    pub fn on_quarter_frame(&mut self) {
        if self.reload_flag {
            self.linear_counter = self.linear_counter_reload;
        }
        if !self.length_counter.halt {
            self.reload_flag = false;
            if self.linear_counter > 0 {
                self.linear_counter -= 1;
            }
        }
    }
}
impl Debug for TriangleRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "on={} timer={:3X} length=[{:?}] linear={:X}",
            self.enabled, self.timer_reload, self.length_counter, self.linear_counter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_descends_then_ascends() {
        let mut t = TriangleRegister::default();
        let wave: Vec<u32> = (0..32)
            .map(|_| {
                let v = t.value();
                t.sequencer = (t.sequencer + 1) % 32;
                v
            })
            .collect();
        let mut expected: Vec<u32> = (0..16).rev().collect();
        expected.extend(0..16);
        assert_eq!(wave, expected);
    }
}
