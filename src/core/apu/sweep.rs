use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// A pulse channel's sweep unit.
///
/// Periodically retunes the channel's timer towards a target period of
/// `period ± (period >> shift)`. The two pulse channels negate differently:
/// pulse 1 uses one's complement (an extra -1), pulse 2 plain negation.
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct Sweep {
    pub enabled: bool,
    /// Divider reload value, from bits 4-6 of the sweep register plus one
    pub period: usize,
    /// Current value of the divider
    pub divider: usize,
    pub negate: bool,
    pub shift: usize,
    /// Most recently computed target period
    pub target_period: usize,
    // Set for pulse 1 only
    ones_complement: bool,
}
impl Sweep {
    pub fn new(ones_complement: bool) -> Sweep {
        Sweep {
            enabled: false,
            period: 1,
            divider: 1,
            negate: false,
            shift: 0,
            target_period: 0,
            ones_complement,
        }
    }
    /// Decode a write to the channel's sweep register ($4001/$4005)
    pub fn write(&mut self, value: u8) {
        self.enabled = (value & 0x80) != 0;
        self.period = ((value as usize & 0x70) >> 4) + 1;
        self.divider = self.period;
        self.negate = (value & 0x08) != 0;
        self.shift = (value & 0x07) as usize;
    }
    /// Recompute the target period from the channel's current timer period
    pub fn update_target(&mut self, timer_reload: usize) {
        let change = timer_reload >> self.shift;
        self.target_period = (timer_reload as i32
            + if self.negate {
                -(if self.ones_complement { change + 1 } else { change } as i32)
            } else {
                change as i32
            })
        .max(0) as usize;
    }
    /// Clock the divider on a half-frame signal.
    /// Returns the new timer period if the channel should be retuned.
    pub fn clock(&mut self, timer_reload: usize) -> Option<usize> {
        if self.divider == 0 {
            self.divider = self.period;
            // Retune anywhere muted() would not kick in
            if self.enabled && self.shift > 0 && timer_reload >= 8 && self.target_period <= 0x7FF {
                return Some(self.target_period);
            }
        } else {
            self.divider -= 1;
        }
        None
    }
    /// Whether the sweep unit is muting the channel
    pub fn muted(&self, timer_reload: usize) -> bool {
        timer_reload < 8 || self.target_period > 0x7FF
    }
}
impl Debug for Sweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "on={} shift={:X} negate={} target={:X}",
            self.enabled, self.shift, self.negate, self.target_period
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retunes_up_to_the_mute_boundary() {
        let mut sweep = Sweep::new(false);
        // Enabled, divider period 1, shift 1
        sweep.write(0x81);
        sweep.update_target(0x555);
        // 0x555 + (0x555 >> 1) lands exactly on the highest audible period
        assert_eq!(sweep.target_period, 0x7FF);
        assert!(!sweep.muted(0x555));
        sweep.divider = 0;
        assert_eq!(sweep.clock(0x555), Some(0x7FF));
    }
}
