use serde::{Deserialize, Serialize};
use std::fmt::Debug;

// CPU cycle counts of the sequencer steps
const STEPS: [i32; 5] = [7457, 14912, 22371, 29828, 37281];

/// The APU's frame sequencer.
///
/// Runs a fixed cadence of "quarter frame" and "half frame" signals that
/// clock the channels' envelopes, linear counter, length counters and sweep
/// units. In 4-step mode the sequence wraps at step 4 and raises the frame
/// IRQ unless inhibited; in 5-step mode it wraps at step 5 and never does.
#[derive(Clone, Serialize, Deserialize)]
pub struct FrameSequencer {
    mode: u32,
    cycles: i32,
    pub irq_inhibit: bool,
    pub irq_flag: bool,
}

impl Default for FrameSequencer {
    fn default() -> FrameSequencer {
        // $4017 powers on as $00: 4-step mode with the IRQ enabled
        FrameSequencer {
            mode: 0,
            cycles: 0,
            irq_inhibit: false,
            irq_flag: false,
        }
    }
}

impl Debug for FrameSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mode={} cycles={} inhibit={} IRQ={}",
            self.mode, self.cycles, self.irq_inhibit, self.irq_flag
        )
    }
}

impl FrameSequencer {
    /// Decode a write to $4017.
    /// Returns `true` if the channels should receive an immediate
    /// quarter+half clock (5-step mode side effect).
    pub fn write_control(&mut self, value: u8) -> bool {
        self.mode = (value as u32 & 0x80) >> 7;
        // The sequencer restarts 3 or 4 cycles after the write
        if self.cycles % 2 == 0 {
            self.cycles = -3;
        } else {
            self.cycles = -4;
        }
        self.irq_inhibit = (value & 0x40) != 0;
        if self.irq_inhibit {
            self.irq_flag = false;
        }
        self.mode == 1
    }
    /// Advance by one CPU cycle.
    /// Returns `(quarter, half)` signals for the channels.
    pub fn advance(&mut self) -> (bool, bool) {
        self.cycles += 1;
        if self.mode == 0 {
            if self.cycles == STEPS[0] || self.cycles == STEPS[2] {
                (true, false)
            } else if self.cycles == STEPS[1] {
                (true, true)
            } else if self.cycles == STEPS[3] {
                self.cycles = 0;
                self.irq_flag = !self.irq_inhibit;
                (true, true)
            } else {
                (false, false)
            }
        } else if STEPS[0..3].contains(&self.cycles) || self.cycles == STEPS[4] {
            let half = self.cycles == STEPS[1] || self.cycles == STEPS[4];
            if self.cycles == STEPS[4] {
                self.cycles = 0;
            }
            (true, half)
        } else {
            (false, false)
        }
    }
}
