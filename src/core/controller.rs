use serde::{Deserialize, Serialize};

/// The button state of one standard controller.
///
/// Used to feed the emulator the host's input; how keys or gamepad buttons
/// map onto these fields is up to the embedding application.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Controller {
    pub up: bool,
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub start: bool,
    pub select: bool,
    pub a: bool,
    pub b: bool,
}

impl Controller {
    pub fn new() -> Controller {
        Controller::default()
    }
}

/// One controller port's strobe and shift register ($4016/$4017).
///
/// While the strobe is high the shift register continuously reloads, so
/// reads keep answering the A button. On a high-to-low strobe transition the
/// current button state is latched, and each following read shifts out one
/// button in the order A, B, Select, Start, Up, Down, Left, Right. After all
/// eight buttons have been read the port answers 1.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ControllerPort {
    strobe: bool,
    latched: Controller,
    bit: usize,
}

impl ControllerPort {
    /// Write to the port's strobe bit. `state` is the live controller state,
    /// latched while the strobe is high.
    pub fn write(&mut self, value: u8, state: Controller) {
        let strobe = (value & 0x01) != 0;
        if strobe {
            self.latched = state;
            self.bit = 0;
        } else if self.strobe {
            // High-to-low transition, freeze the snapshot
            self.latched = state;
            self.bit = 0;
        }
        self.strobe = strobe;
    }
    /// Read one bit from the shift register.
    ///
    /// Bit 6 of the result is sourced from the open bus, since the high byte
    /// of the port's address ($40xx) is still on the bus during the read.
    pub fn read(&mut self) -> u8 {
        let pressed = match self.bit {
            0 => self.latched.a,
            1 => self.latched.b,
            2 => self.latched.select,
            3 => self.latched.start,
            4 => self.latched.up,
            5 => self.latched.down,
            6 => self.latched.left,
            7 => self.latched.right,
            _ => true,
        };
        if !self.strobe {
            self.bit += 1;
        }
        0x40 | if pressed { 1 } else { 0 }
    }
}
