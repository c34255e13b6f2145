use log::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use crate::core::{
    opcodes::*, Apu, Cartridge, Controller, ControllerPort, Cpu, Ppu, Settings, IRQ_VECTOR,
    NMI_VECTOR, RESET_VECTOR,
};

/// The amount of CPU cycles that transferring a page of data to the PPU's
/// OAM memory takes.
pub const CPU_CYCLES_PER_OAM: u32 = 513;

/// The NES.
///
/// The entire console: a [Cpu], [Ppu] and [Apu] kept in lockstep, the 2KB of
/// work RAM, the two controller ports, and the [Cartridge] currently
/// inserted. All CPU memory accesses go through [Nes::read_byte] and
/// [Nes::write_byte], which dispatch to the right component by address.
#[derive(Serialize, Deserialize)]
pub struct Nes {
    /// CPU of the NES
    pub cpu: Cpu,
    /// PPU of the NES
    pub ppu: Ppu,
    /// APU of the NES
    pub apu: Apu,
    /// Work RAM, mirrored through $0000-$1FFF
    #[serde(with = "BigArray")]
    pub mem: [u8; 0x800],
    /// Cartridge inserted in the NES
    pub cartridge: Cartridge,
    /// Player 1 and 2 controller states.
    /// The program running on the console still has to strobe the ports to
    /// see them.
    pub controllers: [Controller; 2],
    ports: [ControllerPort; 2],
    // Fractional cycles left over from the last run() call
    cycle_carry: f64,
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}

impl Nes {
    /// Initialise the NES with no cartridge inserted.
    ///
    /// All reads from cartridge space answer the open bus byte, so this is
    /// only useful on its own for manually driving the console with
    /// [Nes::decode_and_execute]. Use [Nes::with_cartridge] or
    /// [Nes::insert_cartridge] for proper emulation.
    pub fn new() -> Nes {
        Nes {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            mem: [0x00; 0x800],
            cartridge: Cartridge::absent(),
            controllers: [Controller::new(); 2],
            ports: [ControllerPort::default(); 2],
            cycle_carry: 0.0,
        }
    }
    /// Initialise the NES with a cartridge inserted and the PC at the
    /// cartridge's reset vector.
    pub fn with_cartridge(cartridge: Cartridge) -> Nes {
        let mut nes = Nes::new();
        nes.insert_cartridge(cartridge);
        nes
    }
    /// Insert a cartridge, pointing the PC at its reset vector.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        info!("Inserting cartridge ({})", cartridge);
        self.cartridge = cartridge;
        self.cpu.p_c = self.read_vector(RESET_VECTOR);
        info!("Initialized PC to {:#X}", self.cpu.p_c);
    }
    /// Remove the cartridge, leaving the console with an absent one.
    /// Returns the removed cartridge, e.g. to persist its savedata.
    pub fn remove_cartridge(&mut self) -> Cartridge {
        std::mem::take(&mut self.cartridge)
    }
    /// Reset every component to its power-on state and load the PC from the
    /// reset vector, as if the console was just switched on.
    pub fn power_on(&mut self, settings: &Settings) {
        self.cpu.power_on();
        if settings.randomize_ram {
            rand::thread_rng().fill_bytes(&mut self.mem);
        } else {
            self.mem = [0x00; 0x800];
        }
        self.ppu = Ppu::new();
        self.apu = Apu::new();
        self.ports = [ControllerPort::default(); 2];
        self.cycle_carry = 0.0;
        self.cpu.p_c = self.read_vector(RESET_VECTOR);
    }
    /// Create a new NES from a savestate, the opposite of
    /// [Nes::to_savestate].
    pub fn from_savestate(savestate: &[u8]) -> Result<Nes, postcard::Error> {
        postcard::from_bytes(savestate)
    }
    /// Get a serialized copy of this NES as binary data.
    /// ```
    /// let nes = famicore::core::Nes::new();
    /// let savestate: Vec<u8> = nes.to_savestate().unwrap();
    /// ```
    pub fn to_savestate(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }
    /// The savedata of the game in the NES, if the cartridge has battery
    /// backed RAM. "Savedata" on the NES is just the cartridge's PRG RAM.
    pub fn savedata(&self) -> Option<&[u8]> {
        if self.cartridge.has_battery_backed_ram() {
            Some(&self.cartridge.memory.prg_ram)
        } else {
            None
        }
    }

    /// Read a byte of memory given an address in CPU space.
    ///
    /// This is not guaranteed to leave the console untouched, since some
    /// reads have side effects (the PPU status register, the controller
    /// ports, the APU status register).
    /// ```
    /// let mut nes = famicore::core::Nes::new();
    /// // Read a byte of work RAM
    /// let byte = nes.read_byte(0x0123);
    /// // Read the PPU's status register
    /// let ppu_status = nes.read_byte(0x2002);
    /// ```
    pub fn read_byte(&mut self, addr: usize) -> u8 {
        match addr {
            0..0x2000 => self.mem[addr % 0x0800],
            0x2000..0x4000 => self.ppu.read_byte(addr, &self.cartridge),
            0x4016 => self.ports[0].read(),
            0x4017 => self.ports[1].read(),
            0x4000..0x4020 => self.apu.read_byte(addr),
            0x4020..0x10000 => self.cartridge.read_cpu(addr),
            _ => panic!("Invalid read address provided: {:#X}", addr),
        }
    }
    /// Write a byte of memory given an address in CPU space.
    /// ```
    /// let mut nes = famicore::core::Nes::new();
    /// // Set a byte's value in RAM
    /// nes.write_byte(0x00, 0x12);
    /// // Enable the NMI by writing to the PPUCTRL register
    /// nes.write_byte(0x2000, 0x80);
    /// ```
    pub fn write_byte(&mut self, addr: usize, value: u8) {
        match addr {
            0..0x2000 => self.mem[addr % 0x0800] = value,
            0x2000..0x4000 => self.ppu.write_byte(addr, value, &mut self.cartridge),
            0x4014 => {
                // Trigger an OAM DMA, executed after the instruction
                self.ppu.oam_dma = Some(value);
            }
            // The strobe line is wired to both ports
            0x4016 => {
                self.ports[0].write(value, self.controllers[0]);
                self.ports[1].write(value, self.controllers[1]);
            }
            0x4000..0x4020 => self.apu.write_byte(addr, value),
            0x4020..0x10000 => self.cartridge.write_cpu(addr, value),
            _ => panic!("Invalid write address provided: {:#X}", addr),
        };
    }
    /// Update a controller's state in the NES.
    ///
    /// The program running on the console still has to strobe the ports to
    /// see the new state.
    /// * `num`: the controller number, `0` or `1`
    /// * `state`: the [Controller] state
    pub fn set_controller_state(&mut self, num: usize, state: Controller) {
        self.controllers[num] = state;
    }
    /// Execute the next instruction pointed to by the CPU's PC, returning
    /// its cycle cost.
    ///
    /// Does not advance anything other than the CPU; use
    /// [Nes::advance_instruction] to emulate the entire console.
    pub fn step(&mut self) -> u32 {
        let pc = self.cpu.p_c;
        let inst = [
            self.read_byte(pc as usize),
            self.read_byte(pc.wrapping_add(1) as usize),
            self.read_byte(pc.wrapping_add(2) as usize),
        ];
        let (bytes, cycles) = self.decode_and_execute(&inst);
        self.cpu.p_c = self.cpu.p_c.wrapping_add(bytes);
        self.cpu.cycles += cycles as u64;
        cycles as u32
    }
    fn read_vector(&mut self, addr: usize) -> u16 {
        self.read_byte(addr) as u16 | ((self.read_byte(addr + 1) as u16) << 8)
    }
    // Interrupt the CPU through the vector at the given address
    fn interrupt_to_addr(&mut self, addr: usize) {
        self.push_to_stack_u16(self.cpu.p_c);
        // B reads 0 on an interrupt-pushed status byte
        self.push_to_stack(self.cpu.s_r.to_byte() & !0x10);
        self.cpu.p_c = self.read_vector(addr);
        self.cpu.s_r.i = true;
    }
    /// Trigger a non-maskable interrupt, as the PPU does on vblank.
    pub fn nmi(&mut self) {
        self.interrupt_to_addr(NMI_VECTOR);
    }
    /// Trigger a maskable interrupt, as the APU does.
    /// Ignored when the interrupt-disable flag is set.
    pub fn irq(&mut self) {
        if !self.cpu.s_r.i {
            self.interrupt_to_addr(IRQ_VECTOR);
        }
    }
    /// Reset the NES, loading the PC from the reset vector.
    pub fn reset(&mut self) {
        self.interrupt_to_addr(RESET_VECTOR);
    }

    /// Decode and then execute a single CPU instruction.
    ///
    /// Returns `(bytes, cycles)`, where `bytes` is how much the program
    /// counter should be incremented by and `cycles` is how many cycles the
    /// operation needed. Does not change the program counter. An opcode
    /// outside the instruction table logs a warning and executes as a
    /// 2-cycle NOP.
    ///
    /// # Examples
    /// ```
    /// use famicore::core::Nes;
    /// let mut nes = Nes::new();
    /// // Load 0x18 into A
    /// nes.decode_and_execute(&[0xA9, 0x18]);
    /// // Load the memory at 0x0234 into A
    /// nes.decode_and_execute(&[0xAD, 0x34, 0x02]);
    /// // Perform a nop
    /// nes.decode_and_execute(&[0xEA]);
    /// ```
    pub fn decode_and_execute(&mut self, instruction: &[u8]) -> (u16, i64) {
        let [opcode, operands @ ..] = instruction else {
            warn!("Empty instruction provided");
            return (1, 2);
        };
        // Simple macro to create a block that just calls a CPU function
        macro_rules! cpu_func {
            ($func: ident, $read_addr: ident, $bytes: expr, $cycles: expr) => {{
                let v = self.$read_addr(operands);
                self.cpu.$func(v);
                ($bytes, $cycles)
            }};
            ($func: ident, $read_addr: ident, $pc: ident, $bytes: expr, $cycles_no_pc: expr, $cycles_pc: expr) => {{
                let v = self.$read_addr(operands);
                self.cpu.$func(v);
                (
                    $bytes,
                    if self.$pc(operands) {
                        $cycles_pc
                    } else {
                        $cycles_no_pc
                    },
                )
            }};
        }
        // Macro to create a block that calls a CPU function and stores the
        // result back where it came from
        macro_rules! cpu_write_func {
            ($func: ident, $read_addr: ident, $write_addr: ident, $bytes: expr, $cycles: expr) => {{
                let v = self.$read_addr(operands);
                self.$write_addr(operands, v);
                let value = self.cpu.$func(v);
                self.$write_addr(operands, value);
                ($bytes, $cycles)
            }};
        }
        // Macro to set or unset a CPU flag
        macro_rules! flag_func {
            ($flag: ident, $val: expr) => {{
                self.cpu.s_r.$flag = $val;
                (1, 2)
            }};
        }
        // Macro to write a CPU register (or expression) to memory
        macro_rules! store_func {
            ($reg: ident, $write_addr: ident, $bytes: expr, $cycles: expr) => {{
                self.$write_addr(operands, self.cpu.$reg);
                ($bytes, $cycles)
            }};
            ($value: expr, $write_addr: ident, $bytes: expr, $cycles: expr) => {{
                self.$write_addr(operands, $value);
                ($bytes, $cycles)
            }};
        }
        macro_rules! transfer_func {
            ($from_reg: ident, $to_reg: ident) => {{
                self.cpu.$to_reg = self.cpu.$from_reg;
                self.cpu.s_r.z = self.cpu.$to_reg == 0;
                self.cpu.s_r.n = (self.cpu.$to_reg & 0x80) != 0;
                (1, 2)
            }};
        }
        match *opcode {
            // LDA
            LDA_I => cpu_func!(lda, read_immediate, 2, 2),
            LDA_ZP => cpu_func!(lda, read_zp, 2, 3),
            LDA_ZP_X => cpu_func!(lda, read_zp_x, 2, 4),
            LDA_ABS => cpu_func!(lda, read_abs, 3, 4),
            LDA_ABS_X => cpu_func!(lda, read_abs_x, pc_x, 3, 4, 5),
            LDA_ABS_Y => cpu_func!(lda, read_abs_y, pc_y, 3, 4, 5),
            LDA_IND_X => cpu_func!(lda, read_indexed_indirect, 2, 6),
            LDA_IND_Y => cpu_func!(lda, read_indirect_indexed, pc_ind, 2, 5, 6),
            // LDX
            LDX_I => cpu_func!(ldx, read_immediate, 2, 2),
            LDX_ZP => cpu_func!(ldx, read_zp, 2, 3),
            LDX_ZP_Y => cpu_func!(ldx, read_zp_y, 2, 4),
            LDX_ABS => cpu_func!(ldx, read_abs, 3, 4),
            LDX_ABS_Y => cpu_func!(ldx, read_abs_y, pc_y, 3, 4, 5),
            // LDY
            LDY_I => cpu_func!(ldy, read_immediate, 2, 2),
            LDY_ZP => cpu_func!(ldy, read_zp, 2, 3),
            LDY_ZP_X => cpu_func!(ldy, read_zp_x, 2, 4),
            LDY_ABS => cpu_func!(ldy, read_abs, 3, 4),
            LDY_ABS_X => cpu_func!(ldy, read_abs_x, pc_x, 3, 4, 5),
            // ADC
            ADC_I => cpu_func!(adc, read_immediate, 2, 2),
            ADC_ZP => cpu_func!(adc, read_zp, 2, 3),
            ADC_ZP_X => cpu_func!(adc, read_zp_x, 2, 4),
            ADC_ABS => cpu_func!(adc, read_abs, 3, 4),
            ADC_ABS_X => cpu_func!(adc, read_abs_x, pc_x, 3, 4, 5),
            ADC_ABS_Y => cpu_func!(adc, read_abs_y, pc_y, 3, 4, 5),
            ADC_IND_X => cpu_func!(adc, read_indexed_indirect, 2, 6),
            ADC_IND_Y => cpu_func!(adc, read_indirect_indexed, pc_ind, 2, 5, 6),
            // AND
            AND_I => cpu_func!(and, read_immediate, 2, 2),
            AND_ZP => cpu_func!(and, read_zp, 2, 3),
            AND_ZP_X => cpu_func!(and, read_zp_x, 2, 4),
            AND_ABS => cpu_func!(and, read_abs, 3, 4),
            AND_ABS_X => cpu_func!(and, read_abs_x, pc_x, 3, 4, 5),
            AND_ABS_Y => cpu_func!(and, read_abs_y, pc_y, 3, 4, 5),
            AND_IND_X => cpu_func!(and, read_indexed_indirect, 2, 6),
            AND_IND_Y => cpu_func!(and, read_indirect_indexed, pc_ind, 2, 5, 6),
            // ASL
            ASL_A => cpu_write_func!(asl, read_a, write_a, 1, 2),
            ASL_ZP => cpu_write_func!(asl, read_zp, write_zp, 2, 5),
            ASL_ZP_X => cpu_write_func!(asl, read_zp_x, write_zp_x, 2, 6),
            ASL_ABS => cpu_write_func!(asl, read_abs, write_abs, 3, 6),
            ASL_ABS_X => cpu_write_func!(asl, read_abs_x, write_abs_x, 3, 7),
            // Branches
            BCS => (2, self.cpu.branch_if(self.cpu.s_r.c, operands[0])),
            BCC => (2, self.cpu.branch_if(!self.cpu.s_r.c, operands[0])),
            BEQ => (2, self.cpu.branch_if(self.cpu.s_r.z, operands[0])),
            BNE => (2, self.cpu.branch_if(!self.cpu.s_r.z, operands[0])),
            BMI => (2, self.cpu.branch_if(self.cpu.s_r.n, operands[0])),
            BPL => (2, self.cpu.branch_if(!self.cpu.s_r.n, operands[0])),
            BVS => (2, self.cpu.branch_if(self.cpu.s_r.v, operands[0])),
            BVC => (2, self.cpu.branch_if(!self.cpu.s_r.v, operands[0])),
            // BIT
            BIT_ZP => cpu_func!(bit, read_zp, 2, 3),
            BIT_ABS => cpu_func!(bit, read_abs, 3, 4),
            // BRK
            BRK => {
                // The pushed return address skips the padding byte
                self.push_to_stack_u16(self.cpu.p_c.wrapping_add(2));
                // B reads 1 on a software-pushed status byte
                self.push_to_stack(self.cpu.s_r.to_byte() | 0x10);
                self.cpu.s_r.i = true;
                self.cpu.p_c = self.read_vector(IRQ_VECTOR).wrapping_sub(1);
                (1, 7)
            }
            // Flag clears
            CLC => flag_func!(c, false),
            CLD => flag_func!(d, false),
            CLI => flag_func!(i, false),
            CLV => flag_func!(v, false),
            // CMP
            CMP_I => cpu_func!(cmp, read_immediate, 2, 2),
            CMP_ZP => cpu_func!(cmp, read_zp, 2, 3),
            CMP_ZP_X => cpu_func!(cmp, read_zp_x, 2, 4),
            CMP_ABS => cpu_func!(cmp, read_abs, 3, 4),
            CMP_ABS_X => cpu_func!(cmp, read_abs_x, pc_x, 3, 4, 5),
            CMP_ABS_Y => cpu_func!(cmp, read_abs_y, pc_y, 3, 4, 5),
            CMP_IND_X => cpu_func!(cmp, read_indexed_indirect, 2, 6),
            CMP_IND_Y => cpu_func!(cmp, read_indirect_indexed, pc_ind, 2, 5, 6),
            // CPX
            CPX_I => cpu_func!(cpx, read_immediate, 2, 2),
            CPX_ZP => cpu_func!(cpx, read_zp, 2, 3),
            CPX_ABS => cpu_func!(cpx, read_abs, 3, 4),
            // CPY
            CPY_I => cpu_func!(cpy, read_immediate, 2, 2),
            CPY_ZP => cpu_func!(cpy, read_zp, 2, 3),
            CPY_ABS => cpu_func!(cpy, read_abs, 3, 4),
            // DEC
            DEC_ZP => cpu_write_func!(dec, read_zp, write_zp, 2, 5),
            DEC_ZP_X => cpu_write_func!(dec, read_zp_x, write_zp_x, 2, 6),
            DEC_ABS => cpu_write_func!(dec, read_abs, write_abs, 3, 6),
            DEC_ABS_X => cpu_write_func!(dec, read_abs_x, write_abs_x, 3, 7),
            DEX => {
                self.cpu.x = self.cpu.dec(self.cpu.x);
                (1, 2)
            }
            DEY => {
                self.cpu.y = self.cpu.dec(self.cpu.y);
                (1, 2)
            }
            // EOR
            EOR_I => cpu_func!(eor, read_immediate, 2, 2),
            EOR_ZP => cpu_func!(eor, read_zp, 2, 3),
            EOR_ZP_X => cpu_func!(eor, read_zp_x, 2, 4),
            EOR_ABS => cpu_func!(eor, read_abs, 3, 4),
            EOR_ABS_X => cpu_func!(eor, read_abs_x, pc_x, 3, 4, 5),
            EOR_ABS_Y => cpu_func!(eor, read_abs_y, pc_y, 3, 4, 5),
            EOR_IND_X => cpu_func!(eor, read_indexed_indirect, 2, 6),
            EOR_IND_Y => cpu_func!(eor, read_indirect_indexed, pc_ind, 2, 5, 6),
            // INC
            INC_ZP => cpu_write_func!(inc, read_zp, write_zp, 2, 5),
            INC_ZP_X => cpu_write_func!(inc, read_zp_x, write_zp_x, 2, 6),
            INC_ABS => cpu_write_func!(inc, read_abs, write_abs, 3, 6),
            INC_ABS_X => cpu_write_func!(inc, read_abs_x, write_abs_x, 3, 7),
            INX => {
                self.cpu.x = self.cpu.inc(self.cpu.x);
                (1, 2)
            }
            INY => {
                self.cpu.y = self.cpu.inc(self.cpu.y);
                (1, 2)
            }
            JMP_ABS => {
                self.cpu.p_c = (Nes::get_absolute_addr(operands) as u16).wrapping_sub(3);
                (3, 3)
            }
            JMP_IND => {
                self.cpu.p_c = (Nes::get_absolute_addr(&[
                    self.read_abs(operands),
                    // The indirect read wraps around the page boundary
                    self.read_abs(&[operands[0].wrapping_add(1), operands[1]]),
                ]) as u16)
                    .wrapping_sub(3);
                (3, 5)
            }
            JSR => {
                self.push_to_stack_u16(self.cpu.p_c.wrapping_add(2));
                self.cpu.p_c = (Nes::get_absolute_addr(operands) as u16).wrapping_sub(3);
                (3, 6)
            }
            // LSR
            LSR_A => cpu_write_func!(lsr, read_a, write_a, 1, 2),
            LSR_ZP => cpu_write_func!(lsr, read_zp, write_zp, 2, 5),
            LSR_ZP_X => cpu_write_func!(lsr, read_zp_x, write_zp_x, 2, 6),
            LSR_ABS => cpu_write_func!(lsr, read_abs, write_abs, 3, 6),
            LSR_ABS_X => cpu_write_func!(lsr, read_abs_x, write_abs_x, 3, 7),
            NOP => (1, 2),
            // ORA
            ORA_I => cpu_func!(ora, read_immediate, 2, 2),
            ORA_ZP => cpu_func!(ora, read_zp, 2, 3),
            ORA_ZP_X => cpu_func!(ora, read_zp_x, 2, 4),
            ORA_ABS => cpu_func!(ora, read_abs, 3, 4),
            ORA_ABS_X => cpu_func!(ora, read_abs_x, pc_x, 3, 4, 5),
            ORA_ABS_Y => cpu_func!(ora, read_abs_y, pc_y, 3, 4, 5),
            ORA_IND_X => cpu_func!(ora, read_indexed_indirect, 2, 6),
            ORA_IND_Y => cpu_func!(ora, read_indirect_indexed, pc_ind, 2, 5, 6),
            // Pushing to the stack
            PHA => {
                self.push_to_stack(self.cpu.a);
                (1, 3)
            }
            PHP => {
                // B reads 1 on a software-pushed status byte
                self.push_to_stack(self.cpu.s_r.to_byte() | 0x10);
                (1, 3)
            }
            // Pulling from the stack
            PLA => {
                self.cpu.a = self.pull_from_stack();
                self.cpu.s_r.z = self.cpu.a == 0;
                self.cpu.s_r.n = (self.cpu.a & 0x80) != 0;
                (1, 4)
            }
            PLP => {
                let v = self.pull_from_stack();
                self.cpu.s_r.from_byte(v);
                (1, 4)
            }
            // ROL
            ROL_A => cpu_write_func!(rol, read_a, write_a, 1, 2),
            ROL_ZP => cpu_write_func!(rol, read_zp, write_zp, 2, 5),
            ROL_ZP_X => cpu_write_func!(rol, read_zp_x, write_zp_x, 2, 6),
            ROL_ABS => cpu_write_func!(rol, read_abs, write_abs, 3, 6),
            ROL_ABS_X => cpu_write_func!(rol, read_abs_x, write_abs_x, 3, 7),
            // ROR
            ROR_A => cpu_write_func!(ror, read_a, write_a, 1, 2),
            ROR_ZP => cpu_write_func!(ror, read_zp, write_zp, 2, 5),
            ROR_ZP_X => cpu_write_func!(ror, read_zp_x, write_zp_x, 2, 6),
            ROR_ABS => cpu_write_func!(ror, read_abs, write_abs, 3, 6),
            ROR_ABS_X => cpu_write_func!(ror, read_abs_x, write_abs_x, 3, 7),
            RTI => {
                let v = self.pull_from_stack();
                self.cpu.s_r.from_byte(v);
                // Subtract one for the byte that will be added
                self.cpu.p_c = self.pull_from_stack_u16().wrapping_sub(1);
                (1, 6)
            }
            RTS => {
                // The byte we want to skip is added back by the instruction
                // length
                self.cpu.p_c = self.pull_from_stack_u16();
                (1, 6)
            }
            // SBC
            SBC_I => cpu_func!(sbc, read_immediate, 2, 2),
            SBC_ZP => cpu_func!(sbc, read_zp, 2, 3),
            SBC_ZP_X => cpu_func!(sbc, read_zp_x, 2, 4),
            SBC_ABS => cpu_func!(sbc, read_abs, 3, 4),
            SBC_ABS_X => cpu_func!(sbc, read_abs_x, pc_x, 3, 4, 5),
            SBC_ABS_Y => cpu_func!(sbc, read_abs_y, pc_y, 3, 4, 5),
            SBC_IND_X => cpu_func!(sbc, read_indexed_indirect, 2, 6),
            SBC_IND_Y => cpu_func!(sbc, read_indirect_indexed, pc_ind, 2, 5, 6),
            // Flag sets
            SEC => flag_func!(c, true),
            SED => flag_func!(d, true),
            SEI => flag_func!(i, true),
            // STA
            STA_ZP => store_func!(a, write_zp, 2, 3),
            STA_ZP_X => store_func!(a, write_zp_x, 2, 4),
            STA_ABS => store_func!(a, write_abs, 3, 4),
            STA_ABS_X => store_func!(a, write_abs_x, 3, 5),
            STA_ABS_Y => store_func!(a, write_abs_y, 3, 5),
            STA_IND_X => store_func!(a, write_indexed_indirect, 2, 6),
            STA_IND_Y => store_func!(a, write_indirect_indexed, 2, 6),
            // STX
            STX_ZP => store_func!(x, write_zp, 2, 3),
            STX_ZP_Y => store_func!(x, write_zp_y, 2, 4),
            STX_ABS => store_func!(x, write_abs, 3, 4),
            // STY
            STY_ZP => store_func!(y, write_zp, 2, 3),
            STY_ZP_X => store_func!(y, write_zp_x, 2, 4),
            STY_ABS => store_func!(y, write_abs, 3, 4),
            // Transfers
            TAX => transfer_func!(a, x),
            TAY => transfer_func!(a, y),
            TSX => transfer_func!(s_p, x),
            TXA => transfer_func!(x, a),
            // The only transfer that does not affect flags
            TXS => {
                self.cpu.s_p = self.cpu.x;
                (1, 2)
            }
            TYA => transfer_func!(y, a),
            // Unofficial opcodes
            unofficial::LAX_ZP => cpu_func!(lax, read_zp, 2, 3),
            unofficial::LAX_ZP_Y => cpu_func!(lax, read_zp_y, 2, 4),
            unofficial::LAX_ABS => cpu_func!(lax, read_abs, 3, 4),
            unofficial::LAX_ABS_Y => cpu_func!(lax, read_abs_y, pc_y, 3, 4, 5),
            unofficial::LAX_IND_X => cpu_func!(lax, read_indexed_indirect, 2, 6),
            unofficial::LAX_IND_Y => cpu_func!(lax, read_indirect_indexed, pc_ind, 2, 5, 6),
            unofficial::SAX_ZP => store_func!(self.cpu.a & self.cpu.x, write_zp, 2, 3),
            unofficial::SAX_ZP_Y => store_func!(self.cpu.a & self.cpu.x, write_zp_y, 2, 4),
            unofficial::SAX_ABS => store_func!(self.cpu.a & self.cpu.x, write_abs, 3, 4),
            unofficial::SAX_IND_X => {
                store_func!(self.cpu.a & self.cpu.x, write_indexed_indirect, 2, 6)
            }
            unofficial::DCP_ZP => cpu_write_func!(dcp, read_zp, write_zp, 2, 5),
            unofficial::DCP_ZP_X => cpu_write_func!(dcp, read_zp_x, write_zp_x, 2, 6),
            unofficial::DCP_ABS => cpu_write_func!(dcp, read_abs, write_abs, 3, 6),
            unofficial::DCP_ABS_X => cpu_write_func!(dcp, read_abs_x, write_abs_x, 3, 7),
            unofficial::DCP_ABS_Y => cpu_write_func!(dcp, read_abs_y, write_abs_y, 3, 7),
            unofficial::DCP_IND_X => {
                cpu_write_func!(dcp, read_indexed_indirect, write_indexed_indirect, 2, 8)
            }
            unofficial::DCP_IND_Y => {
                cpu_write_func!(dcp, read_indirect_indexed, write_indirect_indexed, 2, 8)
            }
            unofficial::ISC_ZP => cpu_write_func!(isc, read_zp, write_zp, 2, 5),
            unofficial::ISC_ZP_X => cpu_write_func!(isc, read_zp_x, write_zp_x, 2, 6),
            unofficial::ISC_ABS => cpu_write_func!(isc, read_abs, write_abs, 3, 6),
            unofficial::ISC_ABS_X => cpu_write_func!(isc, read_abs_x, write_abs_x, 3, 7),
            unofficial::ISC_ABS_Y => cpu_write_func!(isc, read_abs_y, write_abs_y, 3, 7),
            unofficial::ISC_IND_X => {
                cpu_write_func!(isc, read_indexed_indirect, write_indexed_indirect, 2, 8)
            }
            unofficial::ISC_IND_Y => {
                cpu_write_func!(isc, read_indirect_indexed, write_indirect_indexed, 2, 8)
            }
            unofficial::RLA_ZP => cpu_write_func!(rla, read_zp, write_zp, 2, 5),
            unofficial::RLA_ZP_X => cpu_write_func!(rla, read_zp_x, write_zp_x, 2, 6),
            unofficial::RLA_ABS => cpu_write_func!(rla, read_abs, write_abs, 3, 6),
            unofficial::RLA_ABS_X => cpu_write_func!(rla, read_abs_x, write_abs_x, 3, 7),
            unofficial::RLA_ABS_Y => cpu_write_func!(rla, read_abs_y, write_abs_y, 3, 7),
            unofficial::RLA_IND_X => {
                cpu_write_func!(rla, read_indexed_indirect, write_indexed_indirect, 2, 8)
            }
            unofficial::RLA_IND_Y => {
                cpu_write_func!(rla, read_indirect_indexed, write_indirect_indexed, 2, 8)
            }
            unofficial::RRA_ZP => cpu_write_func!(rra, read_zp, write_zp, 2, 5),
            unofficial::RRA_ZP_X => cpu_write_func!(rra, read_zp_x, write_zp_x, 2, 6),
            unofficial::RRA_ABS => cpu_write_func!(rra, read_abs, write_abs, 3, 6),
            unofficial::RRA_ABS_X => cpu_write_func!(rra, read_abs_x, write_abs_x, 3, 7),
            unofficial::RRA_ABS_Y => cpu_write_func!(rra, read_abs_y, write_abs_y, 3, 7),
            unofficial::RRA_IND_X => {
                cpu_write_func!(rra, read_indexed_indirect, write_indexed_indirect, 2, 8)
            }
            unofficial::RRA_IND_Y => {
                cpu_write_func!(rra, read_indirect_indexed, write_indirect_indexed, 2, 8)
            }
            unofficial::SLO_ZP => cpu_write_func!(slo, read_zp, write_zp, 2, 5),
            unofficial::SLO_ZP_X => cpu_write_func!(slo, read_zp_x, write_zp_x, 2, 6),
            unofficial::SLO_ABS => cpu_write_func!(slo, read_abs, write_abs, 3, 6),
            unofficial::SLO_ABS_X => cpu_write_func!(slo, read_abs_x, write_abs_x, 3, 7),
            unofficial::SLO_ABS_Y => cpu_write_func!(slo, read_abs_y, write_abs_y, 3, 7),
            unofficial::SLO_IND_X => {
                cpu_write_func!(slo, read_indexed_indirect, write_indexed_indirect, 2, 8)
            }
            unofficial::SLO_IND_Y => {
                cpu_write_func!(slo, read_indirect_indexed, write_indirect_indexed, 2, 8)
            }
            unofficial::SRE_ZP => cpu_write_func!(sre, read_zp, write_zp, 2, 5),
            unofficial::SRE_ZP_X => cpu_write_func!(sre, read_zp_x, write_zp_x, 2, 6),
            unofficial::SRE_ABS => cpu_write_func!(sre, read_abs, write_abs, 3, 6),
            unofficial::SRE_ABS_X => cpu_write_func!(sre, read_abs_x, write_abs_x, 3, 7),
            unofficial::SRE_ABS_Y => cpu_write_func!(sre, read_abs_y, write_abs_y, 3, 7),
            unofficial::SRE_IND_X => {
                cpu_write_func!(sre, read_indexed_indirect, write_indexed_indirect, 2, 8)
            }
            unofficial::SRE_IND_Y => {
                cpu_write_func!(sre, read_indirect_indexed, write_indirect_indexed, 2, 8)
            }
            unofficial::SBC => cpu_func!(sbc, read_immediate, 2, 2),
            _ if unofficial::NOPS.contains(opcode) => (1, 2),
            _ if unofficial::SKBS.contains(opcode) => (2, 2),
            _ if unofficial::IGN_ZP.contains(opcode) => {
                self.read_zp(operands);
                (2, 3)
            }
            _ if unofficial::IGN_ZP_X.contains(opcode) => {
                self.read_zp_x(operands);
                (2, 4)
            }
            unofficial::IGN_ABS => {
                self.read_abs(operands);
                (3, 4)
            }
            _ if unofficial::IGN_ABS_X.contains(opcode) => {
                self.read_abs_x(operands);
                if self.pc_x(operands) {
                    (3, 5)
                } else {
                    (3, 4)
                }
            }
            _ => {
                warn!(
                    "Unknown opcode {:#04X} at {:#06X}, executing as a NOP",
                    opcode, self.cpu.p_c
                );
                (1, 2)
            }
        }
    }
    /// Advance the NES by one instruction, updating the PPU, APU and
    /// cartridge in the correct clock ratios. Returns the CPU cycles
    /// elapsed.
    pub fn advance_instruction(&mut self, settings: &Settings) -> u32 {
        let mut c = self.step();
        if self.check_oam_dma() {
            c += CPU_CYCLES_PER_OAM;
        }
        // Poll the APU's frame and DMC interrupts
        if !self.cpu.s_r.i && self.apu.irq() {
            self.interrupt_to_addr(IRQ_VECTOR);
            c += 7;
        }
        self.apu.advance_cpu_cycles(c, &self.cartridge);
        self.cartridge.advance_cpu_cycles(c);
        // The PPU runs 3 dots per CPU cycle
        if self.ppu.advance_dots(3 * c, &self.cartridge, settings) && self.ppu.get_nmi_enabled() {
            self.nmi();
            c += 7;
            self.apu.advance_cpu_cycles(7, &self.cartridge);
            self.cartridge.advance_cpu_cycles(7);
            self.ppu.advance_dots(21, &self.cartridge, settings);
        }
        c
    }
    /// Advance the NES by one frame, approximately 29780 CPU cycles.
    ///
    /// Advances the NES until it has just entered the vblank interval.
    /// Returns the total number of CPU cycles elapsed.
    pub fn advance_frame(&mut self, settings: &Settings) -> u32 {
        let mut cycles = 0;
        let mut has_been_out_of_vblank = !self.ppu.in_vblank();
        loop {
            cycles += self.advance_instruction(settings);
            if !self.ppu.in_vblank() {
                has_been_out_of_vblank = true;
            } else if has_been_out_of_vblank {
                return cycles;
            }
        }
    }
    /// Advance the NES by a fractional budget of CPU cycles.
    ///
    /// Runs whole instructions until the budget is used up; the overshoot
    /// carries over and shortens the next call, so repeated calls average
    /// out to the requested rate. Returns the cycles actually executed.
    pub fn run(&mut self, cycle_budget: f64, settings: &Settings) -> u32 {
        let target = cycle_budget - self.cycle_carry;
        let mut executed: u32 = 0;
        while (executed as f64) < target {
            executed += self.advance_instruction(settings);
        }
        self.cycle_carry = executed as f64 - target;
        executed
    }

    /// Check for a pending OAM DMA and execute it.
    ///
    /// Copies a 256-byte page of CPU memory into the PPU's OAM. Returns
    /// `true` if a DMA was executed.
    pub fn check_oam_dma(&mut self) -> bool {
        if let Some(page) = self.ppu.oam_dma {
            let addr = (page as usize) << 8;
            (0..0x100).for_each(|i| {
                let value = self.read_byte(addr + i);
                self.ppu.write_oam(value);
            });
            self.ppu.oam_dma = None;
            return true;
        }
        false
    }

    fn read_immediate(&self, addr: &[u8]) -> u8 {
        addr[0]
    }
    fn read_a(&self, _addr: &[u8]) -> u8 {
        self.cpu.a
    }
    fn write_a(&mut self, _addr: &[u8], value: u8) {
        self.cpu.a = value;
    }
    /// Read a single byte from a zero page address.
    /// ```
    /// let mut nes = famicore::core::Nes::new();
    /// nes.read_zp(&[0x18]);
    /// ```
    pub fn read_zp(&mut self, addr: &[u8]) -> u8 {
        self.read_byte(addr[0] as usize)
    }
    /// Write a single byte to memory using zero page addressing.
    /// ```
    /// let mut nes = famicore::core::Nes::new();
    /// nes.write_zp(&[0x18], 0x29);
    /// assert_eq!(nes.read_zp(&[0x18]), 0x29);
    /// ```
    pub fn write_zp(&mut self, addr: &[u8], val: u8) {
        self.write_byte(addr[0] as usize, val);
    }
    /// Read a single byte using zero page addressing with X register offset.
    /// The offset wraps within page 0.
    pub fn read_zp_x(&mut self, addr: &[u8]) -> u8 {
        self.read_zp_offset(addr[0], self.cpu.x)
    }
    /// Read a single byte using zero page addressing with Y register offset.
    pub fn read_zp_y(&mut self, addr: &[u8]) -> u8 {
        self.read_zp_offset(addr[0], self.cpu.y)
    }
    fn read_zp_offset(&mut self, addr: u8, offset: u8) -> u8 {
        self.read_byte(addr.wrapping_add(offset) as usize)
    }
    /// Write a single byte using zero page addressing with X register offset.
    /// ```
    /// let mut nes = famicore::core::Nes::new();
    /// nes.cpu.x = 0x10;
    /// nes.write_zp_x(&[0x18], 0x05);
    /// assert_eq!(nes.read_zp(&[0x28]), 0x05);
    /// ```
    pub fn write_zp_x(&mut self, addr: &[u8], value: u8) {
        self.write_zp_offset(addr[0], self.cpu.x, value)
    }
    /// Write a single byte using zero page addressing with Y register offset.
    pub fn write_zp_y(&mut self, addr: &[u8], value: u8) {
        self.write_zp_offset(addr[0], self.cpu.y, value)
    }
    fn write_zp_offset(&mut self, addr: u8, offset: u8, value: u8) {
        self.write_byte(addr.wrapping_add(offset) as usize, value)
    }
    // Absolute addressing, little endian
    fn get_absolute_addr_offset(addr: &[u8], offset: u8) -> usize {
        (addr[0] as u16 + ((addr[1] as u16) << 8)).wrapping_add(offset as u16) as usize
    }
    fn get_absolute_addr(addr: &[u8]) -> usize {
        Nes::get_absolute_addr_offset(addr, 0)
    }
    /// Read a single byte from memory using absolute addressing.
    /// ```
    /// let mut nes = famicore::core::Nes::new();
    /// nes.mem[0x0034] = 0x56;
    /// assert_eq!(nes.read_abs(&[0x34, 0x00]), 0x56);
    /// ```
    pub fn read_abs(&mut self, addr: &[u8]) -> u8 {
        self.read_byte(Nes::get_absolute_addr(addr))
    }
    /// Write a single byte to memory using absolute addressing.
    /// ```
    /// let mut nes = famicore::core::Nes::new();
    /// nes.write_abs(&[0x12, 0x00], 0x56);
    /// assert_eq!(nes.mem[0x0012], 0x56);
    /// ```
    pub fn write_abs(&mut self, addr: &[u8], value: u8) {
        self.write_byte(Nes::get_absolute_addr(addr), value)
    }
    // Read using absolute addressing with an offset.
    // A page cross performs a dummy read of the wrong address first.
    fn read_abs_offset(&mut self, addr: &[u8], offset: u8) -> u8 {
        if Nes::page_crossed_abs(addr, offset) {
            self.read_byte(
                (Nes::get_absolute_addr(addr) & 0xFF00)
                    | (Nes::get_absolute_addr_offset(addr, offset) & 0x00FF),
            );
        }
        self.read_byte(Nes::get_absolute_addr_offset(addr, offset))
    }
    fn write_abs_offset(&mut self, addr: &[u8], offset: u8, value: u8) {
        // Dummy read, always performed by stores
        self.read_byte(
            (Nes::get_absolute_addr(addr) & 0xFF00)
                | (Nes::get_absolute_addr_offset(addr, offset) & 0x00FF),
        );
        self.write_byte(Nes::get_absolute_addr_offset(addr, offset), value)
    }
    /// Read a byte from memory using absolute addressing with X offset.
    pub fn read_abs_x(&mut self, addr: &[u8]) -> u8 {
        self.read_abs_offset(addr, self.cpu.x)
    }
    /// Read a byte from memory using absolute addressing with Y offset.
    pub fn read_abs_y(&mut self, addr: &[u8]) -> u8 {
        self.read_abs_offset(addr, self.cpu.y)
    }
    /// Write a byte to memory using absolute addressing with X offset.
    pub fn write_abs_x(&mut self, addr: &[u8], value: u8) {
        self.write_abs_offset(addr, self.cpu.x, value)
    }
    /// Write a byte to memory using absolute addressing with Y offset.
    pub fn write_abs_y(&mut self, addr: &[u8], value: u8) {
        self.write_abs_offset(addr, self.cpu.y, value)
    }
    /// Read a single byte from memory using indexed indirect addressing.
    ///
    /// A 2 byte little endian pointer is read from the zero page at
    /// `addr + X` (wrapping within page 0), and the byte at that pointer is
    /// returned.
    pub fn read_indexed_indirect(&mut self, addr: &[u8]) -> u8 {
        let first_addr = addr[0].wrapping_add(self.cpu.x);
        let second_addr = [
            self.read_byte(first_addr as usize),
            self.read_byte(first_addr.wrapping_add(1) as usize),
        ];
        self.read_abs(&second_addr)
    }
    /// Write a single byte using indexed indirect addressing.
    pub fn write_indexed_indirect(&mut self, addr: &[u8], value: u8) {
        let first_addr = addr[0].wrapping_add(self.cpu.x);
        let second_addr = [
            self.read_byte(first_addr as usize),
            self.read_byte(first_addr.wrapping_add(1) as usize),
        ];
        self.write_abs(&second_addr, value);
    }
    // Resolve an indirect indexed address: a 2 byte pointer read from the
    // zero page, plus the Y register
    fn indirect_indexed_addr(&mut self, addr: &[u8]) -> usize {
        let first_addr = addr[0];
        (self.read_byte(first_addr as usize) as u16
            + ((self.read_byte(first_addr.wrapping_add(1) as usize) as u16) << 8))
            .wrapping_add(self.cpu.y as u16) as usize
    }
    /// Read a single byte from memory using indirect indexed addressing.
    pub fn read_indirect_indexed(&mut self, addr: &[u8]) -> u8 {
        let addr = self.indirect_indexed_addr(addr);
        self.read_byte(addr)
    }
    /// Write a single byte to memory using indirect indexed addressing.
    /// ```
    /// let mut nes = famicore::core::Nes::new();
    /// nes.write_indirect_indexed(&[0x12], 0x34);
    /// assert_eq!(nes.read_indirect_indexed(&[0x12]), 0x34);
    /// ```
    pub fn write_indirect_indexed(&mut self, addr: &[u8], value: u8) {
        let addr = self.indirect_indexed_addr(addr);
        self.write_byte(addr, value)
    }
    // Whether an absolute address with offset crosses a 256-byte page
    fn page_crossed_abs(addr: &[u8], offset: u8) -> bool {
        255 - addr[0] < offset
    }
    fn pc_x(&self, addr: &[u8]) -> bool {
        Nes::page_crossed_abs(addr, self.cpu.x)
    }
    fn pc_y(&self, addr: &[u8]) -> bool {
        Nes::page_crossed_abs(addr, self.cpu.y)
    }
    // Whether an indirect indexed access crosses a 256-byte page
    fn pc_ind(&mut self, addr: &[u8]) -> bool {
        let low = self.read_zp(addr);
        255 - low < self.cpu.y
    }
    fn push_to_stack(&mut self, v: u8) {
        self.write_byte(0x100 + self.cpu.s_p as usize, v);
        self.cpu.s_p = self.cpu.s_p.wrapping_sub(1);
    }
    fn pull_from_stack(&mut self) -> u8 {
        self.cpu.s_p = self.cpu.s_p.wrapping_add(1);
        self.mem[0x100 + self.cpu.s_p as usize]
    }
    fn push_to_stack_u16(&mut self, v: u16) {
        self.push_to_stack((v >> 8) as u8);
        self.push_to_stack((v & 0xFF) as u8);
    }
    fn pull_from_stack_u16(&mut self) -> u16 {
        (self.pull_from_stack() as u16) + ((self.pull_from_stack() as u16) << 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;

    #[test]
    fn test_ram_is_mirrored() {
        let mut nes = Nes::new();
        nes.write_byte(0x0123, 0xAB);
        assert_eq_hex!(nes.read_byte(0x0923), 0xAB);
        assert_eq_hex!(nes.read_byte(0x1923), 0xAB);
    }
    #[test]
    fn test_stack_round_trip() {
        let mut nes = Nes::new();
        nes.push_to_stack_u16(0x1234);
        assert_eq_hex!(nes.pull_from_stack_u16(), 0x1234);
        assert_eq_hex!(nes.cpu.s_p, 0xFD);
    }
    #[test]
    fn test_absent_cartridge_reads_open_bus() {
        let mut nes = Nes::new();
        assert_eq_hex!(nes.read_byte(0x8000), crate::core::OPEN_BUS);
        assert_eq_hex!(nes.read_byte(0xFFFF), crate::core::OPEN_BUS);
    }
    #[test]
    fn test_controller_reads_through_bus() {
        let mut nes = Nes::new();
        nes.set_controller_state(
            0,
            Controller {
                a: true,
                ..Controller::default()
            },
        );
        nes.write_byte(0x4016, 1);
        nes.write_byte(0x4016, 0);
        assert_eq!(nes.read_byte(0x4016) & 0x01, 1);
        assert_eq!(nes.read_byte(0x4016) & 0x01, 0);
    }
    #[test]
    fn test_unknown_opcode_is_a_nop() {
        let mut nes = Nes::new();
        // 0x02 is a JAM encoding with no stable behaviour
        assert_eq!(nes.decode_and_execute(&[0x02]), (1, 2));
    }
    #[test]
    fn test_branch_page_cross_cycles() {
        let mut nes = Nes::new();
        nes.cpu.p_c = 0x00F0;
        // Branch within the page
        assert_eq!(nes.decode_and_execute(&[BNE, 0x02]), (2, 3));
        nes.cpu.p_c = 0x00F0;
        // Branch across the page boundary
        assert_eq!(nes.decode_and_execute(&[BNE, 0x7F]), (2, 4));
    }
    #[test]
    fn test_oam_dma_copies_a_page() {
        let mut nes = Nes::new();
        (0..0x100).for_each(|i| nes.mem[0x0200 + i] = i as u8);
        nes.write_byte(0x4014, 0x02);
        assert!(nes.check_oam_dma());
        (0..0x100).for_each(|i| assert_eq_hex!(nes.ppu.oam[i], i as u8));
        assert!(!nes.check_oam_dma());
    }
}
