use std::collections::VecDeque;

use log::*;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use crate::core::{
    Cartridge, Settings, DEBUG_PALETTE, PALETTE, SCREEN_HEIGHT, SCREEN_WIDTH,
};

/// Number of dots per scanline
const DOTS_PER_SCANLINE: u32 = 341;
/// Number of scanlines per frame
const SCANLINES_PER_FRAME: u32 = 262;
/// Index of the prerender scanline
const PRERENDER_SCANLINE: u32 = SCANLINES_PER_FRAME - 1;
/// Number of visible scanlines
const RENDER_SCANLINES: u32 = 240;
/// Visible dots per scanline
const RENDER_DOTS: u32 = 256;

fn zeros() -> Box<[[u8; SCREEN_WIDTH]; SCREEN_HEIGHT]> {
    Box::new([[0; SCREEN_WIDTH]; SCREEN_HEIGHT])
}

/// One rendered picture, as a 256x240 grid of palette values.
///
/// Each pixel is the 6-bit hue/value byte the console outputs. The mask bits
/// in effect when the frame was drawn (greyscale and colour emphasis) are
/// kept alongside so [FrameBuffer::rgb_at] and [FrameBuffer::write_rgba] can
/// apply them during conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameBuffer {
    #[serde(skip, default = "zeros")]
    pixels: Box<[[u8; SCREEN_WIDTH]; SCREEN_HEIGHT]>,
    mask: u8,
}

impl Default for FrameBuffer {
    fn default() -> FrameBuffer {
        FrameBuffer {
            pixels: zeros(),
            mask: 0,
        }
    }
}

impl FrameBuffer {
    /// The raw palette value of the pixel at `(x, y)`
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        self.pixels[y][x]
    }
    /// The pixel at `(x, y)` as an RGB triplet, with greyscale and emphasis
    /// applied
    pub fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        let mut index = self.pixels[y][x] as usize;
        if self.mask & 0x01 != 0 {
            // Greyscale only keeps the value column
            index &= 0x30;
        }
        let v = PALETTE[index % PALETTE.len()];
        if self.mask & 0xE0 == 0 {
            return v;
        }
        // Colour emphasis dims the other two channels
        const M: f32 = 0.5;
        let red = self.mask & 0x20 != 0;
        let green = self.mask & 0x40 != 0;
        let blue = self.mask & 0x80 != 0;
        let should_dim = [green || blue, red || blue, red || green];
        core::array::from_fn(|i| (v[i] as f32 * if should_dim[i] { M } else { 1.0 }).floor() as u8)
    }
    /// Copy the picture into `buf` as RGBA bytes, row by row.
    /// `buf` must hold at least 256x240x4 bytes.
    pub fn write_rgba(&self, buf: &mut [u8]) {
        (0..SCREEN_HEIGHT).for_each(|y| {
            (0..SCREEN_WIDTH).for_each(|x| {
                let rgb = self.rgb_at(x, y);
                let i = 4 * (y * SCREEN_WIDTH + x);
                buf[i..i + 3].copy_from_slice(&rgb);
                buf[i + 3] = 0xFF;
            })
        });
    }
}

#[derive(Debug, Serialize, Deserialize)]
/// The picture processing unit of the NES.
///
/// Walks the 341x262 dot grid 3 dots per CPU cycle, fetching background
/// tiles into a shift buffer and compositing them with the sprites fetched
/// for each scanline. The finished picture is available as a [FrameBuffer]
/// through [Ppu::frame].
pub struct Ppu {
    /// The object attribute memory, 4 bytes per sprite
    #[serde(with = "BigArray")]
    pub oam: [u8; 0x100],
    /// The PPUCTRL register
    pub ctrl: u8,
    /// The PPUMASK register
    pub mask: u8,
    /// The PPUSTATUS register
    pub status: u8,
    /// The OAMADDR register
    pub oam_addr: u8,
    /// The PPUDATA read buffer
    pub data: u8,
    /// Set when OAMDMA is written to, taken by the bus when the DMA runs
    pub oam_dma: Option<u8>,
    pub palette_ram: [u8; 0x20],
    #[serde(with = "BigArray")]
    pub nametable_ram: [u8; 0x800],
    // Write toggle shared by PPUSCROLL and PPUADDR, false = first write
    w: bool,
    // (x, y) coordinate of the dot being processed
    pub dot: (u32, u32),
    // t register (the shared scroll/address latch)
    t: u32,
    // v register
    v: u32,
    // Fine X scroll
    x: u32,
    // Sprite pixels fetched for the scanline being drawn.
    // Each entry is (sprite index, palette value, behind background)
    #[serde(with = "BigArray")]
    scanline_sprites: [Option<(usize, u8, bool)>; 256],
    #[serde(skip)]
    frame: FrameBuffer,
    // Last value driven onto the register bus, answered by write-only reads
    open_bus: u8,
    // The two 16-bit tile shift registers and the attribute shift register,
    // as (pattern index, palette index) pairs
    tile_buffer: VecDeque<(usize, usize)>,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Initialise a new PPU, with all memory zeroed and the dot position at
    /// the top left of the screen.
    pub fn new() -> Ppu {
        Ppu {
            oam: [0; 0x100],
            ctrl: 0x00,
            mask: 0,
            status: 0xA0,
            oam_addr: 0,
            data: 0,
            oam_dma: None,
            palette_ram: [0; 0x20],
            nametable_ram: [0; 0x800],
            w: false,
            dot: (0, 0),
            t: 0,
            v: 0,
            x: 0,
            scanline_sprites: [None; 256],
            frame: FrameBuffer::default(),
            open_bus: 0,
            tile_buffer: VecDeque::from([(0, 0); 16]),
        }
    }
    /// The last completed picture
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }
    /// Read a byte from the PPU registers given an address in CPU space.
    ///
    /// Reading PPUSTATUS clears the vblank flag and the shared write toggle.
    pub fn read_byte(&mut self, addr: usize, cartridge: &Cartridge) -> u8 {
        match addr % 8 {
            2 => {
                let status = self.status;
                self.status &= 0x7F;
                self.w = false;
                (status & 0xE0) | (self.open_bus & 0x1F)
            }
            4 => {
                // The attribute byte's unused bits read back as 0
                let v = self.oam[self.oam_addr as usize % self.oam.len()]
                    & if self.oam_addr % 4 == 2 { 0xE3 } else { 0xFF };
                self.open_bus = v;
                v
            }
            7 => {
                let v = self.read_vram(cartridge);
                self.open_bus = v;
                v
            }
            _ => self.open_bus,
        }
    }
    /// Write a byte to the PPU registers given an address in CPU space
    pub fn write_byte(&mut self, addr: usize, value: u8, cartridge: &mut Cartridge) {
        self.open_bus = value;
        match addr % 8 {
            // PPUCTRL
            0 => {
                self.ctrl = value;
                self.t = (self.t & !0x0C00) | (((value & 0x03) as u32) << 10);
            }
            // PPUMASK
            1 => self.mask = value,
            // PPUSTATUS is read only
            2 => {}
            // OAMADDR
            3 => self.oam_addr = value,
            // OAMDATA
            4 => self.write_oam(value),
            // PPUSCROLL
            5 => {
                if self.w {
                    // Second write (Y)
                    self.t = (self.t & 0x0C1F)
                        | (((value & 0x07) as u32) << 12)
                        | (((value & 0x0F8) as u32) << 2);
                } else {
                    // First write (X)
                    self.t = (self.t & !0x1F) | (value >> 3) as u32;
                    self.x = (value & 0x07) as u32;
                }
                self.w = !self.w;
            }
            // PPUADDR
            6 => {
                if self.w {
                    // Second write (LSB)
                    self.t = (self.t & 0xFF00) | value as u32;
                    self.v = self.t;
                } else {
                    // First write (MSB)
                    self.t = (self.t & 0x00FF) | (value as u32 & 0x3F) << 8;
                }
                self.w = !self.w;
            }
            // PPUDATA
            7 => self.write_vram(value, cartridge),
            _ => unreachable!(),
        }
    }
    /// Write a single byte to OAM at OAMADDR.
    /// Increments OAMADDR after writing.
    pub fn write_oam(&mut self, value: u8) {
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    // Fetch up to 8 sprites intersecting the next scanline into the
    // secondary buffer. A 9th match only sets the overflow flag.
    fn refresh_scanline_sprites(
        &mut self,
        scanline: u32,
        cartridge: &Cartridge,
        settings: &Settings,
    ) {
        self.scanline_sprites = [None; 256];
        let sprite_height = if self.is_8x16_sprites() { 16 } else { 8 };
        let objs: Vec<usize> = self
            .oam
            .chunks(4)
            .enumerate()
            .filter(|(_i, obj)| {
                (obj[0] as u32) <= scanline && obj[0] as u32 + sprite_height > scanline
            })
            .map(|(i, _obj)| i)
            .collect();
        if objs.len() > 8 {
            self.status |= 0x20;
        }
        objs.iter()
            .take(if settings.scanline_sprite_limit { 8 } else { 64 })
            .for_each(|i| {
                let obj = &self.oam[(4 * i)..(4 * i + 4)];
                let flip_hor = (obj[2] & 0x40) != 0;
                let flip_vert = (obj[2] & 0x80) != 0;
                let behind = (obj[2] & 0x20) != 0;
                let palette_index = 16 + 4 * (obj[2] & 0x03) as usize;
                let y_off = if flip_vert {
                    (sprite_height - 1 - (scanline - (obj[0] as u32))) as usize
                } else {
                    (scanline - (obj[0] as u32)) as usize
                };
                let tile_addr = if self.is_8x16_sprites() {
                    0x1000 * (obj[1] & 0x01) as usize
                        + 16 * (obj[1] & 0xFE) as usize
                        + if y_off > 7 { 16 + y_off % 8 } else { y_off }
                } else {
                    self.spr_pattern_table_addr() + 16 * obj[1] as usize + y_off
                };
                let mut tile_low = cartridge.read_ppu(tile_addr) as usize;
                // Shifted left by one so combining with tile_low is simply
                // (tile_high & 0x02) + (tile_low & 0x01)
                let mut tile_high = (cartridge.read_ppu(tile_addr + 8) as usize) << 1;
                let palette = if settings.use_debug_palette {
                    &DEBUG_PALETTE
                } else {
                    &self.palette_ram
                };
                (0..8).for_each(|j| {
                    let pixel_index = (tile_low & 0x01) + (tile_high & 0x02);
                    let x = obj[3] as usize + if flip_hor { j } else { 7 - j };
                    if pixel_index != 0 && x < 256 {
                        self.scanline_sprites[x].get_or_insert((
                            *i,
                            palette[palette_index + pixel_index],
                            behind,
                        ));
                    }
                    tile_low >>= 1;
                    tile_high >>= 1;
                })
            });
    }
    /// Advance the PPU a certain number of dots, writing a new pixel of
    /// output for every visible dot processed.
    ///
    /// Returns `true` if vblank began, which raises an NMI when enabled.
    pub fn advance_dots(&mut self, dots: u32, cartridge: &Cartridge, settings: &Settings) -> bool {
        let mut vblank_started = false;
        (0..dots).for_each(|_| {
            self.dot = if self.dot.0 == DOTS_PER_SCANLINE - 1 {
                if self.dot.1 == SCANLINES_PER_FRAME - 1 {
                    (0, 0)
                } else {
                    (0, self.dot.1 + 1)
                }
            } else {
                (self.dot.0 + 1, self.dot.1)
            };
            self.set_output(settings);
            if self.is_rendering_enabled() {
                if self.dot == (280, PRERENDER_SCANLINE) {
                    // Copy the vertical components from T to V
                    self.v = (self.v & 0x041F) | (self.t & !0x041F);
                }
                if self.dot.1 < RENDER_SCANLINES || self.dot.1 == PRERENDER_SCANLINE {
                    // Sprites are fetched after the visible dots, to be
                    // drawn on the next scanline
                    if self.dot.0 == 264 {
                        self.refresh_scanline_sprites(self.dot.1, cartridge, settings);
                    }
                    // Tile fetches finish every 8 dots, plus two fetches at
                    // the end of the line for the next line's first tiles
                    if (self.dot.0 < 256 && self.dot.0 % 8 == 7)
                        || [328, 336].contains(&self.dot.0)
                    {
                        self.read_tile_to_buffer(cartridge);
                        self.coarse_x_inc();
                    }
                    if self.dot.0 == 256 {
                        self.fine_y_inc();
                        // Copy the horizontal components from T to V
                        self.v = (self.v & !0x41F) | (self.t & 0x41F);
                    }
                }
            }
            if self.dot == (1, RENDER_SCANLINES + 1) {
                self.status |= 0x80;
                self.frame.mask = self.mask;
                vblank_started = true;
            } else if self.dot == (1, PRERENDER_SCANLINE) {
                // Clear vblank, sprite overflow and sprite 0 hit
                self.status &= 0x1F;
            }
        });
        vblank_started
    }
    /// Compute the output pixel at the current dot
    fn set_output(&mut self, settings: &Settings) {
        if self.dot.0 < RENDER_DOTS && self.dot.1 < RENDER_SCANLINES {
            let palette = if settings.use_debug_palette {
                &DEBUG_PALETTE
            } else {
                &self.palette_ram
            };
            // Initially set output to the background
            let mut output = if self.is_background_rendering_enabled()
                && !(self.dot.0 < 8 && self.background_left_clipping())
            {
                let (index, palette_index) = match self.tile_buffer.get(self.x as usize) {
                    Some(t) => *t,
                    None => {
                        error!(
                            "Tile buffer is too small (len={:}, fine x={:}, dot={:?})",
                            self.tile_buffer.len(),
                            self.x,
                            self.dot
                        );
                        (0, 0)
                    }
                };
                if index == 0 {
                    None
                } else {
                    Some(palette[4 * palette_index + index])
                }
            } else {
                None
            };
            // Composite the sprite pixel over or under it
            if self.is_sprite_rendering_enabled()
                && !(self.dot.0 < 8 && self.sprite_left_clipping())
            {
                if let Some((j, p, behind)) = self.scanline_sprites[self.dot.0 as usize] {
                    // Sprite 0 opacity against the background sets the hit flag
                    if !self.sprite_zero_hit()
                        && j == 0
                        && output.is_some()
                        && self.dot.1 > 0
                        && self.dot.0 < 255
                    {
                        self.status |= 0x40;
                    }
                    if !behind || output.is_none() || settings.always_sprites_on_top {
                        output = Some(p);
                    }
                }
            }
            // Transparent pixels fall through to the universal background
            self.frame.pixels[self.dot.1 as usize][self.dot.0 as usize] =
                output.unwrap_or(self.palette_ram[0]);
        }
        // Shift the tile and attribute registers
        if self.dot.0 < 337 {
            self.tile_buffer.pop_front();
            self.tile_buffer.push_back((0, 0));
        }
    }

    fn read_tile_to_buffer(&mut self, cartridge: &Cartridge) {
        // Nametable byte
        let nt_addr = cartridge.nametable_offset(0x2000 + (self.v as usize & 0x0FFF));
        let nt_num = self.nametable_ram[nt_addr] as usize;
        // Attribute byte
        let palette_byte_addr = cartridge.nametable_offset(
            (0x23C0 + (self.v & 0xC00) + ((self.v >> 4) & 0x38) + ((self.v >> 2) & 0x07)) as usize,
        );
        let palette_byte = self.nametable_ram[palette_byte_addr];
        let palette_shift = ((self.v & 0x40) >> 4) + (self.v & 0x02);
        let palette_index = ((palette_byte >> palette_shift) as usize) & 0x03;
        // Low and high pattern bytes
        let fine_y = ((self.v & 0x7000) >> 12) as usize;
        let tile_low =
            cartridge.read_ppu(self.background_pattern_table_addr() + 16 * nt_num + fine_y)
                as usize;
        // Shifted left by one, see refresh_scanline_sprites
        let tile_high = (cartridge
            .read_ppu(self.background_pattern_table_addr() + 16 * nt_num + 8 + fine_y)
            as usize)
            << 1;
        // Fill the last 8 entries of the shift register
        self.tile_buffer.truncate(8);
        (0..8).for_each(|i| {
            self.tile_buffer.push_back((
                ((tile_low >> (7 - i)) & 0x01) + ((tile_high >> (7 - i)) & 0x02),
                palette_index,
            ))
        });
    }

    // Coarse X increment on V, wrapping at 32 into the next horizontal
    // nametable
    fn coarse_x_inc(&mut self) {
        self.v = if self.v & 0x1F == 0x1F {
            self.v ^ 0x41F
        } else {
            self.v + 1
        };
    }
    // Fine Y increment on V. Coarse Y wraps at 30 (the valid rows) into the
    // next vertical nametable; a coarse Y of 31 wraps without toggling.
    fn fine_y_inc(&mut self) {
        self.v = if self.v & 0x7000 == 0x7000 {
            if self.v & 0x3E0 == 0x3A0 {
                self.v ^ (0x800 + 0x3A0 + 0x7000)
            } else if self.v & 0x3E0 == 0x3E0 {
                self.v ^ (0x7000 | 0x3E0)
            } else {
                self.v - 0x7000 + 0x20
            }
        } else {
            self.v + 0x1000
        };
    }
    /// Whether the PPU is currently in vblank
    pub fn in_vblank(&self) -> bool {
        self.dot.1 >= RENDER_SCANLINES
    }
    /// Whether the CPU can access VRAM without corrupting rendering
    pub fn can_access_vram(&self) -> bool {
        self.in_vblank() || !self.is_rendering_enabled()
    }
    /// Write a single byte to VRAM at the current v register, incrementing
    /// it by 1 or 32 depending on PPUCTRL
    fn write_vram(&mut self, value: u8, cartridge: &mut Cartridge) {
        let addr = self.v as usize & 0x3FFF;
        if addr < 0x2000 {
            cartridge.write_ppu(addr, value);
        } else if addr < 0x3F00 {
            self.nametable_ram[cartridge.nametable_offset(addr)] = value;
        } else {
            self.palette_ram[Ppu::palette_index(addr)] = value;
        }
        if self.can_access_vram() {
            self.inc_addr();
        } else {
            // Writing during rendering only bumps the scroll components
            self.coarse_x_inc();
            self.fine_y_inc();
        }
    }

    /// Read a single byte from VRAM at the current v register.
    /// Pattern and nametable space reads go through the read buffer;
    /// palette reads are direct but still update the buffer.
    fn read_vram(&mut self, cartridge: &Cartridge) -> u8 {
        let addr = self.v as usize & 0x3FFF;
        if self.can_access_vram() {
            self.inc_addr();
        } else {
            self.coarse_x_inc();
            self.fine_y_inc();
        }
        if addr < 0x2000 {
            let b = self.data;
            self.data = cartridge.read_ppu(addr);
            return b;
        }
        if addr < 0x3F00 {
            let b = self.data;
            self.data = self.nametable_ram[cartridge.nametable_offset(addr)];
            return b;
        }
        let b = (self.open_bus & 0xC0) | (self.palette_ram[Ppu::palette_index(addr)] & 0x3F);
        // The buffer still picks up the mirrored nametable byte underneath
        self.data = self.nametable_ram[cartridge.nametable_offset(addr)];
        b
    }

    fn palette_index(addr: usize) -> usize {
        // The 0th (transparent) colors are shared between background and
        // sprite palettes
        if addr % 4 == 0 {
            addr % 0x10
        } else {
            addr % 0x20
        }
    }

    fn inc_addr(&mut self) {
        // V is 14 bits wide
        self.v = (self.v + if self.ctrl & 0x04 == 0 { 1 } else { 32 }) % 0x4000;
    }
    /// Whether the console is in 8x16 sprite mode
    pub fn is_8x16_sprites(&self) -> bool {
        (self.ctrl & 0x20) != 0
    }
    pub fn is_sprite_rendering_enabled(&self) -> bool {
        (self.mask & 0x10) != 0
    }
    pub fn is_background_rendering_enabled(&self) -> bool {
        (self.mask & 0x08) != 0
    }
    pub fn is_rendering_enabled(&self) -> bool {
        self.is_background_rendering_enabled() || self.is_sprite_rendering_enabled()
    }
    /// Whether sprites are hidden in the 8 leftmost pixels
    pub fn sprite_left_clipping(&self) -> bool {
        (self.mask & 0x04) == 0
    }
    /// Whether the background is hidden in the 8 leftmost pixels
    pub fn background_left_clipping(&self) -> bool {
        (self.mask & 0x02) == 0
    }
    /// The address in PPU memory space of the sprite pattern data
    pub fn spr_pattern_table_addr(&self) -> usize {
        if self.ctrl & 0x08 != 0 {
            return 0x1000;
        }
        0x0000
    }
    /// The address in PPU memory space of the background pattern data
    pub fn background_pattern_table_addr(&self) -> usize {
        if self.ctrl & 0x10 != 0 {
            return 0x1000;
        }
        0x0000
    }
    /// Whether the NMI on vblank is enabled
    pub fn get_nmi_enabled(&self) -> bool {
        self.ctrl & 0x80 != 0
    }
    pub fn sprite_zero_hit(&self) -> bool {
        (self.status & 0x40) != 0
    }
    pub fn sprite_overflow(&self) -> bool {
        (self.status & 0x20) != 0
    }
    /// The index of the scanline currently being drawn, in [0, 261]
    pub fn scanline(&self) -> u32 {
        self.dot.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;

    #[test]
    fn test_status_read_clears_vblank_and_toggle() {
        let mut ppu = Ppu::new();
        let cart = Cartridge::default();
        ppu.status = 0x80;
        // First scroll write sets the toggle
        ppu.write_byte(0x2005, 0x10, &mut Cartridge::default());
        assert!(ppu.w);
        let status = ppu.read_byte(0x2002, &cart);
        assert_eq_hex!(status & 0x80, 0x80);
        assert!(!ppu.w);
        // Second read sees vblank cleared
        assert_eq_hex!(ppu.read_byte(0x2002, &cart) & 0x80, 0x00);
    }
    #[test]
    fn test_scroll_latch() {
        let mut ppu = Ppu::new();
        let mut cart = Cartridge::default();
        // X = 0b01111_101, Y = 0b10110_010
        ppu.write_byte(0x2005, 0x7D, &mut cart);
        assert_eq_hex!(ppu.t & 0x1F, 0x0F);
        assert_eq_hex!(ppu.x, 0x05);
        ppu.write_byte(0x2005, 0xB2, &mut cart);
        assert_eq_hex!((ppu.t >> 12) & 0x07, 0x02);
        assert_eq_hex!((ppu.t >> 5) & 0x1F, 0x16);
        assert!(!ppu.w);
    }
    #[test]
    fn test_addr_latch_copies_to_v() {
        let mut ppu = Ppu::new();
        let mut cart = Cartridge::default();
        ppu.write_byte(0x2006, 0x23, &mut cart);
        assert_eq_hex!(ppu.v, 0x00);
        ppu.write_byte(0x2006, 0xC5, &mut cart);
        assert_eq_hex!(ppu.v, 0x23C5);
    }
    #[test]
    fn test_coarse_x_wraps_into_next_nametable() {
        let mut ppu = Ppu::new();
        ppu.v = 0x001F;
        ppu.coarse_x_inc();
        assert_eq_hex!(ppu.v, 0x0400);
        ppu.coarse_x_inc();
        assert_eq_hex!(ppu.v, 0x0401);
    }
    #[test]
    fn test_coarse_y_wraps_at_30() {
        let mut ppu = Ppu::new();
        // Fine Y = 7, coarse Y = 29
        ppu.v = 0x7000 | (29 << 5);
        ppu.fine_y_inc();
        // Toggles the vertical nametable and resets coarse Y
        assert_eq_hex!(ppu.v, 0x0800);
    }
    #[test]
    fn test_coarse_y_31_wraps_without_toggle() {
        let mut ppu = Ppu::new();
        ppu.v = 0x7000 | (31 << 5);
        ppu.fine_y_inc();
        assert_eq_hex!(ppu.v, 0x0000);
    }
    #[test]
    fn test_oam_data_read_masks_attribute_bits() {
        let mut ppu = Ppu::new();
        let cart = Cartridge::default();
        ppu.oam[2] = 0xFF;
        ppu.oam_addr = 2;
        assert_eq_hex!(ppu.read_byte(0x2004, &cart), 0xE3);
    }
    #[test]
    fn test_data_reads_are_buffered() {
        let mut ppu = Ppu::new();
        let mut cart = Cartridge::default();
        // Write two bytes to the first nametable
        ppu.write_byte(0x2006, 0x20, &mut cart);
        ppu.write_byte(0x2006, 0x00, &mut cart);
        ppu.write_byte(0x2007, 0xAB, &mut cart);
        ppu.write_byte(0x2007, 0xCD, &mut cart);
        ppu.write_byte(0x2006, 0x20, &mut cart);
        ppu.write_byte(0x2006, 0x00, &mut cart);
        // First read returns the stale buffer
        ppu.read_byte(0x2007, &cart);
        assert_eq_hex!(ppu.read_byte(0x2007, &cart), 0xAB);
        assert_eq_hex!(ppu.read_byte(0x2007, &cart), 0xCD);
    }
    #[test]
    fn test_palette_mirrors_universal_background() {
        let mut ppu = Ppu::new();
        let mut cart = Cartridge::default();
        ppu.write_byte(0x2006, 0x3F, &mut cart);
        ppu.write_byte(0x2006, 0x10, &mut cart);
        ppu.write_byte(0x2007, 0x21, &mut cart);
        // 3F10 aliases 3F00
        assert_eq_hex!(ppu.palette_ram[0], 0x21);
    }
    #[test]
    fn test_palette_reads_are_direct() {
        let mut ppu = Ppu::new();
        let mut cart = Cartridge::default();
        ppu.write_byte(0x2006, 0x3F, &mut cart);
        ppu.write_byte(0x2006, 0x01, &mut cart);
        ppu.write_byte(0x2007, 0x2A, &mut cart);
        ppu.write_byte(0x2006, 0x3F, &mut cart);
        ppu.write_byte(0x2006, 0x01, &mut cart);
        assert_eq_hex!(ppu.read_byte(0x2007, &cart) & 0x3F, 0x2A);
    }
    #[test]
    fn test_greyscale_rgb_conversion() {
        let mut frame = FrameBuffer::default();
        frame.pixels[0][0] = 0x16;
        frame.mask = 0x01;
        assert_eq!(frame.rgb_at(0, 0), PALETTE[0x10]);
    }
}
