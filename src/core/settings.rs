/// Settings for how to run the emulator.
///
/// Contains fields that change the visual output of the PPU, and a few that
/// change power-on behaviour.
#[derive(Copy, Clone, Debug)]
pub struct Settings {
    /// Fill work RAM with random bytes on power-on, mimicking uninitialised
    /// DRAM on a real console. Some games use leftover RAM contents as an
    /// entropy source.
    pub randomize_ram: bool,
    /// Debugging palette override, assigns each palette a unique colour to
    /// quickly show which tiles are using which palettes.
    pub use_debug_palette: bool,
    /// Whether to limit each scanline to rendering at most 8 sprites.
    /// The sprite overflow flag is set either way, this is only visual.
    pub scanline_sprite_limit: bool,
    /// Whether to always draw sprites on top of the background
    pub always_sprites_on_top: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            randomize_ram: false,
            use_debug_palette: false,
            scanline_sprite_limit: true,
            always_sprites_on_top: false,
        }
    }
}
