//! Implementations of the supported cartridge mappers.
//! See [Mapper][super::Mapper].
mod nrom;
pub use nrom::NRom;
mod sxrom;
pub use sxrom::SxRom;
mod uxrom;
pub use uxrom::UxRom;
mod cnrom;
pub use cnrom::CnRom;
