pub mod acp;
pub mod blitter;
pub mod cartridge;
pub mod gamepad;
pub mod main_bus;
pub mod palette;
pub mod system_control;
