//! Download the ROMs listed in a DAT file from Myrient.

pub mod console;
pub mod dat;
pub mod download;
pub mod job;
pub mod listing;
pub mod myrient;
pub mod plan;
pub mod select;
pub mod text;

pub use console::init_logging;
