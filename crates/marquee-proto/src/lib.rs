pub mod config;
pub mod error;
pub mod marquee;
pub mod platform;
pub mod protocol;
pub mod scroll;
pub mod transit;
