pub mod channels;
pub mod config;
pub mod render;
pub mod send;
