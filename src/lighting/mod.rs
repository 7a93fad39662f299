pub mod color;
pub mod command;
pub mod device;
pub mod mapper;
pub mod settings;
