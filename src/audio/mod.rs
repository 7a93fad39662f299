pub mod analysis;
pub mod beats;
pub mod decode;
pub mod features;
pub mod mood;
pub mod spectrum;
