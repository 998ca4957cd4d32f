pub mod generate;
pub mod index;
pub mod params;
pub mod sessions;
pub mod upload;
