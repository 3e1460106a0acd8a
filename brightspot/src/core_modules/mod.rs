pub mod annotator;
pub mod decoder;
pub mod error;
pub mod intensity;
pub mod persistor;
pub mod pixel_grid;
pub mod record;
