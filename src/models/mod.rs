pub mod image;
pub mod request;
pub mod state;
pub mod suggestions;

pub use image::*;
pub use request::*;
pub use state::*;
pub use suggestions::*;
