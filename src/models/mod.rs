pub mod render;
pub mod secret;
