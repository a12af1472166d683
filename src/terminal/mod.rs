pub mod events;
pub mod prompt;
pub mod raw;
pub mod render;
