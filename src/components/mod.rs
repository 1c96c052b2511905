//! Engine state: layer stack, action history and brush/palette.

pub mod colors;
pub mod history;
pub mod layers;
