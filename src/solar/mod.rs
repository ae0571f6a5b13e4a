pub mod animation;
pub mod body;
pub mod orbit;
pub mod planet;
pub mod starfield;
pub mod state;
pub mod system;
pub mod visibility;
