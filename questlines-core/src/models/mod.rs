mod dependency;
mod objective;
mod quest;
mod questline;

pub use dependency::*;
pub use objective::*;
pub use quest::*;
pub use questline::*;
