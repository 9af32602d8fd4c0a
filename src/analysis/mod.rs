//! Analysis over collected answers: summaries, sector coding and channel rendering.

mod channels;
mod coding;
mod summary;

pub use channels::*;
pub use coding::*;
pub use summary::*;
