pub mod interval;
pub mod levels;
pub mod record;

pub use interval::{Feature, Interval, ScoredInterval, SimScore};
pub use record::{AgeBin, Category, Direction, HostAgeCat, ObsSim, ScoreRecord};
