//! 播放模块
//!
//! ORP切分、逐词时长、单次定时器以及驱动它们的播放状态机。

pub mod engine;
pub mod orp;
pub mod timer;
pub mod timing;

pub use engine::{Command, CommandOutcome, ContextWindow, Phase, PlaybackEngine, ProgressSink};
pub use orp::{OrpSplit, orp_index};
pub use timer::{PendingTimer, Scheduler, SingleShotTimer, TimerId};
pub use timing::{LengthTier, TimingProfile, base_interval_ms, delay_multiplier};
