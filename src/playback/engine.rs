//! 播放状态机
//!
//! 持有不可变的词序列与当前位置，处理用户命令与定时器回调。每次状态变化都会
//! 先取消待触发的定时器，再按当前词的显示时长重新设置。

use crate::config::PlaybackConfig;
use crate::playback::orp::OrpSplit;
use crate::playback::timer::{Scheduler, TimerId};
use crate::playback::timing::TimingProfile;

/// 播放阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 没有加载文本
    Idle,
    /// 已加载，尚未开始播放
    Ready,
    Playing,
    Paused,
    /// 播放中到达最后一个词，等同于停在最后位置的暂停
    Finished,
}

/// 用户命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePlay,
    StepForward,
    StepBack,
    /// 调整速度，结果限制在配置范围内
    AdjustWpm(i32),
    Reset,
    ToggleContext,
    ToggleVariableTiming,
    /// 离开阅读界面
    GoBack,
    /// 跳转到指定词
    Seek(usize),
}

/// 命令处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
}

/// 阅读位置的持久化出口
pub trait ProgressSink {
    /// 当前位置发生变化时调用
    fn checkpoint(&mut self, index: usize);
}

impl ProgressSink for () {
    fn checkpoint(&mut self, _index: usize) {}
}

impl ProgressSink for Vec<usize> {
    fn checkpoint(&mut self, index: usize) {
        self.push(index);
    }
}

/// 上下文视图：当前词及其前后若干词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow<'a> {
    pub before: &'a [String],
    pub current: &'a str,
    pub after: &'a [String],
}

/// 播放引擎
pub struct PlaybackEngine<T: Scheduler, P: ProgressSink> {
    words: Vec<String>,
    current_index: usize,
    is_playing: bool,
    started: bool,
    finished: bool,
    wpm: u32,
    variable_timing: bool,
    show_context: bool,
    settings: PlaybackConfig,
    timing: TimingProfile,
    scheduler: T,
    pending: Option<TimerId>,
    sink: P,
}

impl<T: Scheduler, P: ProgressSink> PlaybackEngine<T, P> {
    /// 创建引擎
    ///
    /// `start_index` 会被限制在有效范围内；`wpm` 为 `None` 时使用配置中的默认速度。
    pub fn new(
        words: Vec<String>,
        start_index: usize,
        wpm: Option<u32>,
        settings: PlaybackConfig,
        timing: TimingProfile,
        scheduler: T,
        sink: P,
    ) -> Self {
        let wpm = settings.clamp_wpm(i64::from(wpm.unwrap_or(settings.default_wpm)));
        let current_index = start_index.min(words.len().saturating_sub(1));

        Self {
            words,
            current_index,
            is_playing: false,
            started: false,
            finished: false,
            wpm,
            variable_timing: settings.variable_timing,
            show_context: false,
            settings,
            timing,
            scheduler,
            pending: None,
            sink,
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn variable_timing(&self) -> bool {
        self.variable_timing
    }

    pub fn show_context(&self) -> bool {
        self.show_context
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut T {
        &mut self.scheduler
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// 当前阶段
    pub fn phase(&self) -> Phase {
        if self.words.is_empty() {
            Phase::Idle
        } else if self.is_playing {
            Phase::Playing
        } else if self.finished {
            Phase::Finished
        } else if !self.started {
            Phase::Ready
        } else {
            Phase::Paused
        }
    }

    /// 当前词；没有文本时为 `None`
    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.current_index).map(String::as_str)
    }

    /// 当前词的ORP切分
    pub fn current_split(&self) -> Option<OrpSplit<'_>> {
        self.current_word().map(OrpSplit::new)
    }

    /// 上下文视图
    pub fn context(&self) -> Option<ContextWindow<'_>> {
        let current = self.current_word()?;
        let index = self.current_index;
        let start = index.saturating_sub(self.settings.context_before);
        let end = (index + 1 + self.settings.context_after).min(self.words.len());

        Some(ContextWindow {
            before: &self.words[start..index],
            current,
            after: &self.words[index + 1..end],
        })
    }

    /// 进度百分比：(index + 1) / len × 100
    pub fn progress_percent(&self) -> f64 {
        if self.words.is_empty() {
            return 0.0;
        }
        (self.current_index + 1) as f64 / self.words.len() as f64 * 100.0
    }

    /// 开始播放
    pub fn play(&mut self) {
        if self.words.is_empty() || self.finished {
            return;
        }
        self.is_playing = true;
        self.started = true;
        self.reschedule();
    }

    /// 暂停播放
    pub fn pause(&mut self) {
        self.is_playing = false;
        self.reschedule();
    }

    /// 处理用户命令
    pub fn apply(&mut self, command: Command) -> CommandOutcome {
        tracing::trace!(?command, index = self.current_index, "playback command");

        match command {
            Command::TogglePlay => {
                if self.is_playing {
                    self.pause();
                } else {
                    self.play();
                }
            }
            Command::StepForward => self.move_to(self.current_index.saturating_add(1)),
            Command::StepBack => self.move_to(self.current_index.saturating_sub(1)),
            Command::Seek(index) => self.move_to(index),
            Command::AdjustWpm(delta) => {
                self.wpm = self
                    .settings
                    .clamp_wpm(i64::from(self.wpm) + i64::from(delta));
                self.reschedule();
            }
            Command::Reset => {
                self.is_playing = false;
                self.finished = false;
                self.set_index(0);
                self.reschedule();
            }
            Command::ToggleContext => {
                self.show_context = !self.show_context;
                if self.show_context {
                    self.pause();
                }
            }
            Command::ToggleVariableTiming => {
                self.variable_timing = !self.variable_timing;
                self.reschedule();
            }
            Command::GoBack => {
                self.is_playing = false;
                self.cancel_pending();
                return CommandOutcome::Exit;
            }
        }

        CommandOutcome::Continue
    }

    /// 定时器回调
    ///
    /// 过期的标识被忽略。到达最后一个词时停止播放并保持位置不变，
    /// 否则前进一个词并为新词设置定时器。返回回调是否被处理。
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.pending != Some(id) {
            tracing::trace!(?id, "ignoring stale timer");
            return false;
        }
        self.pending = None;

        if !self.is_playing || self.words.is_empty() {
            return false;
        }

        if self.current_index + 1 >= self.words.len() {
            self.is_playing = false;
            self.finished = true;
            tracing::debug!(index = self.current_index, "reached the last word");
        } else {
            self.set_index(self.current_index + 1);
            self.reschedule();
        }
        true
    }

    /// 跳转并保持播放状态
    fn move_to(&mut self, index: usize) {
        if self.words.is_empty() {
            return;
        }
        self.set_index(index.min(self.words.len() - 1));
        self.reschedule();
    }

    /// 修改当前位置；位置确实变化时记录进度
    fn set_index(&mut self, index: usize) {
        if index == self.current_index {
            return;
        }
        self.current_index = index;
        self.finished = false;
        self.sink.checkpoint(index);
    }

    fn cancel_pending(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }
    }

    /// 取消旧定时器，播放中时按当前词重新设置
    fn reschedule(&mut self) {
        self.cancel_pending();

        if !self.is_playing {
            return;
        }
        if let Some(word) = self.words.get(self.current_index) {
            let delay = self.timing.word_delay(word, self.wpm, self.variable_timing);
            self.pending = Some(self.scheduler.arm(delay));
        }
    }
}
