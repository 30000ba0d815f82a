//! 终端阅读界面
//!
//! 原始模式下逐键读取输入；等待按键的超时就是当前词剩余的显示时间，
//! 超时后触发定时器并重绘。界面用ratatui绘制。

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::epub::Chapter;
use crate::error::Result;
use crate::playback::{
    Command, CommandOutcome, Phase, PlaybackEngine, ProgressSink, SingleShotTimer,
};

/// 按键帮助
pub const HELP: &str =
    "空格 播放/暂停 | ←→ 单词 | ↑↓ 调速 | [ ] 章节 | r 重置 | c 上下文 | v 可变时长 | q 返回";

/// 输入事件来源
pub trait InputSource {
    /// 等待下一个事件
    ///
    /// `timeout` 到期时返回 `Ok(None)`。没有超时却返回 `None` 表示输入已结束。
    fn next_event(&mut self, timeout: Option<Duration>) -> io::Result<Option<Event>>;
}

/// 终端键盘输入
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermInput;

impl InputSource for CrosstermInput {
    fn next_event(&mut self, timeout: Option<Duration>) -> io::Result<Option<Event>> {
        match timeout {
            Some(timeout) => {
                if event::poll(timeout)? {
                    event::read().map(Some)
                } else {
                    Ok(None)
                }
            }
            None => event::read().map(Some),
        }
    }
}

/// 进入原始模式与备用屏幕
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

/// 恢复终端
pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// 把按键映射为播放命令；无关的按键返回 `None`
pub fn command_for_key(key: KeyEvent, wpm_step: u32) -> Option<Command> {
    let step = i32::try_from(wpm_step).unwrap_or(i32::MAX);

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(Command::GoBack);
    }

    let command = match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => Command::TogglePlay,
        KeyCode::Right | KeyCode::Char('l') => Command::StepForward,
        KeyCode::Left | KeyCode::Char('h') => Command::StepBack,
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('+') => Command::AdjustWpm(step),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('-') => Command::AdjustWpm(-step),
        KeyCode::Home => Command::Seek(0),
        // 越界位置由引擎限制到最后一个词
        KeyCode::End => Command::Seek(usize::MAX),
        KeyCode::Char('r') => Command::Reset,
        KeyCode::Char('c') => Command::ToggleContext,
        KeyCode::Char('v') => Command::ToggleVariableTiming,
        KeyCode::Char('q') | KeyCode::Esc => Command::GoBack,
        _ => return None,
    };
    Some(command)
}

/// 当前位置之后的第一个章节起点
fn next_chapter(chapters: &[Chapter], index: usize) -> Option<usize> {
    chapters
        .iter()
        .map(|chapter| chapter.start_word_index)
        .find(|&start| start > index)
}

/// 当前位置之前最近的章节起点；位于章节中间时回到本章开头
fn previous_chapter(chapters: &[Chapter], index: usize) -> Option<usize> {
    chapters
        .iter()
        .rev()
        .map(|chapter| chapter.start_word_index)
        .find(|&start| start < index)
}

fn current_chapter(chapters: &[Chapter], index: usize) -> Option<&Chapter> {
    chapters
        .iter()
        .rev()
        .find(|chapter| chapter.start_word_index <= index)
}

/// 终端阅读器
pub struct TerminalReader<B: Backend> {
    terminal: Terminal<B>,
    title: String,
    chapters: Vec<Chapter>,
    wpm_step: u32,
}

impl<B: Backend> TerminalReader<B> {
    pub fn new(
        terminal: Terminal<B>,
        title: impl Into<String>,
        chapters: Vec<Chapter>,
        wpm_step: u32,
    ) -> Self {
        Self {
            terminal,
            title: title.into(),
            chapters,
            wpm_step,
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    /// 运行阅读循环，直到收到返回命令或输入结束且没有待触发的定时器
    pub fn run<P: ProgressSink, I: InputSource>(
        &mut self,
        engine: &mut PlaybackEngine<SingleShotTimer, P>,
        input: &mut I,
    ) -> Result<()> {
        self.draw(engine)?;

        loop {
            let remaining = engine.scheduler().remaining(Instant::now());

            match input.next_event(remaining)? {
                Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    let Some(command) = self.command_for(key, engine.current_index()) else {
                        continue;
                    };
                    if engine.apply(command) == CommandOutcome::Exit {
                        break;
                    }
                }
                Some(Event::Resize(..)) => {}
                Some(_) => continue,
                None if remaining.is_none() => break,
                None => {
                    let Some(id) = engine.scheduler_mut().due(Instant::now()) else {
                        continue;
                    };
                    if !engine.on_timer(id) {
                        continue;
                    }
                }
            }

            self.draw(engine)?;
        }

        Ok(())
    }

    /// 章节跳转需要当前位置，其余按键直接映射
    fn command_for(&self, key: KeyEvent, index: usize) -> Option<Command> {
        match key.code {
            KeyCode::Char(']') => next_chapter(&self.chapters, index).map(Command::Seek),
            KeyCode::Char('[') => previous_chapter(&self.chapters, index).map(Command::Seek),
            _ => command_for_key(key, self.wpm_step),
        }
    }

    /// 绘制当前画面
    pub fn draw<P: ProgressSink>(
        &mut self,
        engine: &PlaybackEngine<SingleShotTimer, P>,
    ) -> Result<()> {
        let title = self.title.as_str();
        let chapters = self.chapters.as_slice();
        self.terminal
            .draw(|frame| render(frame, engine, title, chapters))?;
        Ok(())
    }
}

fn render<P: ProgressSink>(
    frame: &mut Frame,
    engine: &PlaybackEngine<SingleShotTimer, P>,
    title: &str,
    chapters: &[Chapter],
) {
    let context_height = if engine.show_context() { 5 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // 标题
            Constraint::Min(5),                 // 当前词
            Constraint::Length(context_height), // 上下文
            Constraint::Length(1),              // 进度条
            Constraint::Length(2),              // 状态与帮助
        ])
        .split(frame.area());

    let heading = match current_chapter(chapters, engine.current_index()) {
        Some(chapter) => format!("{} · {}", title, chapter.title),
        None => title.to_string(),
    };
    let header = Paragraph::new(heading)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(header, chunks[0]);

    render_word(frame, engine, chunks[1]);
    if engine.show_context() {
        render_context(frame, engine, chunks[2]);
    }

    let percent = engine.progress_percent();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta).bg(Color::DarkGray))
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", percent));
    frame.render_widget(gauge, chunks[3]);

    render_status(frame, engine, chunks[4]);
}

/// 当前词：焦点字母固定在面板中央一列
fn render_word<P: ProgressSink>(
    frame: &mut Frame,
    engine: &PlaybackEngine<SingleShotTimer, P>,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" RSVP ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let column = inner.width / 2;
    let center_x = inner.x + column;
    let center_y = inner.y + inner.height / 2;
    let row = Rect::new(inner.x, center_y, inner.width, 1);

    let Some(split) = engine.current_split() else {
        let empty = Paragraph::new("(没有内容)")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty, row);
        return;
    };

    let marker_style = Style::default().fg(Color::DarkGray);
    if center_y > inner.y {
        let top = Rect::new(center_x, center_y - 1, 1, 1);
        frame.render_widget(Paragraph::new("|").style(marker_style), top);
    }
    if center_y + 1 < inner.y + inner.height {
        let bottom = Rect::new(center_x, center_y + 1, 1, 1);
        frame.render_widget(Paragraph::new("|").style(marker_style), bottom);
    }

    let text_style = Style::default().fg(Color::White);
    let line = Line::from(vec![
        Span::raw(" ".repeat(split.padding(usize::from(column)))),
        Span::styled(split.before, text_style),
        Span::styled(
            split.focus,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled(split.after, text_style),
    ]);
    frame.render_widget(Paragraph::new(line), row);
}

fn render_context<P: ProgressSink>(
    frame: &mut Frame,
    engine: &PlaybackEngine<SingleShotTimer, P>,
    area: Rect,
) {
    let Some(window) = engine.context() else {
        return;
    };

    let dim = Style::default().fg(Color::Gray);
    let mut spans = Vec::with_capacity(window.before.len() + window.after.len() + 1);
    spans.extend(window.before.iter().map(|word| Span::styled(format!("{} ", word), dim)));
    spans.push(Span::styled(
        window.current,
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ));
    spans.extend(window.after.iter().map(|word| Span::styled(format!(" {}", word), dim)));

    let context = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" 上下文 "),
        );
    frame.render_widget(context, area);
}

fn render_status<P: ProgressSink>(
    frame: &mut Frame,
    engine: &PlaybackEngine<SingleShotTimer, P>,
    area: Rect,
) {
    let (status, status_color) = match engine.phase() {
        Phase::Playing => ("播放中", Color::Green),
        Phase::Finished => ("已读完", Color::Blue),
        Phase::Idle => ("空", Color::DarkGray),
        Phase::Ready | Phase::Paused => ("已暂停", Color::Yellow),
    };
    let timing = if engine.variable_timing() { "可变" } else { "固定" };

    let stats = Line::from(vec![
        Span::styled(format!("WPM: {}", engine.wpm()), Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::styled(
            format!("Word: {}/{}", engine.current_index() + 1, engine.len().max(1)),
            Style::default().fg(Color::Blue),
        ),
        Span::raw(" | "),
        Span::raw(timing),
        Span::raw(" | "),
        Span::styled(
            status,
            Style::default().fg(status_color).add_modifier(Modifier::BOLD),
        ),
    ]);
    let help = Line::styled(HELP, Style::default().fg(Color::DarkGray));

    frame.render_widget(
        Paragraph::new(vec![stats, help]).alignment(Alignment::Center),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::playback::TimingProfile;
    use crate::text;
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;
    use std::thread;

    /// 预先排好的输入；用完后等待超时，没有超时时视为输入结束
    struct ScriptedInput {
        events: VecDeque<Event>,
    }

    impl ScriptedInput {
        fn keys(codes: &[KeyCode]) -> Self {
            Self {
                events: codes
                    .iter()
                    .map(|&code| Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
                    .collect(),
            }
        }
    }

    impl InputSource for ScriptedInput {
        fn next_event(&mut self, timeout: Option<Duration>) -> io::Result<Option<Event>> {
            if let Some(event) = self.events.pop_front() {
                return Ok(Some(event));
            }
            if let Some(timeout) = timeout {
                thread::sleep(timeout);
            }
            Ok(None)
        }
    }

    fn engine(body: &str, start: usize) -> PlaybackEngine<SingleShotTimer, Vec<usize>> {
        PlaybackEngine::new(
            text::to_words(body),
            start,
            Some(1000),
            PlaybackConfig::default(),
            TimingProfile::default(),
            SingleShotTimer::new(),
            Vec::new(),
        )
    }

    fn reader(chapters: Vec<Chapter>) -> TerminalReader<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(72, 18)).unwrap();
        TerminalReader::new(terminal, "Sample", chapters, 25)
    }

    fn screen(reader: &TerminalReader<TestBackend>) -> String {
        let buffer = reader.terminal().backend().buffer();
        let area = buffer.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn chapter(title: &str, start_word_index: usize) -> Chapter {
        Chapter {
            title: title.to_string(),
            start_word_index,
        }
    }

    #[test]
    fn test_command_for_key() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(command_for_key(key(KeyCode::Char(' ')), 25), Some(Command::TogglePlay));
        assert_eq!(command_for_key(key(KeyCode::Right), 25), Some(Command::StepForward));
        assert_eq!(command_for_key(key(KeyCode::Char('h')), 25), Some(Command::StepBack));
        assert_eq!(command_for_key(key(KeyCode::Up), 25), Some(Command::AdjustWpm(25)));
        assert_eq!(command_for_key(key(KeyCode::Char('j')), 50), Some(Command::AdjustWpm(-50)));
        assert_eq!(command_for_key(key(KeyCode::Char('r')), 25), Some(Command::Reset));
        assert_eq!(command_for_key(key(KeyCode::Char('c')), 25), Some(Command::ToggleContext));
        assert_eq!(
            command_for_key(key(KeyCode::Char('v')), 25),
            Some(Command::ToggleVariableTiming)
        );
        assert_eq!(command_for_key(key(KeyCode::Home), 25), Some(Command::Seek(0)));
        assert_eq!(command_for_key(key(KeyCode::Esc), 25), Some(Command::GoBack));
        assert_eq!(command_for_key(key(KeyCode::Char('x')), 25), None);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(command_for_key(ctrl_c, 25), Some(Command::GoBack));
        let ctrl_r = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(command_for_key(ctrl_r, 25), None);
    }

    #[test]
    fn test_chapter_targets() {
        let chapters = vec![chapter("One", 0), chapter("Two", 10), chapter("Three", 25)];

        assert_eq!(next_chapter(&chapters, 0), Some(10));
        assert_eq!(next_chapter(&chapters, 12), Some(25));
        assert_eq!(next_chapter(&chapters, 25), None);
        assert_eq!(previous_chapter(&chapters, 12), Some(10));
        assert_eq!(previous_chapter(&chapters, 10), Some(0));
        assert_eq!(previous_chapter(&chapters, 0), None);
        assert_eq!(current_chapter(&chapters, 24).map(|c| c.title.as_str()), Some("Two"));
        assert!(current_chapter(&[], 3).is_none());
    }

    #[test]
    fn test_quit_key_exits() {
        let mut engine = engine("one two three", 0);
        engine.play();
        let mut reader = reader(Vec::new());
        let mut input = ScriptedInput::keys(&[KeyCode::Char('q')]);
        reader.run(&mut engine, &mut input).unwrap();

        assert!(!engine.is_playing());
        assert!(engine.scheduler().pending().is_none());
        assert!(screen(&reader).contains("one"));
    }

    #[test]
    fn test_plays_to_the_end_when_input_ends() {
        let mut engine = engine("one two three", 0);
        engine.play();
        let mut reader = reader(Vec::new());
        reader.run(&mut engine, &mut ScriptedInput::keys(&[])).unwrap();

        assert_eq!(engine.current_index(), 2);
        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.sink(), &vec![1, 2]);

        let screen = screen(&reader);
        assert!(screen.contains("three"));
        assert!(screen.contains("100%"));
        assert!(screen.contains("Word: 3/3"));
    }

    #[test]
    fn test_keys_step_and_adjust_speed() {
        let mut engine = engine("alpha beta gamma delta", 0);
        let mut reader = reader(Vec::new());
        let mut input = ScriptedInput::keys(&[
            KeyCode::Right,
            KeyCode::Right,
            KeyCode::Left,
            KeyCode::Down,
            KeyCode::Char('x'),
            KeyCode::Char('c'),
        ]);
        reader.run(&mut engine, &mut input).unwrap();

        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.wpm(), 975);
        assert_eq!(engine.sink(), &vec![1, 2, 1]);

        let screen = screen(&reader);
        assert!(screen.contains("WPM: 975"));
        assert!(screen.contains("alpha"));
        assert!(screen.contains("gamma delta"));
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut engine = engine("alpha beta gamma", 0);
        let mut reader = reader(Vec::new());
        let mut release = KeyEvent::new(KeyCode::Right, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        let mut input = ScriptedInput {
            events: VecDeque::from([Event::Key(release)]),
        };
        reader.run(&mut engine, &mut input).unwrap();

        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn test_chapter_keys_seek_and_title_follows() {
        let chapters = vec![chapter("Opening", 0), chapter("Middle", 3)];
        let mut engine = engine("a b c d e f", 1);
        let mut reader = reader(chapters);
        let mut input = ScriptedInput::keys(&[KeyCode::Char(']'), KeyCode::Char(']')]);
        reader.run(&mut engine, &mut input).unwrap();

        assert_eq!(engine.current_index(), 3);
        assert!(screen(&reader).contains("Sample · Middle"));

        let mut input = ScriptedInput::keys(&[KeyCode::Right, KeyCode::Char('[')]);
        reader.run(&mut engine, &mut input).unwrap();
        assert_eq!(engine.current_index(), 3);
    }

    #[test]
    fn test_focus_letter_sits_on_the_center_column() {
        let engine = engine("extraordinary", 0);
        let mut reader = reader(Vec::new());
        reader.draw(&engine).unwrap();

        // 面板内宽70，中央列在 x = 1 + 35
        let word_row = screen(&reader)
            .lines()
            .position(|line| line.contains("extraordinary"))
            .unwrap() as u16;
        let buffer = reader.terminal().backend().buffer();
        assert_eq!(buffer[(36, word_row)].symbol(), "a");
        assert_eq!(buffer[(32, word_row)].symbol(), "e");
    }
}
