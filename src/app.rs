//! App: terminal init, main loop, frame and scan schedules, key and mouse handling.

use crate::GameConfig;
use crate::game::GameEngine;
use crate::input::{Action, key_to_action};
use crate::render;
use crate::surface::DisplayList;
use crate::theme::Theme;
use crate::ui::{self, ScoreFlash};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

pub struct App {
    config: GameConfig,
    theme: Theme,
    engine: GameEngine,
    /// Draw commands for the current frame; replayed onto the canvas by `ui`.
    display: DisplayList,
    paused: bool,
    last_scan: Instant,
    /// Board rect from the last draw, for mapping mouse clicks.
    board: Rect,
    score_flash: ScoreFlash,
    last_score: u32,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let engine = GameEngine::new(&config);
        let (w, h) = engine.surface_size();
        Self {
            config,
            theme,
            engine,
            display: DisplayList::new(w, h),
            paused: false,
            last_scan: Instant::now(),
            board: Rect::default(),
            score_flash: ScoreFlash::default(),
            last_score: 0,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = self.config.frame_interval();
        let scan_interval = self.config.scan_interval;
        self.last_scan = Instant::now();

        while self.engine.is_running() {
            let now = Instant::now();
            if !self.paused {
                self.engine.advance(now);
            }
            if self.engine.score() > self.last_score {
                self.score_flash.trigger(&self.theme);
            }
            self.last_score = self.engine.score();

            render::draw_frame(&self.engine, &mut self.display, now);
            let mut board = self.board;
            terminal.draw(|f| {
                board = ui::draw(
                    f,
                    &self.engine,
                    &self.theme,
                    &self.display,
                    &mut self.score_flash,
                    self.paused,
                    now,
                );
            })?;
            self.board = board;

            // Scan schedule, independent of the frame rate.
            if !self.paused && self.last_scan.elapsed() >= scan_interval {
                self.last_scan = Instant::now();
                self.engine.scan(self.last_scan);
            }

            let until_scan = scan_interval.saturating_sub(self.last_scan.elapsed());
            let timeout = frame_duration
                .saturating_sub(now.elapsed())
                .min(until_scan);

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            self.handle_action(key_to_action(key));
                        }
                        Event::Mouse(mouse) => self.handle_mouse(mouse),
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_action(&mut self, action: Action) {
        if self.paused {
            match action {
                Action::Pause => self.resume(),
                Action::Restart => {
                    self.restart();
                    self.resume();
                }
                Action::Quit => self.engine.stop(),
                _ => {}
            }
            return;
        }
        match action {
            Action::Quit => self.engine.stop(),
            Action::Pause => {
                self.paused = true;
                log::debug!("paused");
            }
            Action::Restart => self.restart(),
            Action::CursorLeft => self.engine.move_cursor(0, -1),
            Action::CursorRight => self.engine.move_cursor(0, 1),
            Action::CursorUp => self.engine.move_cursor(-1, 0),
            Action::CursorDown => self.engine.move_cursor(1, 0),
            Action::Select => {
                self.engine.select_at_cursor();
            }
            Action::None => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.paused || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let (w, h) = self.engine.surface_size();
        if let Some((x, y)) = ui::terminal_to_surface(self.board, mouse.column, mouse.row, w, h) {
            self.engine.click(x, y);
        }
    }

    fn resume(&mut self) {
        self.paused = false;
        // Do not fire a burst of scans for the paused time.
        self.last_scan = Instant::now();
        log::debug!("resumed");
    }

    fn restart(&mut self) {
        self.engine.restart();
        self.last_score = 0;
        self.last_scan = Instant::now();
    }
}
