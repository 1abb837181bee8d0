//! App: terminal init, main loop, tick and key handling.

use crate::Args;
use crate::game::GameState;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use log::{debug, info};
use ratatui::DefaultTerminal;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Render pacing (~60 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Paused,
    GameOver,
}

pub struct App {
    theme: Theme,
    state: GameState,
    paused: bool,
    no_animation: bool,
    /// TachyonFX flash over the board after rows are cleared.
    line_clear_effect: Option<Effect>,
    /// Last time the flash effect was processed (for delta).
    line_clear_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: &Args, theme: Theme) -> Self {
        let state = match args.seed {
            Some(seed) => GameState::with_seed(seed),
            None => GameState::new(),
        };
        Self {
            theme,
            state,
            paused: false,
            no_animation: args.no_animation,
            line_clear_effect: None,
            line_clear_effect_process_time: None,
        }
    }

    pub fn screen(&self) -> Screen {
        if self.state.is_game_over() {
            Screen::GameOver
        } else if self.paused {
            Screen::Paused
        } else {
            Screen::Playing
        }
    }

    /// Apply one key action. `Break` means the player asked to quit.
    fn apply_action(&mut self, action: Action, now: Instant) -> ControlFlow<()> {
        if action == Action::Quit {
            return ControlFlow::Break(());
        }
        let lines_before = self.state.lines_cleared();
        match self.screen() {
            Screen::GameOver => {
                info!("restart after game over (score {})", self.state.score());
                self.state.reset();
                self.paused = false;
                self.line_clear_effect = None;
                self.line_clear_effect_process_time = None;
                return ControlFlow::Continue(());
            }
            Screen::Paused => {
                if action == Action::Pause {
                    self.paused = false;
                    self.state.reset_fall_timer(now);
                }
                return ControlFlow::Continue(());
            }
            Screen::Playing => match action {
                Action::Pause => self.paused = true,
                Action::MoveLeft => self.state.move_horizontal(-1),
                Action::MoveRight => self.state.move_horizontal(1),
                Action::Rotate => self.state.rotate(),
                Action::SoftDrop => self.state.soft_drop(),
                Action::HardDrop => self.state.hard_drop(),
                Action::Quit | Action::Other => {}
            },
        }
        self.after_update(lines_before);
        ControlFlow::Continue(())
    }

    /// Gravity for this frame.
    fn tick(&mut self, now: Instant) {
        if self.screen() != Screen::Playing {
            return;
        }
        let lines_before = self.state.lines_cleared();
        self.state.tick(now);
        self.after_update(lines_before);
    }

    fn after_update(&mut self, lines_before: u32) {
        let cleared = self.state.lines_cleared() - lines_before;
        if cleared > 0 {
            debug!("cleared {cleared} rows, score {}", self.state.score());
            if !self.no_animation {
                self.line_clear_effect = Some(crate::ui::line_clear_flash(&self.theme, cleared));
                self.line_clear_effect_process_time = None;
            }
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let result = ratatui::Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            .map_err(anyhow::Error::from)
            .and_then(|mut terminal| {
                let r = self.run_loop(&mut terminal);
                let _ = terminal.show_cursor();
                r
            });

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.state.reset_fall_timer(Instant::now());
        loop {
            let now = Instant::now();
            let screen = self.screen();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    &self.state,
                    &self.theme,
                    screen,
                    &mut self.line_clear_effect,
                    &mut self.line_clear_effect_process_time,
                    now,
                )
            })?;

            if self.line_clear_effect.as_ref().is_some_and(Effect::done) {
                self.line_clear_effect = None;
                self.line_clear_effect_process_time = None;
            }

            let mut timeout = FRAME_DURATION.saturating_sub(now.elapsed());
            if screen == Screen::Playing {
                timeout = timeout.min(self.state.time_to_next_fall(Instant::now()));
            }
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.apply_action(key_to_action(key), Instant::now()).is_break() {
                            return Ok(());
                        }
                    }
                }
            }

            self.tick(Instant::now());
        }
    }
}
