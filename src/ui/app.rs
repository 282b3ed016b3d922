//! Main UI Application
//!
//! Coordinates rendering and input handling across all screens.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::input::{play_action, PlayAction};
use crate::combat::Combatant;
use crate::ecs::{self, Health, Player, Position, Renderable, VisualPosition};
use crate::game::{Game, GameState, Level, MessageCategory};
use crate::render::{detect_render_mode, entity_char, Palette, RenderMode, TileRenderer};

/// Queue entries listed in the sidebar
const QUEUE_PREVIEW: usize = 6;

/// Main UI application
pub struct App {
    /// Current render mode (ASCII or Unicode)
    render_mode: RenderMode,
    /// Tile renderer instance
    tile_renderer: TileRenderer,
}

impl App {
    pub fn new() -> Self {
        Self::with_mode(detect_render_mode())
    }

    pub fn with_mode(render_mode: RenderMode) -> Self {
        Self {
            render_mode,
            tile_renderer: TileRenderer::new(render_mode),
        }
    }

    /// Get the current render mode
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn toggle_render_mode(&mut self) {
        self.render_mode = self.render_mode.toggled();
        self.tile_renderer = TileRenderer::new(self.render_mode);
        log::info!("Switched to render mode: {:?}", self.render_mode);
    }

    /// Handle keyboard input, returns true if should quit
    pub fn handle_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        // Global quit shortcut
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        match game.state() {
            GameState::MainMenu => self.handle_main_menu_input(key, game),
            GameState::Playing => self.handle_playing_input(key, game),
            GameState::Paused => self.handle_pause_input(key, game),
            GameState::GameOver { .. } => self.handle_game_over_input(key, game),
            GameState::Quit => Ok(true),
        }
    }

    fn handle_main_menu_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('n') => game.start_new_run(),
            KeyCode::Tab => self.toggle_render_mode(),
            KeyCode::Char('q') | KeyCode::Esc => game.quit(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_playing_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match play_action(key) {
            Some(PlayAction::Turn(input)) => game.submit_input(input),
            Some(PlayAction::Pause) => game.pause(),
            Some(PlayAction::ToggleRenderMode) => self.toggle_render_mode(),
            Some(PlayAction::Quit) => game.quit(),
            None => {}
        }
        Ok(false)
    }

    fn handle_pause_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('p') => game.resume(),
            KeyCode::Char('q') => game.return_to_menu(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_game_over_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Enter => game.start_new_run(),
            KeyCode::Esc | KeyCode::Char('q') => game.return_to_menu(),
            _ => {}
        }
        Ok(false)
    }

    pub fn render(&self, frame: &mut Frame, game: &Game) {
        // Clear the entire screen first to prevent artifacts
        frame.render_widget(Clear, frame.area());

        match game.state() {
            GameState::MainMenu => self.render_main_menu(frame),
            GameState::Playing => self.render_playing(frame, game),
            GameState::Paused => self.render_pause(frame, game),
            GameState::GameOver { floor_reached } => {
                self.render_playing(frame, game);
                self.render_game_over(frame, game, floor_reached);
            }
            GameState::Quit => {}
        }
    }

    fn render_main_menu(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ])
            .split(area);

        let title = vec![
            Line::from(Span::styled(
                "E M B E R D E E P",
                Style::default()
                    .fg(Color::Rgb(230, 120, 40))
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Carry the torch down.",
                Style::default().fg(Color::Rgb(100, 100, 100)),
            )),
        ];
        let title_area = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(chunks[0])[1];
        frame.render_widget(Paragraph::new(title).alignment(Alignment::Center), title_area);

        let menu = vec![
            Line::from(""),
            Line::from(Span::styled(
                "[Enter] New Run",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("[Tab] Glyphs: {}", self.render_mode.name()),
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
            Line::from(Span::styled("[Q] Quit", Style::default().fg(Color::Gray))),
        ];
        frame.render_widget(Paragraph::new(menu).alignment(Alignment::Center), chunks[1]);

        let version = Paragraph::new(format!("v{}", env!("CARGO_PKG_VERSION")))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(version, chunks[2]);
    }

    fn render_playing(&self, frame: &mut Frame, game: &Game) {
        let area = frame.area();

        // Main layout: sidebar on right
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(26)])
            .split(area);

        // Map area with message log at bottom
        let left_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(7)])
            .split(chunks[0]);

        self.render_map(frame, game, left_chunks[0]);
        self.render_messages(frame, game, left_chunks[1]);
        self.render_sidebar(frame, game, chunks[1]);
    }

    fn render_map(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Floor {} [{}] ", game.floor(), self.render_mode.name()))
            .border_style(Style::default().fg(Color::Rgb(120, 70, 40)));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if let Some(level) = game.level() {
            self.draw_level(frame.buffer_mut(), inner, level);
        }
    }

    /// Draw the grid under the fog of war, then everything standing in the light
    fn draw_level(&self, buf: &mut Buffer, inner: Rect, level: &Level) {
        let grid = level.grid();
        let visibility = level.visibility();
        let palette = Palette::for_seed(level.seed());
        let torch_color = visibility.settings().torch_color;

        // Camera follows the player's interpolated position
        let camera = level
            .visual_position_of(level.player())
            .map(|v| v.rounded())
            .or_else(|| level.player_position())
            .unwrap_or_else(|| Position::new(0, 0));

        let view_width = inner.width as i32;
        let view_height = inner.height as i32;
        let cam_x = camera.x - view_width / 2;
        let cam_y = camera.y - view_height / 2;

        for screen_y in 0..view_height {
            for screen_x in 0..view_width {
                let map_x = cam_x + screen_x;
                let map_y = cam_y + screen_y;
                let cell_x = inner.x + screen_x as u16;
                let cell_y = inner.y + screen_y as u16;

                match grid.cell(map_x, map_y) {
                    Some(cell) => self.tile_renderer.render_cell(
                        buf,
                        cell_x,
                        cell_y,
                        cell,
                        visibility.cell_visibility(map_x, map_y),
                        &palette,
                        torch_color,
                    ),
                    None => {
                        if let Some(target) = buf.cell_mut((cell_x, cell_y)) {
                            target.set_char(' ');
                            target.set_bg(Color::Black);
                        }
                    }
                }
            }
        }

        let world = level.world();
        let mut drawables: Vec<(VisualPosition, Renderable, Option<Health>, bool)> = world
            .query::<(&VisualPosition, &Renderable, Option<&Health>, Option<&Player>)>()
            .iter()
            .map(|(_, (pos, renderable, health, player))| {
                (*pos, renderable.clone(), health.copied(), player.is_some())
            })
            .collect();
        drawables.sort_by_key(|(_, renderable, _, _)| renderable.render_order);

        for (visual, renderable, health, is_player) in drawables {
            let pos = visual.rounded();
            if !is_player && !level.is_in_view(pos) {
                continue;
            }

            let screen_x = pos.x - cam_x;
            let screen_y = pos.y - cam_y;
            if screen_x < 0 || screen_x >= view_width || screen_y < 0 || screen_y >= view_height {
                continue;
            }

            // Color enemies by health percentage
            let fg = match health {
                Some(hp) if !is_player && hp.percentage() <= 0.3 => Color::Rgb(255, 80, 80),
                Some(hp) if !is_player && hp.percentage() <= 0.6 => Color::Rgb(255, 200, 100),
                _ => Color::Rgb(renderable.fg.0, renderable.fg.1, renderable.fg.2),
            };

            if let Some(target) = buf.cell_mut((inner.x + screen_x as u16, inner.y + screen_y as u16)) {
                target.set_char(entity_char(self.render_mode, renderable.glyph, is_player));
                target.set_fg(fg);
            }
        }
    }

    fn render_messages(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Messages ")
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);

        let messages: Vec<Line> = game
            .messages()
            .iter()
            .rev()
            .take(inner.height as usize)
            .rev()
            .map(|msg| {
                let color = match msg.category {
                    MessageCategory::Combat => Color::Red,
                    MessageCategory::System => Color::Cyan,
                    MessageCategory::Warning => Color::LightRed,
                };
                Line::from(Span::styled(msg.text.as_str(), Style::default().fg(color)))
            })
            .collect();

        frame.render_widget(Paragraph::new(messages).block(block), area);
    }

    fn render_sidebar(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Status ")
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let health = game.player_health().unwrap_or(Health::new(0));
        let hp_pct = health.percentage();
        let hp_color = if hp_pct > 0.6 {
            Color::Green
        } else if hp_pct > 0.3 {
            Color::Yellow
        } else {
            Color::Red
        };

        let explored = game
            .level()
            .map(|l| l.visibility().revealed_fraction())
            .unwrap_or(0.0);
        let foes = game.level().map_or(0, |l| ecs::enemy_count(l.world()));

        let mut lines = vec![
            Line::from(Span::styled(
                "Torchbearer",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::raw("HP    "),
                Span::styled(
                    format!("{}/{}", health.current, health.max),
                    Style::default().fg(hp_color),
                ),
            ]),
            Line::from(Span::styled(
                health_bar(hp_pct, inner.width.saturating_sub(2) as usize),
                Style::default().fg(hp_color),
            )),
            Line::from(""),
            Line::from(format!("Floor {}", game.floor())),
            Line::from(vec![
                Span::raw("Gold  "),
                Span::styled(game.gold().to_string(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(format!("Kills {}", game.kills())),
            Line::from(format!("Foes  {}", foes)),
            Line::from(format!("Seen  {:.0}%", explored * 100.0)),
            Line::from(""),
            Line::from(Span::styled("Turn order", Style::default().fg(Color::Gray))),
        ];

        if let Some(level) = game.level() {
            let scheduler = game.scheduler();
            let acting = scheduler.current_actor();
            for actor in acting.into_iter().chain(scheduler.queue()).take(QUEUE_PREVIEW) {
                let (label, color) = match actor {
                    Combatant::Player(_) => ("You".to_string(), Color::White),
                    Combatant::Enemy(e) => (level.name_of(e), Color::Gray),
                };
                let marker = if Some(actor) == acting { "> " } else { "  " };
                lines.push(Line::from(Span::styled(
                    format!("{}{}", marker, label),
                    Style::default().fg(color),
                )));
            }
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_pause(&self, frame: &mut Frame, game: &Game) {
        // Render game in background
        self.render_playing(frame, game);

        let area = centered_rect(30, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" PAUSED ")
            .border_style(Style::default().fg(Color::White));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let menu = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("[Esc] Resume", Style::default().fg(Color::White))),
            Line::from(""),
            Line::from(Span::styled("[Q] Quit to Menu", Style::default().fg(Color::Gray))),
        ])
        .alignment(Alignment::Center);

        frame.render_widget(menu, inner);
    }

    fn render_game_over(&self, frame: &mut Frame, game: &Game, floor: u32) {
        let area = centered_rect(40, 40, frame.area());
        frame.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "YOUR TORCH GOES OUT",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Reached Floor: {}", floor)),
            Line::from(format!("Gold: {}   Kills: {}", game.gold(), game.kills())),
            Line::from(""),
            Line::from(Span::styled(
                "[Enter] New Run   [Esc] Menu",
                Style::default().fg(Color::Gray),
            )),
        ];

        let para = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));

        frame.render_widget(para, area);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn health_bar(fraction: f32, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("{}{}", "=".repeat(filled), "-".repeat(width - filled))
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
