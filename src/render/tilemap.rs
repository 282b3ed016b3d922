//! Tile rendering
//!
//! Draws grid cells into a ratatui buffer, shaded by the fog of war.

use ratatui::buffer::Buffer;
use ratatui::style::Color;

use super::palette::{cell_display_color, Palette, Rgb};
use super::RenderMode;
use crate::world::{Cell, CellVisibility};

/// Tile renderer for ASCII and Unicode modes
#[derive(Debug, Clone, Copy, Default)]
pub struct TileRenderer {
    pub mode: RenderMode,
}

impl TileRenderer {
    pub fn new(mode: RenderMode) -> Self {
        Self { mode }
    }

    /// Get the character representation for a cell
    pub fn cell_char(&self, cell: Cell) -> char {
        match self.mode {
            RenderMode::Ascii => cell.glyph(),
            RenderMode::Unicode => Self::unicode_char(cell),
        }
    }

    fn unicode_char(cell: Cell) -> char {
        match cell {
            Cell::Empty => ' ',
            Cell::Floor => '·',
            Cell::Wall => '█',
            Cell::Entry => '▲',
            Cell::Exit => '▼',
        }
    }

    /// Render a single cell. Hidden cells are drawn as black space.
    pub fn render_cell(
        &self,
        buf: &mut Buffer,
        x: u16,
        y: u16,
        cell: Cell,
        visibility: CellVisibility,
        palette: &Palette,
        torch_color: Rgb,
    ) {
        let Some(target) = buf.cell_mut((x, y)) else {
            return;
        };

        match cell_display_color(palette, cell, visibility, torch_color) {
            Some(fg) => {
                target.set_char(self.cell_char(cell));
                target.set_fg(fg);
            }
            None => {
                target.set_char(' ');
            }
        }
        target.set_bg(Color::Black);
    }
}

/// Entity glyph in the current mode
pub fn entity_char(mode: RenderMode, glyph: char, is_player: bool) -> char {
    match (mode, is_player) {
        (RenderMode::Unicode, true) => '☺',
        _ => glyph,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;

    #[test]
    fn test_chars_per_mode() {
        let ascii = TileRenderer::new(RenderMode::Ascii);
        let unicode = TileRenderer::new(RenderMode::Unicode);
        assert_eq!(ascii.cell_char(Cell::Wall), '#');
        assert_eq!(ascii.cell_char(Cell::Exit), '>');
        assert_eq!(unicode.cell_char(Cell::Wall), '█');
    }

    #[test]
    fn test_hidden_cells_render_blank() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 2, 1));
        let renderer = TileRenderer::new(RenderMode::Ascii);
        let palette = Palette::default();
        let lit = CellVisibility::Revealed { light: 1.0, torch: 0.0, lit: true };

        renderer.render_cell(&mut buf, 0, 0, Cell::Wall, CellVisibility::Hidden, &palette, (1.0, 1.0, 1.0));
        renderer.render_cell(&mut buf, 1, 0, Cell::Wall, lit, &palette, (1.0, 1.0, 1.0));
        // Out of the buffer is ignored
        renderer.render_cell(&mut buf, 5, 5, Cell::Wall, lit, &palette, (1.0, 1.0, 1.0));

        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(1, 0)].symbol(), "#");
    }
}
