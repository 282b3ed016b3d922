//! Level colours and light shading
//!
//! Every floor gets a random wall hue; floors are a brighter version of it.
//! Cell colours are then scaled by the fog-of-war light and tinted by the
//! torch.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::style::Color;

use crate::world::{Cell, CellVisibility};

/// Linear RGB in [0, 1]
pub type Rgb = (f32, f32, f32);

pub const ENTRY_COLOR: Rgb = (0.0, 1.0, 0.0);
pub const EXIT_COLOR: Rgb = (1.0, 0.0, 0.0);

/// Brightness of floor relative to walls
const FLOOR_BOOST: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub wall: Rgb,
    pub floor: Rgb,
    pub entry: Rgb,
    pub exit: Rgb,
}

impl Palette {
    /// Random wall colour: any hue, saturation 0.5-0.8, value 0.6-0.8
    pub fn random(rng: &mut impl Rng) -> Self {
        let wall = hsv_to_rgb(
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.5..=0.8),
            rng.gen_range(0.6..=0.8),
        );
        Self::from_wall(wall)
    }

    /// The palette a level generated from `seed` is drawn with
    pub fn for_seed(seed: u64) -> Self {
        Self::random(&mut StdRng::seed_from_u64(seed))
    }

    pub fn from_wall(wall: Rgb) -> Self {
        let floor = (
            (wall.0 * FLOOR_BOOST).min(1.0),
            (wall.1 * FLOOR_BOOST).min(1.0),
            (wall.2 * FLOOR_BOOST).min(1.0),
        );
        Self {
            wall,
            floor,
            entry: ENTRY_COLOR,
            exit: EXIT_COLOR,
        }
    }

    /// Base colour of a cell; `None` for empty space
    pub fn cell_color(&self, cell: Cell) -> Option<Rgb> {
        match cell {
            Cell::Empty => None,
            Cell::Floor => Some(self.floor),
            Cell::Wall => Some(self.wall),
            Cell::Entry => Some(self.entry),
            Cell::Exit => Some(self.exit),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_wall(hsv_to_rgb(0.08, 0.6, 0.7))
    }
}

/// HSV (all components in [0, 1]) to RGB
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(1.0) * 6.0;
    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (r + m, g + m, b + m)
}

/// Scale `base` by the light level and blend in the torch tint
pub fn shade(base: Rgb, light: f32, torch: f32, torch_color: Rgb) -> Rgb {
    let light = light.clamp(0.0, 1.0);
    let torch = torch.clamp(0.0, 1.0);
    let tint = |c: f32, t: f32| c * light * (1.0 + (t - 1.0) * torch);
    (
        tint(base.0, torch_color.0),
        tint(base.1, torch_color.1),
        tint(base.2, torch_color.2),
    )
}

pub fn to_color(rgb: Rgb) -> Color {
    let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb(byte(rgb.0), byte(rgb.1), byte(rgb.2))
}

/// Terminal colour for a cell under the current fog, `None` when hidden
pub fn cell_display_color(
    palette: &Palette,
    cell: Cell,
    visibility: CellVisibility,
    torch_color: Rgb,
) -> Option<Color> {
    let base = palette.cell_color(cell)?;
    match visibility {
        CellVisibility::Hidden => None,
        CellVisibility::Revealed { light, torch, .. } => {
            Some(to_color(shade(base, light, torch, torch_color)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4 && (a.2 - b.2).abs() < 1e-4
    }

    #[test]
    fn test_hsv_primaries() {
        assert!(close(hsv_to_rgb(0.0, 1.0, 1.0), (1.0, 0.0, 0.0)));
        assert!(close(hsv_to_rgb(0.25, 1.0, 1.0), (0.5, 1.0, 0.0)));
        assert!(close(hsv_to_rgb(0.5, 1.0, 1.0), (0.0, 1.0, 1.0)));
        assert!(close(hsv_to_rgb(1.0, 1.0, 1.0), (1.0, 0.0, 0.0)));
        assert!(close(hsv_to_rgb(0.5, 0.0, 0.4), (0.4, 0.4, 0.4)));
    }

    #[test]
    fn test_floor_is_brighter_wall_capped() {
        let palette = Palette::from_wall((0.8, 0.4, 0.2));
        assert!(close(palette.floor, (1.0, 0.6, 0.3)));
    }

    #[test]
    fn test_random_palette_in_range() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..100 {
            let p = Palette::random(&mut rng);
            let max = p.wall.0.max(p.wall.1).max(p.wall.2);
            assert!((0.6 - 1e-4..=0.8 + 1e-4).contains(&max), "value {max}");
        }
    }

    #[test]
    fn test_palette_is_stable_per_seed() {
        assert_eq!(Palette::for_seed(9), Palette::for_seed(9));
        assert_ne!(Palette::for_seed(9).wall, Palette::for_seed(10).wall);
    }

    #[test]
    fn test_shading() {
        let white = (1.0, 1.0, 1.0);
        assert!(close(shade(white, 0.5, 0.0, (1.0, 0.8, 0.6)), (0.5, 0.5, 0.5)));
        assert!(close(shade(white, 1.0, 1.0, (1.0, 0.8, 0.6)), (1.0, 0.8, 0.6)));

        let palette = Palette::default();
        assert_eq!(
            cell_display_color(&palette, Cell::Floor, CellVisibility::Hidden, white),
            None
        );
        let lit = CellVisibility::Revealed { light: 1.0, torch: 0.0, lit: true };
        assert_eq!(cell_display_color(&palette, Cell::Empty, lit, white), None);
        assert_eq!(
            cell_display_color(&palette, Cell::Exit, lit, white),
            Some(Color::Rgb(255, 0, 0))
        );
    }
}
