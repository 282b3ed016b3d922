//! Fog of war
//!
//! Radius-based visibility around a viewer with a torch-style light falloff.
//! The reveal mask is sticky for the lifetime of a level; light intensity is
//! recomputed from scratch on every update.

use serde::{Deserialize, Serialize};

use super::GridModel;
use crate::events::{ListenerId, Observers};

/// How `update` walks the grid. Both produce identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanStrategy {
    /// Evaluate the falloff for every cell
    Full,
    /// Evaluate only the box around the viewer that either radius can reach
    #[default]
    Bounded,
}

/// Light and reveal tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilitySettings {
    /// Cells within this distance are revealed
    pub visibility_radius: f32,
    /// Reach of the viewer's torch
    pub torch_radius: f32,
    /// Torch curve shape; small values flatten it towards uniform brightness
    pub falloff_exponent: f32,
    /// Brightness at the edge of the visibility radius
    pub revealed_darkness_multiplier: f32,
    /// Revealed cells never render darker than this
    pub min_visibility: f32,
    /// Tint handed to the renderer together with the torch term
    pub torch_color: (f32, f32, f32),
    pub scan: ScanStrategy,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            visibility_radius: 10.0,
            torch_radius: 3.2,
            falloff_exponent: 0.05,
            revealed_darkness_multiplier: 0.5,
            min_visibility: 0.2,
            torch_color: (1.0, 0.8, 0.6),
            scan: ScanStrategy::Bounded,
        }
    }
}

/// The two brightness terms for one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTerms {
    /// Final intensity, already floored by `min_visibility`
    pub light: f32,
    /// Raw torch term, used for tinting
    pub torch: f32,
}

fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Brightness of a cell `distance` away from a viewer seeing `radius` cells.
pub fn light_terms(distance: f32, radius: f32, settings: &VisibilitySettings) -> LightTerms {
    let torch = if settings.torch_radius > 0.0 {
        clamp01(1.0 - distance / settings.torch_radius).powf(settings.falloff_exponent)
    } else {
        0.0
    };

    let normalized = if radius > 0.0 {
        clamp01(distance / radius)
    } else if distance > 0.0 {
        1.0
    } else {
        0.0
    };
    let revealed = lerp(1.0, settings.revealed_darkness_multiplier, normalized);

    LightTerms {
        light: torch.max(revealed).max(settings.min_visibility),
        torch,
    }
}

/// What the renderer needs to know about one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellVisibility {
    /// Never seen; draw nothing
    Hidden,
    Revealed {
        light: f32,
        torch: f32,
        /// Inside the visibility radius right now
        lit: bool,
    },
}

/// Payload-free notice fired after each successful update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityUpdated;

/// Per-cell visibility buffers for one level
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityState {
    /// Layout the buffers were sized for
    grid_id: Option<u64>,
    width: i32,
    height: i32,
    revealed: Vec<bool>,
    lit: Vec<bool>,
    light: Vec<f32>,
    torch: Vec<f32>,
    revealed_count: usize,
}

impl VisibilityState {
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) as usize).saturating_mul(height.max(0) as usize);
        Self {
            grid_id: None,
            width,
            height,
            revealed: vec![false; len],
            lit: vec![false; len],
            light: vec![0.0; len],
            torch: vec![0.0; len],
            revealed_count: 0,
        }
    }

    pub fn for_grid(grid: &GridModel) -> Self {
        Self {
            grid_id: Some(grid.id()),
            ..Self::new(grid.width(), grid.height())
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn matches(&self, grid: &GridModel) -> bool {
        self.grid_id == Some(grid.id()) && self.width == grid.width() && self.height == grid.height()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    pub fn is_revealed(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map_or(false, |i| self.revealed[i])
    }

    pub fn is_lit(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map_or(false, |i| self.lit[i])
    }

    /// Light intensity of a revealed cell; `None` for hidden cells
    pub fn light_intensity(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y)
            .filter(|&i| self.revealed[i])
            .map(|i| self.light[i])
    }

    /// Torch term of a revealed cell; `None` for hidden cells
    pub fn torch_intensity(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y)
            .filter(|&i| self.revealed[i])
            .map(|i| self.torch[i])
    }

    pub fn cell_visibility(&self, x: i32, y: i32) -> CellVisibility {
        match self.index(x, y) {
            Some(i) if self.revealed[i] => CellVisibility::Revealed {
                light: self.light[i],
                torch: self.torch[i],
                lit: self.lit[i],
            },
            _ => CellVisibility::Hidden,
        }
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    /// Revealed cells over all cells, in [0, 1]
    pub fn revealed_fraction(&self) -> f32 {
        if self.revealed.is_empty() {
            return 0.0;
        }
        self.revealed_count as f32 / self.revealed.len() as f32
    }

    fn set_cell(&mut self, idx: usize, distance: f32, radius: f32, settings: &VisibilitySettings) {
        let terms = light_terms(distance, radius, settings);
        self.light[idx] = terms.light;
        self.torch[idx] = terms.torch;

        let lit = distance <= radius;
        self.lit[idx] = lit;
        if lit && !self.revealed[idx] {
            self.revealed[idx] = true;
            self.revealed_count += 1;
        }
    }

    fn scan_full(&mut self, viewer: (f32, f32), radius: f32, settings: &VisibilitySettings) {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = (y * self.width + x) as usize;
                self.set_cell(idx, distance(x, y, viewer), radius, settings);
            }
        }
    }

    fn scan_bounded(&mut self, viewer: (f32, f32), radius: f32, settings: &VisibilitySettings) {
        // Outside both radii every cell gets the same far-field value
        let far = light_terms(f32::INFINITY, radius, settings);
        self.light.fill(far.light);
        self.torch.fill(far.torch);
        self.lit.fill(false);

        let reach = radius.max(settings.torch_radius).max(0.0);
        let x0 = ((viewer.0 - reach).floor() as i32).max(0);
        let x1 = ((viewer.0 + reach).ceil() as i32).min(self.width - 1);
        let y0 = ((viewer.1 - reach).floor() as i32).max(0);
        let y1 = ((viewer.1 + reach).ceil() as i32).min(self.height - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let idx = (y * self.width + x) as usize;
                self.set_cell(idx, distance(x, y, viewer), radius, settings);
            }
        }
    }
}

fn distance(x: i32, y: i32, viewer: (f32, f32)) -> f32 {
    let dx = x as f32 - viewer.0;
    let dy = y as f32 - viewer.1;
    (dx * dx + dy * dy).sqrt()
}

/// Owns the visibility state of the current level and tells listeners when
/// it changes.
#[derive(Debug)]
pub struct VisibilityTracker {
    settings: VisibilitySettings,
    state: VisibilityState,
    observers: Observers<VisibilityUpdated>,
    updates: u64,
}

impl VisibilityTracker {
    pub fn new(settings: VisibilitySettings, grid: &GridModel) -> Self {
        Self {
            settings,
            state: VisibilityState::for_grid(grid),
            observers: Observers::new(),
            updates: 0,
        }
    }

    pub fn settings(&self) -> &VisibilitySettings {
        &self.settings
    }

    pub fn state(&self) -> &VisibilityState {
        &self.state
    }

    /// Forget everything revealed so far, sized for `grid`
    pub fn reset(&mut self, grid: &GridModel) {
        self.state = VisibilityState::for_grid(grid);
        self.updates = 0;
    }

    /// Recompute lighting from `viewer` and reveal everything within `radius`.
    ///
    /// A different grid (new layout or new dimensions) means a new level, so
    /// the mask is reset first. Non-finite viewer positions are ignored.
    pub fn update(&mut self, viewer: (f32, f32), radius: f32, grid: &GridModel) {
        if !viewer.0.is_finite() || !viewer.1.is_finite() || radius.is_nan() {
            log::warn!("Ignoring visibility update from {:?} (radius {})", viewer, radius);
            return;
        }

        if !self.state.matches(grid) {
            log::debug!(
                "Visibility mask {}x{} does not match grid #{} ({}x{}), resetting",
                self.state.width(),
                self.state.height(),
                grid.id(),
                grid.width(),
                grid.height()
            );
            self.reset(grid);
        }

        match self.settings.scan {
            ScanStrategy::Full => self.state.scan_full(viewer, radius, &self.settings),
            ScanStrategy::Bounded => self.state.scan_bounded(viewer, radius, &self.settings),
        }
        self.updates += 1;

        self.observers.notify(&VisibilityUpdated);
    }

    /// `update` with the configured visibility radius
    pub fn refresh(&mut self, viewer: (f32, f32), grid: &GridModel) {
        let radius = self.settings.visibility_radius;
        self.update(viewer, radius, grid);
    }

    pub fn is_revealed(&self, x: i32, y: i32) -> bool {
        self.state.is_revealed(x, y)
    }

    pub fn is_lit(&self, x: i32, y: i32) -> bool {
        self.state.is_lit(x, y)
    }

    pub fn light_intensity(&self, x: i32, y: i32) -> Option<f32> {
        self.state.light_intensity(x, y)
    }

    pub fn torch_intensity(&self, x: i32, y: i32) -> Option<f32> {
        self.state.torch_intensity(x, y)
    }

    pub fn cell_visibility(&self, x: i32, y: i32) -> CellVisibility {
        self.state.cell_visibility(x, y)
    }

    pub fn revealed_count(&self) -> usize {
        self.state.revealed_count()
    }

    pub fn revealed_fraction(&self) -> f32 {
        self.state.revealed_fraction()
    }

    /// Successful updates since the last reset
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&VisibilityUpdated) + 'static) -> ListenerId {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.observers.unsubscribe(id)
    }
}
