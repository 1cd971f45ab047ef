//! Surface layout domain entity.
//!
//! The layout engine divides the touch surface into labeled key zones and a
//! single trackpad zone.  Every rectangle is derived from the surface size and
//! a fixed set of fractional parameters, so the whole layout is a pure function
//! of `(width, height, LayoutConfig)` and is rebuilt wholesale on every resize.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                                                          │
//! │   ┌───┬───┬───┐                        ┌───┬───┬───┐     │  key_top
//! │   │ s │ d │ f │                        │ j │ k │ l │     │  key_height
//! │   └───┴───┴───┘                        └───┴───┴───┘     │
//! │ ↔ side_margin    group_width                             │
//! │    ┌────────────────────────────────────────────────┐    │
//! │    │                  trackpad                      │    │  trackpad_height
//! │    └────────────────────────────────────────────────┘    │
//! │                                                          │  trackpad_bottom_margin
//! └──────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when validating a [`LayoutConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    /// A fractional parameter is NaN, infinite, or outside `0.0..=1.0`.
    #[error("layout fraction `{name}` must be within 0.0..=1.0, got {value}")]
    FractionOutOfRange { name: &'static str, value: f32 },

    /// The same label appears more than once across both groups.
    #[error("duplicate key label: {0:?}")]
    DuplicateLabel(char),
}

/// A position on the touch surface, in surface units (pixels or points).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Returns `true` when the rectangle covers no area (including inverted rects).
    pub fn is_empty(&self) -> bool {
        !(self.left < self.right && self.top < self.bottom)
    }

    /// Half-open containment test: `left <= x < right` and `top <= y < bottom`.
    ///
    /// An empty rectangle never contains any point.
    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.left
            && point.x < self.right
            && point.y >= self.top
            && point.y < self.bottom
    }
}

/// Which key group a zone belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySide {
    Left,
    Right,
}

/// The computed bounds of one labeled key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyZoneBounds {
    pub label: char,
    pub side: KeySide,
    pub bounds: Rect,
}

/// The single trackpad region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackpadZone {
    pub bounds: Rect,
}

impl TrackpadZone {
    pub fn contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }

    /// Normalized horizontal position of `point` within the trackpad.
    ///
    /// Returns `(x - left) / width` clamped to `0.0..=1.0`, or `None` when the
    /// trackpad has no width.
    pub fn horizontal_ratio(&self, point: Point) -> Option<f32> {
        let width = self.bounds.width();
        if width.is_nan() || width <= 0.0 {
            return None;
        }
        Some(((point.x - self.bounds.left) / width).clamp(0.0, 1.0))
    }
}

/// Fractional layout parameters plus the key labels of each group.
///
/// All fractions are relative to the surface width (horizontal values) or
/// height (vertical values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Labels of the left key group, declared left to right.
    #[serde(default = "default_left_keys")]
    pub left_keys: Vec<char>,
    /// Labels of the right key group, declared left to right.
    #[serde(default = "default_right_keys")]
    pub right_keys: Vec<char>,
    /// Gap between each surface edge and the outer edge of its key group.
    #[serde(default = "default_side_margin")]
    pub side_margin: f32,
    /// Width of one key group; keys split it evenly.
    #[serde(default = "default_group_width")]
    pub group_width: f32,
    #[serde(default = "default_key_height")]
    pub key_height: f32,
    /// Distance from the top edge to the top of the keys.
    #[serde(default = "default_key_top")]
    pub key_top: f32,
    /// Trackpad width; the trackpad is centred horizontally.
    #[serde(default = "default_trackpad_width")]
    pub trackpad_width: f32,
    #[serde(default = "default_trackpad_height")]
    pub trackpad_height: f32,
    /// Gap between the bottom of the trackpad and the bottom edge.
    #[serde(default = "default_trackpad_bottom_margin")]
    pub trackpad_bottom_margin: f32,
}

fn default_left_keys() -> Vec<char> {
    vec!['s', 'd', 'f']
}
fn default_right_keys() -> Vec<char> {
    vec!['j', 'k', 'l']
}
fn default_side_margin() -> f32 {
    0.10
}
fn default_group_width() -> f32 {
    0.325
}
fn default_key_height() -> f32 {
    0.25
}
fn default_key_top() -> f32 {
    0.40
}
fn default_trackpad_width() -> f32 {
    0.85
}
fn default_trackpad_height() -> f32 {
    0.15
}
fn default_trackpad_bottom_margin() -> f32 {
    0.05
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            left_keys: default_left_keys(),
            right_keys: default_right_keys(),
            side_margin: default_side_margin(),
            group_width: default_group_width(),
            key_height: default_key_height(),
            key_top: default_key_top(),
            trackpad_width: default_trackpad_width(),
            trackpad_height: default_trackpad_height(),
            trackpad_bottom_margin: default_trackpad_bottom_margin(),
        }
    }
}

impl LayoutConfig {
    /// Checks that every fraction lies in `0.0..=1.0` and that labels are unique.
    ///
    /// Either group, or both, may be empty; with no keys at all the surface is
    /// a pad-only screen.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::FractionOutOfRange`] for the first invalid fraction
    /// and [`LayoutError::DuplicateLabel`] if a label repeats.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let fractions = [
            ("side_margin", self.side_margin),
            ("group_width", self.group_width),
            ("key_height", self.key_height),
            ("key_top", self.key_top),
            ("trackpad_width", self.trackpad_width),
            ("trackpad_height", self.trackpad_height),
            ("trackpad_bottom_margin", self.trackpad_bottom_margin),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(LayoutError::FractionOutOfRange { name, value });
            }
        }

        let mut seen = Vec::with_capacity(self.left_keys.len() + self.right_keys.len());
        for &label in self.left_keys.iter().chain(&self.right_keys) {
            if seen.contains(&label) {
                return Err(LayoutError::DuplicateLabel(label));
            }
            seen.push(label);
        }
        Ok(())
    }
}

/// The full set of zones for one surface size.
///
/// `keys` is ordered left group first, then right group, left to right within
/// each group.  This is also the claim-scan order used by the classifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceLayout {
    pub width: f32,
    pub height: f32,
    pub keys: Vec<KeyZoneBounds>,
    pub trackpad: TrackpadZone,
}

/// Computes the key and trackpad zones for a surface of `width` × `height`.
///
/// Negative or non-finite dimensions are treated as zero, which yields
/// zero-area zones that never contain a point.
pub fn compute_layout(width: f32, height: f32, config: &LayoutConfig) -> SurfaceLayout {
    let w = sanitize_dimension(width);
    let h = sanitize_dimension(height);

    let side_margin = w * config.side_margin;
    let group_width = w * config.group_width;
    let key_top = h * config.key_top;
    let key_bottom = key_top + h * config.key_height;

    let mut keys = Vec::with_capacity(config.left_keys.len() + config.right_keys.len());
    push_group(
        &mut keys,
        &config.left_keys,
        KeySide::Left,
        side_margin,
        group_width,
        key_top,
        key_bottom,
    );
    push_group(
        &mut keys,
        &config.right_keys,
        KeySide::Right,
        w - side_margin - group_width,
        group_width,
        key_top,
        key_bottom,
    );

    let pad_width = w * config.trackpad_width;
    let pad_height = h * config.trackpad_height;
    let pad_left = (w - pad_width) / 2.0;
    let pad_top = h - h * config.trackpad_bottom_margin - pad_height;

    SurfaceLayout {
        width: w,
        height: h,
        keys,
        trackpad: TrackpadZone {
            bounds: Rect::new(pad_left, pad_top, pad_left + pad_width, pad_top + pad_height),
        },
    }
}

fn push_group(
    out: &mut Vec<KeyZoneBounds>,
    labels: &[char],
    side: KeySide,
    group_left: f32,
    group_width: f32,
    top: f32,
    bottom: f32,
) {
    if labels.is_empty() {
        return;
    }
    let key_width = group_width / labels.len() as f32;
    for (i, &label) in labels.iter().enumerate() {
        let left = group_left + i as f32 * key_width;
        out.push(KeyZoneBounds {
            label,
            side,
            bounds: Rect::new(left, top, left + key_width, bottom),
        });
    }
}

fn sanitize_dimension(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
