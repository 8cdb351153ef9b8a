//! Agent skins and per-segment colouring.
//!
//! Segment colours depend only on the skin and the segment index, so each
//! agent memoizes a palette once when its skin is assigned.

use crate::components::Rgb;

/// Number of segment colours memoized per agent; longer bodies wrap around.
pub const PALETTE_SIZE: usize = 1000;

/// Segments over which a gradient skin blends between its two colours.
const GRADIENT_SPAN: f32 = 30.0;

/// How a skin maps segment indices to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Solid,
    Rainbow,
    Gradient,
    Tiger,
    Neon,
    Lava,
}

/// A named colour scheme for agent bodies.
#[derive(Debug, Clone, Copy)]
pub struct Skin {
    pub name: &'static str,
    pub colors: &'static [Rgb],
    pub pattern: Pattern,
}

impl Skin {
    /// Colour used for the agent as a whole (byproduct tint, UI accents).
    pub fn base_color(&self) -> Rgb {
        self.colors.first().copied().unwrap_or(FALLBACK_COLOR)
    }
}

const FALLBACK_COLOR: Rgb = Rgb(0, 255, 0);

const RAINBOW: [Rgb; 7] = [
    Rgb(255, 0, 0),
    Rgb(255, 128, 0),
    Rgb(255, 255, 0),
    Rgb(0, 255, 0),
    Rgb(0, 0, 255),
    Rgb(128, 0, 255),
    Rgb(255, 0, 255),
];
const TIGER: [Rgb; 2] = [Rgb(255, 180, 0), Rgb(0, 0, 0)];
const NEON: [Rgb; 2] = [Rgb(0, 255, 255), Rgb(255, 0, 255)];
const LAVA: [Rgb; 3] = [Rgb(255, 60, 0), Rgb(180, 0, 0), Rgb(40, 0, 0)];

/// Built-in skins. Index 0 is the default player skin.
pub static SKINS: [Skin; 9] = [
    Skin { name: "Classic", colors: &[Rgb(0, 220, 0)], pattern: Pattern::Solid },
    Skin { name: "Blue", colors: &[Rgb(0, 100, 255)], pattern: Pattern::Solid },
    Skin { name: "Fire Red", colors: &[Rgb(255, 30, 0)], pattern: Pattern::Solid },
    Skin {
        name: "Rainbow",
        colors: &[
            Rgb(255, 0, 0),
            Rgb(255, 128, 0),
            Rgb(255, 255, 0),
            Rgb(0, 220, 0),
            Rgb(0, 80, 255),
            Rgb(150, 0, 255),
        ],
        pattern: Pattern::Rainbow,
    },
    Skin { name: "Tiger", colors: &[Rgb(255, 180, 0), Rgb(10, 10, 10)], pattern: Pattern::Tiger },
    Skin { name: "Ice", colors: &[Rgb(180, 230, 255), Rgb(230, 250, 255)], pattern: Pattern::Gradient },
    Skin { name: "Gold", colors: &[Rgb(255, 215, 0), Rgb(218, 165, 32)], pattern: Pattern::Gradient },
    Skin { name: "Neon", colors: &[Rgb(0, 255, 255), Rgb(255, 0, 255)], pattern: Pattern::Neon },
    Skin {
        name: "Lava",
        colors: &[Rgb(255, 80, 0), Rgb(200, 0, 0), Rgb(60, 0, 0)],
        pattern: Pattern::Lava,
    },
];

/// Look up a built-in skin, falling back to the default for unknown indices.
pub fn skin(index: usize) -> &'static Skin {
    SKINS.get(index).unwrap_or(&SKINS[0])
}

/// Colour of segment `index` for `skin`.
pub fn color_for(skin: &Skin, index: usize) -> Rgb {
    if skin.colors.is_empty() {
        return FALLBACK_COLOR;
    }
    match skin.pattern {
        Pattern::Solid => skin.colors[0],
        Pattern::Rainbow => RAINBOW[(index / 3) % RAINBOW.len()],
        Pattern::Gradient => match skin.colors {
            [from, to, ..] => {
                let ratio = (index as f32 / GRADIENT_SPAN).min(1.0);
                from.lerp(*to, ratio)
            }
            _ => skin.colors[0],
        },
        Pattern::Tiger => TIGER[index % 2],
        Pattern::Neon => NEON[index % 2],
        Pattern::Lava => {
            if index == 0 {
                LAVA[0]
            } else if index % 5 == 0 {
                LAVA[2]
            } else if index % 3 == 0 {
                LAVA[1]
            } else {
                LAVA[0]
            }
        }
    }
}

/// Segment colours of one agent, computed once per skin assignment.
#[derive(Debug, Clone)]
pub struct SegmentPalette {
    skin_index: usize,
    colors: Vec<Rgb>,
}

impl SegmentPalette {
    pub fn new(skin_index: usize) -> Self {
        let skin = skin(skin_index);
        Self {
            skin_index,
            colors: (0..PALETTE_SIZE).map(|i| color_for(skin, i)).collect(),
        }
    }

    pub fn skin_index(&self) -> usize {
        self.skin_index
    }

    pub fn skin(&self) -> &'static Skin {
        skin(self.skin_index)
    }

    pub fn color_at(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }
}
