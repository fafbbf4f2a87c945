use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[macro_export]
macro_rules! fixture_layout {
    ($($role:expr),* $(,)?) => {
        $crate::FixtureLayout::new(vec![$($role),*])
    };
}

/// Maximum number of DMX channels a single fixture may occupy.
pub const MAX_FIXTURE_CHANNELS: usize = 15;

/// Semantic role of one DMX channel slot within a fixture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelRole {
    /// Always 0. Keeps strobe and macro channels quiet.
    #[default]
    Zero,
    Red,
    Green,
    Blue,
    White,
    /// Shutter/dimmer channel carrying the global brightness.
    Shutter,
    /// Always 255.
    Full,
}

impl ChannelRole {
    /// Decode the numeric role code used by stored fixture maps (0..=6).
    pub fn from_code(code: u8) -> Option<ChannelRole> {
        match code {
            0 => Some(ChannelRole::Zero),
            1 => Some(ChannelRole::Red),
            2 => Some(ChannelRole::Green),
            3 => Some(ChannelRole::Blue),
            4 => Some(ChannelRole::White),
            5 => Some(ChannelRole::Shutter),
            6 => Some(ChannelRole::Full),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ChannelRole::Zero => 0,
            ChannelRole::Red => 1,
            ChannelRole::Green => 2,
            ChannelRole::Blue => 3,
            ChannelRole::White => 4,
            ChannelRole::Shutter => 5,
            ChannelRole::Full => 6,
        }
    }

    /// True for roles that carry a pixel color component.
    pub fn is_color(&self) -> bool {
        matches!(
            self,
            ChannelRole::Red | ChannelRole::Green | ChannelRole::Blue | ChannelRole::White
        )
    }
}

impl std::fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ChannelRole::Zero => write!(f, "Zero"),
            ChannelRole::Red => write!(f, "Red"),
            ChannelRole::Green => write!(f, "Green"),
            ChannelRole::Blue => write!(f, "Blue"),
            ChannelRole::White => write!(f, "White"),
            ChannelRole::Shutter => write!(f, "Shutter"),
            ChannelRole::Full => write!(f, "Full"),
        }
    }
}

/// Ordered channel roles of one fixture. Every pixel is rendered into one
/// fixture with this layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureLayout {
    roles: Vec<ChannelRole>,
}

impl FixtureLayout {
    /// Build a layout, keeping at most `MAX_FIXTURE_CHANNELS` roles.
    pub fn new(mut roles: Vec<ChannelRole>) -> Self {
        roles.truncate(MAX_FIXTURE_CHANNELS);
        Self { roles }
    }

    /// Build a layout from numeric role codes. Unknown codes fall back to `Zero`.
    pub fn from_codes(codes: &[u8]) -> Self {
        Self::new(
            codes
                .iter()
                .map(|c| ChannelRole::from_code(*c).unwrap_or_default())
                .collect(),
        )
    }

    /// Role of the slot `index`. Slots past the stored roles read as `Zero`.
    pub fn role(&self, index: usize) -> ChannelRole {
        self.roles.get(index).copied().unwrap_or_default()
    }

    pub fn roles(&self) -> &[ChannelRole] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Whether color channels get pre-multiplied by brightness.
    ///
    /// This is decided once for the whole layout: a single `Shutter` slot among
    /// the first `channel_count` slots turns pre-multiplication off for every
    /// fixture and the shutter channel carries brightness instead.
    pub fn computes_brightness(&self, channel_count: usize) -> bool {
        !(0..channel_count.min(MAX_FIXTURE_CHANNELS))
            .any(|j| self.role(j) == ChannelRole::Shutter)
    }
}

/// Where the first fixture lives in the universe and how fixtures are spaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureAddressing {
    /// DMX address (1-based) of the first channel of the first fixture.
    pub start_address: u16,
    /// Number of channels rendered per fixture.
    pub channels_per_fixture: u8,
    /// Address distance between the start of consecutive fixtures.
    pub gap: u16,
    /// Index of the pixel rendered into the first fixture.
    pub first_pixel: usize,
}

impl FixtureAddressing {
    /// Base DMX address of fixture `fixture_index`, or `None` on overflow.
    pub fn fixture_base(&self, fixture_index: usize) -> Option<usize> {
        (self.gap as usize)
            .checked_mul(fixture_index)?
            .checked_add(self.start_address as usize)
    }
}

impl Default for FixtureAddressing {
    fn default() -> Self {
        Self {
            start_address: 1,
            channels_per_fixture: 4,
            gap: 4,
            first_pixel: 0,
        }
    }
}

/// Named fixture layouts for common pixel fixtures.
pub struct LayoutLibrary {
    pub layouts: HashMap<String, FixtureLayout>,
}

impl LayoutLibrary {
    pub fn new() -> Self {
        let mut layouts = HashMap::new();

        layouts.insert(
            "rgb".to_string(),
            fixture_layout![ChannelRole::Red, ChannelRole::Green, ChannelRole::Blue],
        );
        layouts.insert(
            "rgbw".to_string(),
            fixture_layout![
                ChannelRole::Red,
                ChannelRole::Green,
                ChannelRole::Blue,
                ChannelRole::White,
            ],
        );
        layouts.insert(
            "rgb-shutter".to_string(),
            fixture_layout![
                ChannelRole::Red,
                ChannelRole::Green,
                ChannelRole::Blue,
                ChannelRole::Shutter,
            ],
        );
        layouts.insert(
            "shutter-rgbw".to_string(),
            fixture_layout![
                ChannelRole::Shutter,
                ChannelRole::Red,
                ChannelRole::Green,
                ChannelRole::Blue,
                ChannelRole::White,
            ],
        );

        // Typical 8 channel RGBW par: dimmer, color, strobe, then two macro
        // channels that must stay at 0 or the fixture runs its own programs.
        layouts.insert(
            "dimmer-rgbw-strobe-off".to_string(),
            fixture_layout![
                ChannelRole::Shutter,
                ChannelRole::Red,
                ChannelRole::Green,
                ChannelRole::Blue,
                ChannelRole::White,
                ChannelRole::Zero,
                ChannelRole::Zero,
                ChannelRole::Zero,
            ],
        );

        LayoutLibrary { layouts }
    }

    pub fn get(&self, name: &str) -> Option<&FixtureLayout> {
        self.layouts.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.layouts.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for LayoutLibrary {
    fn default() -> Self {
        Self::new()
    }
}
