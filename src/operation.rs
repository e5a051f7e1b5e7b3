//! Operations understood by the remote service.
//!
//! An [`Operation`] describes *what* the service should do to the source
//! image; it knows nothing about where the image lives or where the result
//! goes. Each variant maps to a short operation code (the `q` query
//! parameter) plus a fixed, ordered list of single-letter parameters:
//!
//! | Variant | code | params |
//! |---|---|---|
//! | `Thumbnail` | `thumbnail` | — |
//! | `Label` | `label` | `t`=text, `l`=location |
//! | `RoundCorners` | `round` | `r`=radius |
//! | `Cube` | `cube` | `r`, `g`, `b` |
//! | `Raise` | `raise` | `h`=height |
//! | `Scale` | `scale` | `p`=pct |
//! | `Resize` | `resize` | `w`, `h` |
//! | `Focus` | `focus` | — |
//! | `Emboss` | `emboss` | — |
//! | `Paint` | `paint` | — |
//! | `Repaint` | `repaint` | `r`, `g`, `b` |
//! | `Frame` | `frame` | `r`, `g`, `b`, `t`=thickness |
//! | `RoundFrame` | `rframe` | `r`, `g`, `b`, `t`=thickness, `v`=radius |
//! | `Mirror` | `mirror` | — |
//! | `Grayscale` | `grayscale` | — |
//! | `Blur` | `blur` | — |
//! | `Brighten` | `brighten` | — |
//! | `Sobel` | `sobel` | — |
//!
//! The table is the wire contract with the service and must not drift.
//!
//! ## Numeric arguments
//!
//! Numeric fields are carried as [`Numeric`], which keeps the caller's text
//! untouched so that values typed on a command line reach the service exactly
//! as written. Validity is checked by [`Operation::validate`], not at
//! construction, so a bad value is reported by the operation that used it.
//! Color components are documented as `0..=255` but not range-checked; the
//! service clamps on its side.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A numeric operation argument, kept in its textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numeric(String);

impl Numeric {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the text reads as a finite decimal number.
    pub fn is_valid(&self) -> bool {
        is_numeric(&self.0)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Numeric {
    fn from(value: String) -> Self {
        Self(value)
    }
}

macro_rules! numeric_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Numeric {
                fn from(value: $t) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

numeric_from_number!(u8, u16, u32, u64, i8, i16, i32, i64, usize, f32, f64);

/// Loose numeric check: optional surrounding whitespace, optional sign,
/// digits with an optional fraction and exponent. `inf` and `NaN` are not
/// numbers here.
///
/// - `"42"`, `" 42 "`, `"-3"`, `"1.5"`, `".5"`, `"1e3"` → true
/// - `""`, `"abc"`, `"12px"`, `"0x1A"`, `"inf"` → false
pub fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return false;
    }
    trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Where the `label` operation places its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Center,
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Location {
    pub const ALL: [Location; 9] = [
        Location::Center,
        Location::North,
        Location::South,
        Location::East,
        Location::West,
        Location::NorthEast,
        Location::NorthWest,
        Location::SouthEast,
        Location::SouthWest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Location::Center => "Center",
            Location::North => "North",
            Location::South => "South",
            Location::East => "East",
            Location::West => "West",
            Location::NorthEast => "NorthEast",
            Location::NorthWest => "NorthWest",
            Location::SouthEast => "SouthEast",
            Location::SouthWest => "SouthWest",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the service's spelling.
impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Location::ALL
            .into_iter()
            .find(|loc| loc.as_str() == s)
            .ok_or_else(|| Error::InvalidLocation(s.to_string()))
    }
}

/// One transformation request for the remote service.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Thumbnail,
    Label {
        text: String,
        location: String,
    },
    RoundCorners {
        radius: Numeric,
    },
    Cube {
        r: Numeric,
        g: Numeric,
        b: Numeric,
    },
    Raise {
        height: Numeric,
    },
    Scale {
        pct: Numeric,
    },
    Resize {
        width: Numeric,
        height: Numeric,
    },
    Focus,
    Emboss,
    Paint,
    Repaint {
        r: Numeric,
        g: Numeric,
        b: Numeric,
    },
    Frame {
        thickness: Numeric,
        r: Numeric,
        g: Numeric,
        b: Numeric,
    },
    RoundFrame {
        thickness: Numeric,
        radius: Numeric,
        r: Numeric,
        g: Numeric,
        b: Numeric,
    },
    Mirror,
    Grayscale,
    Blur,
    Brighten,
    Sobel,
}

/// A single operation-specific query field, before serialization.
enum Field<'a> {
    Text(&'a str),
    Number(&'a Numeric),
    Location(&'a str),
}

impl Field<'_> {
    fn as_str(&self) -> &str {
        match self {
            Field::Text(s) | Field::Location(s) => *s,
            Field::Number(n) => n.as_str(),
        }
    }
}

impl Operation {
    pub fn label(text: impl Into<String>, location: impl Into<String>) -> Self {
        Self::Label {
            text: text.into(),
            location: location.into(),
        }
    }

    pub fn round_corners(radius: impl Into<Numeric>) -> Self {
        Self::RoundCorners {
            radius: radius.into(),
        }
    }

    pub fn cube(r: impl Into<Numeric>, g: impl Into<Numeric>, b: impl Into<Numeric>) -> Self {
        Self::Cube {
            r: r.into(),
            g: g.into(),
            b: b.into(),
        }
    }

    pub fn raise(height: impl Into<Numeric>) -> Self {
        Self::Raise {
            height: height.into(),
        }
    }

    pub fn scale(pct: impl Into<Numeric>) -> Self {
        Self::Scale { pct: pct.into() }
    }

    pub fn resize(width: impl Into<Numeric>, height: impl Into<Numeric>) -> Self {
        Self::Resize {
            width: width.into(),
            height: height.into(),
        }
    }

    pub fn repaint(r: impl Into<Numeric>, g: impl Into<Numeric>, b: impl Into<Numeric>) -> Self {
        Self::Repaint {
            r: r.into(),
            g: g.into(),
            b: b.into(),
        }
    }

    pub fn frame(
        thickness: impl Into<Numeric>,
        r: impl Into<Numeric>,
        g: impl Into<Numeric>,
        b: impl Into<Numeric>,
    ) -> Self {
        Self::Frame {
            thickness: thickness.into(),
            r: r.into(),
            g: g.into(),
            b: b.into(),
        }
    }

    pub fn round_frame(
        thickness: impl Into<Numeric>,
        radius: impl Into<Numeric>,
        r: impl Into<Numeric>,
        g: impl Into<Numeric>,
        b: impl Into<Numeric>,
    ) -> Self {
        Self::RoundFrame {
            thickness: thickness.into(),
            radius: radius.into(),
            r: r.into(),
            g: g.into(),
            b: b.into(),
        }
    }

    /// Public method name, used in error messages and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Thumbnail => "thumbnail",
            Operation::Label { .. } => "label",
            Operation::RoundCorners { .. } => "round_corners",
            Operation::Cube { .. } => "cube",
            Operation::Raise { .. } => "raise",
            Operation::Scale { .. } => "scale",
            Operation::Resize { .. } => "resize",
            Operation::Focus => "focus",
            Operation::Emboss => "emboss",
            Operation::Paint => "paint",
            Operation::Repaint { .. } => "repaint",
            Operation::Frame { .. } => "frame",
            Operation::RoundFrame { .. } => "round_frame",
            Operation::Mirror => "mirror",
            Operation::Grayscale => "grayscale",
            Operation::Blur => "blur",
            Operation::Brighten => "brighten",
            Operation::Sobel => "sobel",
        }
    }

    /// Operation code sent as the `q` parameter.
    pub fn code(&self) -> &'static str {
        match self {
            Operation::RoundCorners { .. } => "round",
            Operation::RoundFrame { .. } => "rframe",
            other => other.name(),
        }
    }

    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        use Field::Number as N;
        match self {
            Operation::Label { text, location } => {
                vec![("t", Field::Text(text)), ("l", Field::Location(location))]
            }
            Operation::RoundCorners { radius } => vec![("r", N(radius))],
            Operation::Cube { r, g, b } | Operation::Repaint { r, g, b } => {
                vec![("r", N(r)), ("g", N(g)), ("b", N(b))]
            }
            Operation::Raise { height } => vec![("h", N(height))],
            Operation::Scale { pct } => vec![("p", N(pct))],
            Operation::Resize { width, height } => vec![("w", N(width)), ("h", N(height))],
            Operation::Frame { thickness, r, g, b } => {
                vec![("r", N(r)), ("g", N(g)), ("b", N(b)), ("t", N(thickness))]
            }
            Operation::RoundFrame {
                thickness,
                radius,
                r,
                g,
                b,
            } => vec![
                ("r", N(r)),
                ("g", N(g)),
                ("b", N(b)),
                ("t", N(thickness)),
                ("v", N(radius)),
            ],
            Operation::Thumbnail
            | Operation::Focus
            | Operation::Emboss
            | Operation::Paint
            | Operation::Mirror
            | Operation::Grayscale
            | Operation::Blur
            | Operation::Brighten
            | Operation::Sobel => Vec::new(),
        }
    }

    /// Check every argument. The first bad field wins.
    pub fn validate(&self) -> Result<()> {
        for (_, field) in self.fields() {
            match field {
                Field::Number(n) if !n.is_valid() => {
                    return Err(Error::NonNumericArgument {
                        operation: self.name(),
                        value: n.to_string(),
                    });
                }
                Field::Location(loc) => {
                    loc.parse::<Location>()?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Operation-specific query parameters in wire order (excludes `s` and `q`).
    pub fn params(&self) -> Vec<(&'static str, String)> {
        self.fields()
            .into_iter()
            .map(|(key, field)| (key, field.as_str().to_string()))
            .collect()
    }
}
