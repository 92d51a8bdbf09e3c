use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Dimension {
    #[default]
    Overworld,
    Underworld,
    Sky,
}

impl Dimension {
    pub fn all() -> &'static [Dimension] {
        &[Dimension::Overworld, Dimension::Underworld, Dimension::Sky]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Overworld => "overworld",
            Dimension::Underworld => "underworld",
            Dimension::Sky => "sky",
        }
    }

    /// Tags matched through the `#` prefix in dimension expressions.
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Dimension::Overworld => &["NATURAL", "SURFACE"],
            Dimension::Underworld => &["UNNATURAL", "CEILING", "HOT"],
            Dimension::Sky => &["UNNATURAL", "FLOATING"],
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
