//! The two conversion directions offered on the home page.

use std::{fmt, str::FromStr};

/// A conversion tab, as carried by `?tab=` and the `tab` form field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tab {
    /// One PDF in, a ZIP of per-page PNGs out.
    Pdf2Png,
    /// PNG/JPEG images in, one merged PDF out.
    #[default]
    Png2Pdf,
}

impl Tab {
    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Pdf2Png => "pdf2png",
            Tab::Png2Pdf => "png2pdf",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pdf2png" => Ok(Tab::Pdf2Png),
            "png2pdf" => Ok(Tab::Png2Pdf),
            other => Err(format!("unknown tab `{}`", other)),
        }
    }
}
