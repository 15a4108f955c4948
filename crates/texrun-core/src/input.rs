/*
 * input.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The LaTeX snippet to compile and how to typeset it.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A length in LaTeX points.
pub type Length = f64;

/// An RGBA color with 0-255 channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    /// Color from 8-bit channels, alpha 255 being opaque.
    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Opaque color.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::rgba(red, green, blue, 255)
    }

    /// Opaque black, the default foreground.
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Fully transparent white, the default background.
    pub const TRANSPARENT_WHITE: Color = Color::rgba(255, 255, 255, 0);

    /// Whether the color is fully transparent.
    pub fn is_transparent(&self) -> bool {
        self.alpha == 0
    }
}

/// Margins around the typeset output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Margins {
    /// The same margin on all four sides.
    pub fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }
}

/// A piece of LaTeX code and how to compile it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    /// LaTeX code to process, without math mode delimiters
    pub latex: String,

    /// Opening and closing math mode delimiters, e.g. `("\\[", "\\]")`
    pub math_mode: (String, String),

    /// Code placed in the document preamble
    pub preamble: String,

    /// LaTeX engine, e.g. `pdflatex`, `xelatex`, `lualatex`
    pub latex_engine: String,

    /// Font size in points
    pub font_size: Length,

    /// Text color
    pub fg_color: Color,

    /// Background color
    pub bg_color: Color,

    /// Space added around the rendered equation
    pub margins: Margins,

    /// Rasterization resolution in dots per inch
    pub dpi: u32,

    /// Scale factor applied to the output
    pub scale: f64,

    /// Convert glyphs to outlines in vector output
    pub outline_fonts: bool,

    /// Backend-specific parameters
    pub parameters: BTreeMap<String, Value>,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            latex: String::new(),
            math_mode: ("\\(".to_string(), "\\)".to_string()),
            preamble: String::new(),
            latex_engine: "pdflatex".to_string(),
            font_size: 11.0,
            fg_color: Color::BLACK,
            bg_color: Color::TRANSPARENT_WHITE,
            margins: Margins::default(),
            dpi: 600,
            scale: 1.0,
            outline_fonts: true,
            parameters: BTreeMap::new(),
        }
    }
}

impl Input {
    /// Input with the given LaTeX code and default settings otherwise.
    pub fn new(latex: impl Into<String>) -> Self {
        Self {
            latex: latex.into(),
            ..Self::default()
        }
    }

    /// Use `open` and `close` as math mode delimiters.
    pub fn with_math_mode(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.math_mode = (open.into(), close.into());
        self
    }

    /// Set the preamble code.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Compile with `engine` instead of `pdflatex`.
    pub fn with_latex_engine(mut self, engine: impl Into<String>) -> Self {
        self.latex_engine = engine.into();
        self
    }

    /// Add a backend-specific parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// The LaTeX code wrapped in the math mode delimiters.
    pub fn math_latex(&self) -> String {
        format!("{}{}{}", self.math_mode.0, self.latex, self.math_mode.1)
    }
}
