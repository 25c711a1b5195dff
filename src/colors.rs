//! Wire color model.
//!
//! A [`SingleColor`] carries the English two-letter code, the German
//! short code, and the HTML value for one base color. A [`MultiColor`]
//! is an ordered run of one to three base colors, as found on striped
//! wire insulation. Rendering never touches global state: the caller
//! passes a [`ColorMode`] to every call that produces text.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::HarnessError;

/// One entry of the known-color table.
#[derive(Debug, Clone, Copy)]
pub struct KnownColor {
    pub html: &'static str,
    pub code_de: &'static str,
    pub full_en: &'static str,
    pub full_de: &'static str,
}

const KNOWN_COLORS: &[(&str, KnownColor)] = &[
    ("BK", KnownColor { html: "#000000", code_de: "sw", full_en: "black", full_de: "schwarz" }),
    ("WH", KnownColor { html: "#ffffff", code_de: "ws", full_en: "white", full_de: "weiß" }),
    ("GY", KnownColor { html: "#999999", code_de: "gr", full_en: "grey", full_de: "grau" }),
    ("PK", KnownColor { html: "#ff66cc", code_de: "rs", full_en: "pink", full_de: "rosa" }),
    ("RD", KnownColor { html: "#ff0000", code_de: "rt", full_en: "red", full_de: "rot" }),
    ("OG", KnownColor { html: "#ff8000", code_de: "or", full_en: "orange", full_de: "orange" }),
    ("YE", KnownColor { html: "#ffff00", code_de: "ge", full_en: "yellow", full_de: "gelb" }),
    ("OL", KnownColor { html: "#708000", code_de: "ol", full_en: "olive green", full_de: "olivgrün" }),
    ("GN", KnownColor { html: "#00ff00", code_de: "gn", full_en: "green", full_de: "grün" }),
    ("TQ", KnownColor { html: "#00ffff", code_de: "tk", full_en: "turquoise", full_de: "türkis" }),
    ("LB", KnownColor { html: "#a0dfff", code_de: "hb", full_en: "light blue", full_de: "hellblau" }),
    ("BU", KnownColor { html: "#0066ff", code_de: "bl", full_en: "blue", full_de: "blau" }),
    ("VT", KnownColor { html: "#8000ff", code_de: "vi", full_en: "violet", full_de: "violett" }),
    ("BN", KnownColor { html: "#895956", code_de: "br", full_en: "brown", full_de: "braun" }),
    ("BG", KnownColor { html: "#ceb673", code_de: "bg", full_en: "beige", full_de: "beige" }),
    ("IV", KnownColor { html: "#f5f0d0", code_de: "eb", full_en: "ivory", full_de: "elfenbein" }),
    ("SL", KnownColor { html: "#708090", code_de: "si", full_en: "slate", full_de: "schiefer" }),
    ("CU", KnownColor { html: "#d6775e", code_de: "ku", full_en: "copper", full_de: "Kupfer" }),
    ("SN", KnownColor { html: "#aaaaaa", code_de: "vz", full_en: "tin", full_de: "verzinkt" }),
    ("SR", KnownColor { html: "#84878c", code_de: "ag", full_en: "silver", full_de: "Silber" }),
    ("GD", KnownColor { html: "#ffcf80", code_de: "au", full_en: "gold", full_de: "Gold" }),
];

fn known_color(code: &str) -> Option<&'static KnownColor> {
    let upper = code.to_uppercase();
    KNOWN_COLORS
        .iter()
        .find(|(key, _)| *key == upper)
        .map(|(_, color)| color)
}

/// Text output mode for color rendering.
///
/// Passed explicitly to every rendering call; there is no process-wide
/// output mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    EnUpper,
    EnLower,
    DeUpper,
    DeLower,
    HtmlUpper,
    HtmlLower,
}

impl ColorMode {
    fn is_lower(self) -> bool {
        matches!(self, Self::EnLower | Self::DeLower | Self::HtmlLower)
    }

    fn is_html(self) -> bool {
        matches!(self, Self::HtmlUpper | Self::HtmlLower)
    }

    fn is_german(self) -> bool {
        matches!(self, Self::DeUpper | Self::DeLower)
    }

    fn convert_case(self, text: &str) -> String {
        if self.is_lower() {
            text.to_lowercase()
        } else {
            text.to_uppercase()
        }
    }
}

/// A single base color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleColor {
    code_en: String,
    code_de: String,
    html: String,
    known: bool,
}

impl SingleColor {
    /// Parse a color from text: a known two-letter code
    /// (case-insensitive, canonicalized to uppercase) or a literal
    /// HTML color.
    pub fn parse(input: &str) -> Self {
        match known_color(input) {
            Some(entry) => {
                let upper = input.to_uppercase();
                Self {
                    code_en: upper,
                    code_de: entry.code_de.to_string(),
                    html: entry.html.to_string(),
                    known: true,
                }
            }
            None => Self {
                code_en: input.to_string(),
                code_de: input.to_string(),
                html: input.to_string(),
                known: false,
            },
        }
    }

    /// Build a color from a 24-bit RGB value. The result is formatted
    /// as `#rrggbb` and flagged as not a known code, so no reverse
    /// lookup to a short code happens.
    pub fn from_rgb(rgb: u32) -> Self {
        let hex = format!("#{rgb:06x}");
        Self {
            code_en: hex.clone(),
            code_de: hex.clone(),
            html: hex,
            known: false,
        }
    }

    pub fn known(&self) -> bool {
        self.known
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn code_en(&self) -> &str {
        &self.code_en
    }

    pub fn code_de(&self) -> &str {
        &self.code_de
    }

    /// Full English name, for known codes only.
    pub fn full_en(&self) -> Option<&'static str> {
        if self.known {
            known_color(&self.code_en).map(|entry| entry.full_en)
        } else {
            None
        }
    }

    /// Full German name, for known codes only.
    pub fn full_de(&self) -> Option<&'static str> {
        if self.known {
            known_color(&self.code_en).map(|entry| entry.full_de)
        } else {
            None
        }
    }

    /// Render in the given output mode. Unknown colors always render
    /// as their HTML value.
    pub fn render(&self, mode: ColorMode) -> String {
        let raw = if !self.known || mode.is_html() {
            &self.html
        } else if mode.is_german() {
            &self.code_de
        } else {
            &self.code_en
        };
        mode.convert_case(raw)
    }
}

impl fmt::Display for SingleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(ColorMode::default()))
    }
}

/// An ordered run of base colors, as printed on striped insulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiColor {
    colors: Vec<SingleColor>,
}

impl MultiColor {
    pub fn new(colors: Vec<SingleColor>) -> Self {
        Self { colors }
    }

    pub fn from_single(color: SingleColor) -> Self {
        Self { colors: vec![color] }
    }

    pub fn from_rgb(rgb: u32) -> Self {
        Self::from_single(SingleColor::from_rgb(rgb))
    }

    /// Parse a color run from text.
    ///
    /// `:`-separated segments are each parsed as a single color. An
    /// even-length string whose every 2-character chunk is a known code
    /// splits into that many singles (`"GYPK"` is grey + pink).
    /// Anything else is one literal HTML color.
    pub fn parse(input: &str) -> Self {
        if input.contains(':') {
            return Self {
                colors: input.split(':').map(SingleColor::parse).collect(),
            };
        }
        if !input.is_empty() && input.len() % 2 == 0 && input.is_ascii() {
            let chunks: Vec<&str> = input
                .as_bytes()
                .chunks(2)
                .map(|pair| std::str::from_utf8(pair).unwrap_or(input))
                .collect();
            if chunks.iter().all(|chunk| known_color(chunk).is_some()) {
                return Self {
                    colors: chunks.into_iter().map(SingleColor::parse).collect(),
                };
            }
        }
        Self::from_single(SingleColor::parse(input))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[SingleColor] {
        &self.colors
    }

    pub fn all_known(&self) -> bool {
        self.colors.iter().all(SingleColor::known)
    }

    /// Render in the given output mode. Segments join with no separator
    /// when every segment is a known code in an EN/DE mode (`GYPK`);
    /// otherwise, and always in HTML modes, with `:`.
    pub fn render(&self, mode: ColorMode) -> String {
        let joiner = if !mode.is_html() && self.all_known() {
            ""
        } else {
            ":"
        };
        self.colors
            .iter()
            .map(|color| color.render(mode))
            .collect::<Vec<_>>()
            .join(joiner)
    }

    /// All segments as HTML values, `:`-joined (Graphviz color-list
    /// syntax).
    pub fn html(&self) -> String {
        self.colors
            .iter()
            .map(|color| color.html().to_string())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Pad to a three-stripe bar: one color is tripled, two become
    /// `[first, second, first]` so a two-tone wire reads centered,
    /// three pass through. More than three segments is an unsupported
    /// configuration.
    pub fn padded(&self) -> Result<Vec<SingleColor>, HarnessError> {
        match self.colors.as_slice() {
            [] => Ok(vec![]),
            [single] => Ok(vec![single.clone(); 3]),
            [first, second] => Ok(vec![first.clone(), second.clone(), first.clone()]),
            [_, _, _] => Ok(self.colors.clone()),
            longer => Err(HarnessError::UnsupportedPadding(longer.len())),
        }
    }

    /// Padded stripe bar as a `:`-joined HTML color list.
    pub fn html_padded(&self) -> Result<String, HarnessError> {
        Ok(self
            .padded()?
            .iter()
            .map(|color| color.html().to_string())
            .collect::<Vec<_>>()
            .join(":"))
    }
}

impl fmt::Display for MultiColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(ColorMode::default()))
    }
}

impl Serialize for MultiColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render(ColorMode::EnUpper))
    }
}

impl<'de> Deserialize<'de> for MultiColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Scalar {
            Number(u32),
            Text(String),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Input {
            Number(u32),
            Text(String),
            List(Vec<Scalar>),
        }

        match Input::deserialize(deserializer)? {
            Input::Number(rgb) => Ok(Self::from_rgb(rgb)),
            Input::Text(text) => Ok(Self::parse(&text)),
            Input::List(items) => {
                let colors = items
                    .into_iter()
                    .map(|item| match item {
                        Scalar::Number(rgb) => Ok(SingleColor::from_rgb(rgb)),
                        Scalar::Text(text) if !text.is_empty() => Ok(SingleColor::parse(&text)),
                        Scalar::Text(_) => Err(D::Error::custom("empty color segment")),
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Self::new(colors))
            }
        }
    }
}

/// Standard wire color-code tables. A bundle declared with a scheme
/// instead of an explicit color list draws its wire colors from the
/// table in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorScheme {
    Din,
    Iec,
    Bw,
    Tel,
    Telalt,
    T568a,
    T568b,
}

impl ColorScheme {
    pub fn codes(self) -> &'static [&'static str] {
        match self {
            Self::Din => &[
                "WH", "BN", "GN", "YE", "GY", "PK", "BU", "RD", "BK", "VT", "GYPK", "RDBU",
                "WHGN", "BNGN", "WHYE", "YEBN", "WHGY", "GYBN", "WHPK", "PKBN", "WHBU", "BNBU",
                "WHRD", "BNRD", "WHBK", "BNBK", "GYGN", "YEGY", "PKGN", "YEPK", "GNBU", "YEBU",
                "GNRD", "YERD", "GNBK", "YEBK", "GYBU", "PKBU", "GYRD", "PKRD", "GYBK", "PKBK",
                "BUBK", "RDBK", "WHBNBK", "YEGNBK", "GYPKBK", "RDBUBK", "WHGNBK", "BNGNBK",
                "WHYEBK", "YEBNBK", "WHGYBK", "GYBNBK", "WHPKBK", "PKBNBK", "WHBUBK",
                "BNBUBK", "WHRDBK", "BNRDBK",
            ],
            Self::Iec => &["BN", "RD", "OG", "YE", "GN", "BU", "VT", "GY", "WH", "BK"],
            Self::Bw => &["BK", "WH"],
            // 25-pair color code: ring then tip of each pair
            Self::Tel => &[
                "BUWH", "WHBU", "OGWH", "WHOG", "GNWH", "WHGN", "BNWH", "WHBN", "SLWH", "WHSL",
                "BURD", "RDBU", "OGRD", "RDOG", "GNRD", "RDGN", "BNRD", "RDBN", "SLRD", "RDSL",
                "BUBK", "BKBU", "OGBK", "BKOG", "GNBK", "BKGN", "BNBK", "BKBN", "SLBK", "BKSL",
                "BUYE", "YEBU", "OGYE", "YEOG", "GNYE", "YEGN", "BNYE", "YEBN", "SLYE", "YESL",
                "BUVT", "VTBU", "OGVT", "VTOG", "GNVT", "VTGN", "BNVT", "VTBN", "SLVT", "VTSL",
            ],
            // 25-pair color code: tip then ring of each pair
            Self::Telalt => &[
                "WHBU", "BU", "WHOG", "OG", "WHGN", "GN", "WHBN", "BN", "WHSL", "SL",
                "RDBU", "BURD", "RDOG", "OGRD", "RDGN", "GNRD", "RDBN", "BNRD", "RDSL", "SLRD",
                "BKBU", "BUBK", "BKOG", "OGBK", "BKGN", "GNBK", "BKBN", "BNBK", "BKSL", "SLBK",
                "YEBU", "BUYE", "YEOG", "OGYE", "YEGN", "GNYE", "YEBN", "BNYE", "YESL", "SLYE",
                "VTBU", "BUVT", "VTOG", "OGVT", "VTGN", "GNVT", "VTBN", "BNVT", "VTSL", "SLVT",
            ],
            Self::T568a => &["WHGN", "GN", "WHOG", "BU", "WHBU", "OG", "WHBN", "BN"],
            Self::T568b => &["WHOG", "OG", "WHGN", "BU", "WHBU", "GN", "WHBN", "BN"],
        }
    }
}
