use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8Premul;

/// Format versions this decoder understands.
pub(crate) const SUPPORTED_VERSIONS: &[&str] = &["1"];

/// Only the `version` field, read before the full document so that a future layout is reported as
/// unsupported rather than malformed.
#[derive(Debug, Deserialize)]
pub(crate) struct VersionProbe {
    pub(crate) version: VersionDef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum VersionDef {
    Text(String),
    Number(u64),
}

impl VersionDef {
    pub(crate) fn as_string(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_owned(),
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SpriteDocDef {
    pub(crate) version: VersionDef,
    pub(crate) fps: FpsDef,
    #[serde(rename = "loop", default = "default_loop")]
    pub(crate) looping: bool,
    pub(crate) canvas: CanvasDef,
    #[serde(default)]
    pub(crate) assets: BTreeMap<String, AssetDef>,
    pub(crate) frames: Vec<FrameDef>,
}

fn default_loop() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct CanvasDef {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct FpsDef {
    pub(crate) num: u32,
    pub(crate) den: u32,
}

impl<'de> Deserialize<'de> for FpsDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Whole(u32),
            Obj {
                num: u32,
                #[serde(default = "one")]
                den: u32,
            },
        }

        fn one() -> u32 {
            1
        }

        match Repr::deserialize(deserializer)? {
            Repr::Whole(num) => Ok(Self { num, den: 1 }),
            Repr::Obj { num, den } => Ok(Self { num, den }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum AssetDef {
    Image(ImageDef),
    Path(PathDef),
    Svg(SvgDef),
    Solid(SolidDef),
}

/// Bitmap from a resource-relative file, or inline straight-alpha RGBA8 pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ImageDef {
    #[serde(default)]
    pub(crate) path: Option<String>,
    #[serde(default)]
    pub(crate) width: Option<u32>,
    #[serde(default)]
    pub(crate) height: Option<u32>,
    #[serde(default)]
    pub(crate) rgba: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PathDef {
    pub(crate) d: String,
    #[serde(default = "default_fill")]
    pub(crate) fill: ColorDef,
}

fn default_fill() -> ColorDef {
    ColorDef([255, 255, 255, 255])
}

/// SVG document from a resource-relative file or inline markup. `width`/`height` override the
/// raster size (defaults to the document's intrinsic size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SvgDef {
    #[serde(default)]
    pub(crate) path: Option<String>,
    #[serde(default)]
    pub(crate) markup: Option<String>,
    #[serde(default)]
    pub(crate) width: Option<u32>,
    #[serde(default)]
    pub(crate) height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SolidDef {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) color: ColorDef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FrameDef {
    #[serde(default)]
    pub(crate) elements: Vec<ElementDef>,
    /// Number of consecutive frame slots this entry occupies.
    #[serde(default = "default_hold")]
    pub(crate) hold: u32,
}

fn default_hold() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ElementDef {
    pub(crate) asset: String,
    #[serde(default)]
    pub(crate) transform: TransformDef,
    #[serde(default = "default_opacity")]
    pub(crate) opacity: f64,
    #[serde(default)]
    pub(crate) z: i32,
}

fn default_opacity() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TransformDef {
    #[serde(default)]
    pub(crate) translate: Vec2Def,
    #[serde(default)]
    pub(crate) rotation_deg: f64,
    #[serde(default = "unit_scale")]
    pub(crate) scale: Vec2Def,
    #[serde(default)]
    pub(crate) anchor: Vec2Def,
}

fn unit_scale() -> Vec2Def {
    Vec2Def { x: 1.0, y: 1.0 }
}

impl Default for TransformDef {
    fn default() -> Self {
        Self {
            translate: Vec2Def::default(),
            rotation_deg: 0.0,
            scale: unit_scale(),
            anchor: Vec2Def::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub(crate) struct Vec2Def {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl<'de> Deserialize<'de> for Vec2Def {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([f64; 2]),
            Obj { x: f64, y: f64 },
            Uniform(f64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([x, y]) => Ok(Self { x, y }),
            Repr::Obj { x, y } => Ok(Self { x, y }),
            Repr::Uniform(v) => Ok(Self { x: v, y: v }),
        }
    }
}

/// Straight-alpha RGBA8 color, written as `[r,g,b]`, `[r,g,b,a]`, or `"#RRGGBB[AA]"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ColorDef(pub(crate) [u8; 4]);

impl ColorDef {
    pub(crate) fn to_rgba8_premul(self) -> Rgba8Premul {
        let [r, g, b, a] = self.0;
        Rgba8Premul::from_straight_rgba(r, g, b, a)
    }
}

impl<'de> Deserialize<'de> for ColorDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v.as_slice() {
                &[r, g, b] => Ok(Self([r, g, b, 255])),
                &[r, g, b, a] => Ok(Self([r, g, b, a])),
                _ => Err(serde::de::Error::custom(
                    "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn parse_hex(s: &str) -> Result<ColorDef, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }
    match s.len() {
        6 => Ok(ColorDef([
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        ])),
        8 => Ok(ColorDef([
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ])),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}
