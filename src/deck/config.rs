//! Layout configuration for a generation run.
//!
//! [`SlideLayoutConfig`] is deserialized with serde; every field has a
//! default, so a YAML document only needs the keys it changes. Enumerated
//! settings are lenient: an unrecognized value falls back to that setting's
//! default instead of failing the whole document.

use crate::common::{Error, RGBColor, Result};
use crate::common::unit::inches_to_emu;
use crate::ooxml::pptx::{Autofit, TextAlign, TextFormat};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// Define a string-valued setting with a default and spelling aliases.
///
/// Values are matched after lowercasing and mapping `-`/space to `_`.
macro_rules! lenient_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident {
            $($(#[$vmeta:meta])* $variant:ident => [$first:literal $(, $alias:literal)*]),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl $name {
            /// Parse a setting value, falling back to the default when it is
            /// not recognized.
            pub fn parse(value: &str) -> Self {
                let normalized = value.trim().to_lowercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($first $(| $alias)* => Self::$variant,)+
                    _ => {
                        warn!(value, setting = stringify!($name), "unrecognized value, using default");
                        Self::default()
                    },
                }
            }

            /// Canonical spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $first,)+
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Ok(Self::parse(&value))
            }
        }
    };
}

lenient_enum! {
    /// How an image is scaled into its bounding box.
    SizingMode, default = FitBox {
        /// Largest size that fits the box, keeping the aspect ratio
        FitBox => ["fit_box", "fitbox", "fit"],
        /// Box width, height from the aspect ratio
        FitWidth => ["fit_width", "fitwidth"],
        /// Box height, width from the aspect ratio
        FitHeight => ["fit_height", "fitheight"],
        /// Exactly the box, ignoring the aspect ratio
        Stretch => ["stretch", "fill"],
    }
}

lenient_enum! {
    VerticalAlign, default = Center {
        Top => ["top"],
        Center => ["center", "middle", "centre"],
        Bottom => ["bottom"],
    }
}

lenient_enum! {
    /// Horizontal placement, used for images and for text paragraphs.
    HorizontalAlign, default = Center {
        Left => ["left"],
        Center => ["center", "centre", "middle"],
        Right => ["right"],
    }
}

lenient_enum! {
    /// What happens when text does not fit its container.
    Overflow, default = Grow {
        /// The container grows with the text
        Grow => ["grow", "resize", "shape_to_fit"],
        /// The text shrinks to fit the container
        Shrink => ["shrink", "shrink_on_overflow"],
    }
}

lenient_enum! {
    PositionMode, default = Auto {
        Auto => ["auto", "flow"],
        Fixed => ["fixed", "absolute"],
    }
}

lenient_enum! {
    /// Where slides come from: an empty slide or a clone of the template's
    /// first slide.
    TemplateMode, default = Blank {
        Blank => ["blank"],
        Template => ["template"],
    }
}

lenient_enum! {
    /// One image and one text block per slide, or several named elements.
    ElementMode, default = Single {
        Single => ["single", "legacy"],
        Multi => ["multi", "multiple", "multi_element"],
    }
}

lenient_enum! {
    Orientation, default = Portrait {
        /// 7.5 x 10 in
        Portrait => ["portrait"],
        /// 10 x 7.5 in
        Landscape => ["landscape"],
    }
}

impl HorizontalAlign {
    pub fn to_text_align(self) -> TextAlign {
        match self {
            Self::Left => TextAlign::Left,
            Self::Center => TextAlign::Center,
            Self::Right => TextAlign::Right,
        }
    }
}

impl Overflow {
    pub fn autofit(self) -> Autofit {
        match self {
            Self::Grow => Autofit::ShapeToFitText,
            Self::Shrink => Autofit::ShrinkTextOnOverflow,
        }
    }
}

impl Orientation {
    /// Slide width and height in inches.
    pub fn size_inches(self) -> (f64, f64) {
        match self {
            Self::Portrait => (7.5, 10.0),
            Self::Landscape => (10.0, 7.5),
        }
    }
}

/// The four ways a run can compose slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    BlankSingle,
    BlankMulti,
    TemplateSingle,
    TemplateMulti,
}

impl GenerationMode {
    pub fn uses_template(self) -> bool {
        matches!(self, Self::TemplateSingle | Self::TemplateMulti)
    }
}

/// Image placement within the bounding box, on both axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAlignment {
    pub vertical: VerticalAlign,
    pub horizontal: HorizontalAlign,
}

/// Typography of one text column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnFormat {
    /// Font size in points; `None` uses the run's default font size
    pub font_size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub font_name: String,
    /// Hex colour without `#`
    #[serde(deserialize_with = "hex_color")]
    pub color: String,
}

impl Default for ColumnFormat {
    fn default() -> Self {
        Self {
            font_size: None,
            bold: false,
            italic: false,
            font_name: "Calibri".to_string(),
            color: "000000".to_string(),
        }
    }
}

impl ColumnFormat {
    /// Run formatting, with `default_size` filling an unset font size. An
    /// unparsable colour falls back to black.
    pub fn text_format(&self, default_size: f64) -> TextFormat {
        TextFormat {
            font: Some(self.font_name.clone()).filter(|f| !f.trim().is_empty()),
            size: Some(self.font_size.unwrap_or(default_size)),
            bold: Some(self.bold),
            italic: Some(self.italic),
            color: Some(RGBColor::from_hex(&self.color).unwrap_or(RGBColor::BLACK)),
        }
    }
}

/// Placement of one text column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnPosition {
    pub mode: PositionMode,
    /// Inches from the slide top; required for fixed placement
    pub top: Option<f64>,
    /// Inches from the slide left
    pub left: f64,
    /// Container width in inches; `None` spans the slide minus margins
    pub width: Option<f64>,
}

impl Default for ColumnPosition {
    fn default() -> Self {
        Self {
            mode: PositionMode::Auto,
            top: None,
            left: 0.5,
            width: None,
        }
    }
}

/// A resolved fixed position, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPosition {
    pub top: f64,
    pub left: f64,
    pub width: Option<f64>,
}

impl ColumnPosition {
    /// The fixed box of this column, or `None` when it flows with the
    /// automatic text block. A fixed column without `top` flows too.
    pub fn fixed(&self) -> Option<FixedPosition> {
        match (self.mode, self.top) {
            (PositionMode::Fixed, Some(top)) => Some(FixedPosition {
                top,
                left: self.left,
                width: self.width,
            }),
            _ => None,
        }
    }
}

/// An image source column bound to a named template shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    pub column: String,
    pub placeholder_name: String,
    /// `None` uses the run's sizing mode
    #[serde(default)]
    pub sizing_mode: Option<SizingMode>,
    /// `None` uses the run's image alignment
    #[serde(default)]
    pub alignment: Option<ImageAlignment>,
}

/// Text columns bound to a named template shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGroup {
    pub columns: Vec<String>,
    pub placeholder_name: String,
    /// When set, the group's non-empty texts are joined into the first
    /// content slot
    #[serde(default)]
    pub separator: Option<String>,
}

/// Configuration of a generation run.
///
/// Lengths are in inches, font sizes and spacing in points.
///
/// # Examples
///
/// ```rust
/// use rowdeck::deck::{SlideLayoutConfig, SizingMode};
///
/// let config = SlideLayoutConfig::from_yaml_str(
///     "image_column: Photo\ntext_columns: [Name, Price]\nimage_sizing: stretch\n",
/// )?;
/// assert_eq!(config.image_sizing, SizingMode::Stretch);
/// assert_eq!(config.img_width, 5.5);
/// # Ok::<(), rowdeck::common::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideLayoutConfig {
    /// Worksheet name; `None` selects the active sheet
    pub sheet: Option<String>,
    /// Data rows beyond this are ignored
    pub max_rows: usize,
    /// Column holding images (name, letter or zero-based index)
    pub image_column: String,
    /// Text columns in the order they fill the slide
    pub text_columns: Vec<String>,

    pub img_width: f64,
    pub img_height: f64,
    pub img_top: f64,
    pub img_left: f64,
    pub image_sizing: SizingMode,
    pub image_alignment: ImageAlignment,

    pub text_top: f64,
    pub text_left: f64,
    pub text_alignment: HorizontalAlign,
    pub font_size: f64,
    /// Space after each generated paragraph
    pub paragraph_spacing: f64,
    pub overflow: Overflow,
    pub column_formats: BTreeMap<String, ColumnFormat>,
    pub column_positions: BTreeMap<String, ColumnPosition>,
    /// Joins the texts of a block into its first slot when set
    pub text_separator: Option<String>,

    pub orientation: Orientation,
    pub template_mode: TemplateMode,
    pub element_mode: ElementMode,
    /// Image shape name in single-element template mode (loose match)
    pub image_placeholder: String,
    /// Text shape name in single-element template mode (loose match)
    pub text_placeholder: String,
    pub image_elements: Option<Vec<ImageElement>>,
    pub text_groups: Option<Vec<TextGroup>>,

    /// Largest accepted image, in megabytes
    pub max_image_mb: f64,
    /// Accepted local file extensions, with the leading dot
    pub allowed_extensions: Vec<String>,
    /// Directory relative image paths are resolved against
    pub base_path: Option<PathBuf>,
    /// Image resolver worker threads
    pub resolver_workers: usize,
    /// Compose rows on the rayon pool
    pub parallel_rows: bool,
}

impl Default for SlideLayoutConfig {
    fn default() -> Self {
        Self {
            sheet: None,
            max_rows: 1000,
            image_column: "B".to_string(),
            text_columns: ["C", "D", "E", "F"].iter().map(|c| c.to_string()).collect(),
            img_width: 5.5,
            img_height: 4.0,
            img_top: 0.5,
            img_left: 0.5,
            image_sizing: SizingMode::FitBox,
            image_alignment: ImageAlignment::default(),
            text_top: 5.0,
            text_left: 0.5,
            text_alignment: HorizontalAlign::Center,
            font_size: 14.0,
            paragraph_spacing: 0.0,
            overflow: Overflow::Grow,
            column_formats: BTreeMap::new(),
            column_positions: BTreeMap::new(),
            text_separator: None,
            orientation: Orientation::Portrait,
            template_mode: TemplateMode::Blank,
            element_mode: ElementMode::Single,
            image_placeholder: "Rectangle 1".to_string(),
            text_placeholder: "TextBox".to_string(),
            image_elements: None,
            text_groups: None,
            max_image_mb: 10.0,
            allowed_extensions: [".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            base_path: None,
            resolver_workers: 5,
            parallel_rows: false,
        }
    }
}

impl SlideLayoutConfig {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Typography of a column: its configured format (exact key, then
    /// case-insensitive), else the defaults. The font size falls back to
    /// [`font_size`](Self::font_size).
    pub fn column_format(&self, column: &str) -> ColumnFormat {
        let mut format = lookup(&self.column_formats, column).cloned().unwrap_or_default();
        format.font_size.get_or_insert(self.font_size);
        format
    }

    /// Configured placement of a column; `None` when it flows automatically.
    pub fn column_position(&self, column: &str) -> Option<FixedPosition> {
        lookup(&self.column_positions, column).and_then(ColumnPosition::fixed)
    }

    #[inline]
    pub fn image_alignment(&self) -> ImageAlignment {
        self.image_alignment
    }

    /// Paragraph spacing in points, never negative.
    #[inline]
    pub fn paragraph_spacing(&self) -> f64 {
        self.paragraph_spacing.max(0.0)
    }

    /// Largest accepted image in bytes.
    pub fn max_image_bytes(&self) -> u64 {
        (self.max_image_mb.max(0.0) * 1024.0 * 1024.0) as u64
    }

    /// Image elements of the run. An explicit list wins, even when empty;
    /// otherwise one element is built from the single-element fields.
    pub fn image_elements(&self) -> Vec<ImageElement> {
        match &self.image_elements {
            Some(elements) => elements.clone(),
            None => vec![ImageElement {
                column: self.image_column.clone(),
                placeholder_name: self.image_placeholder.clone(),
                sizing_mode: Some(self.image_sizing),
                alignment: Some(self.image_alignment),
            }],
        }
    }

    /// Text groups of the run. An explicit list wins, even when empty;
    /// otherwise one group is built from the single-element fields.
    pub fn text_groups(&self) -> Vec<TextGroup> {
        match &self.text_groups {
            Some(groups) => groups.clone(),
            None if self.text_columns.is_empty() => Vec::new(),
            None => vec![TextGroup {
                columns: self.text_columns.clone(),
                placeholder_name: self.text_placeholder.clone(),
                separator: self.text_separator.clone(),
            }],
        }
    }

    /// Every image column the run reads, without duplicates, in order.
    pub fn image_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let elements = match self.element_mode {
            ElementMode::Single => vec![ImageElement {
                column: self.image_column.clone(),
                placeholder_name: self.image_placeholder.clone(),
                sizing_mode: None,
                alignment: None,
            }],
            ElementMode::Multi => self.image_elements(),
        };
        for element in elements {
            if !element.column.trim().is_empty() && !columns.contains(&element.column) {
                columns.push(element.column);
            }
        }
        columns
    }

    /// Every text column the run reads, without duplicates, in order.
    pub fn all_text_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let groups: Vec<Vec<String>> = match self.element_mode {
            ElementMode::Single => vec![self.text_columns.clone()],
            ElementMode::Multi => self.text_groups().into_iter().map(|g| g.columns).collect(),
        };
        for column in groups.into_iter().flatten() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    /// The mode of a run, given whether a template is present.
    ///
    /// Template mode without a template is a configuration error.
    pub fn generation_mode(&self, has_template: bool) -> Result<GenerationMode> {
        match (self.template_mode, self.element_mode) {
            (TemplateMode::Template, _) if !has_template => Err(Error::Config(
                "template mode requires a template presentation".to_string(),
            )),
            (TemplateMode::Template, ElementMode::Single) => Ok(GenerationMode::TemplateSingle),
            (TemplateMode::Template, ElementMode::Multi) => Ok(GenerationMode::TemplateMulti),
            (TemplateMode::Blank, ElementMode::Single) => Ok(GenerationMode::BlankSingle),
            (TemplateMode::Blank, ElementMode::Multi) => Ok(GenerationMode::BlankMulti),
        }
    }

    /// Slide size in inches for blank presentations.
    #[inline]
    pub fn slide_size(&self) -> (f64, f64) {
        self.orientation.size_inches()
    }

    /// Slide size in EMUs for blank presentations.
    pub fn slide_size_emu(&self) -> (i64, i64) {
        let (w, h) = self.slide_size();
        (inches_to_emu(w), inches_to_emu(h))
    }
}

/// Accept `color: 000000` as well as `color: "000000"`; YAML reads the
/// unquoted form as a number.
fn hex_color<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text.trim_start_matches('#').to_string(),
        Raw::Number(n) => format!("{:06}", n),
    })
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, column: &str) -> Option<&'a T> {
    map.get(column).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    })
}
