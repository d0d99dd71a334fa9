use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Visual style shared by every element type.
///
/// Every field is optional; renderers fall back to their own defaults. The
/// same type doubles as a style patch: [`ElementStyle::merge`] copies over
/// only the fields that are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,

    /// CSS border shorthand, e.g. `"2px solid #FF3B30"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
}

macro_rules! merge_fields {
    ($target:expr, $patch:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = Some(value.clone());
            }
        )*
    };
}

impl ElementStyle {
    /// Overlay the set fields of `patch` onto this style.
    pub fn merge(&mut self, patch: &ElementStyle) {
        merge_fields!(
            self,
            patch,
            [
                background_color,
                border_radius,
                border,
                opacity,
                font_family,
                font_size,
                color,
                padding,
                text_align,
            ]
        );

        if let Some(opacity) = self.opacity {
            self.opacity = Some(opacity.clamp(0.0, 1.0));
        }
    }
}
