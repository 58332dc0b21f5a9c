//! Defaults applied to new and partially specified SK1 documents.

use ukiyo_model::tree::{LayerProps, PageFormat};
use ukiyo_model::{Color, Style};

/// Document-level configuration for the SK1 codec.
///
/// Loaders fall back to these values whenever a file omits a record,
/// for example a drawing that starts placing objects before declaring
/// any page or layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Sk1Config {
    pub page_format: PageFormat,
    /// Mark color of ordinary layers.
    pub layer_color: Color,
    /// Mark color of the guide layer.
    pub guide_color: Color,
    pub guidelayer_name: String,
    pub grid_color: Color,
    /// `(start_x, start_y, dx, dy)` of the default grid.
    pub grid_geometry: [f64; 4],
    pub default_style: Style,
}

impl Default for Sk1Config {
    fn default() -> Self {
        Self {
            page_format: PageFormat::default(),
            layer_color: Color::cmyk(1.0, 1.0, 0.0, 0.0),
            guide_color: Color::cmyk(1.0, 0.0, 0.0, 1.0),
            guidelayer_name: "GuideLayer".into(),
            grid_color: Color::rgb(0.83, 0.87, 0.91),
            grid_geometry: [0.0, 0.0, 2.83465, 2.83465],
            default_style: Style::empty(),
        }
    }
}

impl Sk1Config {
    /// Properties of a freshly created drawing layer.
    pub fn layer_props(&self, name: &str) -> LayerProps {
        LayerProps {
            name: name.into(),
            color: self.layer_color.clone(),
            ..LayerProps::default()
        }
    }

    /// Properties of a freshly created guide layer. Guide layers do
    /// not print.
    pub fn guidelayer_props(&self) -> LayerProps {
        LayerProps {
            name: self.guidelayer_name.clone(),
            printable: false,
            color: self.guide_color.clone(),
            ..LayerProps::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guide_layer_does_not_print() {
        let config = Sk1Config::default();
        let props = config.guidelayer_props();
        assert!(!props.printable);
        assert_eq!(props.name, "GuideLayer");
    }

    #[test]
    fn default_format_is_a4() {
        let config = Sk1Config::default();
        assert_eq!(config.page_format.name, "A4");
        assert_eq!(config.page_format.size, (595.276, 841.89));
    }
}
