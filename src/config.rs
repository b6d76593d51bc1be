use crate::pdf::markup::ReplaceStyle;
use crate::pdf::overlay::WatermarkStyle;
use crate::pdf::render::DEFAULT_SCALE;
use clap::{ArgAction, Args};
use std::path::PathBuf;

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Pixels per PDF point when rendering pages
    #[arg(long, env = "PDFEDIT_RENDER_SCALE", default_value_t = DEFAULT_SCALE, global = true)]
    pub render_scale: f32,

    /// Directory holding the pdfium shared library
    #[arg(long, env = "PDFIUM_LIB_PATH", global = true)]
    pub pdfium_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub render_scale: f32,
    pub pdfium_path: Option<PathBuf>,
    pub watermark: WatermarkStyle,
    pub replace: ReplaceStyle,
    /// Default size for free text insertion
    pub text_font_size: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            render_scale: DEFAULT_SCALE,
            pdfium_path: None,
            watermark: WatermarkStyle::default(),
            replace: ReplaceStyle::default(),
            text_font_size: 12.0,
        }
    }
}

impl From<&ConfigArgs> for EditorConfig {
    fn from(args: &ConfigArgs) -> Self {
        EditorConfig {
            render_scale: args.render_scale,
            pdfium_path: args.pdfium_path.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::geometry::Color;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.render_scale, 1.5);
        assert_eq!(config.watermark.font_size, 12.0);
        assert_eq!(config.watermark.color, Color::gray(0.7));
        assert_eq!(config.replace.font_size, 11.0);
        assert_eq!(config.replace.color, Color::BLACK);
    }

    #[test]
    fn test_from_args() {
        let args = ConfigArgs {
            verbose: 0,
            render_scale: 2.0,
            pdfium_path: Some(PathBuf::from("/opt/pdfium")),
        };
        let config = EditorConfig::from(&args);
        assert_eq!(config.render_scale, 2.0);
        assert_eq!(config.pdfium_path, Some(PathBuf::from("/opt/pdfium")));
        assert_eq!(config.text_font_size, 12.0);
    }
}
