use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub use_color: bool,
}

/// Resolve color from the CLI flag, the `color` setting and `NO_COLOR`.
pub fn detect_color(color_flag: bool, setting: &str) -> bool {
    if !color_flag || setting == "never" {
        return false;
    }
    if setting == "always" {
        return true;
    }
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!(OutputFormat::from_name("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_name("xlsx"), None);
    }

    #[test]
    fn no_color_flag_wins() {
        assert!(!detect_color(false, "always"));
        assert!(!detect_color(true, "never"));
        assert!(detect_color(true, "always"));
    }
}
