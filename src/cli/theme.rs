use crate::config::{
    HexColor, StyleOverride, ThemeConfig as UserThemeConfig, ThemeModifier, ThemePreset, ThemeToken,
};
use crossterm::style::{Attribute, Attributes, Color, ContentStyle};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::IsTerminal;

#[derive(Debug, Clone)]
pub struct Theme {
    enabled: bool,
    styles: HashMap<ThemeToken, ContentStyle>,
}

impl Theme {
    #[cfg(test)]
    pub fn new(enabled: bool) -> Self {
        Self::from_config(enabled, &UserThemeConfig::default())
    }

    /// Colors are on only for a terminal stdout without `NO_COLOR`.
    pub fn detect(config: &UserThemeConfig) -> Self {
        let enabled = colors_enabled(
            std::env::var_os("NO_COLOR"),
            std::io::stdout().is_terminal(),
        );
        Self::from_config(enabled, config)
    }

    pub fn from_config(enabled: bool, config: &UserThemeConfig) -> Self {
        let mut styles = preset_styles(config.preset);
        for (token, override_style) in &config.styles {
            let base = styles.get(token).copied().unwrap_or_default();
            styles.insert(*token, merge_style(base, override_style));
        }

        Self { enabled, styles }
    }

    pub fn style(&self, token: ThemeToken) -> ContentStyle {
        if !self.enabled {
            return ContentStyle::default();
        }

        self.styles.get(&token).copied().unwrap_or_default()
    }

    pub fn paint(&self, token: ThemeToken, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        self.style(token).apply(text).to_string()
    }
}

fn colors_enabled(no_color: Option<OsString>, stdout_is_terminal: bool) -> bool {
    let no_color_set = no_color.is_some_and(|value| !value.is_empty());
    stdout_is_terminal && !no_color_set
}

fn preset_styles(preset: ThemePreset) -> HashMap<ThemeToken, ContentStyle> {
    ThemeToken::all()
        .iter()
        .copied()
        .map(|token| (token, preset_style(preset, token)))
        .collect()
}

fn preset_style(preset: ThemePreset, token: ThemeToken) -> ContentStyle {
    match preset {
        ThemePreset::Default => default_preset_style(token),
        ThemePreset::Light => light_preset_style(token),
        ThemePreset::HighContrast => high_contrast_preset_style(token),
    }
}

fn styled(r: u8, g: u8, b: u8, attributes: &[Attribute]) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(Color::Rgb { r, g, b });
    for attribute in attributes {
        style.attributes.set(*attribute);
    }
    style
}

fn default_preset_style(token: ThemeToken) -> ContentStyle {
    match token {
        ThemeToken::Badge => styled(122, 162, 247, &[Attribute::Bold]),
        ThemeToken::AnswerKnowledge => styled(158, 206, 106, &[]),
        ThemeToken::AnswerGenerated => styled(192, 202, 245, &[]),
        ThemeToken::AnswerDegraded => styled(255, 158, 100, &[]),
        ThemeToken::HistoryUser => styled(224, 175, 104, &[Attribute::Bold]),
        ThemeToken::SystemInfo => styled(86, 95, 137, &[]),
        ThemeToken::SystemError => styled(247, 118, 142, &[Attribute::Bold]),
    }
}

fn light_preset_style(token: ThemeToken) -> ContentStyle {
    match token {
        ThemeToken::Badge => styled(31, 111, 235, &[Attribute::Bold]),
        ThemeToken::AnswerKnowledge => styled(5, 80, 40, &[]),
        ThemeToken::AnswerGenerated => styled(36, 41, 47, &[]),
        ThemeToken::AnswerDegraded => styled(188, 76, 0, &[]),
        ThemeToken::HistoryUser => styled(130, 70, 0, &[Attribute::Bold]),
        ThemeToken::SystemInfo => styled(36, 70, 120, &[]),
        ThemeToken::SystemError => styled(176, 0, 32, &[Attribute::Bold]),
    }
}

fn high_contrast_preset_style(token: ThemeToken) -> ContentStyle {
    match token {
        ThemeToken::Badge => styled(255, 215, 0, &[Attribute::Bold]),
        ThemeToken::AnswerKnowledge => styled(0, 255, 127, &[]),
        ThemeToken::AnswerGenerated => styled(255, 255, 255, &[]),
        ThemeToken::AnswerDegraded => styled(255, 140, 0, &[Attribute::Bold]),
        ThemeToken::HistoryUser => styled(135, 206, 250, &[Attribute::Bold]),
        ThemeToken::SystemInfo => styled(173, 216, 230, &[]),
        ThemeToken::SystemError => styled(255, 64, 64, &[Attribute::Bold]),
    }
}

fn merge_style(base: ContentStyle, override_style: &StyleOverride) -> ContentStyle {
    let mut merged = base;

    if let Some(fg) = override_style.fg {
        merged.foreground_color = Some(color_from_hex(fg));
    }

    if let Some(bg) = override_style.bg {
        merged.background_color = Some(color_from_hex(bg));
    }

    if let Some(modifiers) = &override_style.modifiers {
        merged.attributes = modifiers_to_attributes(modifiers);
    }

    merged
}

fn color_from_hex(color: HexColor) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

fn modifiers_to_attributes(modifiers: &[ThemeModifier]) -> Attributes {
    let mut attributes = Attributes::default();
    for modifier in modifiers {
        attributes.set(modifier_to_attribute(*modifier));
    }
    attributes
}

fn modifier_to_attribute(modifier: ThemeModifier) -> Attribute {
    match modifier {
        ThemeModifier::Bold => Attribute::Bold,
        ThemeModifier::Dim => Attribute::Dim,
        ThemeModifier::Italic => Attribute::Italic,
        ThemeModifier::Underlined => Attribute::Underlined,
        ThemeModifier::Reversed => Attribute::Reverse,
    }
}
