use crate::knowledge::MatchConfig;
use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_KNOWLEDGE_FILE: &str = "knowledge.json";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 200;
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;

const CONFIG_DIR_NAME: &str = "agentdesk";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub config_is_explicit: bool,
    pub knowledge_file: PathBuf,
    pub completion: CompletionConfig,
    pub matching: MatchConfig,
    pub theme: ThemeConfig,
}

/// Options for the external completion call made when no stored answer is
/// confident enough.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl CompletionConfig {
    pub fn defaults_for(provider: ProviderKind) -> Self {
        Self {
            provider,
            api_key: None,
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self::defaults_for(ProviderKind::OpenAi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_MODEL,
            Self::Gemini => DEFAULT_GEMINI_MODEL,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_BASE_URL,
            Self::Gemini => DEFAULT_GEMINI_BASE_URL,
        }
    }

    /// Provider-specific variable consulted when `AGENTDESK_API_KEY` is unset.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            _ => Err(format!("unknown provider '{value}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub preset: ThemePreset,
    pub styles: HashMap<ThemeToken, StyleOverride>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            preset: ThemePreset::Default,
            styles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemePreset {
    Default,
    Light,
    HighContrast,
}

impl FromStr for ThemePreset {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "light" => Ok(Self::Light),
            "high-contrast" => Ok(Self::HighContrast),
            _ => Err(format!("unknown preset '{value}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeToken {
    Badge,
    AnswerKnowledge,
    AnswerGenerated,
    AnswerDegraded,
    HistoryUser,
    SystemInfo,
    SystemError,
}

impl ThemeToken {
    pub fn all() -> &'static [ThemeToken] {
        &[
            Self::Badge,
            Self::AnswerKnowledge,
            Self::AnswerGenerated,
            Self::AnswerDegraded,
            Self::HistoryUser,
            Self::SystemInfo,
            Self::SystemError,
        ]
    }
}

impl FromStr for ThemeToken {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "badge" => Ok(Self::Badge),
            "answer_knowledge" => Ok(Self::AnswerKnowledge),
            "answer_generated" => Ok(Self::AnswerGenerated),
            "answer_degraded" => Ok(Self::AnswerDegraded),
            "history_user" => Ok(Self::HistoryUser),
            "system_info" => Ok(Self::SystemInfo),
            "system_error" => Ok(Self::SystemError),
            _ => Err(format!("unknown token '{value}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOverride {
    pub fg: Option<HexColor>,
    pub bg: Option<HexColor>,
    pub modifiers: Option<Vec<ThemeModifier>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = value.as_bytes();
        if bytes.len() != 7 || bytes[0] != b'#' || !value.is_ascii() {
            return Err("invalid hex color, expected #RRGGBB".to_string());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&value[range], 16)
                .map_err(|_| "invalid hex color, expected #RRGGBB".to_string())
        };

        Ok(Self {
            r: channel(1..3)?,
            g: channel(3..5)?,
            b: channel(5..7)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeModifier {
    Bold,
    Dim,
    Italic,
    Underlined,
    Reversed,
}

impl FromStr for ThemeModifier {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "bold" => Ok(Self::Bold),
            "dim" => Ok(Self::Dim),
            "italic" => Ok(Self::Italic),
            "underlined" => Ok(Self::Underlined),
            "reversed" => Ok(Self::Reversed),
            _ => Err(format!("unknown modifier '{value}'")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    knowledge_file: Option<String>,
    completion: Option<RawCompletionConfig>,
    matching: Option<RawMatchingConfig>,
    theme: Option<RawThemeConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCompletionConfig {
    provider: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMatchingConfig {
    threshold: Option<f64>,
    context_threshold: Option<f64>,
    context_limit: Option<usize>,
    keyword_boost: Option<f64>,
    max_keyword_boost: Option<f64>,
    keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThemeConfig {
    name: Option<String>,
    styles: Option<HashMap<String, RawStyleOverride>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStyleOverride {
    fg: Option<String>,
    bg: Option<String>,
    modifiers: Option<Vec<String>>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let (config_path, config_is_explicit) = match explicit_path {
            Some(path) => (path.to_path_buf(), true),
            None => (discover_config_path()?, false),
        };

        if config_is_explicit && !config_path.is_file() {
            bail!(
                "Failed to load config {}: file does not exist",
                config_path.display()
            );
        }

        let file_config = load_file_config(&config_path)?.unwrap_or_default();

        // Variables already present in the process environment win over .env.
        dotenvy::dotenv().ok();

        let knowledge_file = env_non_empty("AGENTDESK_KNOWLEDGE_FILE")
            .or_else(|| file_config.knowledge_file.as_deref().and_then(non_empty_owned))
            .unwrap_or_else(|| DEFAULT_KNOWLEDGE_FILE.to_string());

        let completion = validate_completion(file_config.completion.as_ref(), &config_path)?;
        let matching = validate_matching(file_config.matching.as_ref(), &config_path)?;
        let theme = validate_theme(file_config.theme.as_ref(), &config_path)?;

        Ok(Self {
            config_path,
            config_is_explicit,
            knowledge_file: PathBuf::from(knowledge_file),
            completion,
            matching,
            theme,
        })
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn validate_completion(
    raw: Option<&RawCompletionConfig>,
    config_path: &Path,
) -> Result<CompletionConfig> {
    let empty = RawCompletionConfig::default();
    let raw = raw.unwrap_or(&empty);

    let provider = match env_non_empty("AGENTDESK_PROVIDER") {
        Some(name) => ProviderKind::from_str(&name)
            .map_err(|reason| anyhow!("Invalid AGENTDESK_PROVIDER: {reason}"))?,
        None => match raw.provider.as_deref() {
            Some(name) => ProviderKind::from_str(name.trim())
                .map_err(|reason| config_error(config_path, "completion.provider", &reason))?,
            None => ProviderKind::OpenAi,
        },
    };

    let mut config = CompletionConfig::defaults_for(provider);

    config.api_key = env_non_empty("AGENTDESK_API_KEY")
        .or_else(|| env_non_empty(provider.api_key_env()))
        .or_else(|| raw.api_key.as_deref().and_then(non_empty_owned));

    if let Some(model) = env_non_empty("AGENTDESK_MODEL")
        .or_else(|| raw.model.as_deref().and_then(non_empty_owned))
    {
        config.model = model;
    }

    if let Some(base_url) = env_non_empty("AGENTDESK_BASE_URL")
        .or_else(|| raw.base_url.as_deref().and_then(non_empty_owned))
    {
        config.base_url = base_url;
    }

    if let Some(temperature) = raw.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(config_error(
                config_path,
                "completion.temperature",
                "must be between 0.0 and 2.0",
            ));
        }
        config.temperature = temperature;
    }

    if let Some(max_tokens) = raw.max_tokens {
        if max_tokens == 0 {
            return Err(config_error(
                config_path,
                "completion.max_tokens",
                "must be >= 1",
            ));
        }
        config.max_tokens = max_tokens;
    }

    if let Some(timeout_ms) = raw.timeout_ms {
        if timeout_ms == 0 {
            return Err(config_error(
                config_path,
                "completion.timeout_ms",
                "must be >= 1",
            ));
        }
        config.timeout_ms = timeout_ms;
    }

    Ok(config)
}

fn validate_matching(raw: Option<&RawMatchingConfig>, config_path: &Path) -> Result<MatchConfig> {
    let mut config = MatchConfig::default();
    let Some(raw) = raw else {
        return Ok(config);
    };

    let fraction = |value: Option<f64>, key: &str| -> Result<Option<f64>> {
        match value {
            Some(v) if !(0.0..=1.0).contains(&v) => Err(config_error(
                config_path,
                &format!("matching.{key}"),
                "must be between 0.0 and 1.0",
            )),
            other => Ok(other),
        }
    };

    if let Some(threshold) = fraction(raw.threshold, "threshold")? {
        config.threshold = threshold;
    }
    if let Some(context_threshold) = fraction(raw.context_threshold, "context_threshold")? {
        config.context_threshold = context_threshold;
    }
    if let Some(keyword_boost) = fraction(raw.keyword_boost, "keyword_boost")? {
        config.keyword_boost = keyword_boost;
    }
    if let Some(max_keyword_boost) = fraction(raw.max_keyword_boost, "max_keyword_boost")? {
        config.max_keyword_boost = max_keyword_boost;
    }

    if let Some(context_limit) = raw.context_limit {
        if context_limit == 0 {
            return Err(config_error(
                config_path,
                "matching.context_limit",
                "must be >= 1",
            ));
        }
        config.context_limit = context_limit;
    }

    if let Some(keywords) = &raw.keywords {
        config.keywords = keywords
            .iter()
            .filter_map(|keyword| non_empty(keyword))
            .map(str::to_lowercase)
            .collect();
    }

    Ok(config)
}

fn validate_theme(raw_theme: Option<&RawThemeConfig>, config_path: &Path) -> Result<ThemeConfig> {
    let Some(theme) = raw_theme else {
        return Ok(ThemeConfig::default());
    };

    let mut config = ThemeConfig::default();

    if let Some(name) = &theme.name {
        config.preset = ThemePreset::from_str(name)
            .map_err(|reason| config_error(config_path, "theme.name", &reason))?;
    }

    if let Some(styles) = &theme.styles {
        for (token_name, raw_style) in styles {
            let token = ThemeToken::from_str(token_name).map_err(|reason| {
                config_error(config_path, &format!("theme.styles.{token_name}"), &reason)
            })?;

            let fg = parse_color(raw_style.fg.as_deref(), config_path, token_name, "fg")?;
            let bg = parse_color(raw_style.bg.as_deref(), config_path, token_name, "bg")?;
            let modifiers =
                parse_modifiers(raw_style.modifiers.as_deref(), config_path, token_name)?;

            config.styles.insert(token, StyleOverride { fg, bg, modifiers });
        }
    }

    Ok(config)
}

fn parse_color(
    value: Option<&str>,
    config_path: &Path,
    token_name: &str,
    field_name: &str,
) -> Result<Option<HexColor>> {
    let Some(value) = value else {
        return Ok(None);
    };

    HexColor::from_str(value).map(Some).map_err(|reason| {
        config_error(
            config_path,
            &format!("theme.styles.{token_name}.{field_name}"),
            &reason,
        )
    })
}

fn parse_modifiers(
    values: Option<&[String]>,
    config_path: &Path,
    token_name: &str,
) -> Result<Option<Vec<ThemeModifier>>> {
    let Some(values) = values else {
        return Ok(None);
    };

    values
        .iter()
        .map(|value| {
            ThemeModifier::from_str(value).map_err(|reason| {
                config_error(
                    config_path,
                    &format!("theme.styles.{token_name}.modifiers"),
                    &reason,
                )
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|value| non_empty_owned(&value))
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn non_empty_owned(value: &str) -> Option<String> {
    non_empty(value).map(ToOwned::to_owned)
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::{
        AppConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_KNOWLEDGE_FILE, DEFAULT_OPENAI_MODEL,
        HexColor, ProviderKind, ThemeConfig, ThemePreset, ThemeToken,
    };
    use crate::knowledge::MatchConfig;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn reset_vars() {
        unsafe {
            for key in [
                "AGENTDESK_PROVIDER",
                "AGENTDESK_API_KEY",
                "AGENTDESK_MODEL",
                "AGENTDESK_BASE_URL",
                "AGENTDESK_KNOWLEDGE_FILE",
                "OPENAI_API_KEY",
                "GEMINI_API_KEY",
                "XDG_CONFIG_HOME",
            ] {
                env::remove_var(key);
            }
        }
    }

    fn with_cwd<T>(path: &Path, f: impl FnOnce() -> T) -> T {
        let cwd = env::current_dir().expect("current dir");
        env::set_current_dir(path).expect("set current dir");
        let result = f();
        env::set_current_dir(cwd).expect("restore current dir");
        result
    }

    fn write_discovered_config(root: &Path, content: &str) -> PathBuf {
        let config_dir = root.join("agentdesk");
        fs::create_dir_all(&config_dir).expect("create config dir");
        let path = config_dir.join("config.toml");
        fs::write(&path, content).expect("write config");
        path
    }

    fn load_in(root: &Path) -> anyhow::Result<AppConfig> {
        unsafe {
            env::set_var("XDG_CONFIG_HOME", root);
        }
        with_cwd(root, AppConfig::load)
    }

    #[test]
    #[serial]
    fn load_uses_defaults_when_nothing_is_configured() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();

        let cfg = load_in(tmp.path()).expect("load config");
        assert_eq!(cfg.completion.provider, ProviderKind::OpenAi);
        assert_eq!(cfg.completion.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(cfg.completion.api_key, None);
        assert_eq!(cfg.knowledge_file, PathBuf::from(DEFAULT_KNOWLEDGE_FILE));
        assert_eq!(cfg.matching, MatchConfig::default());
        assert_eq!(cfg.theme, ThemeConfig::default());
        assert!(!cfg.config_is_explicit);
    }

    #[test]
    #[serial]
    fn load_env_overrides_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(
            tmp.path(),
            r#"
knowledge_file = "from_file.json"

[completion]
api_key = "file_key"
model = "file_model"
base_url = "https://example.com"
"#,
        );

        reset_vars();
        unsafe {
            env::set_var("AGENTDESK_API_KEY", "os_key");
            env::set_var("AGENTDESK_MODEL", "os_model");
        }

        let cfg = load_in(tmp.path()).expect("load config");
        assert_eq!(cfg.completion.api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.completion.model, "os_model");
        assert_eq!(cfg.completion.base_url, "https://example.com");
        assert_eq!(cfg.knowledge_file, PathBuf::from("from_file.json"));
    }

    #[test]
    #[serial]
    fn load_falls_back_to_provider_specific_key_variable() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(
            tmp.path(),
            r#"
[completion]
provider = "gemini"
"#,
        );

        reset_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "openai_key");
            env::set_var("GEMINI_API_KEY", "gemini_key");
        }

        let cfg = load_in(tmp.path()).expect("load config");
        assert_eq!(cfg.completion.provider, ProviderKind::Gemini);
        assert_eq!(cfg.completion.api_key.as_deref(), Some("gemini_key"));
        assert_eq!(cfg.completion.base_url, DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    #[serial]
    fn load_does_not_override_existing_os_env_with_dotenv() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(".env"),
            "AGENTDESK_API_KEY=dotenv_key\nAGENTDESK_MODEL=dotenv_model\n",
        )
        .expect("write env file");

        reset_vars();
        unsafe {
            env::set_var("AGENTDESK_API_KEY", "os_key");
            env::set_var("AGENTDESK_MODEL", "os_model");
        }

        let cfg = load_in(tmp.path()).expect("load config");
        assert_eq!(cfg.completion.api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.completion.model, "os_model");
        reset_vars();
    }

    #[test]
    #[serial]
    fn load_with_explicit_path_marks_config_explicit() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[matching]\nthreshold = 0.55\n").expect("write config");

        reset_vars();
        let cfg = with_cwd(tmp.path(), || {
            AppConfig::load_with_path(Some(path.as_path())).expect("load config")
        });
        assert!(cfg.config_is_explicit);
        assert_eq!(cfg.config_path, path);
        assert_eq!(cfg.matching.threshold, 0.55);
    }

    #[test]
    #[serial]
    fn load_fails_when_explicit_path_is_missing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();

        let missing = tmp.path().join("nope.toml");
        let err = AppConfig::load_with_path(Some(missing.as_path())).expect_err("load should fail");
        assert!(err.to_string().contains("file does not exist"));
    }

    #[test]
    #[serial]
    fn load_fails_when_xdg_config_home_is_empty() {
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "   ");
        }

        let err = AppConfig::load().expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("Failed to resolve config path: XDG_CONFIG_HOME is set but empty")
        );
        reset_vars();
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_root_key() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(tmp.path(), "unknown_key = 1");
        reset_vars();

        let err = load_in(tmp.path()).expect_err("load should fail");
        assert!(err.to_string().contains("Failed to load config"));
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_provider() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(tmp.path(), "[completion]\nprovider = \"llama\"\n");
        reset_vars();

        let err = load_in(tmp.path()).expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("completion.provider: unknown provider 'llama'")
        );
    }

    #[test]
    #[serial]
    fn load_rejects_out_of_range_threshold() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(tmp.path(), "[matching]\nthreshold = 1.5\n");
        reset_vars();

        let err = load_in(tmp.path()).expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("matching.threshold: must be between 0.0 and 1.0")
        );
    }

    #[test]
    #[serial]
    fn load_rejects_zero_timeout() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(tmp.path(), "[completion]\ntimeout_ms = 0\n");
        reset_vars();

        let err = load_in(tmp.path()).expect_err("load should fail");
        assert!(err.to_string().contains("completion.timeout_ms: must be >= 1"));
    }

    #[test]
    #[serial]
    fn load_parses_matching_table() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(
            tmp.path(),
            r#"
[matching]
threshold = 0.5
context_threshold = 0.2
context_limit = 5
keyword_boost = 0.2
max_keyword_boost = 0.4
keywords = ["EVA", "  ", "Payment Posting"]
"#,
        );
        reset_vars();

        let cfg = load_in(tmp.path()).expect("load config");
        assert_eq!(cfg.matching.threshold, 0.5);
        assert_eq!(cfg.matching.context_threshold, 0.2);
        assert_eq!(cfg.matching.context_limit, 5);
        assert_eq!(cfg.matching.keyword_boost, 0.2);
        assert_eq!(cfg.matching.max_keyword_boost, 0.4);
        assert_eq!(
            cfg.matching.keywords,
            vec!["eva".to_string(), "payment posting".to_string()]
        );
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_style_token() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(
            tmp.path(),
            r##"
[theme.styles.unknown_token]
fg = "#ffffff"
"##,
        );
        reset_vars();

        let err = load_in(tmp.path()).expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("theme.styles.unknown_token: unknown token 'unknown_token'")
        );
    }

    #[test]
    #[serial]
    fn load_fails_on_invalid_hex_color() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(
            tmp.path(),
            r#"
[theme.styles.badge]
fg = "red"
"#,
        );
        reset_vars();

        let err = load_in(tmp.path()).expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("theme.styles.badge.fg: invalid hex color")
        );
    }

    #[test]
    #[serial]
    fn load_parses_theme_config_with_strong_types() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_discovered_config(
            tmp.path(),
            r##"
[theme]
name = "light"

[theme.styles.answer_knowledge]
fg = "#A0B1C2"
modifiers = ["bold", "italic"]
"##,
        );
        reset_vars();

        let cfg = load_in(tmp.path()).expect("load config");
        assert_eq!(cfg.theme.preset, ThemePreset::Light);
        let style = cfg
            .theme
            .styles
            .get(&ThemeToken::AnswerKnowledge)
            .expect("answer_knowledge style");
        assert_eq!(
            style.fg,
            Some(HexColor {
                r: 0xA0,
                g: 0xB1,
                b: 0xC2
            })
        );
        assert_eq!(style.modifiers.as_ref().map(Vec::len), Some(2));
    }
}
