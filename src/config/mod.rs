use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";
const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_CONFIG_PATH: &str = "config/agent.toml";
const DEFAULT_INDEX_PATH: &str = "data/eda_index.jsonl";
const DEFAULT_KB_DIR: &str = "knowledge_base";

// Kept short; compact system prompts work better with small local models.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Data Insight, an autonomous data analysis \
assistant. You MUST use tools when needed:
- Use search_eda_kb to retrieve grounded EDA guidance (workflow, missing values, outliers, \
correlation, visualization).
- Use create_eda_plan when user provides dataset columns and a goal and needs a structured EDA plan.

Follow a ReAct style:
Think -> decide tool -> use tool -> observe -> final answer.
If you have enough info, provide a final answer.";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub embed_model: String,
    pub ollama_url: String,
    pub index_path: PathBuf,
    pub kb_dir: PathBuf,
    pub system_prompt: Option<String>,
    pub max_turns: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    model: Option<String>,
    embed_model: Option<String>,
    ollama_url: Option<String>,
    index_path: Option<PathBuf>,
    kb_dir: Option<PathBuf>,
    system_prompt: Option<String>,
    max_turns: Option<usize>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return read_config(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        match read_config(default_path) {
            Ok(config) => Ok(config),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("Configuration file not found; using defaults");
                Ok(Self::default())
            }
            Err(other) => Err(other),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            kb_dir: PathBuf::from(DEFAULT_KB_DIR),
            system_prompt: None,
            max_turns: None,
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading agent configuration file");
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let defaults = AppConfig::default();
    Ok(AppConfig {
        model: parsed.model.unwrap_or(defaults.model),
        embed_model: parsed.embed_model.unwrap_or(defaults.embed_model),
        ollama_url: parsed.ollama_url.unwrap_or(defaults.ollama_url),
        index_path: parsed.index_path.unwrap_or(defaults.index_path),
        kb_dir: parsed.kb_dir.unwrap_or(defaults.kb_dir),
        system_prompt: parsed.system_prompt,
        max_turns: parsed.max_turns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;

    static WORKDIR_GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn returns_default_when_missing() {
        let _lock = WORKDIR_GUARD.lock().expect("lock guard");
        let original_dir = env::current_dir().expect("current dir");
        let temp = tempfile::tempdir().expect("tempdir");
        env::set_current_dir(temp.path()).expect("switch to temp dir");

        let config = AppConfig::load(None).expect("load succeeds");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.embed_model, DEFAULT_EMBED_MODEL);
        assert_eq!(config.ollama_url, DEFAULT_OLLAMA_URL);
        assert!(config.max_turns.is_none());

        env::set_current_dir(original_dir).expect("restore dir");
    }

    #[test]
    fn reads_explicit_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("agent.toml");
        let mut file = File::create(&path).expect("create config");
        writeln!(
            file,
            "model = \"llama3\"\nmax_turns = 12\nindex_path = \"custom/index.jsonl\""
        )
        .expect("write config");

        let config = AppConfig::load(Some(&path)).expect("load succeeds");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.max_turns, Some(12));
        assert_eq!(config.index_path, PathBuf::from("custom/index.jsonl"));
        // Unset keys fall back to defaults.
        assert_eq!(config.embed_model, DEFAULT_EMBED_MODEL);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("absent.toml");
        let err = AppConfig::load(Some(&path)).expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("agent.toml");
        fs::write(&path, "model = [broken").expect("write config");
        let err = AppConfig::load(Some(&path)).expect_err("invalid toml");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
