//! # pmoconfig - Configuration YAML de PMOJukebox
//!
//! La configuration effective est construite en trois couches, de la plus
//! faible à la plus forte :
//!
//! 1. les valeurs embarquées dans le binaire (`pmojukebox.yaml`) ;
//! 2. le fichier `config.yaml` du répertoire de configuration ;
//! 3. les variables d'environnement `PMOJUKEBOX_CONFIG__SECTION__CLE=valeur`.
//!
//! Les clés sont normalisées en minuscules. Le résultat fusionné est réécrit
//! dans `config.yaml` au chargement.
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! let db_dir = config.get_managed_dir(&["jukebox", "directory"], "jukebox")?;
//! println!("{} {}", port, db_dir.display());
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = include_str!("pmojukebox.yaml");
const CONFIG_FILE: &str = "config.yaml";

const ENV_CONFIG_DIR: &str = "PMOJUKEBOX_CONFIG";
const ENV_PREFIX: &str = "PMOJUKEBOX_CONFIG__";
const DEFAULT_DIR_NAME: &str = ".pmojukebox";

const DEFAULT_HTTP_PORT: u16 = 8880;
const DEFAULT_BASE_URL: &str = "localhost";

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PMOJukebox configuration"));
}

/// Section `host.logger`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerSettings {
    /// Nombre d'entrées gardées en mémoire pour `/log-dump` et `/log-sse`
    pub buffer_capacity: usize,
    pub enable_console: bool,
    /// `ERROR`, `WARN`, `INFO`, `DEBUG` ou `TRACE`
    pub min_level: String,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            enable_console: true,
            min_level: "INFO".to_string(),
        }
    }
}

/// Configuration chargée, partagée par tout le processus via [`get_config`]
#[derive(Debug)]
pub struct Config {
    dir: PathBuf,
    file: PathBuf,
    data: Mutex<Value>,
}

impl Config {
    /// Charge la configuration depuis `directory`
    ///
    /// Si `directory` est vide, le répertoire est cherché dans cet ordre :
    /// la variable `PMOJUKEBOX_CONFIG`, `./.pmojukebox` s'il existe,
    /// `~/.pmojukebox` s'il existe, et sinon `./.pmojukebox` est créé.
    pub fn load_config(directory: &str) -> Result<Self> {
        let dir = resolve_config_dir(directory);
        prepare_dir(&dir)
            .with_context(|| format!("Invalid configuration directory {}", dir.display()))?;
        info!(config_dir = %dir.display(), "Using config directory");

        let file = dir.join(CONFIG_FILE);
        let mut data: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read_to_string(&file) {
            Ok(text) => {
                let user: Value = serde_yaml::from_str(&text)
                    .with_context(|| format!("Malformed configuration file {}", file.display()))?;
                merge_yaml(&mut data, &lower_keys(user));
                info!(config_file = %file.display(), "Loaded config file");
            }
            Err(_) => {
                info!(config_file = %file.display(), "Config file not found, using embedded defaults");
            }
        }

        apply_env_overrides(&mut data, env::vars());

        let config = Self {
            dir,
            file,
            data: Mutex::new(data),
        };
        config.save()?;
        Ok(config)
    }

    fn lock_data(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.lock_data())?;
        fs::write(&self.file, yaml)
            .with_context(|| format!("Cannot write {}", self.file.display()))
    }

    /// Valeur au chemin donné (`&["jukebox", "tick_interval_ms"]`), `None` si absente
    pub fn get_value(&self, path: &[&str]) -> Option<Value> {
        lookup(&self.lock_data(), path).cloned()
    }

    /// Modifie une valeur puis réécrit `config.yaml`
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        insert(&mut self.lock_data(), path, value)?;
        self.save()
    }

    /// Lit un entier positif, accepte aussi une chaîne numérique (`"1500"`)
    pub fn get_u64(&self, path: &[&str]) -> Option<u64> {
        match self.get_value(path)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Répertoire de données géré par la configuration, créé au besoin
    ///
    /// Un chemin relatif est résolu depuis le répertoire de configuration. Si
    /// la clé est absente, `default` est enregistré à sa place.
    pub fn get_managed_dir(&self, path: &[&str], default: &str) -> Result<PathBuf> {
        let configured = self
            .get_value(path)
            .and_then(|v| v.as_str().map(str::to_owned))
            .filter(|s| !s.is_empty());

        let name = match configured {
            Some(name) => name,
            None => {
                self.set_value(path, Value::String(default.to_string()))?;
                default.to_string()
            }
        };

        let dir = if Path::new(&name).is_absolute() {
            PathBuf::from(&name)
        } else {
            self.dir.join(&name)
        };

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            info!(directory = %dir.display(), "Created managed directory");
        }
        Ok(dir)
    }

    /// Hôte annoncé par le serveur (`host.base_url`, `localhost` si vide)
    pub fn get_base_url(&self) -> String {
        self.get_value(&["host", "base_url"])
            .and_then(|v| v.as_str().map(str::to_owned))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn get_http_port(&self) -> u16 {
        match self.get_u64(&["host", "http_port"]).map(u16::try_from) {
            Some(Ok(port)) if port > 0 => port,
            _ => {
                warn!(
                    "HTTP port missing or invalid, using default {}",
                    DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
        }
    }

    /// Réglages du logger ; une section invalide retombe sur les valeurs par défaut
    pub fn logger_settings(&self) -> LoggerSettings {
        let Some(section) = self.get_value(&["host", "logger"]) else {
            return LoggerSettings::default();
        };
        serde_yaml::from_value(section).unwrap_or_else(|e| {
            warn!("Invalid host.logger section: {}", e);
            LoggerSettings::default()
        })
    }
}

/// Configuration globale, chargée au premier accès
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn resolve_config_dir(directory: &str) -> PathBuf {
    if !directory.is_empty() {
        return PathBuf::from(directory);
    }

    if let Ok(from_env) = env::var(ENV_CONFIG_DIR) {
        info!(env_var = ENV_CONFIG_DIR, path = %from_env, "Config directory taken from env");
        return PathBuf::from(from_env);
    }

    let local = PathBuf::from(DEFAULT_DIR_NAME);
    if local.exists() {
        return local;
    }

    match dirs::home_dir().map(|home| home.join(DEFAULT_DIR_NAME)) {
        Some(in_home) if in_home.exists() => in_home,
        _ => local,
    }
}

/// Crée le répertoire et vérifie qu'on peut y écrire
fn prepare_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    if !path.is_dir() {
        return Err(anyhow!("{} is not a directory", path.display()));
    }

    let probe = path.join(".write_test");
    fs::write(&probe, b"test")?;
    fs::remove_file(&probe)?;
    Ok(())
}

fn key(name: &str) -> Value {
    Value::String(name.to_lowercase())
}

fn lookup<'a>(data: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(data, |node, name| node.as_mapping()?.get(key(name)))
}

fn insert(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *data = value;
        return Ok(());
    };

    let mut node = data;
    for name in parents {
        let map = node
            .as_mapping_mut()
            .ok_or_else(|| anyhow!("{} is not a section", name))?;
        node = map
            .entry(key(name))
            .or_insert(Value::Mapping(Mapping::new()));
    }

    node.as_mapping_mut()
        .ok_or_else(|| anyhow!("{} is not a section", path.join(".")))?
        .insert(key(last), value);
    Ok(())
}

/// `PMOJUKEBOX_CONFIG__JUKEBOX__TICK_INTERVAL_MS=500` fixe `jukebox.tick_interval_ms`
fn apply_env_overrides(data: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
    for (name, raw) in vars {
        let Some(stripped) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<&str> = stripped.split("__").collect();
        let value = serde_yaml::from_str(&raw).unwrap_or(Value::String(raw.clone()));
        if let Err(e) = insert(data, &path, value) {
            warn!(variable = %name, "Ignoring environment override: {}", e);
        }
    }
}

fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys).collect()),
        other => other,
    }
}

/// Sections fusionnées récursivement, scalaires et listes remplacés
fn merge_yaml(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (k, v) in overlay {
                match base.get_mut(k) {
                    Some(existing) => merge_yaml(existing, v),
                    None => {
                        base.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_merge_keeps_untouched_defaults() {
        let mut base = yaml("host:\n  http_port: 8880\n  base_url: ''\n");
        merge_yaml(&mut base, &yaml("host:\n  http_port: 9000\n"));

        assert_eq!(
            lookup(&base, &["host", "http_port"]).and_then(Value::as_u64),
            Some(9000)
        );
        assert!(lookup(&base, &["host", "base_url"]).is_some());
    }

    #[test]
    fn test_lower_keys() {
        let lowered = lower_keys(yaml("Jukebox:\n  Tick_Interval_MS: 500\n"));
        assert!(lookup(&lowered, &["jukebox", "tick_interval_ms"]).is_some());
    }

    #[test]
    fn test_insert_creates_sections() {
        let mut data = yaml("host: {}\n");
        insert(&mut data, &["jukebox", "mailbox_capacity"], Value::Number(8u64.into())).unwrap();

        assert_eq!(
            lookup(&data, &["JUKEBOX", "mailbox_capacity"]).and_then(Value::as_u64),
            Some(8)
        );
        assert!(insert(&mut data, &["jukebox", "mailbox_capacity", "x"], Value::Null).is_err());
    }

    #[test]
    fn test_env_overrides_are_typed_and_scoped() {
        let mut data = yaml("jukebox:\n  tick_interval_ms: 1000\n");
        apply_env_overrides(
            &mut data,
            vec![
                (
                    "PMOJUKEBOX_CONFIG__JUKEBOX__TICK_INTERVAL_MS".to_string(),
                    "250".to_string(),
                ),
                ("HOME".to_string(), "/root".to_string()),
            ],
        );

        assert_eq!(
            lookup(&data, &["jukebox", "tick_interval_ms"]).and_then(Value::as_u64),
            Some(250)
        );
        assert!(lookup(&data, &["home"]).is_none());
    }
}
