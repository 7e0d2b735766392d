//! PromptProvider - template loading and rendering

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use handlebars::Handlebars;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::embedded;

/// Errors from prompt loading or rendering
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template not found: {name}")]
    NotFound { name: String },

    #[error("Failed to parse prompt {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to render prompt {name}: {message}")]
    Render { name: String, message: String },

    #[error("Failed to read prompt {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// A rendered prompt ready for a model call
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,

    /// Sampling temperature the template asks for, if any
    pub temperature: Option<f32>,
}

/// Capability interface for prompt templates
///
/// The orchestration core depends only on this trait; whether templates
/// come from disk or from the binary is an implementation detail.
pub trait PromptProvider: Send + Sync {
    /// Render the named template with the given variables
    fn render(&self, name: &str, vars: &serde_json::Value) -> Result<RenderedPrompt, PromptError>;

    /// Drop any cached templates so the next render re-reads sources
    ///
    /// No-op for embedded-only providers.
    fn reload(&self);
}

/// On-disk shape of a `.prompt.yaml` template
#[derive(Debug, Clone, Deserialize)]
struct PromptFile {
    system: String,
    user: String,
    #[serde(default)]
    temperature: Option<f32>,
}

fn parse_template(name: &str, raw: &str) -> Result<PromptFile, PromptError> {
    serde_yaml::from_str(raw).map_err(|source| PromptError::Parse {
        name: name.to_string(),
        source,
    })
}

fn render_template(hbs: &Handlebars<'_>, name: &str, file: &PromptFile, vars: &serde_json::Value) -> Result<RenderedPrompt, PromptError> {
    let render = |template: &str| {
        hbs.render_template(template, vars).map_err(|e| PromptError::Render {
            name: name.to_string(),
            message: e.to_string(),
        })
    };
    Ok(RenderedPrompt {
        system: render(&file.system)?,
        user: render(&file.user)?,
        temperature: file.temperature,
    })
}

fn new_handlebars() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    // Prompts are plain text, not HTML
    hbs.register_escape_fn(handlebars::no_escape);
    hbs
}

/// Provider backed only by templates compiled into the binary
pub struct EmbeddedPrompts {
    hbs: Handlebars<'static>,
}

impl EmbeddedPrompts {
    pub fn new() -> Self {
        Self { hbs: new_handlebars() }
    }
}

impl Default for EmbeddedPrompts {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptProvider for EmbeddedPrompts {
    fn render(&self, name: &str, vars: &serde_json::Value) -> Result<RenderedPrompt, PromptError> {
        let raw = embedded::get_embedded(name).ok_or_else(|| PromptError::NotFound { name: name.to_string() })?;
        let file = parse_template(name, raw)?;
        render_template(&self.hbs, name, &file, vars)
    }

    fn reload(&self) {}
}

/// Provider that prefers `.prompt.yaml` files from a directory
///
/// Parsed files are cached; `reload()` drops the cache so edited templates
/// take effect without a restart. Missing files fall back to the embedded
/// defaults.
pub struct FilePrompts {
    dir: PathBuf,
    hbs: Handlebars<'static>,
    cache: RwLock<HashMap<String, PromptFile>>,
}

impl FilePrompts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        info!(dir = %dir.display(), "FilePrompts: using template directory");
        Self {
            dir,
            hbs: new_handlebars(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn load(&self, name: &str) -> Result<PromptFile, PromptError> {
        if let Some(cached) = self.cache.read().unwrap_or_else(|p| p.into_inner()).get(name) {
            return Ok(cached.clone());
        }

        let path = self.dir.join(format!("{name}.prompt.yaml"));
        let file = if path.exists() {
            debug!(path = %path.display(), "FilePrompts: loading template from disk");
            let raw = std::fs::read_to_string(&path).map_err(|source| PromptError::Io {
                name: name.to_string(),
                source,
            })?;
            parse_template(name, &raw)?
        } else {
            debug!(%name, "FilePrompts: falling back to embedded template");
            let raw = embedded::get_embedded(name).ok_or_else(|| PromptError::NotFound { name: name.to_string() })?;
            parse_template(name, raw)?
        };

        self.cache
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(name.to_string(), file.clone());
        Ok(file)
    }
}

impl PromptProvider for FilePrompts {
    fn render(&self, name: &str, vars: &serde_json::Value) -> Result<RenderedPrompt, PromptError> {
        let file = self.load(name)?;
        render_template(&self.hbs, name, &file, vars)
    }

    fn reload(&self) {
        debug!("FilePrompts: dropping template cache");
        self.cache.write().unwrap_or_else(|p| p.into_inner()).clear();
    }
}
