use crate::error::PromptError;
use tera::Tera;

/// Tera-backed template engine for building structured prompts.
pub struct TeraEngine {
    tera: Tera,
}

fn render_error(err: &tera::Error) -> PromptError {
    // Tera's top-level message omits the cause; fold the source chain in.
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    PromptError::Render(message)
}

impl TeraEngine {
    /// Create with inline templates only (no filesystem).
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
        }
    }

    /// Register a template from a string, replacing any previous one.
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<(), PromptError> {
        self.tera
            .add_raw_template(name, content)
            .map_err(|e| render_error(&e))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a named template with the given context.
    pub fn render(&self, template_name: &str, context: &tera::Context) -> Result<String, PromptError> {
        if !self.has_template(template_name) {
            return Err(PromptError::NotFound(template_name.to_string()));
        }
        self.tera
            .render(template_name, context)
            .map_err(|e| render_error(&e))
    }
}

impl Default for TeraEngine {
    fn default() -> Self {
        Self::new()
    }
}
