use super::Config;
use crate::config::ProviderKind;

fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = first_env(&["POCKET_SRE_API_KEY", "LLM_API_KEY"]) {
            self.llm.api_key = Some(key);
        }

        if let Some(provider) = first_env(&["POCKET_SRE_PROVIDER"]) {
            match ProviderKind::parse(&provider) {
                Some(kind) => self.llm.provider = kind,
                None => tracing::warn!(provider, "ignoring unknown POCKET_SRE_PROVIDER"),
            }
        }

        if let Some(base_url) = first_env(&["POCKET_SRE_BASE_URL"]) {
            self.llm.base_url = base_url;
        }

        if let Some(model) = first_env(&["POCKET_SRE_MODEL", "LLM_MODEL"]) {
            self.llm.model = model;
        }

        if let Some(host) = first_env(&["POCKET_SRE_HOST", "HOST"]) {
            self.gateway.host = host;
        }

        if let Some(port_str) = first_env(&["POCKET_SRE_PORT", "PORT"])
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }

        if let Some(debug) = first_env(&["POCKET_SRE_DEBUG", "DEBUG"]) {
            self.debug = debug.eq_ignore_ascii_case("true");
        }
    }
}
