pub mod llm;

mod azure;
mod openai;
mod openai_types;
mod perplexity;
mod test_provider;

use anyhow::{Result, anyhow};

/// Resolves `env:NAME` credentials from the environment, other values are
/// returned unchanged.
pub(crate) fn resolve_api_key(api_key: &str) -> Result<String> {
    match api_key.strip_prefix("env:") {
        Some(name) => {
            let name = name.trim();
            std::env::var(name).map_err(|_| anyhow!("Environment variable {} not found", name))
        }
        None => Ok(api_key.to_string()),
    }
}

/// Joins a base endpoint and a path without doubling slashes.
pub(crate) fn endpoint_url(endpoint: &str, path: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_key_plain_and_env() {
        assert_eq!(resolve_api_key("sk-plain").unwrap(), "sk-plain");

        unsafe {
            std::env::set_var("AICHAT_TEST_RESOLVE_KEY", "sk-from-env");
        }
        assert_eq!(
            resolve_api_key("env: AICHAT_TEST_RESOLVE_KEY").unwrap(),
            "sk-from-env"
        );

        let err = resolve_api_key("env:AICHAT_TEST_MISSING_KEY").unwrap_err();
        assert!(err.to_string().contains("AICHAT_TEST_MISSING_KEY"));
    }

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("https://api.example/v1/", "/chat/completions"),
            "https://api.example/v1/chat/completions"
        );
        assert_eq!(
            endpoint_url("http://localhost:8080", "chat/completions"),
            "http://localhost:8080/chat/completions"
        );
    }
}
