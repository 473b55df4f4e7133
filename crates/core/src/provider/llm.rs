use crate::completion::CompletionModel;
use crate::model::{ChatConfiguration, ModelProvider};
use crate::provider::{azure, openai, perplexity, test_provider};
use anyhow::Result;
use tracing::instrument;

/// Creates the backend matching the configuration's provider.
#[instrument(skip(configuration), fields(configuration = %configuration.name))]
pub fn get_completion_llm(configuration: &ChatConfiguration) -> Result<Box<dyn CompletionModel>> {
    match configuration.provider {
        ModelProvider::Openai => {
            let model = openai::OpenAIBaseModel::new(configuration)?;
            Ok(Box::new(model))
        }
        ModelProvider::Azure => {
            let model = azure::AzureModel::new(configuration)?;
            Ok(Box::new(model))
        }
        ModelProvider::Perplexity => {
            let model = perplexity::PerplexityModel::new(configuration)?;
            Ok(Box::new(model))
        }
        ModelProvider::Test => {
            let model = test_provider::TestProviderModel::new(configuration)?;
            Ok(Box::new(model))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration(provider: ModelProvider, endpoint: Option<&str>) -> ChatConfiguration {
        ChatConfiguration {
            name: "test".to_string(),
            provider,
            endpoint: endpoint.map(str::to_string),
            api_key: "sk-dummy".to_string(),
            model: "some-model".to_string(),
        }
    }

    #[test]
    fn test_get_completion_llm_openai_provider() {
        let model = get_completion_llm(&configuration(ModelProvider::Openai, None));
        assert!(model.is_ok());
    }

    #[test]
    fn test_get_completion_llm_perplexity_provider() {
        let model = get_completion_llm(&configuration(ModelProvider::Perplexity, None));
        assert!(model.is_ok());
    }

    #[test]
    fn test_get_completion_llm_azure_requires_endpoint() {
        let model = get_completion_llm(&configuration(ModelProvider::Azure, None));
        assert!(model.is_err());
        assert!(
            model
                .err()
                .unwrap()
                .to_string()
                .contains("'endpoint' is required for azure")
        );

        let model = get_completion_llm(&configuration(
            ModelProvider::Azure,
            Some("https://example.openai.azure.com"),
        ));
        assert!(model.is_ok());
    }
}
