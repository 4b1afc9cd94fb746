//! Tiers and the transport contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::fallback::error::AttemptError;
use crate::health::ProviderId;

/// A source cited by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceCitation {
    pub title: String,
    pub url: String,
    /// Host of `url` without a leading `www.`; `None` when the url does not parse.
    pub domain: Option<String>,
}

impl EvidenceCitation {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let domain = domain_of(&url);
        Self {
            title: title.into(),
            url,
            domain,
        }
    }
}

/// Lowercased host of a url, `www.` stripped.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// One hit from a basic search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Provider response, by capability shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TierResponse {
    /// Rich research answer with its sources.
    Research {
        answer: String,
        citations: Vec<EvidenceCitation>,
    },
    /// General-purpose structured JSON.
    General { json: serde_json::Value },
    /// Ranked search hits.
    Search { results: Vec<SearchHit> },
    /// Raw body text, possibly JSON.
    Text(String),
}

/// Per-attempt context handed to the transport.
#[derive(Debug, Clone)]
pub struct AttemptOptions {
    pub execution_id: Uuid,
    pub tier: String,
    /// Zero-based attempt index within the tier.
    pub attempt: u32,
    /// Deadline the executor enforces for this attempt.
    pub timeout: Duration,
}

/// Executes one attempt against one provider.
#[async_trait]
pub trait TierTransport: Send + Sync {
    async fn attempt(
        &self,
        query: &str,
        options: &AttemptOptions,
    ) -> Result<TierResponse, AttemptError>;
}

/// One capability level of a fallback chain.
#[derive(Clone)]
pub struct Tier {
    pub name: String,
    /// Health identity of this tier's provider.
    pub provider: ProviderId,
    pub transport: Arc<dyn TierTransport>,
    /// Overrides `retry.max_retries`.
    pub max_retries: Option<u32>,
    /// Overrides `retry.attempt_timeout_ms`.
    pub attempt_timeout: Option<Duration>,
}

impl Tier {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<ProviderId>,
        transport: Arc<dyn TierTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            transport,
            max_retries: None,
            attempt_timeout: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tier")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("max_retries", &self.max_retries)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://www.Example.com/a?b=1"), Some("example.com".into()));
        assert_eq!(domain_of("http://news.example.org"), Some("news.example.org".into()));
        assert_eq!(domain_of("not a url"), None);
        assert_eq!(domain_of(""), None);
    }

    #[test]
    fn test_citation_derives_domain() {
        let c = EvidenceCitation::new("Report", "https://www.gov.uk/report");
        assert_eq!(c.domain.as_deref(), Some("gov.uk"));
    }
}
