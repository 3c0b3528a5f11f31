//! Provider data structure passed to resources and data sources

use crate::api::Client;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tfplug::retry::StateChangeConf;
use tfplug::types::Diagnostic;

#[derive(Clone)]
pub struct EquinixProviderData {
    pub client: Arc<Client>,
    pub page_size: i64,
    /// Replaces waiter delays and backoff with a fixed poll interval
    pub poll_interval: Option<Duration>,
}

impl EquinixProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            poll_interval: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Recovers the data handed out by the provider's configure call.
    /// `target` names the receiver in diagnostics, e.g. "resource".
    pub fn from_configure(
        data: Option<Arc<dyn Any + Send + Sync>>,
        target: &str,
    ) -> Result<Self, Diagnostic> {
        let data = data.ok_or_else(|| {
            Diagnostic::error(
                "No provider data",
                format!("No provider data was provided to the {}", target),
            )
        })?;
        data.downcast_ref::<EquinixProviderData>()
            .cloned()
            .ok_or_else(|| {
                Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract EquinixProviderData from provider data",
                )
            })
    }

    /// Applies the poll interval override to a waiter, if one is set.
    pub fn tune_waiter<F>(&self, conf: StateChangeConf<F>) -> StateChangeConf<F> {
        match self.poll_interval {
            Some(interval) => conf
                .delay(Duration::ZERO)
                .min_timeout(Duration::ZERO)
                .poll_interval(interval),
            None => conf,
        }
    }
}

/// Diagnostic for operations invoked before configure.
pub fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FabricAuth;

    fn provider_data() -> EquinixProviderData {
        let client = Client::new(
            "https://api.equinix.com",
            FabricAuth::Token("t".to_string()),
            None,
        )
        .unwrap();
        EquinixProviderData::new(client)
    }

    #[test]
    fn test_from_configure_downcasts() {
        let data: Arc<dyn Any + Send + Sync> = Arc::new(provider_data());
        let recovered = EquinixProviderData::from_configure(Some(data), "resource").unwrap();
        assert_eq!(recovered.page_size, crate::config::DEFAULT_PAGE_SIZE);
        assert!(recovered.poll_interval.is_none());
    }

    #[test]
    fn test_from_configure_rejects_foreign_data() {
        let data: Arc<dyn Any + Send + Sync> = Arc::new("not provider data".to_string());
        let err = EquinixProviderData::from_configure(Some(data), "resource")
            .err()
            .unwrap();
        assert_eq!(err.summary, "Invalid provider data");

        let err = EquinixProviderData::from_configure(None, "data source")
            .err()
            .unwrap();
        assert_eq!(err.summary, "No provider data");
        assert_eq!(err.detail, "No provider data was provided to the data source");
    }
}
