//! Install and activate tools.
//!
//! ### Behavior
//! - `sw_install` re-runs install for the current generation
//! - `sw_activate` removes every other generation
//! - [`start`] runs both at startup, activating only after a clean install,
//!   and otherwise keeps serving the generation activated last

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use swproxy_core::{AppConfig, CacheProxy, CacheStorage, Error, Event, EventOutcome, Network, dispatch};

use super::json_result;

/// Execute the sw_install tool.
pub async fn install_impl(proxy: &CacheProxy) -> Result<CallToolResult, McpError> {
    match dispatch(proxy, Event::Install).await? {
        EventOutcome::Installed(report) => json_result(&report),
        other => Err(unexpected("install", &other)),
    }
}

/// Execute the sw_activate tool.
pub async fn activate_impl(proxy: &CacheProxy) -> Result<CallToolResult, McpError> {
    match dispatch(proxy, Event::Activate).await? {
        EventOutcome::Activated(report) => json_result(&report),
        other => Err(unexpected("activate", &other)),
    }
}

/// Boot the configured generation and build the proxy that serves requests.
///
/// If the configured generation cannot be installed and activated, requests
/// are served from the generation activated last, untouched.
///
/// # Errors
///
/// `Error::InstallFailed` when boot fails and no generation was ever
/// activated.
pub async fn start(
    config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
) -> Result<CacheProxy, Error> {
    let proxy = CacheProxy::new(config, storage.clone(), network.clone())?;
    if boot(&proxy).await {
        return Ok(proxy);
    }

    match proxy.activated().await? {
        Some(previous) if previous == config.cache_name => Ok(proxy),
        Some(previous) => {
            tracing::warn!(generation = %previous, pending = %config.cache_name, "serving previous generation");
            let fallback = AppConfig { cache_name: previous, ..config.clone() };
            CacheProxy::new(&fallback, storage, network)
        }
        None => Err(Error::InstallFailed {
            url: config.origin.clone(),
            reason: format!("{} not installed and no generation is active", config.cache_name),
        }),
    }
}

/// Install then activate. A failed install leaves older generations in place.
///
/// Returns whether the new generation was activated.
async fn boot(proxy: &CacheProxy) -> bool {
    if let Err(e) = dispatch(proxy, Event::Install).await {
        tracing::warn!(generation = %proxy.generation(), error = %e, "install failed, skipping activation");
        return false;
    }

    match dispatch(proxy, Event::Activate).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(generation = %proxy.generation(), error = %e, "activation failed");
            false
        }
    }
}

fn unexpected(event: &str, outcome: &EventOutcome) -> McpError {
    McpError::internal_error(format!("{event} produced {outcome:?}"), None)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use swproxy_core::{
        ActivateReport, InstallReport, InterceptedRequest, LifecycleHandler, MemoryStorage, RequestKey, Response,
        ResponseSource,
    };
    use url::Url;

    use super::*;
    use crate::tools::test_support::{ORIGIN, StubNetwork, config, output, proxy, site};

    /// Storage holding an activated v1 whose shell root is cached.
    async fn previous_release() -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        let root = RequestKey::get(&Url::parse(ORIGIN).unwrap());
        storage.put("palinsesto-tv-v1", &root, &Response::new(200, "v1 shell")).await.unwrap();
        storage.set_activated("palinsesto-tv-v1").await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_install_impl_reports_shell() {
        let (proxy, _) = proxy(Arc::new(site(&[])));

        let result = install_impl(&proxy).await.unwrap();
        let report: InstallReport = output(&result);

        assert_eq!(report.generation, "palinsesto-tv-v2");
        assert_eq!(report.cached.len(), 7);
        assert_eq!(report.cached[0], format!("{ORIGIN}/"));
    }

    #[tokio::test]
    async fn test_install_impl_failure_is_error() {
        let (proxy, _) = proxy(Arc::new(StubNetwork::default()));

        let err = install_impl(&proxy).await.unwrap_err();
        assert_eq!(err.code.0, -32013);
    }

    #[tokio::test]
    async fn test_activate_impl_reports_deleted() {
        let (proxy, storage) = proxy(Arc::new(site(&[])));
        storage.open("palinsesto-tv-v1").await.unwrap();
        storage.open("palinsesto-tv-v2").await.unwrap();

        let result = activate_impl(&proxy).await.unwrap();
        let report: ActivateReport = output(&result);

        assert_eq!(report.current, "palinsesto-tv-v2");
        assert_eq!(report.deleted, vec!["palinsesto-tv-v1"]);
    }

    #[tokio::test]
    async fn test_boot_activates_after_install() {
        let (proxy, storage) = proxy(Arc::new(site(&[])));
        storage.open("palinsesto-tv-v1").await.unwrap();

        assert!(boot(&proxy).await);
        assert_eq!(storage.keys().await.unwrap(), vec!["palinsesto-tv-v2"]);
    }

    #[tokio::test]
    async fn test_boot_keeps_old_generation_when_install_fails() {
        let (proxy, storage) = proxy(Arc::new(StubNetwork::default()));
        let old = RequestKey::get(&Url::parse(ORIGIN).unwrap());
        storage.put("palinsesto-tv-v1", &old, &Response::new(200, "old")).await.unwrap();

        assert!(!boot(&proxy).await);
        let keys = storage.keys().await.unwrap();
        assert!(keys.contains(&"palinsesto-tv-v1".to_string()));
        assert!(storage.match_request("palinsesto-tv-v1", &old).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_start_activates_configured_generation() {
        let storage = previous_release().await;

        let proxy = start(&config(), storage.clone(), Arc::new(site(&[]))).await.unwrap();

        assert_eq!(proxy.generation(), "palinsesto-tv-v2");
        assert_eq!(storage.activated().await.unwrap().as_deref(), Some("palinsesto-tv-v2"));
        assert_eq!(storage.keys().await.unwrap(), vec!["palinsesto-tv-v2"]);
    }

    #[tokio::test]
    async fn test_start_serves_previous_generation_when_install_fails() {
        let storage = previous_release().await;
        let network = Arc::new(StubNetwork::new());
        network.set_offline(true);

        let proxy = start(&config(), storage.clone(), network).await.unwrap();

        assert_eq!(proxy.generation(), "palinsesto-tv-v1");
        assert_eq!(storage.activated().await.unwrap().as_deref(), Some("palinsesto-tv-v1"));

        let page = InterceptedRequest::navigate(Url::parse(ORIGIN).unwrap());
        let outcome = proxy.on_fetch(page).await;
        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(outcome.response().unwrap().text(), "v1 shell");
    }

    #[tokio::test]
    async fn test_start_keeps_active_generation_on_offline_restart() {
        let storage = Arc::new(MemoryStorage::new());
        start(&config(), storage.clone(), Arc::new(site(&[]))).await.unwrap();

        let network = Arc::new(StubNetwork::new());
        network.set_offline(true);
        let proxy = start(&config(), storage.clone(), network).await.unwrap();

        assert_eq!(proxy.generation(), "palinsesto-tv-v2");
        assert_eq!(proxy.entries().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_start_without_active_generation_fails() {
        let storage = Arc::new(MemoryStorage::new());

        let result = start(&config(), storage, Arc::new(StubNetwork::new())).await;

        assert!(matches!(result, Err(Error::InstallFailed { .. })));
    }
}
