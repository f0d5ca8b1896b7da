//! End-to-end fan-out scenarios through the public API.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use fanout::{
    EndpointError, Parameters, PoolConfig, PoolMode, ServiceEndpoint, ServiceManager,
};
use serde_json::json;

struct Lookup {
    name: &'static str,
    supported: &'static [&'static str],
    items: Vec<String>,
}

#[async_trait]
impl ServiceEndpoint<String> for Lookup {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_parameters(&self) -> HashSet<String> {
        self.supported.iter().map(|s| s.to_string()).collect()
    }

    fn max_concurrent_invocations(&self) -> usize {
        2
    }

    async fn invoke(&self, _parameters: &Parameters) -> Result<Vec<String>, EndpointError> {
        Ok(self.items.clone())
    }
}

fn endpoints() -> Vec<Arc<dyn ServiceEndpoint<String>>> {
    vec![
        Arc::new(Lookup {
            name: "orders",
            supported: &["customer", "order_id"],
            items: vec!["order-1".into(), "order-2".into()],
        }),
        Arc::new(Lookup {
            name: "shipments",
            supported: &["customer"],
            items: vec!["shipment-9".into()],
        }),
    ]
}

#[tokio::test]
async fn fan_out_merges_results_in_both_modes() {
    for config in [PoolConfig::centralized(4), PoolConfig::decentralized(2)] {
        let manager = ServiceManager::new(endpoints(), &config);

        let params: Parameters = [("customer".to_string(), json!("c-42"))].into();
        let outcome = manager.invoke(&params).await;

        assert!(outcome.is_complete());
        let mut items = outcome.into_items();
        items.sort();
        assert_eq!(items, vec!["order-1", "order-2", "shipment-9"]);

        manager.shutdown().await;
    }
}

#[tokio::test]
async fn narrower_request_excludes_endpoints() {
    let manager = ServiceManager::new(endpoints(), &PoolConfig::default());

    let params: Parameters = [
        ("customer".to_string(), json!("c-42")),
        ("order_id".to_string(), json!(7)),
    ]
    .into();
    let outcome = manager.invoke(&params).await;

    assert!(outcome.is_complete());
    let mut items = outcome.into_items();
    items.sort();
    assert_eq!(items, vec!["order-1", "order-2"]);
}

#[tokio::test]
async fn default_config_is_centralized() {
    let config = PoolConfig::default();
    assert_eq!(config.mode, PoolMode::Centralized);
}
