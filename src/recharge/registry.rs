use serde::Serialize;
use std::sync::Arc;

use super::provider::{ProviderName, RechargeProvider};
use super::providers::{
    FlutterwaveRecharge, HustleSimRecharge, PaystackBillsRecharge, ReloadlyRecharge,
    TopupMamaRecharge, VtPassRecharge,
};
use crate::config::ProvidersConfig;
use crate::payments::utils::PaymentHttpClient;

/// Adapters in fixed priority order. Which of them are active is decided by
/// configuration, not by the order list.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn RechargeProvider>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProviderStatus {
    pub name: String,
    pub configured: bool,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn RechargeProvider>>) -> Self {
        Self { providers }
    }

    /// Build the registry from the priority list, sharing one HTTP client.
    pub fn from_config(
        order: &[ProviderName],
        config: &ProvidersConfig,
        http: &PaymentHttpClient,
    ) -> Self {
        let providers = order
            .iter()
            .map(|name| -> Arc<dyn RechargeProvider> {
                match name {
                    ProviderName::HustleSim => Arc::new(HustleSimRecharge::new(
                        config.hustlesim.clone(),
                        http.clone(),
                    )),
                    ProviderName::TopupMama => Arc::new(TopupMamaRecharge::new(
                        config.topupmama.clone(),
                        http.clone(),
                    )),
                    ProviderName::Reloadly => Arc::new(ReloadlyRecharge::new(
                        config.reloadly.clone(),
                        http.clone(),
                    )),
                    ProviderName::VtPass => {
                        Arc::new(VtPassRecharge::new(config.vtpass.clone(), http.clone()))
                    }
                    ProviderName::Flutterwave => Arc::new(FlutterwaveRecharge::new(
                        config.flutterwave.clone(),
                        http.clone(),
                    )),
                    ProviderName::Paystack => Arc::new(PaystackBillsRecharge::new(
                        config.paystack.clone(),
                        http.clone(),
                    )),
                }
            })
            .collect();

        Self { providers }
    }

    /// Configured adapters in priority order. Lazy, and can be iterated again.
    pub fn configured_providers(&self) -> impl Iterator<Item = &Arc<dyn RechargeProvider>> + '_ {
        self.providers.iter().filter(|p| p.is_configured())
    }

    pub fn statuses(&self) -> Vec<ProviderStatus> {
        self.providers
            .iter()
            .map(|p| ProviderStatus {
                name: p.name().to_string(),
                configured: p.is_configured(),
            })
            .collect()
    }

    pub fn configured_count(&self) -> usize {
        self.configured_providers().count()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
