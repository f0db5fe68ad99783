//! Engine configuration.

use chrono_tz::Tz;

use crate::constants::{DEFAULT_BASE_CURRENCY, DEFAULT_DISPLAY_CURRENCIES};

/// Configuration for one valuation run.
///
/// Currency classification and split coverage are re-resolved at the start
/// of every run; the settings only decide how typed fallback outcomes are
/// treated, they never reintroduce silent defaults.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Reporting currency every value is pivoted through.
    pub base_currency: String,
    /// Secondary currencies the daily value series is also expressed in.
    pub display_currencies: Vec<String>,
    /// Exchange-local time zone split effective dates are normalized to
    /// before they are compared against transaction dates.
    pub exchange_time_zone: Tz,
    /// Accept `ClassifiedCurrency::Defaulted` outcomes instead of failing
    /// the affected symbol.
    pub accept_defaulted_currency: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            display_currencies: DEFAULT_DISPLAY_CURRENCIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            exchange_time_zone: chrono_tz::America::New_York,
            accept_defaulted_currency: false,
        }
    }
}

impl EngineSettings {
    pub fn with_base_currency(mut self, currency: impl Into<String>) -> Self {
        self.base_currency = currency.into();
        self
    }

    pub fn with_display_currencies(mut self, currencies: Vec<String>) -> Self {
        self.display_currencies = currencies;
        self
    }

    pub fn with_exchange_time_zone(mut self, zone: Tz) -> Self {
        self.exchange_time_zone = zone;
        self
    }

    pub fn with_accept_defaulted_currency(mut self, accept: bool) -> Self {
        self.accept_defaulted_currency = accept;
        self
    }
}
