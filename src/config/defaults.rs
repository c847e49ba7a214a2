use super::*;
use crate::catalog::Connector;

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            web_level: None,
            file: "/tmp/chargedeck.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: "/data/chargedeck_state.json".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            active_charger_id: "CHG-002".to_string(),
            commercial_charger_id: "CHG-002".to_string(),
            rate_per_kwh: 1200.0,
            initial_percent: 44.0,
            initial_kwh: 18.6,
            initial_power_kw: 7.2,
            initial_amount: 22_320.0,
            percent_per_tick: 0.05,
            max_power_kw: 80.0,
            power_jitter_kw: 0.4,
            supply_decay: 0.5,
            kwh_per_percent: 0.6,
            target_percent: 100.0,
            mobile_request: true,
            seed: None,
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            currency_code: "UGX".to_string(),
            currency_symbol: "UGX".to_string(),
            symbol_first: true,
            decimals: 0,
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
            date_format: "DD/MM/YYYY".to_string(),
            timezone: "Africa/Kampala".to_string(),
        }
    }
}

fn connector(id: &str, label: &str) -> Connector {
    Connector {
        id: id.to_string(),
        label: label.to_string(),
    }
}

/// Chargers shown until the account has its own list configured
pub fn default_chargers() -> Vec<Charger> {
    vec![
        Charger {
            id: "CHG-001".to_string(),
            name: "Home Charger".to_string(),
            tag: "Private".to_string(),
            location: "Garage, Plot 12".to_string(),
            connector: "Type 2".to_string(),
            max_power_kw: 22.0,
            amount: 0.0,
            connectors: vec![connector("C1", "Type 2")],
        },
        Charger {
            id: "CHG-002".to_string(),
            name: "Roadside Bay".to_string(),
            tag: "Commercial".to_string(),
            location: "Kira Road".to_string(),
            connector: "CCS2".to_string(),
            max_power_kw: 60.0,
            amount: 184_500.0,
            connectors: vec![connector("C1", "CCS2"), connector("C2", "CHAdeMO")],
        },
        Charger {
            id: "CHG-003".to_string(),
            name: "Office Charger".to_string(),
            tag: "Shared".to_string(),
            location: "Nakasero Office Park".to_string(),
            connector: "Type 2".to_string(),
            max_power_kw: 11.0,
            amount: 0.0,
            connectors: vec![connector("C1", "Type 2"), connector("C2", "Type 2")],
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
            locale: LocaleConfig::default(),
            chargers: default_chargers(),
        }
    }
}
