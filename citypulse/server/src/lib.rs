pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        #[serde(default = "default_port")]
        pub port: u16,
        pub admin_username: String,
        pub admin_password: String,
        pub jwt_secret: String,
        /// YAML file of issues loaded into the store at start-up.
        #[serde(default)]
        pub seed_path: Option<String>,
        #[serde(default = "default_activity_window_days")]
        pub activity_window_days: u32,
        #[serde(default = "default_sla_alert_threshold_hours")]
        pub sla_alert_threshold_hours: u32,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;
            Self::from_settings(settings)
        }

        /// Deserializes configuration from already assembled settings.
        pub fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        /// How close to its deadline an unresolved issue must be to raise an alert.
        pub fn sla_alert_threshold(&self) -> chrono::TimeDelta {
            chrono::TimeDelta::hours(i64::from(self.sla_alert_threshold_hours))
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_activity_window_days() -> u32 {
        citypulse_core::DEFAULT_WINDOW_DAYS
    }

    fn default_sla_alert_threshold_hours() -> u32 {
        48
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn required() -> config::ConfigBuilder<config::builder::DefaultState> {
            config::Config::builder()
                .set_override("admin_username", "admin")
                .unwrap()
                .set_override("admin_password", "password")
                .unwrap()
                .set_override("jwt_secret", "secret")
                .unwrap()
        }

        #[test]
        fn applies_defaults_for_optional_settings() {
            let settings = required().build().unwrap();

            let config = Config::from_settings(settings).unwrap();

            assert_eq!(config.port, 8080);
            assert_eq!(config.seed_path, None);
            assert_eq!(config.activity_window_days, 30);
            assert_eq!(config.sla_alert_threshold_hours, 48);
            assert_eq!(config.sla_alert_threshold(), chrono::TimeDelta::hours(48));
        }

        #[test]
        fn reads_overridden_settings() {
            let settings = required()
                .set_override("port", "9090")
                .unwrap()
                .set_override("seed_path", "seed/issues.yml")
                .unwrap()
                .set_override("activity_window_days", "7")
                .unwrap()
                .build()
                .unwrap();

            let config = Config::from_settings(settings).unwrap();

            assert_eq!(config.port, 9090);
            assert_eq!(config.seed_path.as_deref(), Some("seed/issues.yml"));
            assert_eq!(config.activity_window_days, 7);
        }

        #[test]
        fn fails_without_credentials() {
            let settings = config::Config::builder().build().unwrap();
            assert!(Config::from_settings(settings).is_err());
        }
    }
}
pub mod auth;
pub mod dashboard;
pub mod issue;
pub mod store;
pub mod web;
