use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::Config as RocketConfig;
use std::env;
use std::time::Duration;

use crate::services::scheduler::MAX_PERIOD;

pub struct Config;

impl Config {
    fn figment() -> Figment {
        // Get the current profile
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_").ignore(&["PROFILE"]).global())
    }

    pub fn openai_api_key() -> Option<String> {
        Self::figment()
            .extract_inner::<String>("openai_api_key")
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn openai_model() -> String {
        Self::figment()
            .extract_inner("openai_model")
            .unwrap_or_else(|_| "gpt-3.5-turbo".to_string())
    }

    pub fn openai_base_url() -> String {
        Self::figment()
            .extract_inner("openai_base_url")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
    }

    pub fn sweep_interval() -> Duration {
        Duration::from_secs(
            Self::figment()
                .extract_inner::<u64>("sweep_interval_secs")
                .unwrap_or(3600)
                .clamp(1, MAX_PERIOD.as_secs()),
        )
    }

    pub fn summary_interval() -> Duration {
        Duration::from_secs(
            Self::figment()
                .extract_inner::<u64>("summary_interval_secs")
                .unwrap_or(86_400)
                .clamp(1, MAX_PERIOD.as_secs()),
        )
    }

    /// Seed for reproducible payment outcomes; random per draw when unset.
    pub fn simulation_seed() -> Option<u64> {
        Self::figment()
            .extract_inner("simulation_seed")
            .ok()
    }

    pub fn is_scheduler_enabled() -> bool {
        Self::figment()
            .extract_inner("scheduler_enabled")
            .unwrap_or(true)
    }
}
