// Service configuration - config/vitals.toml layered with VITALS__* environment variables
use crate::application::error::VitalsError;
use crate::application::reconnect::ReconnectPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub api: ApiSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    pub reconnect: ReconnectSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardSettings {
    #[serde(default)]
    pub facility_id: Option<String>,
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Overrides the endpoint resolved from facility and bed.
    #[serde(default)]
    pub socket_url: Option<String>,
    #[serde(default)]
    pub compact: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconnectSettings {
    pub strategy: String,
    pub base_ms: u64,
    pub max_ms: u64,
    pub max_attempts: usize,
}

impl ReconnectSettings {
    pub fn policy(&self) -> Result<ReconnectPolicy, VitalsError> {
        match self.strategy.as_str() {
            "never" => Ok(ReconnectPolicy::Never),
            "exponential" => {
                if self.base_ms == 0 || self.max_ms < self.base_ms {
                    return Err(VitalsError::Config(format!(
                        "reconnect delays must satisfy 0 < base_ms <= max_ms (got {} and {})",
                        self.base_ms, self.max_ms
                    )));
                }
                Ok(ReconnectPolicy::Exponential {
                    base_ms: self.base_ms,
                    max_ms: self.max_ms,
                    max_attempts: self.max_attempts,
                })
            }
            other => Err(VitalsError::Config(format!(
                "unknown reconnect strategy '{}'",
                other
            ))),
        }
    }
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    build_config(config::File::with_name("config/vitals").required(false))
}

fn build_config<S>(source: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("api.base_url", "http://localhost:9000")?
        .set_default("reconnect.strategy", "never")?
        .set_default("reconnect.base_ms", 500)?
        .set_default("reconnect.max_ms", 30_000)?
        .set_default("reconnect.max_attempts", 10)?
        .add_source(source)
        .add_source(config::Environment::with_prefix("VITALS").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
