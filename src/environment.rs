use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents the deployment environments the metrics backend is available in.
#[derive(Clone, Default, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development backend.
    Local,
    /// Staging backend for pre-production testing.
    Staging,
    /// Production metrics backend.
    #[default]
    Production,
}

impl Environment {
    /// Returns the metrics API root associated with the environment.
    pub fn api_root(&self) -> String {
        match self {
            Environment::Local => "http://localhost:8085/api".to_string(),
            Environment::Staging => "https://staging.metrics.internal/api".to_string(),
            Environment::Production => "https://metrics.internal/api".to_string(),
        }
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "Local"),
            Environment::Staging => write!(f, "Staging"),
            Environment::Production => write!(f, "Production"),
        }
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Environment::{}, URL: {}", self, self.api_root())
    }
}
