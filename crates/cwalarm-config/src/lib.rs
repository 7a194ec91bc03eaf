use std::fmt;
use std::fs;
use std::str::FromStr;

use serde::Deserialize;

/// Reasons a configuration is rejected before any AWS call is made
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("You must provide an instance name, a tag key, or instance IDs")]
    NoSelection,

    #[error("You must provide an alarm name prefix")]
    MissingAlarmPrefix,

    #[error("You must provide a SNS topic")]
    MissingSnsTopic,

    #[error("Valid actions are Terminate, Stop, or Reboot, got '{0}'")]
    InvalidAction(String),

    #[error("Valid periods are 1, 5, 10, 30, or multiples of 60, got {0}")]
    InvalidPeriod(i32),
}

/// EC2 action executed when the alarm fires
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    #[default]
    Terminate,
    Stop,
    Reboot,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Terminate => "Terminate",
            Action::Stop => "Stop",
            Action::Reboot => "Reboot",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Terminate" => Ok(Action::Terminate),
            "Stop" => Ok(Action::Stop),
            "Reboot" => Ok(Action::Reboot),
            _ => Err(ConfigError::InvalidAction(value.to_string())),
        }
    }
}

/// Alarm evaluation period in seconds.
///
/// CloudWatch accepts 1, 5, 10 and 30 for high-resolution metrics, otherwise
/// any positive multiple of 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period(i32);

impl Period {
    pub const DEFAULT: Self = Self(900);

    const HIGH_RESOLUTION: [i32; 4] = [1, 5, 10, 30];

    pub fn new(seconds: i32) -> Result<Self, ConfigError> {
        if Self::is_valid(seconds) {
            Ok(Self(seconds))
        } else {
            Err(ConfigError::InvalidPeriod(seconds))
        }
    }

    pub fn is_valid(seconds: i32) -> bool {
        Self::HIGH_RESOLUTION.contains(&seconds) || (seconds > 0 && seconds % 60 == 0)
    }

    pub fn as_secs(self) -> i32 {
        self.0
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which instances get an alarm
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Exact value of the `Name` tag
    pub name: Option<String>,
    /// Tag key that must exist on the instance
    pub tag_key: Option<String>,
    /// Explicit instance IDs, in the order given by the user
    pub instance_ids: Vec<String>,
    /// Only consider instances in the `running` state
    pub running_only: bool,
}

impl Selection {
    /// `true` when no name, tag key or instance ID narrows the selection
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.tag_key.is_none() && self.instance_ids.is_empty()
    }
}

/// Splits a comma-separated instance ID list, dropping blank entries
pub fn parse_instance_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

/// A partially filled configuration source.
///
/// Layers come from the TOML config file and from command-line flags; the flag
/// layer is merged over the file layer before validation.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub selection: SelectionLayer,
    pub alarm: AlarmLayer,
    pub aws: AwsLayer,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionLayer {
    pub name: Option<String>,
    pub tag_key: Option<String>,
    pub instance_ids: Option<Vec<String>>,
    pub running: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlarmLayer {
    pub prefix: Option<String>,
    pub sns_topic: Option<String>,
    pub action: Option<String>,
    pub threshold: Option<f64>,
    pub period: Option<i32>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsLayer {
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl ConfigLayer {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;

        let layer: ConfigLayer = toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;

        log::debug!("Loaded config layer from {path}: {layer:?}");

        Ok(layer)
    }

    /// Combines two layers, values present in `overrides` win
    #[must_use]
    pub fn merge(self, overrides: ConfigLayer) -> Self {
        Self {
            selection: SelectionLayer {
                name: overrides.selection.name.or(self.selection.name),
                tag_key: overrides.selection.tag_key.or(self.selection.tag_key),
                instance_ids: overrides
                    .selection
                    .instance_ids
                    .or(self.selection.instance_ids),
                running: overrides.selection.running.or(self.selection.running),
            },
            alarm: AlarmLayer {
                prefix: overrides.alarm.prefix.or(self.alarm.prefix),
                sns_topic: overrides.alarm.sns_topic.or(self.alarm.sns_topic),
                action: overrides.alarm.action.or(self.alarm.action),
                threshold: overrides.alarm.threshold.or(self.alarm.threshold),
                period: overrides.alarm.period.or(self.alarm.period),
            },
            aws: AwsLayer {
                region: overrides.aws.region.or(self.aws.region),
                profile: overrides.aws.profile.or(self.aws.profile),
            },
            dry_run: overrides.dry_run.or(self.dry_run),
        }
    }
}

/// Validated, immutable run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub selection: Selection,
    pub alarm_name_prefix: String,
    pub sns_topic: String,
    pub action: Action,
    /// CPU utilization percentage the alarm compares against
    pub threshold: f64,
    pub period: Period,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub dry_run: bool,
}

impl Config {
    pub const DEFAULT_THRESHOLD: f64 = 1.0;

    /// Loads the optional config file, merges `overrides` over it and validates the result
    pub fn load(path: Option<&str>, overrides: ConfigLayer) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => ConfigLayer::from_file(path)?,
            None => ConfigLayer::default(),
        };

        Self::try_from(base.merge(overrides))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

impl TryFrom<ConfigLayer> for Config {
    type Error = ConfigError;

    fn try_from(layer: ConfigLayer) -> Result<Self, Self::Error> {
        let selection = Selection {
            name: non_empty(layer.selection.name),
            tag_key: non_empty(layer.selection.tag_key),
            instance_ids: layer
                .selection
                .instance_ids
                .unwrap_or_default()
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            running_only: layer.selection.running.unwrap_or(false),
        };

        if selection.is_empty() {
            return Err(ConfigError::NoSelection);
        }

        let alarm_name_prefix =
            non_empty(layer.alarm.prefix).ok_or(ConfigError::MissingAlarmPrefix)?;
        let sns_topic = non_empty(layer.alarm.sns_topic).ok_or(ConfigError::MissingSnsTopic)?;

        let action = match layer.alarm.action {
            Some(action) => action.parse()?,
            None => Action::default(),
        };

        let period = match layer.alarm.period {
            Some(seconds) => Period::new(seconds)?,
            None => Period::default(),
        };

        Ok(Self {
            selection,
            alarm_name_prefix,
            sns_topic,
            action,
            threshold: layer.alarm.threshold.unwrap_or(Self::DEFAULT_THRESHOLD),
            period,
            region: non_empty(layer.aws.region),
            profile: non_empty(layer.aws.profile),
            dry_run: layer.dry_run.unwrap_or(false),
        })
    }
}
