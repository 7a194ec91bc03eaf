use std::fmt;

use aws_sdk_cloudwatch::types::{ComparisonOperator, Statistic};

/// AWS account ID of the caller, used to build alarm action ARNs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(account: impl Into<String>) -> Self {
        Self(account.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to put a CPU utilization alarm on a single instance
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmSpec {
    pub name: String,
    pub description: String,
    /// Bound through the `InstanceId` dimension
    pub instance_id: String,

    pub metric_name: String,
    pub namespace: String,
    pub statistic: Statistic,
    pub comparison_operator: ComparisonOperator,
    pub threshold: f64,
    /// Seconds
    pub period: i32,
    pub evaluation_periods: i32,

    pub actions_enabled: bool,
    pub alarm_actions: Vec<String>,
}

impl AlarmSpec {
    pub const INSTANCE_DIMENSION: &'static str = "InstanceId";
}

/// Step at which provisioning an alarm failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmStage {
    Create,
    Enable,
}

impl fmt::Display for AlarmStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmStage::Create => write!(f, "create"),
            AlarmStage::Enable => write!(f, "enable"),
        }
    }
}

/// Terminal state of a single instance's alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmOutcome {
    /// Alarm was created and its actions enabled
    Enabled,
    /// Nothing was sent, dry run
    Skipped,
    Failed { stage: AlarmStage, error: String },
}

impl AlarmOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, AlarmOutcome::Failed { .. })
    }
}
