use aws_sdk_cloudwatch::types::{ComparisonOperator, Statistic};
use cwalarm_config::{Action, Config};

use crate::aws::client::CloudWatch;
use crate::aws::types::{AccountId, AlarmOutcome, AlarmSpec, AlarmStage};

const ALARM_NAME_VENDOR_PREFIX: &str = "awsec2";
const METRIC_NAME: &str = "CPUUtilization";
const NAMESPACE: &str = "AWS/EC2";

/// `awsec2-<instance id>-<prefix>`
pub fn alarm_name(instance_id: &str, prefix: &str) -> String {
    format!("{ALARM_NAME_VENDOR_PREFIX}-{instance_id}-{prefix}")
}

/// ARN of the EC2 automate action CloudWatch runs against the alarmed instance
pub fn instance_action_arn(region: &str, account: &AccountId, action: Action) -> String {
    format!("arn:aws:swf:{region}:{account}:action/actions/AWS_EC2.InstanceId.{action}/1.0")
}

pub fn sns_topic_arn(region: &str, account: &AccountId, topic: &str) -> String {
    format!("arn:aws:sns:{region}:{account}:{topic}")
}

impl AlarmSpec {
    /// Alarm that fires when average CPU of `instance_id` drops below the configured threshold
    pub fn for_instance(
        instance_id: &str,
        account: &AccountId,
        region: &str,
        config: &Config,
    ) -> Self {
        Self {
            name: alarm_name(instance_id, &config.alarm_name_prefix),
            description: format!(
                "Alarm when server CPU falls below {:.6} percent",
                config.threshold
            ),
            instance_id: instance_id.to_string(),
            metric_name: METRIC_NAME.to_string(),
            namespace: NAMESPACE.to_string(),
            statistic: Statistic::Average,
            comparison_operator: ComparisonOperator::LessThanThreshold,
            threshold: config.threshold,
            period: config.period.as_secs(),
            evaluation_periods: 1,
            actions_enabled: true,
            alarm_actions: vec![
                instance_action_arn(region, account, config.action),
                sns_topic_arn(region, account, &config.sns_topic),
            ],
        }
    }
}

/// Creates alarms and enables their actions, one alarm at a time
#[derive(Debug)]
pub struct AlarmProvisioner {
    client: CloudWatch,
}

impl AlarmProvisioner {
    pub(super) fn new(client: CloudWatch) -> Self {
        Self { client }
    }

    /// Puts the alarm, then enables its actions.
    ///
    /// Failures are logged and returned as [`AlarmOutcome::Failed`], the caller
    /// moves on to the next instance.
    pub async fn provision(&self, spec: AlarmSpec) -> AlarmOutcome {
        let alarm_name = spec.name.clone();
        let instance_id = spec.instance_id.clone();

        if let Err(e) = self.client.put_metric_alarm(spec).await {
            log::error!("Failed to create alarm {alarm_name} for EC2 instance {instance_id}: {e}");

            return AlarmOutcome::Failed {
                stage: AlarmStage::Create,
                error: e.to_string(),
            };
        }

        log::debug!("Created alarm {alarm_name}");

        if let Err(e) = self
            .client
            .enable_alarm_actions(vec![alarm_name.clone()])
            .await
        {
            log::error!("Failed to enable alarm {alarm_name} for EC2 instance {instance_id}: {e}");

            return AlarmOutcome::Failed {
                stage: AlarmStage::Enable,
                error: e.to_string(),
            };
        }

        log::info!("Enabled alarm {alarm_name} for EC2 instance {instance_id}");

        AlarmOutcome::Enabled
    }
}
