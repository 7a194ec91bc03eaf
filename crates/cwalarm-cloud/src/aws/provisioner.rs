use cwalarm_config::Config;

use crate::aws::alarm::AlarmProvisioner;
use crate::aws::client::{CloudWatch, Ec2, Sts};
use crate::aws::identity::IdentityResolver;
use crate::aws::selector::InstanceSelector;
use crate::aws::types::{AlarmOutcome, AlarmSpec};

/// Errors that stop the whole run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("No AWS region configured, pass --region or set AWS_REGION")]
    MissingRegion,

    #[error("Failed to describe EC2 instances: {0}")]
    Discovery(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to resolve AWS account: {0}")]
    Identity(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Per-instance result of a run, in provisioning order
#[derive(Debug, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<(String, AlarmOutcome)>,
}

impl RunReport {
    pub fn enabled(&self) -> usize {
        self.count(|outcome| *outcome == AlarmOutcome::Enabled)
    }

    pub fn failed(&self) -> usize {
        self.count(AlarmOutcome::is_failed)
    }

    fn count(&self, predicate: impl Fn(&AlarmOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

/// Selects instances, resolves the caller account and puts one CPU alarm per instance
#[derive(Debug)]
pub struct Provisioner {
    selector: InstanceSelector,
    identity: IdentityResolver,
    alarms: AlarmProvisioner,

    region: String,
}

impl Provisioner {
    pub async fn new(config: &Config) -> Result<Self, RunError> {
        let sdk_config =
            super::load_sdk_config(config.region.as_deref(), config.profile.as_deref()).await;

        let region = sdk_config
            .region()
            .map(ToString::to_string)
            .ok_or(RunError::MissingRegion)?;

        log::info!("Using AWS region {region}");

        Ok(Self {
            selector: InstanceSelector::new(Ec2::new(aws_sdk_ec2::Client::new(&sdk_config))),
            identity: IdentityResolver::new(Sts::new(aws_sdk_sts::Client::new(&sdk_config))),
            alarms: AlarmProvisioner::new(CloudWatch::new(aws_sdk_cloudwatch::Client::new(
                &sdk_config,
            ))),
            region,
        })
    }

    /// Provisions alarms for every selected instance.
    ///
    /// Discovery and identity failures abort the run. Alarm failures are recorded
    /// in the report and do not stop the remaining instances.
    pub async fn run(&self, config: &Config) -> Result<RunReport, RunError> {
        let instance_ids = self
            .selector
            .select(&config.selection)
            .await
            .map_err(RunError::Discovery)?;

        let mut report = RunReport::default();

        if instance_ids.is_empty() {
            log::info!("No EC2 instances matched, nothing to do");

            return Ok(report);
        }

        let account = self
            .identity
            .resolve()
            .await
            .map_err(RunError::Identity)?;

        for instance_id in instance_ids {
            let spec = AlarmSpec::for_instance(&instance_id, &account, &self.region, config);

            let outcome = if config.dry_run {
                log::info!("Dry run, skipping alarm {spec:?}");

                AlarmOutcome::Skipped
            } else {
                self.alarms.provision(spec).await
            };

            report.outcomes.push((instance_id, outcome));
        }

        log::info!(
            "Enabled {} alarm(s), {} failed",
            report.enabled(),
            report.failed()
        );

        Ok(report)
    }
}
