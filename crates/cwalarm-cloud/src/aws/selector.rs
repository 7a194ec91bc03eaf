use aws_sdk_ec2::types::{Filter, Instance, Reservation};
use cwalarm_config::Selection;

use crate::aws::client::Ec2;

/// Resolves a [`Selection`] into the list of matching instance IDs
#[derive(Debug)]
pub struct InstanceSelector {
    client: Ec2,
}

impl InstanceSelector {
    const NAME_TAG_FILTER: &'static str = "tag:Name";
    const TAG_KEY_FILTER: &'static str = "tag-key";
    const STATE_FILTER: &'static str = "instance-state-name";
    const RUNNING_STATE: &'static str = "running";

    pub(super) fn new(client: Ec2) -> Self {
        Self { client }
    }

    /// Builds the DescribeInstances filters for the criteria that are set
    pub fn filters(selection: &Selection) -> Vec<Filter> {
        let mut filters = Vec::new();

        if let Some(name) = &selection.name {
            filters.push(
                Filter::builder()
                    .name(Self::NAME_TAG_FILTER)
                    .values(name)
                    .build(),
            );
        }

        if let Some(tag_key) = &selection.tag_key {
            filters.push(
                Filter::builder()
                    .name(Self::TAG_KEY_FILTER)
                    .values(tag_key)
                    .build(),
            );
        }

        if selection.running_only {
            filters.push(
                Filter::builder()
                    .name(Self::STATE_FILTER)
                    .values(Self::RUNNING_STATE)
                    .build(),
            );
        }

        filters
    }

    /// Returns matching instance IDs in the order EC2 reports them
    pub async fn select(
        &self,
        selection: &Selection,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let reservations = self
            .client
            .describe_instances(Self::filters(selection), selection.instance_ids.clone())
            .await?;

        let instance_ids: Vec<String> = reservations
            .iter()
            .flat_map(Reservation::instances)
            .filter_map(|instance| {
                let instance_id = instance.instance_id()?;

                log::info!("{}", Self::summary(instance_id, instance));

                Some(instance_id.to_string())
            })
            .collect();

        log::info!("Matched {} EC2 instance(s)", instance_ids.len());

        Ok(instance_ids)
    }

    fn summary(instance_id: &str, instance: &Instance) -> String {
        let instance_type = instance
            .instance_type()
            .map_or("unknown", |instance_type| instance_type.as_str());
        let state = instance
            .state()
            .and_then(|state| state.name())
            .map_or("unknown", |name| name.as_str());

        format!("{instance_id} ({instance_type}): {state}")
    }
}
