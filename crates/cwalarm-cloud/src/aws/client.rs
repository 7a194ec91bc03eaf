//! AWS service clients implementation
use aws_sdk_cloudwatch::types::Dimension;
use aws_sdk_ec2::types::{Filter, Reservation};
use aws_sdk_sts::operation::get_caller_identity::GetCallerIdentityOutput;

#[cfg(test)]
use mockall::automock;

use crate::aws::types::AlarmSpec;

/// AWS EC2 client implementation
#[derive(Debug)]
pub(super) struct Ec2Impl {
    inner: aws_sdk_ec2::Client,
}

#[cfg_attr(test, allow(dead_code))]
#[cfg_attr(test, automock)]
impl Ec2Impl {
    pub(super) fn new(inner: aws_sdk_ec2::Client) -> Self {
        Self { inner }
    }

    /// Describes instances matching `filters`, optionally scoped to `instance_ids`.
    ///
    /// Follows `next_token` until exhausted and returns every reservation in page order.
    pub(super) async fn describe_instances(
        &self,
        filters: Vec<Filter>,
        instance_ids: Vec<String>,
    ) -> Result<Vec<Reservation>, Box<dyn std::error::Error + Send + Sync>> {
        let filters = (!filters.is_empty()).then_some(filters);
        let instance_ids = (!instance_ids.is_empty()).then_some(instance_ids);

        collect_pages(|next_token| {
            let request = self
                .inner
                .describe_instances()
                .set_filters(filters.clone())
                .set_instance_ids(instance_ids.clone())
                .set_next_token(next_token);

            async move {
                let response = request.send().await?;

                Ok::<_, Box<dyn std::error::Error + Send + Sync>>((
                    response.reservations().to_vec(),
                    response.next_token().map(String::from),
                ))
            }
        })
        .await
    }
}

/// Calls `fetch_page` with the previous page's token until no token is returned.
///
/// Items are concatenated in page order. An empty token ends the listing too.
async fn collect_pages<T, E, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>), E>>,
{
    let mut items = Vec::new();
    let mut next_token = None;

    loop {
        let (page, token) = fetch_page(next_token).await?;
        items.extend(page);

        next_token = token.filter(|token| !token.is_empty());
        if next_token.is_none() {
            break;
        }

        log::debug!("Fetching next page");
    }

    Ok(items)
}

/// AWS STS client implementation
#[derive(Debug)]
pub(super) struct StsImpl {
    inner: aws_sdk_sts::Client,
}

#[cfg_attr(test, allow(dead_code))]
#[cfg_attr(test, automock)]
impl StsImpl {
    pub(super) fn new(inner: aws_sdk_sts::Client) -> Self {
        Self { inner }
    }

    pub(super) async fn get_caller_identity(
        &self,
    ) -> Result<GetCallerIdentityOutput, Box<dyn std::error::Error + Send + Sync>> {
        let response = self.inner.get_caller_identity().send().await?;

        Ok(response)
    }
}

/// AWS CloudWatch client implementation
#[derive(Debug)]
pub(super) struct CloudWatchImpl {
    inner: aws_sdk_cloudwatch::Client,
}

#[cfg_attr(test, allow(dead_code))]
#[cfg_attr(test, automock)]
impl CloudWatchImpl {
    pub(super) fn new(inner: aws_sdk_cloudwatch::Client) -> Self {
        Self { inner }
    }

    pub(super) async fn put_metric_alarm(
        &self,
        alarm: AlarmSpec,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        log::debug!("Putting metric alarm {}", alarm.name);

        self.inner
            .put_metric_alarm()
            .alarm_name(alarm.name)
            .alarm_description(alarm.description)
            .comparison_operator(alarm.comparison_operator)
            .evaluation_periods(alarm.evaluation_periods)
            .metric_name(alarm.metric_name)
            .namespace(alarm.namespace)
            .period(alarm.period)
            .statistic(alarm.statistic)
            .threshold(alarm.threshold)
            .actions_enabled(alarm.actions_enabled)
            .set_alarm_actions(Some(alarm.alarm_actions))
            .dimensions(
                Dimension::builder()
                    .name(AlarmSpec::INSTANCE_DIMENSION)
                    .value(alarm.instance_id)
                    .build(),
            )
            .send()
            .await?;

        Ok(())
    }

    pub(super) async fn enable_alarm_actions(
        &self,
        alarm_names: Vec<String>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner
            .enable_alarm_actions()
            .set_alarm_names(Some(alarm_names))
            .send()
            .await?;

        Ok(())
    }
}

#[cfg(not(test))]
pub(super) use Ec2Impl as Ec2;
#[cfg(test)]
pub(super) use MockEc2Impl as Ec2;

#[cfg(not(test))]
pub(super) use StsImpl as Sts;
#[cfg(test)]
pub(super) use MockStsImpl as Sts;

#[cfg(not(test))]
pub(super) use CloudWatchImpl as CloudWatch;
#[cfg(test)]
pub(super) use MockCloudWatchImpl as CloudWatch;
