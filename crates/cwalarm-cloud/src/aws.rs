pub mod alarm;
mod client;
pub mod identity;
pub mod provisioner;
pub mod selector;
pub mod types;

pub use provisioner::{Provisioner, RunError, RunReport};

/// Loads the shared AWS SDK configuration.
///
/// Explicit `region` and `profile` win over the default provider chain
/// (environment, shared config files, instance metadata).
pub(crate) async fn load_sdk_config(
    region: Option<&str>,
    profile: Option<&str>,
) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region.to_string()));
    }

    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}
