use crate::aws::client::Sts;
use crate::aws::types::AccountId;

/// Looks up the account the current credentials belong to
#[derive(Debug)]
pub struct IdentityResolver {
    client: Sts,
}

impl IdentityResolver {
    pub(super) fn new(client: Sts) -> Self {
        Self { client }
    }

    pub async fn resolve(&self) -> Result<AccountId, Box<dyn std::error::Error + Send + Sync>> {
        let identity = self.client.get_caller_identity().await?;

        let account = identity
            .account()
            .ok_or("No account ID returned from STS GetCallerIdentity")?;

        log::info!("Resolved AWS account {account}");

        Ok(AccountId::new(account))
    }
}
