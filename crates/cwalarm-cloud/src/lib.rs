//! AWS side of cwalarm: instance discovery, account lookup and CloudWatch alarm provisioning

pub mod aws;
