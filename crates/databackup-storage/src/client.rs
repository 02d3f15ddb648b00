//! AWS configuration resolved from the default provider chain.

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Load shared SDK configuration.
///
/// Credentials come from the environment, the shared credentials/config
/// files, or an attached instance role. `region` overrides the chain's
/// region when provided.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}
