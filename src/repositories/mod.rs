mod error;
mod subscription;

pub use error::RepositoryError;
pub use subscription::{SubscriptionRepository, SubscriptionRepositoryTrait, SubscriptionService};
