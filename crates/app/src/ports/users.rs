//! User port: the identity automated runs execute as.

use std::future::Future;

use fleethub_domain::error::FleetHubError;
use fleethub_domain::user::User;

pub trait UserRepository {
    /// The first registered user, which is the administrator.
    fn find_first(&self) -> impl Future<Output = Result<Option<User>, FleetHubError>> + Send;
}
