//! Fleet ports: container and volume lifecycle services.

use std::future::Future;

use fleethub_domain::container::{Container, ContainerOperation, Volume, VolumeOperation};
use fleethub_domain::error::FleetHubError;
use fleethub_domain::id::VolumeId;

/// Container lookup and lifecycle operations on remote devices.
pub trait ContainerService {
    /// Resolve a container by the identifier the runtime reports for it.
    fn get_container_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Container>, FleetHubError>> + Send;

    /// Apply `operation` to the container. Fails when the device rejects it.
    fn execute_container_action(
        &self,
        id: &str,
        operation: ContainerOperation,
    ) -> impl Future<Output = Result<(), FleetHubError>> + Send;
}

/// Volume lookup and operations on remote devices.
pub trait VolumeService {
    fn get_volume_by_id(
        &self,
        id: VolumeId,
    ) -> impl Future<Output = Result<Option<Volume>, FleetHubError>> + Send;

    fn perform_volume_action(
        &self,
        volume: &Volume,
        operation: VolumeOperation,
    ) -> impl Future<Output = Result<(), FleetHubError>> + Send;
}
