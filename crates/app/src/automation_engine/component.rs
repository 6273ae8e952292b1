//! Automation component: the live form of one registered automation.

use std::sync::{Arc, Mutex, PoisonError};

use fleethub_domain::automation::{Automation, ExecutionStatus};
use fleethub_domain::error::{AutomationError, FleetHubError};
use fleethub_domain::id::AutomationId;
use fleethub_domain::time::{self, Timestamp};

use super::action::Action;
use super::report::{ActionFailure, RunReport};
use super::trigger::Trigger;
use super::{Collaborators, PollingConfig};
use crate::ports::{AutomationRepository, Ports};
use crate::scheduler::Scheduler;

/// Owns one trigger and the ordered actions of an automation.
///
/// A component is `registered` from [`init`](Self::init) until
/// [`deregister`](Self::deregister); afterwards it cannot run again and a
/// new component must be built.
pub struct AutomationComponent<P: Ports> {
    id: AutomationId,
    name: String,
    automations: Arc<P::Automations>,
    /// Held for the whole duration of a run.
    run_lock: tokio::sync::Mutex<()>,
    live: Mutex<Option<Live<P>>>,
}

struct Live<P: Ports> {
    trigger: Trigger,
    actions: Arc<[Action<P>]>,
}

impl<P: Ports> AutomationComponent<P> {
    /// Build the trigger and actions from the definition and start the
    /// trigger.
    ///
    /// Everything that can fail happens before the trigger is scheduled, so
    /// an error leaves no job behind.
    ///
    /// # Errors
    ///
    /// Returns [`FleetHubError::Validation`] when the chain is structurally
    /// invalid and [`FleetHubError::Automation`] when an action needs a
    /// collaborator that was not configured.
    pub(crate) fn init(
        definition: &Automation,
        collaborators: &Collaborators<P>,
        scheduler: &Scheduler,
        polling: PollingConfig,
    ) -> Result<Arc<Self>, FleetHubError> {
        let chain = definition.chain()?;
        let mut trigger = Trigger::build(chain.trigger()?, scheduler)?;
        let actions = chain
            .actions()?
            .iter()
            .enumerate()
            .map(|(index, spec)| Action::build(index, spec, collaborators, scheduler, polling))
            .collect::<Result<Vec<_>, _>>()?;

        let component = Arc::new(Self {
            id: definition.id,
            name: definition.name.clone(),
            automations: Arc::clone(collaborators.automations()),
            run_lock: tokio::sync::Mutex::new(()),
            live: Mutex::new(None),
        });

        let weak = Arc::downgrade(&component);
        trigger.start(move || {
            let weak = weak.clone();
            async move {
                if let Some(component) = weak.upgrade() {
                    component.on_trigger().await;
                }
            }
        });
        *component.lock_live() = Some(Live {
            trigger,
            actions: actions.into(),
        });

        tracing::info!(
            automation_id = %component.id,
            name = %component.name,
            "automation component registered"
        );
        Ok(component)
    }

    #[must_use]
    pub fn id(&self) -> AutomationId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.lock_live().is_some()
    }

    /// Next time the trigger goes off after `after`, or `None` once
    /// deregistered.
    #[must_use]
    pub fn next_fire_after(&self, after: &Timestamp) -> Option<Timestamp> {
        self.lock_live()
            .as_ref()
            .and_then(|live| live.trigger.next_fire_after(after))
    }

    /// Execute every action in order and record the outcome.
    ///
    /// A failing action does not stop the ones after it. Waits for a run
    /// already in progress to finish first.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Deregistered`] once the component has been
    /// deregistered. Action failures are reported in the [`RunReport`].
    pub async fn run(&self) -> Result<RunReport, AutomationError> {
        let _guard = self.run_lock.lock().await;
        self.run_exclusive().await
    }

    /// Stop the trigger and release the actions. Idempotent.
    pub fn deregister(&self) {
        let Some(mut live) = self.lock_live().take() else {
            return;
        };
        live.trigger.stop();
        tracing::info!(
            automation_id = %self.id,
            name = %self.name,
            "automation component deregistered"
        );
    }

    /// Scheduled entry point: skips the fire when a run is still going.
    async fn on_trigger(&self) {
        let Ok(_guard) = self.run_lock.try_lock() else {
            tracing::info!(
                automation_id = %self.id,
                "previous run still in progress, skipping scheduled fire"
            );
            return;
        };
        match self.run_exclusive().await {
            Ok(report) if report.is_success() => {
                tracing::info!(automation_id = %self.id, "scheduled run succeeded");
            }
            Ok(report) => {
                tracing::warn!(
                    automation_id = %self.id,
                    failed_actions = report.failures.len(),
                    "scheduled run failed"
                );
            }
            Err(err) => {
                tracing::debug!(automation_id = %self.id, error = %err, "scheduled run skipped");
            }
        }
    }

    #[tracing::instrument(skip(self), fields(automation_id = %self.id, name = %self.name))]
    async fn run_exclusive(&self) -> Result<RunReport, AutomationError> {
        let actions = self
            .actions()
            .ok_or(AutomationError::Deregistered(self.id))?;

        let mut failures = Vec::new();
        for (index, action) in actions.iter().enumerate() {
            tracing::debug!(index, kind = action.kind(), "executing action");
            if let Err(message) = action.execute().await {
                tracing::warn!(index, kind = action.kind(), %message, "action failed");
                failures.push(ActionFailure {
                    index,
                    kind: action.kind(),
                    message,
                });
            }
        }

        let status = if failures.is_empty() {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failed
        };
        let finished_at = time::now();
        if let Err(err) = self
            .automations
            .set_last_execution_status(self.id, status, finished_at)
            .await
        {
            tracing::error!(error = %err, %status, "failed to record execution status");
        }
        tracing::info!(%status, actions = actions.len(), "automation run finished");

        Ok(RunReport {
            automation_id: self.id,
            status,
            failures,
            finished_at,
        })
    }

    fn actions(&self) -> Option<Arc<[Action<P>]>> {
        self.lock_live()
            .as_ref()
            .map(|live| Arc::clone(&live.actions))
    }

    fn lock_live(&self) -> std::sync::MutexGuard<'_, Option<Live<P>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn job(&self) -> Option<crate::scheduler::JobId> {
        self.lock_live()
            .as_ref()
            .and_then(|live| live.trigger.job())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fleethub_domain::automation::{ActionSpec, AutomationChain, TriggerSpec};
    use fleethub_domain::container::ContainerOperation;
    use fleethub_domain::error::ValidationError;

    use super::*;
    use crate::testing::{FakePorts, Fixture};

    fn container_action(ids: &[&str]) -> ActionSpec {
        ActionSpec::Container {
            operation: ContainerOperation::Start,
            container_ids: ids.iter().map(ToString::to_string).collect(),
        }
    }

    fn definition(cron: &str, actions: Vec<ActionSpec>) -> Automation {
        let builder = Automation::builder()
            .name("Start web stack")
            .trigger(TriggerSpec::cron(cron));
        actions
            .into_iter()
            .fold(builder, |builder, action| builder.action(action))
            .build()
            .unwrap()
    }

    fn init(
        fixture: &Fixture,
        definition: &Automation,
    ) -> Result<Arc<AutomationComponent<FakePorts>>, FleetHubError> {
        AutomationComponent::init(
            definition,
            &fixture.collaborators(),
            &fixture.scheduler,
            PollingConfig::default(),
        )
    }

    #[tokio::test]
    async fn should_run_actions_in_order_and_record_success() {
        let fixture = Fixture::new().with_containers(&["c1", "c2", "c3"]);
        let definition = definition(
            "0 0 * * *",
            vec![container_action(&["c1", "c2"]), container_action(&["c3"])],
        );
        let component = init(&fixture, &definition).unwrap();

        let report = component.run().await.unwrap();

        assert!(report.is_success());
        assert_eq!(
            fixture.containers.started(),
            vec!["c1".to_string(), "c2".to_string(), "c3".to_string()]
        );
        assert_eq!(
            fixture.automations.status_writes(),
            vec![(definition.id, ExecutionStatus::Success)]
        );
    }

    #[tokio::test]
    async fn should_keep_running_after_failed_action_and_record_failure() {
        let fixture = Fixture::new().with_containers(&["c2"]);
        let definition = definition(
            "0 0 * * *",
            vec![container_action(&["missing"]), container_action(&["c2"])],
        );
        let component = init(&fixture, &definition).unwrap();

        let report = component.run().await.unwrap();

        assert_eq!(report.status, ExecutionStatus::Failed);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 0);
        assert_eq!(fixture.containers.started(), vec!["c2".to_string()]);
        assert_eq!(
            fixture.automations.status_writes(),
            vec![(definition.id, ExecutionStatus::Failed)]
        );
    }

    #[tokio::test]
    async fn should_refuse_to_run_after_deregistration() {
        let fixture = Fixture::new().with_containers(&["c1"]);
        let definition = definition("0 0 * * *", vec![container_action(&["c1"])]);
        let component = init(&fixture, &definition).unwrap();

        component.deregister();
        component.deregister();

        assert!(!component.is_registered());
        assert_eq!(
            component.run().await,
            Err(AutomationError::Deregistered(definition.id))
        );
        assert!(fixture.automations.status_writes().is_empty());
        assert_eq!(fixture.scheduler.active_jobs(), 0);
    }

    #[tokio::test]
    async fn should_stop_reporting_next_fire_once_deregistered() {
        let fixture = Fixture::new().with_containers(&["c1"]);
        let definition = definition("0 12 * * *", vec![container_action(&["c1"])]);
        let component = init(&fixture, &definition).unwrap();
        let now = time::now();

        let next = component.next_fire_after(&now).unwrap();
        assert!(next > now);
        assert!(next - now <= chrono::TimeDelta::days(1));

        component.deregister();
        assert!(component.next_fire_after(&now).is_none());
    }

    #[tokio::test]
    async fn should_fail_without_scheduling_when_collaborator_missing() {
        let fixture = Fixture::new();
        let definition = definition(
            "0 0 * * *",
            vec![ActionSpec::Volume {
                operation: fleethub_domain::container::VolumeOperation::Backup,
                volume_ids: vec![fleethub_domain::id::VolumeId::new()],
            }],
        );
        let collaborators = Collaborators::<FakePorts>::new(Arc::clone(&fixture.automations))
            .with_containers(Arc::clone(&fixture.containers));

        let result = AutomationComponent::<FakePorts>::init(
            &definition,
            &collaborators,
            &fixture.scheduler,
            PollingConfig::default(),
        );

        assert!(matches!(
            result,
            Err(FleetHubError::Automation(AutomationError::MissingCollaborator(_)))
        ));
        assert_eq!(fixture.scheduler.active_jobs(), 0);
    }

    #[tokio::test]
    async fn should_fail_without_scheduling_when_actions_missing() {
        let fixture = Fixture::new();
        let mut definition = definition("0 0 * * *", vec![container_action(&["c1"])]);
        definition.chain = Some(AutomationChain {
            trigger: Some(TriggerSpec::cron("0 0 * * *")),
            actions: None,
        });

        let result = init(&fixture, &definition);

        assert!(matches!(
            result,
            Err(FleetHubError::Validation(ValidationError::MissingActions))
        ));
        assert_eq!(fixture.scheduler.active_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_when_cron_trigger_fires() {
        let fixture = Fixture::new().with_containers(&["c1"]);
        let definition = definition("* * * * * *", vec![container_action(&["c1"])]);
        let component = init(&fixture, &definition).unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(!fixture.containers.started().is_empty());
        assert!(!fixture.automations.status_writes().is_empty());
        component.deregister();
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_scheduled_fire_while_run_in_progress() {
        let fixture = Fixture::new()
            .with_containers(&["c1"])
            .with_container_delay(Duration::from_secs(10));
        let definition = definition("* * * * * *", vec![container_action(&["c1"])]);
        let component = init(&fixture, &definition).unwrap();

        tokio::time::sleep(Duration::from_millis(5500)).await;

        // The first fire is still executing, later fires were dropped.
        assert_eq!(fixture.containers.lookups(), 1);
        component.deregister();
    }

    #[tokio::test(start_paused = true)]
    async fn should_wait_for_in_flight_run_when_run_manually() {
        let fixture = Fixture::new()
            .with_containers(&["c1"])
            .with_container_delay(Duration::from_secs(10));
        let definition = definition("0 0 1 1 *", vec![container_action(&["c1"])]);
        let component = init(&fixture, &definition).unwrap();

        let first = tokio::spawn({
            let component = Arc::clone(&component);
            async move { component.run().await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fixture.containers.lookups(), 1);

        let second = tokio::spawn({
            let component = Arc::clone(&component);
            async move { component.run().await }
        });
        tokio::time::sleep(Duration::from_secs(5)).await;

        // Blocked on the first run, nothing executed yet.
        assert_eq!(fixture.containers.lookups(), 1);
        assert!(fixture.containers.invoked().is_empty());
        assert!(fixture.automations.status_writes().is_empty());

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(fixture.containers.lookups(), 2);
        assert_eq!(fixture.containers.started(), vec!["c1".to_string()]);
        assert_eq!(
            fixture.automations.status_writes(),
            vec![(definition.id, ExecutionStatus::Success)]
        );

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert!(first.is_success());
        assert!(second.is_success());
        assert!(second.finished_at >= first.finished_at);
        assert_eq!(
            fixture.containers.started(),
            vec!["c1".to_string(), "c1".to_string()]
        );
        assert_eq!(
            fixture.automations.status_writes(),
            vec![
                (definition.id, ExecutionStatus::Success),
                (definition.id, ExecutionStatus::Success),
            ]
        );
        component.deregister();
    }
}
