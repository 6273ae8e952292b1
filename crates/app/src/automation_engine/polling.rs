//! Completion detection for playbook executions.
//!
//! Each status check is a one-shot scheduler job that, when the execution
//! is still running, schedules the next check. The action awaiting the
//! outcome only holds the receiving end of a channel.

use std::sync::Arc;
use std::time::Duration;

use fleethub_domain::playbook::ExecutionId;
use tokio::sync::oneshot;

use super::PollingConfig;
use super::action::ActionOutcome;
use crate::ports::TaskStatusRepository;
use crate::scheduler::Scheduler;

pub(crate) struct StatusPoll<T> {
    statuses: Arc<T>,
    scheduler: Scheduler,
    config: PollingConfig,
}

impl<T> StatusPoll<T>
where
    T: TaskStatusRepository + Send + Sync + 'static,
{
    pub(crate) fn new(statuses: Arc<T>, scheduler: Scheduler, config: PollingConfig) -> Self {
        Self {
            statuses,
            scheduler,
            config,
        }
    }

    /// Poll until the execution reaches a terminal status or the attempt
    /// cap is hit. The first check happens immediately.
    pub(crate) async fn wait_for_completion(&self, execution_id: ExecutionId) -> ActionOutcome {
        let (done, outcome) = oneshot::channel();
        let check = Check {
            statuses: Arc::clone(&self.statuses),
            scheduler: self.scheduler.clone(),
            config: self.config,
            execution_id,
            attempt: 1,
            done,
        };
        check.schedule(Duration::ZERO);
        outcome
            .await
            .unwrap_or_else(|_| Err("status polling was cancelled".to_string()))
    }
}

/// One pending status check, carrying everything the next one needs.
struct Check<T> {
    statuses: Arc<T>,
    scheduler: Scheduler,
    config: PollingConfig,
    execution_id: ExecutionId,
    attempt: u32,
    done: oneshot::Sender<ActionOutcome>,
}

impl<T> Check<T>
where
    T: TaskStatusRepository + Send + Sync + 'static,
{
    fn schedule(self, delay: Duration) {
        let scheduler = self.scheduler.clone();
        scheduler.schedule_once_after(delay, move || self.run());
    }

    async fn run(mut self) {
        let latest = self
            .statuses
            .find_latest_by_execution_id(&self.execution_id)
            .await;
        let outcome = match latest {
            Err(err) => Err(format!(
                "failed to read status of execution {}: {err}",
                self.execution_id
            )),
            Ok(Some(record)) if record.status.is_terminal() => {
                tracing::debug!(
                    execution_id = %self.execution_id,
                    status = %record.status,
                    attempt = self.attempt,
                    "playbook execution finished"
                );
                if record.status.is_success() {
                    Ok(())
                } else {
                    Err(format!(
                        "playbook execution {} finished with status {}",
                        self.execution_id, record.status
                    ))
                }
            }
            Ok(_) if self.attempt >= self.config.max_attempts => {
                tracing::warn!(
                    execution_id = %self.execution_id,
                    attempts = self.attempt,
                    "playbook execution timed out"
                );
                Err(format!(
                    "execution timed out after {} status checks",
                    self.attempt
                ))
            }
            Ok(_) => {
                self.attempt += 1;
                let interval = self.config.interval;
                self.schedule(interval);
                return;
            }
        };
        // The receiver is gone when the run was cancelled; nothing left to do.
        let _ = self.done.send(outcome);
    }
}
