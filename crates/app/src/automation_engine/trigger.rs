//! Live triggers built from [`TriggerSpec`]s.

use std::future::Future;

use fleethub_domain::automation::{CronExpression, TriggerSpec};
use fleethub_domain::error::ValidationError;
use fleethub_domain::time::Timestamp;

use crate::scheduler::{JobId, Scheduler};

pub(crate) enum Trigger {
    Cron(CronTrigger),
}

impl Trigger {
    /// Parse the spec. Nothing is scheduled until [`Trigger::start`].
    pub(crate) fn build(
        spec: &TriggerSpec,
        scheduler: &Scheduler,
    ) -> Result<Self, ValidationError> {
        match spec {
            TriggerSpec::Cron { expression } => Ok(Self::Cron(CronTrigger {
                expression: CronExpression::parse(expression)?,
                scheduler: scheduler.clone(),
                job: None,
            })),
            TriggerSpec::Unsupported => Err(ValidationError::UnsupportedTrigger),
        }
    }

    /// Begin invoking `fire` whenever the trigger goes off.
    pub(crate) fn start<F, Fut>(&mut self, fire: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        match self {
            Self::Cron(cron) => cron.start(fire),
        }
    }

    /// Release scheduling resources. Idempotent.
    pub(crate) fn stop(&mut self) {
        match self {
            Self::Cron(cron) => cron.stop(),
        }
    }

    /// First instant strictly after `after` at which the trigger goes off.
    pub(crate) fn next_fire_after(&self, after: &Timestamp) -> Option<Timestamp> {
        match self {
            Self::Cron(cron) => cron.expression.next_after(after),
        }
    }

    #[cfg(test)]
    pub(crate) fn job(&self) -> Option<JobId> {
        match self {
            Self::Cron(cron) => cron.job,
        }
    }
}

pub(crate) struct CronTrigger {
    expression: CronExpression,
    scheduler: Scheduler,
    job: Option<JobId>,
}

impl CronTrigger {
    fn start<F, Fut>(&mut self, fire: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();
        let job = self
            .scheduler
            .schedule_recurring(self.expression.clone(), fire);
        tracing::debug!(%job, expression = %self.expression, "cron trigger started");
        self.job = Some(job);
    }

    fn stop(&mut self) {
        if let Some(job) = self.job.take() {
            self.scheduler.cancel(job);
            tracing::debug!(%job, expression = %self.expression, "cron trigger stopped");
        }
    }
}

impl Drop for CronTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}
