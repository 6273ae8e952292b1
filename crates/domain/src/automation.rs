//! Automation: a trigger followed by an ordered chain of actions.
//!
//! An [`Automation`] is the persisted definition. Its [`AutomationChain`]
//! names a [`TriggerSpec`] deciding when the automation runs and a list of
//! [`ActionSpec`]s executed in order on every run. Definitions written by
//! other clients can be incomplete, so both parts of the chain are optional
//! at the type level and checked by [`AutomationChain::validate`].

mod action;
mod execution;
mod trigger;

pub use action::ActionSpec;
pub use execution::ExecutionStatus;
pub use trigger::{CronExpression, TriggerSpec};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::AutomationId;
use crate::time::Timestamp;

/// Minimum length of a trimmed automation name.
pub const MIN_NAME_LEN: usize = 3;
/// Maximum length of a trimmed automation name.
pub const MAX_NAME_LEN: usize = 50;

/// A stored automation definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Automation {
    pub id: AutomationId,
    pub name: String,
    pub enabled: bool,
    pub chain: Option<AutomationChain>,
    pub last_execution_time: Option<Timestamp>,
    pub last_execution_status: Option<ExecutionStatus>,
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    /// Check domain invariants on the name and the chain.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        self.chain()?.validate()
    }

    /// The chain, or [`ValidationError::MissingChain`] when absent.
    ///
    /// # Errors
    ///
    /// Fails when the definition carries no chain at all.
    pub fn chain(&self) -> Result<&AutomationChain, ValidationError> {
        self.chain.as_ref().ok_or(ValidationError::MissingChain)
    }
}

/// Check the length rules of an automation name.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyName`], [`ValidationError::NameTooShort`]
/// or [`ValidationError::NameTooLong`].
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::EmptyName);
    }
    if len < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort { min: MIN_NAME_LEN });
    }
    if len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong { max: MAX_NAME_LEN });
    }
    Ok(())
}

/// Trigger plus ordered actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationChain {
    #[serde(default)]
    pub trigger: Option<TriggerSpec>,
    #[serde(default)]
    pub actions: Option<Vec<ActionSpec>>,
}

impl AutomationChain {
    #[must_use]
    pub fn new(trigger: TriggerSpec, actions: Vec<ActionSpec>) -> Self {
        Self {
            trigger: Some(trigger),
            actions: Some(actions),
        }
    }

    /// Check that the chain is structurally complete.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking the trigger
    /// first and then each action in order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.trigger()?.validate()?;
        for (index, action) in self.actions()?.iter().enumerate() {
            action.validate(index)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::MissingTrigger`] when absent.
    pub fn trigger(&self) -> Result<&TriggerSpec, ValidationError> {
        self.trigger.as_ref().ok_or(ValidationError::MissingTrigger)
    }

    /// The actions, which must be present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingActions`] or
    /// [`ValidationError::NoActions`].
    pub fn actions(&self) -> Result<&[ActionSpec], ValidationError> {
        match self.actions.as_deref() {
            None => Err(ValidationError::MissingActions),
            Some([]) => Err(ValidationError::NoActions),
            Some(actions) => Ok(actions),
        }
    }
}

/// Step-by-step builder for [`Automation`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    id: Option<AutomationId>,
    name: Option<String>,
    enabled: Option<bool>,
    trigger: Option<TriggerSpec>,
    actions: Vec<ActionSpec>,
    last_execution_time: Option<Timestamp>,
    last_execution_status: Option<ExecutionStatus>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn id(mut self, id: AutomationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: TriggerSpec) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn last_execution(mut self, at: Timestamp, status: ExecutionStatus) -> Self {
        self.last_execution_time = Some(at);
        self.last_execution_status = Some(status);
        self
    }

    /// Consume the builder, validate, and return an [`Automation`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name or the chain is invalid.
    pub fn build(self) -> Result<Automation, ValidationError> {
        let automation = Automation {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default().trim().to_string(),
            enabled: self.enabled.unwrap_or(true),
            chain: Some(AutomationChain {
                trigger: self.trigger,
                actions: Some(self.actions),
            }),
            last_execution_time: self.last_execution_time,
            last_execution_status: self.last_execution_status,
        };
        automation.validate()?;
        Ok(automation)
    }
}
