// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Node notification policies
//!
//! A policy says who hears about a stage's success, warning or failure and
//! what happens automatically on failure. Policies are plain values: every
//! update takes the previous policy and returns the next one.

mod debounce;

pub use debounce::{FlushReport, PolicySaver, PolicySink, DEFAULT_DEBOUNCE};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::descriptor::StageNotifications;
use crate::graph::{NodeId, StageGraph};

/// Outcome branch of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Warning,
    Failure,
}

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Slack,
}

/// Automatic reaction to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureAction {
    Rollback,
    Retrigger,
    Notify,
}

/// Channel switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channels {
    pub email: bool,
    pub slack: bool,
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            email: true,
            slack: false,
        }
    }
}

impl Channels {
    pub fn get(&self, channel: Channel) -> bool {
        match channel {
            Channel::Email => self.email,
            Channel::Slack => self.slack,
        }
    }

    fn set(&mut self, channel: Channel, enabled: bool) {
        match channel {
            Channel::Email => self.email = enabled,
            Channel::Slack => self.slack = enabled,
        }
    }
}

impl From<StageNotifications> for Channels {
    fn from(n: StageNotifications) -> Self {
        Self {
            email: n.email,
            slack: n.slack,
        }
    }
}

impl From<Channels> for StageNotifications {
    fn from(c: Channels) -> Self {
        Self {
            email: c.email,
            slack: c.slack,
        }
    }
}

/// Failure actions switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureActions {
    pub rollback: bool,
    pub retrigger: bool,
    pub notify: bool,
}

impl Default for FailureActions {
    fn default() -> Self {
        Self {
            rollback: false,
            retrigger: true,
            notify: true,
        }
    }
}

impl FailureActions {
    pub fn get(&self, action: FailureAction) -> bool {
        match action {
            FailureAction::Rollback => self.rollback,
            FailureAction::Retrigger => self.retrigger,
            FailureAction::Notify => self.notify,
        }
    }

    fn set(&mut self, action: FailureAction, enabled: bool) {
        match action {
            FailureAction::Rollback => self.rollback = enabled,
            FailureAction::Retrigger => self.retrigger = enabled,
            FailureAction::Notify => self.notify = enabled,
        }
    }
}

/// Success or warning branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeNotification {
    pub message: String,
    pub enabled: bool,
    pub channels: Channels,
}

/// Failure branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureNotification {
    pub message: String,
    pub enabled: bool,
    pub channels: Channels,
    pub actions: FailureActions,
}

/// Per-node notification policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPolicy {
    pub success: OutcomeNotification,
    pub warning: OutcomeNotification,
    pub failure: FailureNotification,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self::with_channels(Channels::default())
    }
}

/// Mutable view of the fields every branch shares
struct BranchMut<'a> {
    message: &'a mut String,
    enabled: &'a mut bool,
    channels: &'a mut Channels,
}

impl NotificationPolicy {
    /// Default policy with every branch on the given channels
    pub fn with_channels(channels: Channels) -> Self {
        Self {
            success: OutcomeNotification {
                message: "Stage completed successfully".into(),
                enabled: true,
                channels,
            },
            warning: OutcomeNotification {
                message: "Stage completed with warnings".into(),
                enabled: true,
                channels,
            },
            failure: FailureNotification {
                message: "Stage failed".into(),
                enabled: true,
                channels,
                actions: FailureActions::default(),
            },
        }
    }

    fn branch_mut(&mut self, outcome: Outcome) -> BranchMut<'_> {
        match outcome {
            Outcome::Success => BranchMut {
                message: &mut self.success.message,
                enabled: &mut self.success.enabled,
                channels: &mut self.success.channels,
            },
            Outcome::Warning => BranchMut {
                message: &mut self.warning.message,
                enabled: &mut self.warning.enabled,
                channels: &mut self.warning.channels,
            },
            Outcome::Failure => BranchMut {
                message: &mut self.failure.message,
                enabled: &mut self.failure.enabled,
                channels: &mut self.failure.channels,
            },
        }
    }

    pub fn message(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Success => &self.success.message,
            Outcome::Warning => &self.warning.message,
            Outcome::Failure => &self.failure.message,
        }
    }

    pub fn is_enabled(&self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Success => self.success.enabled,
            Outcome::Warning => self.warning.enabled,
            Outcome::Failure => self.failure.enabled,
        }
    }

    pub fn channels(&self, outcome: Outcome) -> Channels {
        match outcome {
            Outcome::Success => self.success.channels,
            Outcome::Warning => self.warning.channels,
            Outcome::Failure => self.failure.channels,
        }
    }

    pub fn with_message(mut self, outcome: Outcome, message: impl Into<String>) -> Self {
        *self.branch_mut(outcome).message = message.into();
        self
    }

    pub fn with_enabled(mut self, outcome: Outcome, enabled: bool) -> Self {
        *self.branch_mut(outcome).enabled = enabled;
        self
    }

    pub fn with_channel(mut self, outcome: Outcome, channel: Channel, enabled: bool) -> Self {
        self.branch_mut(outcome).channels.set(channel, enabled);
        self
    }

    pub fn with_failure_action(mut self, action: FailureAction, enabled: bool) -> Self {
        self.failure.actions.set(action, enabled);
        self
    }

    /// Apply one update on top of this policy
    pub fn apply(self, update: PolicyUpdate) -> Self {
        match update {
            PolicyUpdate::Message { outcome, message } => self.with_message(outcome, message),
            PolicyUpdate::Enabled { outcome, enabled } => self.with_enabled(outcome, enabled),
            PolicyUpdate::Channel {
                outcome,
                channel,
                enabled,
            } => self.with_channel(outcome, channel, enabled),
            PolicyUpdate::FailureAction { action, enabled } => {
                self.with_failure_action(action, enabled)
            }
            PolicyUpdate::Replace(policy) => policy,
        }
    }
}

/// A single edit to a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyUpdate {
    Message { outcome: Outcome, message: String },
    Enabled { outcome: Outcome, enabled: bool },
    Channel { outcome: Outcome, channel: Channel, enabled: bool },
    FailureAction { action: FailureAction, enabled: bool },
    /// Full replacement
    Replace(NotificationPolicy),
}

/// Pipeline-wide `node id -> policy` map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationPolicies(BTreeMap<NodeId, NotificationPolicy>);

impl NotificationPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the policies carried by a graph's nodes
    pub fn from_graph(graph: &StageGraph) -> Self {
        Self(
            graph
                .nodes()
                .iter()
                .filter_map(|n| n.notification_policy.clone().map(|p| (n.id.clone(), p)))
                .collect(),
        )
    }

    /// Copy policies onto the matching graph nodes
    pub fn apply_to(&self, graph: &mut StageGraph) {
        for (id, policy) in &self.0 {
            if let Some(node) = graph.node_mut(id) {
                node.notification_policy = Some(policy.clone());
            }
        }
    }

    pub fn get(&self, id: &NodeId) -> Option<&NotificationPolicy> {
        self.0.get(id)
    }

    /// Stored policy for a node, or the default one
    pub fn policy_for(&self, id: &NodeId) -> NotificationPolicy {
        self.0.get(id).cloned().unwrap_or_default()
    }

    /// Replace a node's policy
    pub fn set(&mut self, id: NodeId, policy: NotificationPolicy) {
        self.0.insert(id, policy);
    }

    /// Apply an update on top of the node's current (or default) policy
    pub fn update(&mut self, id: &NodeId, update: PolicyUpdate) -> &NotificationPolicy {
        let next = self.policy_for(id).apply(update);
        self.0.insert(id.clone(), next);
        &self.0[id]
    }

    pub fn remove(&mut self, id: &NodeId) -> Option<NotificationPolicy> {
        self.0.remove(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NotificationPolicy)> {
        self.0.iter()
    }
}
