// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Per-controller registry of declared actions.

use std::collections::HashMap;
use std::sync::Arc;

use super::builder::ActionBuilder;
use super::config::ActionConfiguration;

/// Action name → configuration.
///
/// Filled once when a controller is set up, read on every request.
/// Subclass-style reuse goes through [`ActionRegistry::inherit`].
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<ActionConfiguration>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an action, replacing any previous declaration of the same name.
    pub fn define(&mut self, name: &str, f: impl FnOnce(&mut ActionBuilder)) -> &mut Self {
        let mut builder = ActionBuilder::new(name);
        f(&mut builder);
        self.insert(builder.build());
        self
    }

    /// Refines an existing (for example inherited) action in place. Defines
    /// it from scratch when absent.
    pub fn refine(&mut self, name: &str, f: impl FnOnce(&mut ActionBuilder)) -> &mut Self {
        let base = self
            .actions
            .get(name)
            .map(|c| c.as_ref().clone())
            .unwrap_or_else(|| ActionConfiguration::new(name));
        let mut builder = ActionBuilder::from_configuration(base);
        f(&mut builder);
        self.insert(builder.build());
        self
    }

    /// Stores a built configuration under its name.
    pub fn insert(&mut self, config: ActionConfiguration) {
        tracing::debug!(action = %config.name, "registering action");
        self.actions.insert(config.name.clone(), Arc::new(config));
    }

    /// Looks up an action.
    pub fn get(&self, name: &str) -> Option<Arc<ActionConfiguration>> {
        self.actions.get(name).cloned()
    }

    /// True when an action is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Declared action names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of declared actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// A registry holding the parent's actions overridden by this one's.
    pub fn inherit(&self, parent: &ActionRegistry) -> Self {
        let mut actions = parent.actions.clone();
        actions.extend(self.actions.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { actions }
    }

    /// A deep copy of one action's configuration with `f` applied. The
    /// registered configuration is left untouched.
    pub fn with_modified(&self, name: &str, f: impl FnOnce(&mut ActionConfiguration)) -> Option<ActionConfiguration> {
        let mut copy = self.actions.get(name)?.as_ref().clone();
        f(&mut copy);
        Some(copy)
    }
}
