//! Policy store access
//!
//! The engine never owns policies; it asks a [`PolicyStore`] for the
//! policies that apply to a session and evaluates that snapshot.
//! [`InMemoryPolicyStore`] keeps an immutable [`PolicySnapshot`] behind a
//! lock and swaps it wholesale on every change, so a reader always sees one
//! consistent version.

use crate::error::Result;
use crate::iam::{Policy, PolicyDocument};
use crate::request::Session;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error};

/// Source of policies for a decision pass
pub trait PolicyStore: Send + Sync {
    /// Policies applicable to a session, in evaluation order
    fn policies_for_session(&self, session: &Session) -> Vec<Arc<Policy>>;

    /// Policies with a statement naming the operation
    fn policies_for_operation(&self, operation_id: &str) -> Vec<Arc<Policy>>;
}

impl<S: PolicyStore + ?Sized> PolicyStore for Arc<S> {
    fn policies_for_session(&self, session: &Session) -> Vec<Arc<Policy>> {
        (**self).policies_for_session(session)
    }

    fn policies_for_operation(&self, operation_id: &str) -> Vec<Arc<Policy>> {
        (**self).policies_for_operation(operation_id)
    }
}

/// Immutable set of policies and their attachments
#[derive(Debug, Clone, Default)]
pub struct PolicySnapshot {
    /// All policies by uuid
    policies: HashMap<String, Arc<Policy>>,
    /// Insertion order of policy uuids
    order: Vec<String>,
    /// Policies applying to every session
    global: Vec<String>,
    /// Account id -> attached policy uuids
    accounts: HashMap<String, Vec<String>>,
    /// User id -> attached policy uuids
    users: HashMap<String, Vec<String>>,
}

impl PolicySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a policy (keeps its attachments)
    pub fn insert(&mut self, policy: Policy) {
        if !self.policies.contains_key(&policy.uuid) {
            self.order.push(policy.uuid.clone());
        }
        self.policies.insert(policy.uuid.clone(), Arc::new(policy));
    }

    pub fn attach_global(&mut self, policy_uuid: &str) {
        push_unique(&mut self.global, policy_uuid);
    }

    pub fn attach_to_account(&mut self, account_id: &str, policy_uuid: &str) {
        push_unique(self.accounts.entry(account_id.to_string()).or_default(), policy_uuid);
    }

    pub fn attach_to_user(&mut self, user_id: &str, policy_uuid: &str) {
        push_unique(self.users.entry(user_id.to_string()).or_default(), policy_uuid);
    }

    pub fn get(&self, policy_uuid: &str) -> Option<&Arc<Policy>> {
        self.policies.get(policy_uuid)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Global, then account, then (user sessions) user attachments; duplicates dropped
    pub fn for_session(&self, session: &Session) -> Vec<Arc<Policy>> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        let account = self.accounts.get(&session.account_id);
        let user = session
            .user_id
            .as_ref()
            .filter(|_| session.is_user_session())
            .and_then(|id| self.users.get(id));

        let attached = self
            .global
            .iter()
            .chain(account.into_iter().flatten())
            .chain(user.into_iter().flatten());

        for uuid in attached {
            if !seen.insert(uuid.as_str()) {
                continue;
            }
            if let Some(policy) = self.policies.get(uuid) {
                result.push(Arc::clone(policy));
            }
        }

        result
    }

    pub fn for_operation(&self, operation_id: &str) -> Vec<Arc<Policy>> {
        self.order
            .iter()
            .filter_map(|uuid| self.policies.get(uuid))
            .filter(|p| p.mentions_operation(operation_id))
            .cloned()
            .collect()
    }
}

fn push_unique(list: &mut Vec<String>, policy_uuid: &str) {
    if !list.iter().any(|u| u == policy_uuid) {
        list.push(policy_uuid.to_string());
    }
}

/// Thread-safe store serving snapshots
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    snapshot: RwLock<Arc<PolicySnapshot>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: PolicySnapshot) -> Self {
        InMemoryPolicyStore {
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot; stays valid even if the store changes afterwards
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.snapshot.read().clone()
    }

    /// Swap in a whole new snapshot
    pub fn replace(&self, snapshot: PolicySnapshot) {
        *self.snapshot.write() = Arc::new(snapshot);
    }

    /// Copy the current snapshot, apply `f`, and publish the result
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut PolicySnapshot),
    {
        let mut guard = self.snapshot.write();
        let mut next = PolicySnapshot::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }

    pub fn insert_policy(&self, policy: Policy) {
        self.update(|s| s.insert(policy));
    }

    pub fn attach_global(&self, policy_uuid: &str) {
        self.update(|s| s.attach_global(policy_uuid));
    }

    pub fn attach_to_account(&self, account_id: &str, policy_uuid: &str) {
        self.update(|s| s.attach_to_account(account_id, policy_uuid));
    }

    pub fn attach_to_user(&self, user_id: &str, policy_uuid: &str) {
        self.update(|s| s.attach_to_user(user_id, policy_uuid));
    }

    /// Load a JSON array of policies and attach them all globally
    ///
    /// Nothing is stored unless every policy parses and validates.
    pub fn load_json(&self, json: &str) -> Result<usize> {
        let documents: Vec<PolicyDocument> = serde_json::from_str(json)?;
        let policies = documents
            .into_iter()
            .map(|document| {
                let policy = document.into_policy()?;
                policy.validate()?;
                Ok(policy)
            })
            .collect::<Result<Vec<Policy>>>()
            .map_err(|e| {
                if e.is_fatal() {
                    error!("[RBAC] rejected policy document: {}", e);
                }
                e
            })?;

        let count = policies.len();
        self.update(|s| {
            for policy in policies {
                let uuid = policy.uuid.clone();
                s.insert(policy);
                s.attach_global(&uuid);
            }
        });

        debug!("Loaded {} policies into store", count);
        Ok(count)
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn policies_for_session(&self, session: &Session) -> Vec<Arc<Policy>> {
        self.snapshot().for_session(session)
    }

    fn policies_for_operation(&self, operation_id: &str) -> Vec<Arc<Policy>> {
        self.snapshot().for_operation(operation_id)
    }
}
