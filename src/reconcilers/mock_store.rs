// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`ResourceStore`] for unit tests.
//!
//! Objects are kept as JSON keyed by kind and name. Every call is journaled, and
//! failures can be injected per verb and kind.

use super::store::{kind_of, resource_name, ResourceStore, StoredResource};
use crate::errors::StoreError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Timestamp stamped on objects created through the mock.
pub const CREATION_TIMESTAMP: &str = "2025-01-01T00:00:00Z";

/// Store operations as seen by the journal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Load,
    Create,
    Update,
    Delete,
    Patch,
}

/// One journaled store call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub verb: Verb,
    pub kind: String,
    pub name: String,
}

impl Call {
    pub fn new(verb: Verb, kind: &str, name: &str) -> Self {
        Self {
            verb,
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Default)]
pub struct MockStore {
    objects: Mutex<BTreeMap<(String, String), Value>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<(Verb, String)>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object as if it had been created earlier.
    pub fn insert<K: StoredResource>(&self, resource: &K) {
        let name = resource_name(resource).unwrap();
        let mut value = serde_json::to_value(resource).unwrap();
        value["metadata"]["creationTimestamp"] = json!(CREATION_TIMESTAMP);
        self.objects
            .lock()
            .unwrap()
            .insert((kind_of::<K>(), name), value);
    }

    pub fn get<K: StoredResource>(&self, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&(kind_of::<K>(), name.to_string()))
            .map(|value| serde_json::from_value(value.clone()).unwrap())
    }

    pub fn contains<K: StoredResource>(&self, name: &str) -> bool {
        self.get::<K>(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Make every `verb` on objects of `kind` fail.
    pub fn fail_on(&self, verb: Verb, kind: &str) {
        self.failures.lock().unwrap().push((verb, kind.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Journaled calls that write, in order.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.verb != Verb::Load)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, verb: Verb, kind: &str, name: &str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(Call::new(verb, kind, name));
        let injected = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .any(|(failing_verb, failing_kind)| *failing_verb == verb && failing_kind == kind);
        if injected {
            return Err(StoreError::Api {
                verb: "inject",
                kind: kind.to_string(),
                name: name.to_string(),
                source: anyhow::anyhow!("injected {verb:?} failure"),
            });
        }
        Ok(())
    }

    fn not_found(kind: &str, name: &str) -> StoreError {
        StoreError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    fn put<K: StoredResource>(&self, resource: &K, name: &str) -> Result<(), StoreError> {
        let mut value = serde_json::to_value(resource)?;
        if value["metadata"].get("creationTimestamp").is_none() {
            value["metadata"]["creationTimestamp"] = json!(CREATION_TIMESTAMP);
        }
        self.objects
            .lock()
            .unwrap()
            .insert((kind_of::<K>(), name.to_string()), value);
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for MockStore {
    async fn load<K: StoredResource>(&self, name: &str) -> Result<K, StoreError> {
        let kind = kind_of::<K>();
        self.record(Verb::Load, &kind, name)?;
        self.get::<K>(name)
            .ok_or_else(|| Self::not_found(&kind, name))
    }

    async fn create<K: StoredResource>(
        &self,
        resource: &K,
        _set_controller_owner: bool,
    ) -> Result<(), StoreError> {
        let kind = kind_of::<K>();
        let name = resource_name(resource)?;
        self.record(Verb::Create, &kind, &name)?;
        if self.contains::<K>(&name) {
            return Err(StoreError::AlreadyExists { kind, name });
        }
        self.put(resource, &name)
    }

    async fn update<K: StoredResource>(&self, resource: &K) -> Result<(), StoreError> {
        let kind = kind_of::<K>();
        let name = resource_name(resource)?;
        self.record(Verb::Update, &kind, &name)?;
        if !self.contains::<K>(&name) {
            return Err(Self::not_found(&kind, &name));
        }
        self.put(resource, &name)
    }

    async fn delete<K: StoredResource>(&self, name: &str) -> Result<(), StoreError> {
        let kind = kind_of::<K>();
        self.record(Verb::Delete, &kind, name)?;
        self.objects
            .lock()
            .unwrap()
            .remove(&(kind.clone(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(&kind, name))
    }

    async fn create_or_patch<K, F>(
        &self,
        seed: K,
        _set_controller_owner: bool,
        mutate: F,
    ) -> Result<(), StoreError>
    where
        K: StoredResource,
        F: Fn(&mut K) -> Result<(), StoreError> + Send + Sync,
    {
        let kind = kind_of::<K>();
        let name = resource_name(&seed)?;
        self.record(Verb::Patch, &kind, &name)?;

        let existing = self.get::<K>(&name);
        let exists = existing.is_some();
        let mut desired = existing.unwrap_or(seed);
        mutate(&mut desired)?;

        if !exists {
            self.calls
                .lock()
                .unwrap()
                .push(Call::new(Verb::Create, &kind, &name));
        }
        self.put(&desired, &name)
    }
}

/// [`OperatorImageSource`](crate::reconcilers::config_listener::image::OperatorImageSource)
/// returning a fixed image, or failing when built with [`MockImageSource::failing`].
pub struct MockImageSource {
    image: Option<String>,
    lookups: Mutex<u32>,
}

impl MockImageSource {
    pub fn new(image: &str) -> Self {
        Self {
            image: Some(image.to_string()),
            lookups: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            image: None,
            lookups: Mutex::new(0),
        }
    }

    pub fn lookups(&self) -> u32 {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl crate::reconcilers::config_listener::image::OperatorImageSource for MockImageSource {
    async fn operator_image(&self) -> anyhow::Result<String> {
        *self.lookups.lock().unwrap() += 1;
        self.image
            .clone()
            .ok_or_else(|| anyhow::anyhow!("operator pod not found"))
    }
}
