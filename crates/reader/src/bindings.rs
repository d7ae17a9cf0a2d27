//! Custom-ID façade over a contract reader
//!
//! Callers address contracts by their own opaque identifiers. The registry
//! maps each identifier to a chain binding and qualifies reads with the
//! binding's read identifier before delegating.
//!
//! Entries are stored one at a time, not as a batch: a read racing a bind
//! may observe any prefix of the entries that bind stores.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use chainread_core::{
    from_value, BatchGetLatestValuesRequest, BatchRead, BatchReadResult, BoundContract,
    ConfidenceLevel, ContractReader, Context, Error, KeyFilter, LimitAndSort, Result, Sequence,
    TypeDescriptor, Value,
};

/// Custom ID → reads, for [`BindingRegistry::batch_get_latest_values_by_custom_id`]
pub type CustomIdBatchRequest = BTreeMap<String, Vec<BatchRead>>;

/// Custom ID → results, in request order
pub type CustomIdBatchResult = BTreeMap<String, Vec<BatchReadResult>>;

/// Concurrency-safe customID → binding map in front of a reader
pub struct BindingRegistry {
    reader: Arc<dyn ContractReader>,
    bindings: DashMap<String, BoundContract>,
}

impl BindingRegistry {
    /// Registry delegating to `reader`
    pub fn new(reader: Arc<dyn ContractReader>) -> Self {
        Self {
            reader,
            bindings: DashMap::new(),
        }
    }

    /// The wrapped reader
    pub fn reader(&self) -> &Arc<dyn ContractReader> {
        &self.reader
    }

    /// Store each mapping, then bind the underlying contracts in one call.
    ///
    /// Rebinding a custom ID replaces its binding.
    pub fn bind(&self, ctx: &Context, bindings: &BTreeMap<String, BoundContract>) -> Result<()> {
        for (custom_id, binding) in bindings {
            self.bindings.insert(custom_id.clone(), binding.clone());
        }
        let contracts: Vec<BoundContract> = bindings.values().cloned().collect();
        self.reader.bind(ctx, &contracts)?;
        info!(target: "chainread::bindings", count = contracts.len(), "bound custom ids");
        Ok(())
    }

    /// Remove the mappings, then unbind the contracts that were removed.
    pub fn unbind(&self, ctx: &Context, bindings: &BTreeMap<String, BoundContract>) -> Result<()> {
        let removed: Vec<BoundContract> = bindings
            .keys()
            .filter_map(|custom_id| self.bindings.remove(custom_id).map(|(_, b)| b))
            .collect();
        if removed.is_empty() {
            debug!(target: "chainread::bindings", "nothing to unbind");
            return Ok(());
        }
        self.reader.unbind(ctx, &removed)?;
        info!(target: "chainread::bindings", count = removed.len(), "unbound custom ids");
        Ok(())
    }

    /// Binding for `custom_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` naming the ID if it is unbound or its binding is incomplete.
    pub fn lookup(&self, custom_id: &str) -> Result<BoundContract> {
        match self.bindings.get(custom_id) {
            Some(entry) if entry.is_complete() => Ok(entry.value().clone()),
            _ => Err(Error::not_found(format!(
                "no binding for custom id '{}'",
                custom_id
            ))),
        }
    }

    /// Number of bound custom IDs
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Latest value of `method` on the contract bound to `custom_id`.
    pub fn get_latest_value(
        &self,
        ctx: &Context,
        custom_id: &str,
        method: &str,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<Value> {
        let binding = self.lookup(custom_id)?;
        self.reader
            .get_latest_value(ctx, &binding.read_identifier(method), confidence, params)
    }

    /// [`get_latest_value`](Self::get_latest_value) decoded into `T`
    pub fn get_latest_value_as<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        custom_id: &str,
        method: &str,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<T> {
        from_value(self.get_latest_value(ctx, custom_id, method, confidence, params)?)
    }

    /// Sequences of one key on the contract bound to `custom_id`.
    pub fn query_key(
        &self,
        ctx: &Context,
        custom_id: &str,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
        sequence_type: &TypeDescriptor,
    ) -> Result<Vec<Sequence<Value>>> {
        let binding = self.lookup(custom_id)?;
        self.reader
            .query_key(ctx, &binding, filter, limit_and_sort, sequence_type)
    }

    /// Run a custom-ID keyed batch.
    ///
    /// Results are correlated back through each binding's canonical string
    /// form. Two custom IDs resolving to the same binding in one batch are
    /// rejected.
    pub fn batch_get_latest_values_by_custom_id(
        &self,
        ctx: &Context,
        request: &CustomIdBatchRequest,
    ) -> Result<CustomIdBatchResult> {
        let mut chain_request = BatchGetLatestValuesRequest::new();
        let mut correlation: BTreeMap<String, String> = BTreeMap::new();
        for (custom_id, reads) in request {
            let binding = self.lookup(custom_id)?;
            if let Some(other) = correlation.insert(binding.to_string(), custom_id.clone()) {
                return Err(Error::invalid_argument(format!(
                    "custom ids '{}' and '{}' resolve to the same binding {}",
                    other, custom_id, binding
                )));
            }
            chain_request.insert(binding, reads.clone());
        }

        let chain_result = self.reader.batch_get_latest_values(ctx, &chain_request)?;

        let mut result = CustomIdBatchResult::new();
        for (binding, items) in chain_result {
            let custom_id = correlation.remove(&binding.to_string()).ok_or_else(|| {
                Error::internal(format!("batch result for unrequested binding {}", binding))
            })?;
            result.insert(custom_id, items);
        }
        if let Some(missing) = correlation.values().next() {
            return Err(Error::internal(format!(
                "batch result is missing custom id '{}'",
                missing
            )));
        }
        Ok(result)
    }
}
