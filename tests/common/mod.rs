//! Shared test utilities for integration tests
//!
//! `MemoryChain` is a small token ledger behind the `ContractReader` trait:
//! - `balanceOf({owner})` → `Uint`
//! - `symbol()` → `String`
//! - `revert()` always fails
//! - key `Transfer` → `{to, value}` events

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Once};

use parking_lot::RwLock;

pub use chainread::*;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness, once per binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

#[derive(Default)]
pub struct MemoryChain {
    bound: RwLock<BTreeSet<BoundContract>>,
    balances: RwLock<BTreeMap<(BoundContract, String), u64>>,
    transfers: RwLock<BTreeMap<BoundContract, Vec<(String, u64)>>>,
}

impl MemoryChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn credit(&self, contract: &BoundContract, owner: &str, amount: u64) {
        *self
            .balances
            .write()
            .entry((contract.clone(), owner.to_string()))
            .or_default() += amount;
    }

    pub fn transfer(&self, contract: &BoundContract, to: &str, value: u64) {
        self.transfers
            .write()
            .entry(contract.clone())
            .or_default()
            .push((to.to_string(), value));
        self.credit(contract, to, value);
    }

    fn require_bound(&self, contract: &BoundContract) -> Result<()> {
        if self.bound.read().contains(contract) {
            Ok(())
        } else {
            Err(Error::not_found(format!("{} is not bound", contract)))
        }
    }

    fn call(&self, read_identifier: &str, params: &Value) -> Result<Value> {
        let id = ReadIdentifier::parse(read_identifier)?;
        self.require_bound(&id.contract)?;
        match id.method.as_str() {
            "balanceOf" => {
                let owner = params
                    .get("owner")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::invalid_argument("balanceOf needs an owner"))?;
                let balance = self
                    .balances
                    .read()
                    .get(&(id.contract.clone(), owner.to_string()))
                    .copied()
                    .unwrap_or(0);
                Ok(Value::Uint(balance))
            }
            "symbol" => Ok(Value::String(id.contract.name.to_uppercase())),
            "revert" => Err(Error::invalid_argument("execution reverted")),
            other => Err(Error::not_found(format!("no method {}", other))),
        }
    }
}

impl Service for MemoryChain {
    fn name(&self) -> String {
        "MemoryChain".into()
    }
    fn start(&self, _ctx: &Context) -> Result<()> {
        Ok(())
    }
    fn close(&self) -> Result<()> {
        Ok(())
    }
    fn ready(&self) -> Result<()> {
        Ok(())
    }
}

impl TypeProvider for MemoryChain {
    fn create_contract_type(
        &self,
        read_identifier: &str,
        for_encoding: bool,
    ) -> Result<TypeDescriptor> {
        let id = ReadIdentifier::parse(read_identifier)?;
        Ok(match (id.method.as_str(), for_encoding) {
            ("balanceOf", true) => TypeDescriptor::structure([("owner", TypeDescriptor::String)]),
            ("balanceOf", false) => TypeDescriptor::Uint,
            ("symbol", false) => TypeDescriptor::String,
            ("Transfer", false) => TypeDescriptor::structure([
                ("to", TypeDescriptor::String),
                ("value", TypeDescriptor::Uint),
            ]),
            _ => TypeDescriptor::Any,
        })
    }
}

impl ContractReader for MemoryChain {
    fn bind(&self, _ctx: &Context, bindings: &[BoundContract]) -> Result<()> {
        self.bound.write().extend(bindings.iter().cloned());
        Ok(())
    }

    fn unbind(&self, _ctx: &Context, bindings: &[BoundContract]) -> Result<()> {
        let mut bound = self.bound.write();
        for b in bindings {
            bound.remove(b);
        }
        Ok(())
    }

    fn get_latest_value(
        &self,
        ctx: &Context,
        read_identifier: &str,
        _confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<Value> {
        ctx.check()?;
        self.call(read_identifier, params)
    }

    fn get_latest_value_with_head_data(
        &self,
        ctx: &Context,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<(Value, Option<Head>)> {
        let value = self.get_latest_value(ctx, read_identifier, confidence, params)?;
        Ok((
            value,
            Some(Head {
                height: "100".into(),
                hash: vec![0xab; 4],
                timestamp: 1_700_000_100,
            }),
        ))
    }

    fn batch_get_latest_values(
        &self,
        _ctx: &Context,
        request: &BatchGetLatestValuesRequest,
    ) -> Result<BatchGetLatestValuesResult> {
        Ok(request
            .iter()
            .map(|(contract, reads)| {
                let results = reads
                    .iter()
                    .map(|read| BatchReadResult {
                        read_name: read.read_name.clone(),
                        result: self.call(&contract.read_identifier(&read.read_name), &read.params),
                    })
                    .collect();
                (contract.clone(), results)
            })
            .collect())
    }

    fn query_key(
        &self,
        _ctx: &Context,
        contract: &BoundContract,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
        _sequence_type: &TypeDescriptor,
    ) -> Result<Vec<Sequence<Value>>> {
        self.require_bound(contract)?;
        if filter.key != "Transfer" {
            return Ok(Vec::new());
        }
        let transfers = self
            .transfers
            .read()
            .get(contract)
            .cloned()
            .unwrap_or_default();
        let mut sequences: Vec<Sequence<Value>> = transfers
            .into_iter()
            .enumerate()
            .map(|(i, (to, value))| Sequence {
                cursor: format!("{}", i),
                head: Head {
                    height: (i as u64 + 1).to_string(),
                    hash: vec![i as u8],
                    timestamp: 1_700_000_000 + i as u64,
                },
                data: [("to", Value::String(to)), ("value", Value::Uint(value))]
                    .into_iter()
                    .collect(),
            })
            .collect();
        if limit_and_sort.sort_by.first() == Some(&SortBy::Sequence(SortDirection::Desc)) {
            sequences.reverse();
        }
        let count = limit_and_sort.count();
        if count > 0 {
            sequences.truncate(count as usize);
        }
        Ok(sequences)
    }

    fn query_keys(
        &self,
        ctx: &Context,
        filters: &[ContractKeyFilter],
        limit_and_sort: &LimitAndSort,
    ) -> Result<Vec<KeyedSequence>> {
        let mut out = Vec::new();
        for f in filters {
            let sequences =
                self.query_key(ctx, &f.contract, &f.filter, limit_and_sort, &f.sequence_type)?;
            out.extend(sequences.into_iter().map(|sequence| KeyedSequence {
                key: f.filter.key.clone(),
                sequence,
            }));
        }
        Ok(out)
    }

    fn type_provider(&self) -> Option<&dyn TypeProvider> {
        Some(self)
    }
}

/// Client and chain connected through an in-process server
pub struct TestStack {
    pub chain: Arc<MemoryChain>,
    pub client: Arc<ContractReaderClient>,
}

impl TestStack {
    pub fn new(encoding: EncodingVersion) -> Self {
        init_tracing();
        let chain = MemoryChain::new();
        let reader: Arc<dyn ContractReader> = chain.clone();
        let server = Arc::new(ContractReaderServer::new(Some(reader), encoding));
        let client = ContractReaderClient::new(Arc::new(LoopbackTransport::new(server)))
            .with_encoding(encoding);
        Self {
            chain,
            client: Arc::new(client),
        }
    }

    pub fn registry(&self) -> BindingRegistry {
        let reader: Arc<dyn ContractReader> = self.client.clone();
        BindingRegistry::new(reader)
    }
}

pub fn usdc() -> BoundContract {
    BoundContract::new("0x0001", "usdc")
}

pub fn weth() -> BoundContract {
    BoundContract::new("0x0002", "weth")
}

pub fn owner(name: &str) -> Value {
    [("owner", name)].into_iter().collect()
}
