//! Test doubles and common utilities for contract tests
//!
//! [`FakeDnsApi`] keeps zones in memory and answers with the same JSON
//! envelopes the real provider uses, so the core's decoding runs unchanged.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zonesync_core::error::Error;
use zonesync_core::record::RecordType;
use zonesync_core::traits::DnsApiClient;
use zonesync_core::{CachedClient, ResourceManager, StrategyRegistry, ZoneCache};

/// A record as stored by the fake provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub subname: String,
    pub rectype: String,
    pub content: String,
    pub prio: Option<u16>,
    pub weight: Option<u16>,
    pub port: Option<u16>,
    pub flag: Option<u8>,
    pub tag: Option<String>,
}

impl StoredRecord {
    pub fn simple(subname: &str, rectype: &str, content: &str) -> Self {
        Self {
            subname: subname.to_string(),
            rectype: rectype.to_string(),
            content: content.to_string(),
            prio: None,
            weight: None,
            port: None,
            flag: None,
            tag: None,
        }
    }

    pub fn with_prio(mut self, prio: u16) -> Self {
        self.prio = Some(prio);
        self
    }

    fn to_json(&self) -> Value {
        let mut rr = json!({
            "subname": self.subname,
            "rectype": self.rectype,
            "content": self.content,
            "state": "A",
        });
        if let Some(prio) = self.prio {
            rr["prio"] = json!(prio);
        }
        if let Some(weight) = self.weight {
            rr["weight"] = json!(weight);
        }
        if let Some(port) = self.port {
            rr["port"] = json!(port);
        }
        if let Some(flag) = self.flag {
            rr["flag"] = json!(flag);
        }
        if let Some(tag) = &self.tag {
            rr["tag"] = json!(tag);
        }
        rr
    }
}

/// In-memory provider that counts every call
#[derive(Clone)]
pub struct FakeDnsApi {
    zones: Arc<Mutex<HashMap<String, Vec<StoredRecord>>>>,
    writes: Arc<Mutex<Vec<String>>>,
    get_calls: Arc<AtomicUsize>,
    add_calls: Arc<AtomicUsize>,
    remove_calls: Arc<AtomicUsize>,
    fail_get_records: Arc<AtomicBool>,
    /// Writes allowed to succeed before every further write fails
    write_budget: Arc<AtomicUsize>,
    fetch_delay: Arc<Mutex<Duration>>,
}

impl FakeDnsApi {
    pub fn new() -> Self {
        Self {
            zones: Arc::new(Mutex::new(HashMap::new())),
            writes: Arc::new(Mutex::new(Vec::new())),
            get_calls: Arc::new(AtomicUsize::new(0)),
            add_calls: Arc::new(AtomicUsize::new(0)),
            remove_calls: Arc::new(AtomicUsize::new(0)),
            fail_get_records: Arc::new(AtomicBool::new(false)),
            write_budget: Arc::new(AtomicUsize::new(usize::MAX)),
            fetch_delay: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Seed a record directly, bypassing the call counters
    pub fn seed(&self, zone: &str, record: StoredRecord) {
        self.zones
            .lock()
            .unwrap()
            .entry(zone.to_string())
            .or_default()
            .push(record);
    }

    /// Records currently stored for a zone
    pub fn records(&self, zone: &str) -> Vec<StoredRecord> {
        self.zones.lock().unwrap().get(zone).cloned().unwrap_or_default()
    }

    /// Write log, one line per add/remove call in call order
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.add_calls() + self.remove_calls()
    }

    pub fn reset_counters(&self) {
        self.get_calls.store(0, Ordering::SeqCst);
        self.add_calls.store(0, Ordering::SeqCst);
        self.remove_calls.store(0, Ordering::SeqCst);
        self.writes.lock().unwrap().clear();
    }

    pub fn fail_get_records(&self, fail: bool) {
        self.fail_get_records.store(fail, Ordering::SeqCst);
    }

    /// Let `n` more writes succeed, then reject the rest
    pub fn fail_writes_after(&self, n: usize) {
        self.write_budget.store(n, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    fn take_write_budget(&self) -> bool {
        self.write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn success(zone: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "result": "success",
            "answer": { "domains": [ { "dname": zone, "result": "success" } ] }
        }))
        .unwrap()
    }

    fn domain_error(zone: &str, code: &str, text: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "result": "success",
            "answer": { "domains": [
                { "dname": zone, "result": "error", "error_code": code, "error_text": text }
            ] }
        }))
        .unwrap()
    }

    fn add(&self, zone: &str, record: StoredRecord) -> Vec<u8> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.writes.lock().unwrap().push(format!(
            "add {} {} {}",
            record.rectype, record.subname, record.content
        ));

        if !self.take_write_budget() {
            return Self::domain_error(zone, "INVALID_IP_ADDRESS", "rejected by test");
        }

        self.seed(zone, record);
        Self::success(zone)
    }

    fn remove<F>(&self, zone: &str, label: String, matches: F) -> Vec<u8>
    where
        F: Fn(&StoredRecord) -> bool,
    {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.writes.lock().unwrap().push(format!("remove {label}"));

        if !self.take_write_budget() {
            return Self::domain_error(zone, "ACCESS_DENIED_FROM_IP", "rejected by test");
        }

        let mut zones = self.zones.lock().unwrap();
        let records = zones.entry(zone.to_string()).or_default();
        match records.iter().position(|r| matches(r)) {
            Some(index) => {
                records.remove(index);
                Self::success(zone)
            }
            None => Self::domain_error(zone, "RR_NOT_FOUND", "Resource record not found"),
        }
    }
}

impl Default for FakeDnsApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsApiClient for FakeDnsApi {
    async fn add_record(
        &self,
        record_type: RecordType,
        zone: &str,
        subname: &str,
        value: &str,
        priority: Option<u16>,
    ) -> Result<Vec<u8>, Error> {
        let mut record = StoredRecord::simple(subname, record_type.as_str(), value);
        record.prio = priority.filter(|_| record_type.uses_priority());
        Ok(self.add(zone, record))
    }

    async fn remove_record(
        &self,
        zone: &str,
        subname: &str,
        record_type: RecordType,
        content: &str,
        priority: Option<u16>,
    ) -> Result<Vec<u8>, Error> {
        let label = format!("{record_type} {subname} {content}");
        Ok(self.remove(zone, label, |r| {
            r.subname == subname
                && r.rectype == record_type.as_str()
                && r.content == content
                && (priority.is_none() || r.prio == priority)
        }))
    }

    async fn add_srv_record(
        &self,
        zone: &str,
        subname: &str,
        target: &str,
        priority: u16,
        weight: u16,
        port: u16,
    ) -> Result<Vec<u8>, Error> {
        let mut record = StoredRecord::simple(subname, "SRV", target);
        record.prio = Some(priority);
        record.weight = Some(weight);
        record.port = Some(port);
        Ok(self.add(zone, record))
    }

    async fn remove_srv_record(
        &self,
        zone: &str,
        subname: &str,
        target: &str,
        priority: u16,
        weight: u16,
        port: u16,
    ) -> Result<Vec<u8>, Error> {
        let label = format!("SRV {subname} {priority} {weight} {port} {target}");
        Ok(self.remove(zone, label, |r| {
            r.subname == subname
                && r.rectype == "SRV"
                && r.content == target
                && r.prio == Some(priority)
                && r.weight == Some(weight)
                && r.port == Some(port)
        }))
    }

    async fn add_caa_record(
        &self,
        zone: &str,
        subname: &str,
        value: &str,
        flag: u8,
        tag: &str,
    ) -> Result<Vec<u8>, Error> {
        let mut record = StoredRecord::simple(subname, "CAA", value);
        record.flag = Some(flag);
        record.tag = Some(tag.to_string());
        Ok(self.add(zone, record))
    }

    async fn remove_caa_record(
        &self,
        zone: &str,
        subname: &str,
        value: &str,
        flag: u8,
        tag: &str,
    ) -> Result<Vec<u8>, Error> {
        let label = format!("CAA {subname} {flag} {tag} {value}");
        Ok(self.remove(zone, label, |r| {
            r.subname == subname
                && r.rectype == "CAA"
                && r.content == value
                && r.flag == Some(flag)
                && r.tag.as_deref() == Some(tag)
        }))
    }

    async fn get_records(&self, zone: &str) -> Result<Vec<u8>, Error> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_get_records.load(Ordering::SeqCst) {
            return Ok(serde_json::to_vec(&json!({
                "result": "error",
                "error_code": "IP_EXCEEDED_ALLOWED_CONNECTION_RATE",
                "error_text": "rate limited by test"
            }))
            .unwrap());
        }

        let rrs: Vec<Value> = self.records(zone).iter().map(StoredRecord::to_json).collect();
        Ok(serde_json::to_vec(&json!({
            "result": "success",
            "answer": { "domains": [ { "dname": zone, "result": "success", "rrs": rrs } ] }
        }))
        .unwrap())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Manager over a fake provider with a default-TTL cache
pub fn manager(api: &FakeDnsApi) -> ResourceManager {
    ResourceManager::new(Arc::new(api.clone()))
}

/// Cached client over a fake provider
pub fn cached_client(api: &FakeDnsApi, ttl: Duration) -> CachedClient {
    CachedClient::new(Arc::new(api.clone()), ZoneCache::with_ttl(ttl))
}

/// Manager sharing an explicit cached client
pub fn manager_with(client: CachedClient) -> ResourceManager {
    ResourceManager::with_parts(Arc::new(StrategyRegistry::with_defaults()), client)
}
