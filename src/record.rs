//! Record registry: named singletons with blocking lookup.
//!
//! Subsystems publish themselves under a well-known name with
//! [`Registry::create`]; other subsystems [`open`](Registry::open) the name
//! and block until it has been published, so start-up order does not matter.
//!
//! Each name moves through `pending` (opened, nothing published yet) and
//! `ready` (published). Holder counts are kept under the registry lock;
//! waiting for readiness happens on the record's own event flag after the
//! lock has been released.

use crate::config::KernelConfig;
use crate::error::{Error, Result};
use crate::furry_printf;
use crate::isr;
use crate::string::FurryString;
use crate::sync::{EventFlag, FlagWait};
use crate::time::Timeout;
use core::any::Any;
use core::time::Duration;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const RECORD_READY: u32 = 1 << 0;

type Data = Arc<dyn Any + Send + Sync>;

struct Record {
    ready: Arc<EventFlag>,
    data: Option<Data>,
    holders: usize,
}

impl Record {
    fn pending() -> Self {
        Self {
            ready: Arc::new(EventFlag::new()),
            data: None,
            holders: 0,
        }
    }
}

/// `"name" (N holders)`, for log lines.
fn describe(name: &[u8], holders: usize) -> FurryString {
    let mut line = FurryString::new();
    if furry_printf!(line, "\"%s\" (%zu holders)", name, holders).is_err() {
        line.set_bytes(name);
    }
    line
}

fn forbid_interrupt(op: &str, name: &[u8]) {
    if isr::is_active() {
        let name = FurryString::from_bytes(name);
        log::error!(target: "Record", "{op} {name} from interrupt context");
        panic!("Record: {op} of {name} from interrupt context");
    }
}

/// Directory of named records.
pub struct Registry {
    records: Mutex<HashMap<FurryString, Record>>,
    warn_interval: Duration,
}

impl Registry {
    /// Create an empty registry with the default wait warning interval.
    pub fn new() -> Self {
        Self::with_wait_warn_interval(KernelConfig::default().record_wait_warn_interval)
    }

    /// Create an empty registry whose [`open`](Self::open) logs a warning
    /// every `interval` while it keeps waiting.
    pub fn with_wait_warn_interval(interval: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            warn_interval: interval,
        }
    }

    /// Publish `data` under `name` and wake everyone waiting for it.
    ///
    /// Publishing a name twice is a fatal error.
    pub fn create<T: Any + Send + Sync>(&self, name: impl AsRef<[u8]>, data: Arc<T>) {
        let name = name.as_ref();
        forbid_interrupt("create", name);
        let mut records = self.records.lock();
        let record = records
            .entry(FurryString::from_bytes(name))
            .or_insert_with(Record::pending);
        if record.data.is_some() {
            let line = describe(name, record.holders);
            log::error!(target: "Record", "{line} already published");
            panic!("Record: {line} published twice");
        }
        record.data = Some(data as Data);
        record.ready.set(RECORD_READY);
        log::debug!(target: "Record", "created {}", describe(name, record.holders));
    }

    /// Take a holder reference on `name`, creating a pending record if needed.
    fn hold(&self, name: &[u8]) -> Arc<EventFlag> {
        let mut records = self.records.lock();
        let record = records
            .entry(FurryString::from_bytes(name))
            .or_insert_with(Record::pending);
        record.holders += 1;
        record.ready.clone()
    }

    /// Fetch published data; the caller must hold a reference.
    fn published<T: Any + Send + Sync>(&self, name: &[u8]) -> Arc<T> {
        let data = self
            .records
            .lock()
            .get(name)
            .and_then(|record| record.data.clone());
        let data = match data {
            Some(data) => data,
            None => {
                log::error!(target: "Record", "{} vanished while held", FurryString::from_bytes(name));
                panic!("Record: held record lost its data");
            }
        };
        match data.downcast::<T>() {
            Ok(data) => data,
            Err(_) => {
                let name = FurryString::from_bytes(name);
                log::error!(
                    target: "Record",
                    "{name} opened as {}",
                    core::any::type_name::<T>()
                );
                panic!("Record: {name} holds a different type");
            }
        }
    }

    /// Open `name`, blocking until some thread has published it.
    ///
    /// Every successful open must be paired with a [`close`](Self::close).
    /// A warning is logged each time the configured interval passes without
    /// the record appearing. Opening from interrupt context, or as a type
    /// other than the published one, is a fatal error.
    pub fn open<T: Any + Send + Sync>(&self, name: impl AsRef<[u8]>) -> Arc<T> {
        let name = name.as_ref();
        forbid_interrupt("open", name);
        let ready = self.hold(name);
        let wait = FlagWait::ANY.no_clear();
        while ready
            .wait(RECORD_READY, wait, Timeout::from(self.warn_interval))
            .is_err()
        {
            log::warn!(
                target: "Record",
                "still waiting for {} after {:?}",
                FurryString::from_bytes(name),
                self.warn_interval
            );
        }
        log::debug!(target: "Record", "opened {}", FurryString::from_bytes(name));
        self.published(name)
    }

    /// Open `name`, giving up after `timeout`.
    ///
    /// On failure the holder reference taken by this call is given back and
    /// the error from the wait ([`Error::Resource`] or [`Error::Timeout`]) is
    /// returned.
    pub fn try_open<T: Any + Send + Sync>(&self, name: impl AsRef<[u8]>, timeout: Timeout) -> Result<Arc<T>> {
        let name = name.as_ref();
        forbid_interrupt("open", name);
        let ready = self.hold(name);
        match ready.wait(RECORD_READY, FlagWait::ANY.no_clear(), timeout) {
            Ok(_) => Ok(self.published(name)),
            Err(err) => {
                self.release(name);
                Err(err)
            }
        }
    }

    fn release(&self, name: &[u8]) {
        let mut records = self.records.lock();
        match records.get_mut(name) {
            Some(record) if record.holders > 0 => record.holders -= 1,
            _ => {
                let name = FurryString::from_bytes(name);
                log::error!(target: "Record", "close of {name} without a holder");
                panic!("Record: {name} closed more often than opened");
            }
        }
    }

    /// Give back a reference taken by [`open`](Self::open).
    ///
    /// The record stays registered. Closing a name nobody holds is a fatal
    /// error.
    pub fn close(&self, name: impl AsRef<[u8]>) {
        let name = name.as_ref();
        forbid_interrupt("close", name);
        self.release(name);
        log::debug!(target: "Record", "closed {}", FurryString::from_bytes(name));
    }

    /// Remove `name` from the registry.
    ///
    /// # Returns
    ///
    /// `false` if no such record exists or somebody still holds it.
    pub fn destroy(&self, name: impl AsRef<[u8]>) -> bool {
        let name = name.as_ref();
        forbid_interrupt("destroy", name);
        let mut records = self.records.lock();
        let holders = match records.get(name) {
            Some(record) => record.holders,
            None => return false,
        };
        if holders != 0 {
            log::debug!(target: "Record", "destroy refused for {}", describe(name, holders));
            return false;
        }
        records.remove(name);
        log::debug!(target: "Record", "destroyed {}", FurryString::from_bytes(name));
        true
    }

    /// Whether `name` is registered, pending or ready.
    pub fn exists(&self, name: impl AsRef<[u8]>) -> bool {
        let name = name.as_ref();
        forbid_interrupt("exists", name);
        self.records.lock().contains_key(name)
    }

    /// Number of holders of `name`, or `None` if it is not registered.
    pub fn holders(&self, name: impl AsRef<[u8]>) -> Option<usize> {
        let name = name.as_ref();
        forbid_interrupt("holders", name);
        self.records.lock().get(name).map(|record| record.holders)
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        forbid_interrupt("len", b"registry");
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tear the registry down.
    ///
    /// Fails with [`Error::InUse`] if any record is still held; each such
    /// record is logged.
    pub fn teardown(self) -> Result<()> {
        let records = self.records.into_inner();
        let mut held = 0;
        for (name, record) in &records {
            if record.holders > 0 {
                log::warn!(target: "Record", "teardown with {} still held", describe(name.as_bytes(), record.holders));
                held += 1;
            }
        }
        if held > 0 {
            return Err(Error::InUse);
        }
        log::debug!(target: "Record", "teardown released {} records", records.len());
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_create_then_open() {
        let registry = Registry::new();
        registry.create("storage", Arc::new(42u32));
        assert!(registry.exists("storage"));
        let value: Arc<u32> = registry.open("storage");
        assert_eq!(*value, 42);
        assert_eq!(registry.holders("storage"), Some(1));
        registry.close("storage");
        assert_eq!(registry.holders("storage"), Some(0));
        assert!(registry.exists("storage"));
    }

    #[test]
    fn test_open_blocks_until_create() {
        let registry = Arc::new(Registry::with_wait_warn_interval(Duration::from_millis(5)));
        let opener = {
            let registry = registry.clone();
            std::thread::spawn(move || registry.open::<String>("gui"))
        };
        std::thread::sleep(Duration::from_millis(30));
        assert!(registry.exists("gui"));
        registry.create("gui", Arc::new(String::from("canvas")));
        assert_eq!(*opener.join().unwrap(), "canvas");
    }

    #[test]
    fn test_try_open_timeout_returns_hold() {
        let registry = Registry::new();
        let missing = registry.try_open::<u8>("radio", Timeout::NONE);
        assert_eq!(missing.err(), Some(Error::Resource));
        let missing = registry.try_open::<u8>("radio", Timeout::from_millis(5));
        assert_eq!(missing.err(), Some(Error::Timeout));
        assert_eq!(registry.holders("radio"), Some(0));
        assert!(registry.destroy("radio"));
    }

    #[test]
    fn test_destroy_rules() {
        let registry = Registry::new();
        assert!(!registry.destroy("nothing"));
        registry.create("bt", Arc::new(()));
        let _bt: Arc<()> = registry.open("bt");
        assert!(!registry.destroy("bt"));
        registry.close("bt");
        assert!(registry.destroy("bt"));
        assert!(!registry.exists("bt"));
    }

    #[test]
    fn test_keys_accept_furry_strings() {
        let registry = Registry::new();
        let name = FurryString::from("notification");
        registry.create(&name, Arc::new(1i64));
        assert!(registry.exists("notification"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_teardown_with_held_record() {
        let registry = Registry::new();
        registry.create("held", Arc::new(0u8));
        let _held: Arc<u8> = registry.open("held");
        assert_eq!(registry.teardown(), Err(Error::InUse));

        let registry = Registry::new();
        registry.create("free", Arc::new(0u8));
        assert_eq!(registry.teardown(), Ok(()));
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(b"gui", 2).as_bytes(), b"\"gui\" (2 holders)");
    }

    #[test]
    #[should_panic(expected = "published twice")]
    fn test_double_create_is_fatal() {
        let registry = Registry::new();
        registry.create("x", Arc::new(1u8));
        registry.create("x", Arc::new(2u8));
    }

    #[test]
    #[should_panic(expected = "closed more often")]
    fn test_close_without_open_is_fatal() {
        let registry = Registry::new();
        registry.create("x", Arc::new(1u8));
        registry.close("x");
    }

    #[test]
    #[should_panic(expected = "different type")]
    fn test_wrong_type_is_fatal() {
        let registry = Registry::new();
        registry.create("x", Arc::new(1u8));
        let _: Arc<u16> = registry.open("x");
    }

    #[test]
    #[should_panic(expected = "interrupt context")]
    fn test_holders_from_interrupt_is_fatal() {
        let registry = Registry::new();
        registry.create("x", Arc::new(1u8));
        isr::run(|| registry.holders("x"));
    }

    #[test]
    #[should_panic(expected = "interrupt context")]
    fn test_len_from_interrupt_is_fatal() {
        let registry = Registry::new();
        isr::run(|| registry.is_empty());
    }

    #[test]
    #[should_panic(expected = "interrupt context")]
    fn test_exists_from_interrupt_is_fatal() {
        let registry = Registry::new();
        isr::run(|| registry.exists("x"));
    }

    #[test]
    #[should_panic(expected = "interrupt context")]
    fn test_open_from_interrupt_is_fatal() {
        let registry = Registry::new();
        registry.create("x", Arc::new(1u8));
        isr::run(|| {
            let _: Arc<u8> = registry.open("x");
        });
    }

    #[test]
    #[should_panic(expected = "interrupt context")]
    fn test_create_from_interrupt_is_fatal() {
        let registry = Registry::new();
        isr::run(|| registry.create("x", Arc::new(1u8)));
    }
}
