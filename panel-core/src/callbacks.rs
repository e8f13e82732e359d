//! Named callbacks.
//!
//! Board items are plain data, so they refer to custom behaviour by key.
//! Keys are resolved against a [`CallbackRegistry`] each time a callback is
//! about to run. A key with no entry is logged and skipped; the binding
//! stays in place.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;

use log::warn;
use panel_proto::{Decoded, FieldValue, Scalar, ScreenBuffer};

use crate::actions::Actions;
use crate::descriptor::Descriptor;
use crate::error::CallbackError;
use crate::interface::HardwareInterface;
use crate::value::{InterfaceValue, Value};

/// Key of the built-in CDU screen parser.
pub const CDU_SCREEN_PARSER: &str = "cdu-screen";
/// Field holding the decoded [`ScreenBuffer`].
pub const CDU_SCREEN_FIELD: &str = "cdu_screen";
/// Field holding the CDU power flag.
pub const CDU_POWERED_FIELD: &str = "cdu_powered";

/// Context for a callback run on a simulator value.
pub struct SimRead<'a> {
    pub board: &'a str,
    pub item: &'a str,
    pub descriptor: &'a Descriptor,
    /// Decoded record for data descriptors with a parser or layout, the
    /// raw value otherwise.
    pub value: &'a Value,
    pub actions: &'a Actions,
}

/// Context for a callback run on a hardware change.
pub struct DeviceRead<'a> {
    pub board: &'a str,
    pub item: &'a str,
    pub interface: &'a HardwareInterface,
    pub value: &'a InterfaceValue,
    pub actions: &'a Actions,
}

pub type SimReadFn = Rc<dyn Fn(&SimRead<'_>) -> Result<(), CallbackError>>;
pub type DeviceReadFn = Rc<dyn Fn(&DeviceRead<'_>) -> Result<(), CallbackError>>;
pub type DataParserFn = Rc<dyn Fn(&[u8]) -> Result<Decoded, CallbackError>>;

#[derive(Clone)]
pub enum Callback {
    SimRead(SimReadFn),
    DeviceRead(DeviceReadFn),
    DataParser(DataParserFn),
}

impl Callback {
    fn kind(&self) -> &'static str {
        match self {
            Self::SimRead(_) => "sim-read",
            Self::DeviceRead(_) => "device-read",
            Self::DataParser(_) => "data parser",
        }
    }
}

/// Key to callback table, shared by every board of a host.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: RefCell<BTreeMap<String, Callback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in parsers installed.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_parser(CDU_SCREEN_PARSER, parse_cdu_screen);
        registry
    }

    /// Register `callback` under `key`, returning what it replaced.
    pub fn register(&self, key: impl Into<String>, callback: Callback) -> Option<Callback> {
        self.entries.borrow_mut().insert(key.into(), callback)
    }

    pub fn register_sim_read(
        &self,
        key: impl Into<String>,
        f: impl Fn(&SimRead<'_>) -> Result<(), CallbackError> + 'static,
    ) -> Option<Callback> {
        self.register(key, Callback::SimRead(Rc::new(f)))
    }

    pub fn register_device_read(
        &self,
        key: impl Into<String>,
        f: impl Fn(&DeviceRead<'_>) -> Result<(), CallbackError> + 'static,
    ) -> Option<Callback> {
        self.register(key, Callback::DeviceRead(Rc::new(f)))
    }

    pub fn register_parser(
        &self,
        key: impl Into<String>,
        f: impl Fn(&[u8]) -> Result<Decoded, CallbackError> + 'static,
    ) -> Option<Callback> {
        self.register(key, Callback::DataParser(Rc::new(f)))
    }

    /// Callback for `key`. The map is not borrowed once this returns.
    pub fn lookup(&self, key: &str) -> Option<Callback> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn unregister(&self, key: &str) -> Option<Callback> {
        self.entries.borrow_mut().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn sim_read(&self, key: &str) -> Option<SimReadFn> {
        match self.resolve(key, "sim-read")? {
            Callback::SimRead(f) => Some(f),
            other => self.mismatch(key, "sim-read", &other),
        }
    }

    pub fn device_read(&self, key: &str) -> Option<DeviceReadFn> {
        match self.resolve(key, "device-read")? {
            Callback::DeviceRead(f) => Some(f),
            other => self.mismatch(key, "device-read", &other),
        }
    }

    pub fn parser(&self, key: &str) -> Option<DataParserFn> {
        match self.resolve(key, "data parser")? {
            Callback::DataParser(f) => Some(f),
            other => self.mismatch(key, "data parser", &other),
        }
    }

    fn resolve(&self, key: &str, wanted: &str) -> Option<Callback> {
        let found = self.lookup(key);
        if found.is_none() {
            warn!("no {} callback registered for '{}'", wanted, key);
        }
        found
    }

    fn mismatch<T>(&self, key: &str, wanted: &str, found: &Callback) -> Option<T> {
        warn!("callback '{}' is a {} callback, expected {}", key, found.kind(), wanted);
        None
    }
}

/// Decode a CDU screen block into [`CDU_SCREEN_FIELD`] and
/// [`CDU_POWERED_FIELD`].
pub fn parse_cdu_screen(raw: &[u8]) -> Result<Decoded, CallbackError> {
    let screen = ScreenBuffer::decode(raw)?;
    let mut out = Decoded::new();
    out.insert(
        CDU_POWERED_FIELD.into(),
        FieldValue::Scalar(Scalar::Bool(screen.powered)),
    );
    out.insert(CDU_SCREEN_FIELD.into(), FieldValue::Screen(Box::new(screen)));
    Ok(out)
}
