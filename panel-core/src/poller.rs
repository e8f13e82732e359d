//! Hardware-side poller.
//!
//! Each poll sends `READ_PINS_MASKED` and compares every input interface
//! against its stored value. Only transitions reach listeners; there is no
//! time-based debounce.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use embassy_time::Instant;
use log::{debug, trace, warn};
use panel_proto::{parse_response, Command, PinBank};

use crate::error::{CallbackError, ConfigError, Error, TransportError};
use crate::interface::{HardwareInterface, InterfaceKind};
use crate::transport::HidTransport;

/// Listener for transitions of one interface.
pub type ChangeListener = Rc<dyn Fn(&HardwareInterface) -> Result<(), CallbackError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollerState {
    Closed,
    Open,
}

pub struct DevicePoller<H> {
    device: H,
    interfaces: Vec<HardwareInterface>,
    listeners: BTreeMap<String, ChangeListener>,
    state: PollerState,
}

impl<H: HidTransport> DevicePoller<H> {
    pub fn new(device: H, interfaces: Vec<HardwareInterface>) -> Self {
        Self {
            device,
            interfaces,
            listeners: BTreeMap::new(),
            state: PollerState::Closed,
        }
    }

    pub async fn open(&mut self) -> Result<(), Error> {
        if self.state == PollerState::Open {
            return Ok(());
        }
        self.device.open().await?;
        self.state = PollerState::Open;
        debug!("device open, {} interfaces", self.interfaces.len());
        Ok(())
    }

    pub async fn close(&mut self) {
        if self.state == PollerState::Closed {
            return;
        }
        self.device.close().await;
        self.state = PollerState::Closed;
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PollerState::Open
    }

    /// Set the listener for interface `id`, replacing any previous one.
    pub fn on_change(
        &mut self,
        id: impl Into<String>,
        listener: impl Fn(&HardwareInterface) -> Result<(), CallbackError> + 'static,
    ) {
        self.listeners.insert(id.into(), Rc::new(listener));
    }

    pub fn off_change(&mut self, id: &str) -> Option<ChangeListener> {
        self.listeners.remove(id)
    }

    /// Read all inputs once and notify listeners of transitions.
    ///
    /// Stored values are updated for every transition, listener or not.
    /// Listener errors are logged. Returns the number of transitions.
    pub async fn poll_once(&mut self) -> Result<usize, Error> {
        if !self.is_open() {
            return Err(TransportError::NotOpen.into());
        }
        let frame = self.device.exchange(&Command::ReadPinsMasked.encode()).await?;
        let pins = PinBank(parse_response(&frame)?);
        let now = Instant::now();

        let mut changed = Vec::new();
        for (index, iface) in self.interfaces.iter_mut().enumerate() {
            let Some(level) = iface.sample(&pins) else {
                continue;
            };
            if iface.observe(level, now) {
                trace!("{} -> {}", iface.id, level);
                changed.push(index);
            }
        }

        for &index in &changed {
            let iface = &self.interfaces[index];
            let Some(listener) = self.listeners.get(&iface.id).cloned() else {
                continue;
            };
            if let Err(e) = listener(iface) {
                warn!("change listener for {} failed: {}", iface.id, e);
            }
        }
        Ok(changed.len())
    }

    /// Drive LED `id` and return its updated state.
    pub async fn trigger(&mut self, id: &str, value: i32) -> Result<HardwareInterface, Error> {
        if !self.is_open() {
            return Err(TransportError::NotOpen.into());
        }
        let index = self
            .interfaces
            .iter()
            .position(|i| i.id == id)
            .ok_or(ConfigError::UnknownId)?;
        let InterfaceKind::Led { offset, .. } = self.interfaces[index].kind else {
            return Err(ConfigError::WrongKind.into());
        };
        let offset = u8::try_from(offset).map_err(|_| ConfigError::OffsetOutOfRange)?;

        let command = Command::TriggerPin {
            offset,
            on: value != 0,
        };
        let frame = self.device.exchange(&command.encode()).await?;
        parse_response(&frame)?;

        let iface = &mut self.interfaces[index];
        iface.observe(value, Instant::now());
        Ok(iface.clone())
    }

    /// Send a raw request frame and return the response payload.
    pub async fn send_report(&mut self, request: &[u8]) -> Result<Vec<u8>, Error> {
        if !self.is_open() {
            return Err(TransportError::NotOpen.into());
        }
        let frame = self.device.exchange(request).await?;
        Ok(parse_response(&frame)?.to_vec())
    }

    pub fn interface(&self, id: &str) -> Option<&HardwareInterface> {
        self.interfaces.iter().find(|i| i.id == id)
    }

    pub fn interfaces(&self) -> &[HardwareInterface] {
        &self.interfaces
    }

    pub fn device(&self) -> &H {
        &self.device
    }
}
