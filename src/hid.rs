//! Loopback panel controller.
//!
//! Speaks the pin command protocol against an in-memory pin bank, so the
//! bridge can run without hardware. Clones share the same pins; the host
//! keeps one to press buttons and read LEDs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, warn};
use panel_core::{DeviceProvider, HidTransport, TransportError};
use panel_proto::hid::{CMD_READ_PINS_MASKED, CMD_TRIGGER_PIN};
use panel_proto::PinBank;

/// Pin bank size in bytes.
pub const PIN_BANK_BYTES: usize = 8;

/// Status byte for a request the controller does not understand.
pub const STATUS_UNSUPPORTED: u8 = 0x01;

#[derive(Default)]
struct PanelState {
    open: bool,
    pins: [u8; PIN_BANK_BYTES],
}

#[derive(Clone, Default)]
pub struct LoopbackPanel {
    state: Rc<RefCell<PanelState>>,
}

impl LoopbackPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive pin `offset`. Offsets past the bank are ignored.
    pub fn set(&self, offset: u16, high: bool) {
        let (byte, bit) = (usize::from(offset / 8), offset % 8);
        let mut state = self.state.borrow_mut();
        let Some(slot) = state.pins.get_mut(byte) else {
            warn!("pin {} out of range", offset);
            return;
        };
        if high {
            *slot |= 1 << bit;
        } else {
            *slot &= !(1 << bit);
        }
    }

    pub fn press(&self, offset: u16) {
        self.set(offset, true);
    }

    pub fn release(&self, offset: u16) {
        self.set(offset, false);
    }

    pub fn level(&self, offset: u16) -> Option<bool> {
        PinBank(&self.state.borrow().pins).level(offset)
    }

    fn handle(&self, request: &[u8]) -> Vec<u8> {
        match request {
            [CMD_READ_PINS_MASKED, ..] => {
                let mut out = vec![0];
                out.extend_from_slice(&self.state.borrow().pins);
                out
            }
            [CMD_TRIGGER_PIN, offset, on, ..] => {
                self.set(u16::from(*offset), *on != 0);
                vec![0]
            }
            _ => vec![STATUS_UNSUPPORTED],
        }
    }
}

impl HidTransport for LoopbackPanel {
    async fn open(&mut self) -> Result<(), TransportError> {
        self.state.borrow_mut().open = true;
        Ok(())
    }

    async fn close(&mut self) {
        self.state.borrow_mut().open = false;
    }

    async fn exchange(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        debug!("loopback <- {:02x?}", request);
        Ok(self.handle(request))
    }

    fn is_open(&self) -> bool {
        self.state.borrow().open
    }
}

/// Hands out attached loopback panels by vendor and product id.
#[derive(Default)]
pub struct LoopbackProvider {
    panels: BTreeMap<(u16, u16), LoopbackPanel>,
}

impl LoopbackProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a panel and return a handle sharing its pins.
    pub fn attach(&mut self, vendor_id: u16, product_id: u16) -> LoopbackPanel {
        self.panels.entry((vendor_id, product_id)).or_default().clone()
    }
}

impl DeviceProvider for LoopbackProvider {
    type Device = LoopbackPanel;

    fn device(&mut self, vendor_id: u16, product_id: u16) -> Result<LoopbackPanel, TransportError> {
        if vendor_id == 0 || product_id == 0 {
            return Err(TransportError::InvalidDevice);
        }
        self.panels
            .get(&(vendor_id, product_id))
            .cloned()
            .ok_or(TransportError::ConnectFailed)
    }
}
