//! Transport traits for the two sides of the bridge.
//!
//! The engine never talks to a simulator SDK or a USB stack directly. Hosts
//! provide implementations of these traits; the crate's tests use in-memory
//! mocks.

use alloc::vec::Vec;
use core::future::Future;

use crate::descriptor::Descriptor;
use crate::error::TransportError;
use crate::value::Value;

/// Notification received from the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// Event or variable value tagged with a descriptor handle.
    Event { handle: u32, data: i32 },
    /// Client data block for a data descriptor.
    ClientData { handle: u32, data: Vec<u8> },
}

impl SimEvent {
    pub fn handle(&self) -> u32 {
        match self {
            Self::Event { handle, .. } | Self::ClientData { handle, .. } => *handle,
        }
    }

    /// Payload as passed to descriptor callbacks.
    pub fn value(&self) -> Value {
        match self {
            Self::Event { data, .. } => Value::Int(*data),
            Self::ClientData { data, .. } => Value::Bytes(data.clone()),
        }
    }
}

/// Connection to the simulator's event and data bus.
pub trait SimTransport {
    fn connect(&mut self) -> impl Future<Output = Result<(), TransportError>>;

    fn disconnect(&mut self) -> impl Future<Output = ()>;

    /// Make the simulator deliver events for `descriptor`.
    ///
    /// Data descriptors map their data area, declare its definition and
    /// request delivery (on change or periodic). Write descriptors map their
    /// event. Read descriptors need nothing.
    fn subscribe(&mut self, descriptor: &Descriptor) -> impl Future<Output = Result<(), TransportError>>;

    fn unsubscribe(&mut self, descriptor: &Descriptor) -> impl Future<Output = Result<(), TransportError>>;

    /// Send `value` to the event of a write descriptor.
    fn transmit(&mut self, descriptor: &Descriptor, value: i32) -> impl Future<Output = Result<(), TransportError>>;

    /// Wait for the next inbound notification.
    fn next_event(&mut self) -> impl Future<Output = Result<SimEvent, TransportError>>;

    fn is_connected(&self) -> bool;
}

/// Request/response channel to a panel controller.
pub trait HidTransport {
    fn open(&mut self) -> impl Future<Output = Result<(), TransportError>>;

    fn close(&mut self) -> impl Future<Output = ()>;

    /// Send one request frame and return the response frame.
    fn exchange(&mut self, request: &[u8]) -> impl Future<Output = Result<Vec<u8>, TransportError>>;

    fn is_open(&self) -> bool;
}

/// Opens panel controllers by USB vendor and product id.
pub trait DeviceProvider {
    type Device: HidTransport;

    fn device(&mut self, vendor_id: u16, product_id: u16) -> Result<Self::Device, TransportError>;
}
