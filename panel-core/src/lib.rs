//! Binding engine between a flight simulator and polled cockpit panels.
//!
//! A host registers boards. Each board is a list of items; an item ties a
//! hardware interface on a USB panel controller to a simulator descriptor.
//! Hardware transitions become simulator events, simulator data blocks
//! become LED states, UI notifications and callback invocations.
//!
//! # Overview
//!
//! - [`descriptor`]: simulator-side bindings ([`Descriptor`])
//! - [`interface`]: hardware-side bindings ([`HardwareInterface`])
//! - [`registry`]: subscription bookkeeping and event dispatch ([`SimRegistry`])
//! - [`poller`]: change detection on the panel's pins ([`DevicePoller`])
//! - [`callbacks`]: named callbacks resolved at dispatch time ([`CallbackRegistry`])
//! - [`board`]: item routing between the two sides ([`Board`])
//! - [`bridge`]: the host-facing surface ([`PanelBridge`])
//! - [`transport`]: traits the host implements ([`SimTransport`], [`HidTransport`])
//!
//! # Example
//!
//! ```
//! use panel_core::{CallbackRegistry, DeviceRead};
//!
//! let callbacks = CallbackRegistry::with_builtins();
//! callbacks.register_device_read("exec-twice", |ctx: &DeviceRead<'_>| {
//!     ctx.actions.trigger_sim("cdu_exec", ctx.value.value);
//!     ctx.actions.trigger_sim("cdu_exec", ctx.value.value);
//!     Ok(())
//! });
//! assert!(callbacks.device_read("exec-twice").is_some());
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # Concurrency
//!
//! Everything runs on one executor. State shared with callbacks lives in
//! `Rc`/`RefCell`; nothing here is `Send`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod actions;
pub mod board;
pub mod bridge;
pub mod callbacks;
pub mod descriptor;
pub mod error;
pub mod interface;
pub mod poller;
pub mod registry;
pub mod transport;
pub mod value;

#[cfg(test)]
mod test_support;

// Re-export main types at crate root
pub use actions::{Action, Actions};
pub use board::{Board, BoardItem, ItemListener};
pub use bridge::{Activity, BridgeConfig, PanelBridge};
pub use callbacks::{
    parse_cdu_screen, Callback, CallbackRegistry, DeviceRead, SimRead, CDU_POWERED_FIELD, CDU_SCREEN_FIELD,
    CDU_SCREEN_PARSER,
};
pub use descriptor::{DataDescriptor, Descriptor, DescriptorKind, DescriptorTag, ReadDescriptor, WriteDescriptor};
pub use error::{CallbackError, ConfigError, Error, TransportError};
pub use interface::{HardwareInterface, InterfaceKind, InterfaceTag, SwitchPosition};
pub use poller::{DevicePoller, PollerState};
pub use registry::{Dispatch, SimRegistry, Subscription};
pub use transport::{DeviceProvider, HidTransport, SimEvent, SimTransport};
pub use value::{InterfaceValue, Value};
