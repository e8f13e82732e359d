//! Host bridge between a flight simulator and USB cockpit panels.
//!
//! This crate wires [`panel_core`] to concrete transports: an in-process
//! simulator ([`MockSimulator`]) and a loopback panel controller
//! ([`LoopbackPanel`]), plus the captain CDU board definition in [`fmc`].

// Re-export core types for convenience
pub use panel_core::{
    Activity, Board, BoardItem, BridgeConfig, CallbackRegistry, Descriptor, Error, HardwareInterface, PanelBridge,
    SimEvent, Value,
};

pub mod fmc;
pub mod hid;
pub mod sim;

pub use hid::{LoopbackPanel, LoopbackProvider};
pub use sim::{MockSimConfig, MockSimulator};

/// Bridge over the in-process simulator and loopback panels.
pub type LoopbackBridge = PanelBridge<MockSimulator, LoopbackProvider>;
