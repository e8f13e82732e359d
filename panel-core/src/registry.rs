//! Simulator-side descriptor registry.
//!
//! Holds at most one descriptor per id. A descriptor registered while the
//! simulator is disconnected stays pending and is subscribed on the next
//! [`SimRegistry::connect`], in id order.
//!
//! Nothing is retried behind the caller's back. A subscribe that fails
//! inside `register` is returned and the descriptor is not kept. One that
//! fails inside `connect` is logged and left pending; only a later explicit
//! `connect` tries it again.

use alloc::collections::BTreeMap;
use alloc::string::String;

use log::{debug, info, warn};

use crate::descriptor::{Descriptor, DescriptorKind, DescriptorTag};
use crate::error::{CallbackError, ConfigError, Error, TransportError};
use crate::transport::{SimEvent, SimTransport};

/// Subscription state of a registered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Subscription {
    /// Waiting for a connection, or the last subscribe failed.
    Pending,
    Subscribed,
}

/// Outcome of [`SimRegistry::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Callback ran and returned `Ok`.
    Delivered,
    /// No descriptor with that handle. Events for other clients end up here.
    Unmatched,
    /// Matched a descriptor that has no callback.
    NoCallback,
    /// The callback returned an error.
    Failed(CallbackError),
}

struct Entry {
    descriptor: Descriptor,
    state: Subscription,
}

pub struct SimRegistry<S> {
    transport: S,
    entries: BTreeMap<String, Entry>,
}

impl<S: SimTransport> SimRegistry<S> {
    pub fn new(transport: S) -> Self {
        Self {
            transport,
            entries: BTreeMap::new(),
        }
    }

    /// Register a descriptor, subscribing it right away when connected.
    ///
    /// Fails on a duplicate id, or when connected and the subscribe fails.
    /// In both cases the registry is left unchanged.
    pub async fn register(&mut self, descriptor: Descriptor) -> Result<Subscription, Error> {
        if self.entries.contains_key(&descriptor.id) {
            return Err(ConfigError::DuplicateId.into());
        }

        let mut state = Subscription::Pending;
        if self.transport.is_connected() {
            if let Err(e) = self.transport.subscribe(&descriptor).await {
                warn!("subscribe {} failed: {}", descriptor.id, e);
                return Err(e.into());
            }
            state = Subscription::Subscribed;
        }
        debug!("registered {} descriptor {} ({:?})", descriptor.tag(), descriptor.id, state);
        self.entries
            .insert(descriptor.id.clone(), Entry { descriptor, state });
        Ok(state)
    }

    /// Remove a descriptor, unsubscribing it if it was subscribed.
    pub async fn unregister(&mut self, id: &str) -> Result<Descriptor, Error> {
        let entry = self.entries.remove(id).ok_or(ConfigError::UnknownId)?;
        if entry.state == Subscription::Subscribed && self.transport.is_connected() {
            if let Err(e) = self.transport.unsubscribe(&entry.descriptor).await {
                warn!("unsubscribe {} failed: {}", id, e);
            }
        }
        Ok(entry.descriptor)
    }

    /// Connect the transport and subscribe everything pending.
    ///
    /// Returns the number of descriptors newly subscribed. Failures are
    /// logged and leave the descriptor pending for the next call.
    pub async fn connect(&mut self) -> Result<usize, Error> {
        if !self.transport.is_connected() {
            self.transport.connect().await?;
            info!("simulator connected");
        }

        let mut subscribed = 0;
        for (id, entry) in self.entries.iter_mut() {
            if entry.state != Subscription::Pending {
                continue;
            }
            match self.transport.subscribe(&entry.descriptor).await {
                Ok(()) => {
                    entry.state = Subscription::Subscribed;
                    subscribed += 1;
                }
                Err(e) => warn!("subscribe {} failed: {}", id, e),
            }
        }
        Ok(subscribed)
    }

    /// Disconnect the transport. Every descriptor goes back to pending.
    pub async fn disconnect(&mut self) {
        self.transport.disconnect().await;
        for entry in self.entries.values_mut() {
            entry.state = Subscription::Pending;
        }
        info!("simulator disconnected");
    }

    /// Route an inbound notification to the owning descriptor's callback.
    ///
    /// Plain events match any descriptor with the same handle; client data
    /// only matches data descriptors. Callback errors are logged and
    /// returned as [`Dispatch::Failed`].
    pub fn dispatch(&self, event: &SimEvent) -> Dispatch {
        let handle = event.handle();
        let data_only = matches!(event, SimEvent::ClientData { .. });
        let found = self.entries.values().find(|e| {
            e.descriptor.handle == handle && (!data_only || e.descriptor.tag() == DescriptorTag::Data)
        });

        let Some(entry) = found else {
            debug!("no descriptor for handle {}", handle);
            return Dispatch::Unmatched;
        };
        let Some(callback) = entry.descriptor.callback.clone() else {
            return Dispatch::NoCallback;
        };

        match callback(&entry.descriptor, &event.value()) {
            Ok(()) => Dispatch::Delivered,
            Err(e) => {
                warn!("callback for {} failed: {}", entry.descriptor.id, e);
                Dispatch::Failed(e)
            }
        }
    }

    /// Send `value` through the write descriptor `id`.
    pub async fn trigger(&mut self, id: &str, value: i32) -> Result<(), Error> {
        let entry = self.entries.get(id).ok_or(ConfigError::UnknownId)?;
        if !matches!(entry.descriptor.kind, DescriptorKind::Write(_)) {
            return Err(ConfigError::WrongKind.into());
        }
        if !self.transport.is_connected() {
            return Err(TransportError::NotConnected.into());
        }
        self.transport.transmit(&entry.descriptor, value).await?;
        Ok(())
    }

    /// Wait for the next notification from the transport.
    pub async fn next_event(&mut self) -> Result<SimEvent, TransportError> {
        self.transport.next_event().await
    }

    pub fn state(&self, id: &str) -> Option<Subscription> {
        self.entries.get(id).map(|e| e.state)
    }

    pub fn descriptor(&self, id: &str) -> Option<&Descriptor> {
        self.entries.get(id).map(|e| &e.descriptor)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn transport(&self) -> &S {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut S {
        &mut self.transport
    }
}
