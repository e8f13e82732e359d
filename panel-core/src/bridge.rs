//! PanelBridge: the host-facing surface.
//!
//! Owns the simulator registry, the shared callback registry and every
//! registered board. One ticker drives hardware polling for all boards;
//! simulator notifications are dispatched as they arrive.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};
use log::{debug, info, warn};

use crate::board::{Board, BoardItem, ItemListener};
use crate::callbacks::CallbackRegistry;
use crate::error::{CallbackError, ConfigError, Error, TransportError};
use crate::registry::{Dispatch, SimRegistry};
use crate::transport::{DeviceProvider, SimEvent, SimTransport};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Period of the hardware poll.
    pub poll_interval: Duration,
}

impl BridgeConfig {
    pub const DEFAULT: Self = Self {
        poll_interval: Duration::from_millis(100),
    };
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What one turn of [`PanelBridge::run_once`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    /// Boards were polled; total number of hardware transitions.
    Polled(usize),
    /// A simulator notification was dispatched.
    Event(Dispatch),
    /// Reading from the simulator failed.
    SimError(TransportError),
}

pub struct PanelBridge<S, P: DeviceProvider> {
    registry: SimRegistry<S>,
    callbacks: Rc<CallbackRegistry>,
    provider: P,
    boards: BTreeMap<String, Board<P::Device>>,
    config: BridgeConfig,
    ticker: Ticker,
}

impl<S: SimTransport, P: DeviceProvider> PanelBridge<S, P> {
    /// Bridge with the built-in callbacks installed.
    pub fn new(transport: S, provider: P, config: BridgeConfig) -> Self {
        Self::with_callbacks(transport, provider, Rc::new(CallbackRegistry::with_builtins()), config)
    }

    pub fn with_callbacks(
        transport: S,
        provider: P,
        callbacks: Rc<CallbackRegistry>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            registry: SimRegistry::new(transport),
            callbacks,
            provider,
            boards: BTreeMap::new(),
            config,
            ticker: Ticker::every(config.poll_interval),
        }
    }

    /// Open the panel `vendor_id:product_id` and bind `items` to it.
    pub async fn register_board(
        &mut self,
        id: &str,
        vendor_id: u16,
        product_id: u16,
        items: Vec<BoardItem>,
    ) -> Result<(), Error> {
        if self.boards.contains_key(id) {
            return Err(ConfigError::DuplicateBoard.into());
        }
        let device = self.provider.device(vendor_id, product_id)?;
        let mut board = Board::new(id, device, items, Rc::clone(&self.callbacks))?;
        board.open(&mut self.registry).await?;

        info!("board {} registered ({:04x}:{:04x})", id, vendor_id, product_id);
        self.boards.insert(id.into(), board);
        Ok(())
    }

    pub async fn unregister_board(&mut self, id: &str) -> Result<(), Error> {
        let mut board = self.boards.remove(id).ok_or(ConfigError::UnknownBoard)?;
        board.close(&mut self.registry).await;
        Ok(())
    }

    pub async fn trigger_item(&mut self, board: &str, item: &str, value: i32) -> Result<(), Error> {
        let board = self.boards.get_mut(board).ok_or(ConfigError::UnknownBoard)?;
        board.trigger(item, value, &mut self.registry).await
    }

    /// Trigger a write item by one of its named positions.
    pub async fn trigger_named(&mut self, board: &str, item: &str, position: &str) -> Result<(), Error> {
        let board = self.boards.get_mut(board).ok_or(ConfigError::UnknownBoard)?;
        board.trigger_named(item, position, &mut self.registry).await
    }

    /// Attach `listener` to every item of `board`.
    pub fn on_change(
        &self,
        board: &str,
        listener: impl Fn(&str, &Value) -> Result<(), CallbackError> + 'static,
    ) -> Result<usize, ConfigError> {
        let board = self.boards.get(board).ok_or(ConfigError::UnknownBoard)?;
        let listener: ItemListener = Rc::new(listener);
        Ok(board.on_change_all(listener))
    }

    pub async fn connect_simulator(&mut self) -> Result<usize, Error> {
        self.registry.connect().await
    }

    pub async fn disconnect_simulator(&mut self) {
        self.registry.disconnect().await;
    }

    /// Poll every board once. Failures are logged per board.
    pub async fn poll_devices(&mut self) -> usize {
        let mut changes = 0;
        for (id, board) in self.boards.iter_mut() {
            match board.poll(&mut self.registry).await {
                Ok(n) => changes += n,
                Err(e) => warn!("board {}: poll failed: {}", id, e),
            }
        }
        changes
    }

    /// Dispatch one simulator notification and run what it queued.
    pub async fn handle_sim_event(&mut self, event: &SimEvent) -> Dispatch {
        let dispatch = self.registry.dispatch(event);
        for board in self.boards.values_mut() {
            board.flush_actions(&mut self.registry).await;
        }
        dispatch
    }

    /// Wait for the next poll tick or simulator notification and handle it.
    pub async fn run_once(&mut self) -> Activity {
        if !self.registry.is_connected() {
            self.ticker.next().await;
            return Activity::Polled(self.poll_devices().await);
        }

        match select(self.ticker.next(), self.registry.next_event()).await {
            Either::First(()) => Activity::Polled(self.poll_devices().await),
            Either::Second(Ok(event)) => Activity::Event(self.handle_sim_event(&event).await),
            Either::Second(Err(e)) => {
                warn!("simulator read failed: {}", e);
                Activity::SimError(e)
            }
        }
    }

    /// Run the bridge indefinitely.
    pub async fn run(&mut self) -> ! {
        info!(
            "bridge running, {} boards, poll every {} ms",
            self.boards.len(),
            self.config.poll_interval.as_millis()
        );
        loop {
            if let Activity::SimError(_) = self.run_once().await {
                // Back off until the next tick.
                self.ticker.next().await;
            }
        }
    }

    /// Close every board and disconnect from the simulator.
    pub async fn close(&mut self) {
        for (id, mut board) in core::mem::take(&mut self.boards) {
            debug!("closing board {}", id);
            board.close(&mut self.registry).await;
        }
        if self.registry.is_connected() {
            self.registry.disconnect().await;
        }
    }

    pub fn callbacks(&self) -> &Rc<CallbackRegistry> {
        &self.callbacks
    }

    pub fn board(&self, id: &str) -> Option<&Board<P::Device>> {
        self.boards.get(id)
    }

    pub fn boards(&self) -> impl Iterator<Item = &str> {
        self.boards.keys().map(String::as_str)
    }

    pub fn registry(&self) -> &SimRegistry<S> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SimRegistry<S> {
        &mut self.registry
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}
