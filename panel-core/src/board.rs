//! Board: one physical panel bound to the simulator.
//!
//! A board is built from a list of [`BoardItem`]s. Items with a simulator
//! descriptor get a dispatch callback installed and are registered with the
//! [`SimRegistry`]; items with a hardware interface get a change listener on
//! the [`DevicePoller`].
//!
//! Simulator to hardware:
//!
//! 1. A data block is decoded (named parser first, then layout) and every
//!    field is fanned out to the read items naming it. A read item with a
//!    position gets that element of an array field.
//! 2. A read item notifies its UI listener and drives its LED, inverted if
//!    the LED is wired that way.
//! 3. The item's sim-read callback runs, if it names one.
//!
//! Hardware to simulator: the item's device-read callback runs if it names
//! one; otherwise a write descriptor on the item gets the new value
//! (buttons only on press). Button changes also reach the UI listener.
//!
//! Callbacks are synchronous. Anything that needs transport I/O is queued
//! on the board's [`Actions`] and executed by [`Board::flush_actions`].

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use log::{debug, info, warn};
use panel_proto::{Decoded, FieldValue};

use crate::actions::{Action, Actions};
use crate::callbacks::{CallbackRegistry, DeviceRead, SimRead};
use crate::descriptor::{DataDescriptor, Descriptor, DescriptorKind, SimCallback};
use crate::error::{CallbackError, ConfigError, Error};
use crate::interface::{HardwareInterface, InterfaceKind, InterfaceTag};
use crate::poller::DevicePoller;
use crate::registry::SimRegistry;
use crate::transport::{HidTransport, SimTransport};
use crate::value::Value;

/// UI listener: `(item id, value)`.
pub type ItemListener = Rc<dyn Fn(&str, &Value) -> Result<(), CallbackError>>;

/// One logical control or indicator.
#[derive(Debug, Clone)]
pub struct BoardItem {
    pub id: String,
    pub interface: Option<HardwareInterface>,
    pub sim: Option<Descriptor>,
    /// Callback key run after a simulator value reached this item.
    pub on_sim_read: Option<String>,
    /// Callback key run on a hardware change instead of direct forwarding.
    pub on_device_read: Option<String>,
}

impl BoardItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            interface: None,
            sim: None,
            on_sim_read: None,
            on_device_read: None,
        }
    }

    #[must_use]
    pub fn interface(mut self, interface: HardwareInterface) -> Self {
        self.interface = Some(interface);
        self
    }

    #[must_use]
    pub fn sim(mut self, descriptor: Descriptor) -> Self {
        self.sim = Some(descriptor);
        self
    }

    #[must_use]
    pub fn on_sim_read(mut self, key: impl Into<String>) -> Self {
        self.on_sim_read = Some(key.into());
        self
    }

    #[must_use]
    pub fn on_device_read(mut self, key: impl Into<String>) -> Self {
        self.on_device_read = Some(key.into());
        self
    }

    /// Items with neither interface nor descriptor do nothing.
    pub fn is_inert(&self) -> bool {
        self.interface.is_none() && self.sim.is_none()
    }
}

/// State shared between the board and the callbacks it installs.
struct BoardShared {
    id: String,
    items: Vec<BoardItem>,
    listeners: RefCell<BTreeMap<String, ItemListener>>,
    callbacks: Rc<CallbackRegistry>,
    actions: Actions,
}

impl BoardShared {
    fn item(&self, id: &str) -> Option<&BoardItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn on_sim_value(&self, index: usize, descriptor: &Descriptor, value: &Value) -> Result<(), CallbackError> {
        let item = &self.items[index];
        let mut result = Ok(());

        let record = match &descriptor.kind {
            DescriptorKind::Data(data) => self.decode(data, value).map(|record| {
                if let Err(e) = self.fan_out(&record) {
                    result = Err(e);
                }
                Value::Record(record)
            }),
            DescriptorKind::Read(_) => {
                self.notify(item, value);
                if let Some(iface) = &item.interface {
                    self.drive_led(iface, value);
                }
                None
            }
            DescriptorKind::Write(_) => None,
        };

        if let Some(key) = &item.on_sim_read {
            if let Some(callback) = self.callbacks.sim_read(key) {
                let context = SimRead {
                    board: &self.id,
                    item: &item.id,
                    descriptor,
                    value: record.as_ref().unwrap_or(value),
                    actions: &self.actions,
                };
                if let Err(e) = callback(&context) {
                    warn!("sim-read callback {} for {} failed: {}", key, item.id, e);
                    result = Err(e);
                }
            }
        }
        result
    }

    fn decode(&self, data: &DataDescriptor, value: &Value) -> Option<Decoded> {
        let Value::Bytes(raw) = value else {
            return None;
        };
        if let Some(key) = &data.parser {
            let parser = self.callbacks.parser(key)?;
            return match parser(raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("parser {} failed on {}: {}", key, data.data_name, e);
                    None
                }
            };
        }

        let out = data.layout.as_ref()?.decode(raw);
        if let Some(t) = &out.truncated {
            warn!(
                "{}: short block, field {} needs {} bytes, {} available",
                data.data_name, t.field, t.needed, t.available
            );
        }
        Some(out.fields)
    }

    /// Hand each decoded field to the read items naming it.
    fn fan_out(&self, record: &Decoded) -> Result<(), CallbackError> {
        let mut result = Ok(());
        for (index, item) in self.items.iter().enumerate() {
            let Some(sibling) = &item.sim else {
                continue;
            };
            let DescriptorKind::Read(read) = &sibling.kind else {
                continue;
            };
            let Some(field) = record.get(&read.name) else {
                continue;
            };
            let extracted = match (field, read.position) {
                (FieldValue::Array(_), Some(position)) => match field.element(position) {
                    Some(scalar) => FieldValue::Scalar(scalar),
                    None => {
                        debug!("{}: no element {} in {}", item.id, position, read.name);
                        continue;
                    }
                },
                _ => field.clone(),
            };
            if let Err(e) = self.on_sim_value(index, sibling, &Value::Field(extracted)) {
                result = Err(e);
            }
        }
        result
    }

    fn drive_led(&self, iface: &HardwareInterface, value: &Value) {
        let InterfaceKind::Led { inverted, .. } = iface.kind else {
            return;
        };
        let Some(level) = value.level() else {
            debug!("{}: value has no level", iface.id);
            return;
        };
        let level = if inverted { i32::from(level == 0) } else { level };
        self.actions.actuate(iface.id.clone(), level);
    }

    fn on_device_change(&self, index: usize, iface: &HardwareInterface) -> Result<(), CallbackError> {
        let item = &self.items[index];
        let Some(value) = iface.value else {
            return Ok(());
        };
        let mut result = Ok(());

        if let Some(key) = &item.on_device_read {
            if let Some(callback) = self.callbacks.device_read(key) {
                let context = DeviceRead {
                    board: &self.id,
                    item: &item.id,
                    interface: iface,
                    value: &value,
                    actions: &self.actions,
                };
                result = callback(&context);
            }
        } else if let Some(descriptor) = &item.sim {
            let forward = match iface.tag() {
                // A release is not a simulator event.
                InterfaceTag::Button => value.value != 0,
                _ => true,
            };
            if forward && descriptor.as_write().is_some() {
                self.actions.trigger_sim(descriptor.id.clone(), value.value);
            }
        }

        if iface.tag() == InterfaceTag::Button {
            self.notify(item, &Value::Int(value.value));
        }
        result
    }

    fn notify(&self, item: &BoardItem, value: &Value) {
        let listener = self.listeners.borrow().get(&item.id).cloned();
        if let Some(listener) = listener {
            if let Err(e) = listener(&item.id, value) {
                warn!("listener for {} failed: {}", item.id, e);
            }
        }
    }
}

pub struct Board<H> {
    shared: Rc<BoardShared>,
    poller: DevicePoller<H>,
    /// Descriptor ids currently held in the registry.
    registered: Vec<String>,
}

impl<H: HidTransport> Board<H> {
    /// Build a board. Item ids must be unique.
    pub fn new(
        id: impl Into<String>,
        device: H,
        items: Vec<BoardItem>,
        callbacks: Rc<CallbackRegistry>,
    ) -> Result<Self, ConfigError> {
        for (i, item) in items.iter().enumerate() {
            if items[..i].iter().any(|other| other.id == item.id) {
                return Err(ConfigError::DuplicateId);
            }
        }

        let interfaces = items.iter().filter_map(|i| i.interface.clone()).collect();
        let shared = Rc::new(BoardShared {
            id: id.into(),
            items,
            listeners: RefCell::new(BTreeMap::new()),
            callbacks,
            actions: Actions::new(),
        });

        let mut poller = DevicePoller::new(device, interfaces);
        for (index, item) in shared.items.iter().enumerate() {
            let Some(iface) = &item.interface else {
                continue;
            };
            let board = Rc::clone(&shared);
            poller.on_change(iface.id.clone(), move |iface| board.on_device_change(index, iface));
        }

        Ok(Self {
            shared,
            poller,
            registered: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn items(&self) -> &[BoardItem] {
        &self.shared.items
    }

    pub fn poller(&self) -> &DevicePoller<H> {
        &self.poller
    }

    fn sim_callback(&self, index: usize) -> SimCallback {
        let board = Rc::clone(&self.shared);
        Rc::new(move |descriptor: &Descriptor, value: &Value| board.on_sim_value(index, descriptor, value))
    }

    /// Register every descriptor and open the device.
    ///
    /// On failure everything registered so far is removed again.
    pub async fn open<S: SimTransport>(&mut self, registry: &mut SimRegistry<S>) -> Result<(), Error> {
        let shared = Rc::clone(&self.shared);
        for (index, item) in shared.items.iter().enumerate() {
            let Some(descriptor) = &item.sim else {
                continue;
            };
            let mut descriptor = descriptor.clone();
            descriptor.callback = Some(self.sim_callback(index));
            let id = descriptor.id.clone();
            if let Err(e) = registry.register(descriptor).await {
                warn!("board {}: cannot register {}: {}", shared.id, item.id, e);
                self.unregister_all(registry).await;
                return Err(e);
            }
            self.registered.push(id);
        }

        if let Err(e) = self.poller.open().await {
            warn!("board {}: cannot open device: {}", shared.id, e);
            self.unregister_all(registry).await;
            return Err(e);
        }
        info!("board {} open, {} items", shared.id, shared.items.len());
        Ok(())
    }

    /// Close the device and remove every descriptor of this board.
    pub async fn close<S: SimTransport>(&mut self, registry: &mut SimRegistry<S>) {
        self.poller.close().await;
        self.unregister_all(registry).await;
        info!("board {} closed", self.shared.id);
    }

    async fn unregister_all<S: SimTransport>(&mut self, registry: &mut SimRegistry<S>) {
        for id in self.registered.drain(..) {
            if let Err(e) = registry.unregister(&id).await {
                warn!("unregister {} failed: {}", id, e);
            }
        }
    }

    /// Attach the UI listener for item `item`.
    pub fn on_change(
        &self,
        item: &str,
        listener: impl Fn(&str, &Value) -> Result<(), CallbackError> + 'static,
    ) -> Result<(), ConfigError> {
        self.attach(item, Rc::new(listener))
    }

    /// Attach `listener` to every item without one. Returns how many were
    /// attached.
    pub fn on_change_all(&self, listener: ItemListener) -> usize {
        self.shared
            .items
            .iter()
            .filter(|item| self.attach(&item.id, Rc::clone(&listener)).is_ok())
            .count()
    }

    fn attach(&self, item: &str, listener: ItemListener) -> Result<(), ConfigError> {
        if self.shared.item(item).is_none() {
            return Err(ConfigError::UnknownId);
        }
        let mut listeners = self.shared.listeners.borrow_mut();
        if listeners.contains_key(item) {
            warn!("listener for {} already exists", item);
            return Err(ConfigError::ListenerExists);
        }
        listeners.insert(item.into(), listener);
        Ok(())
    }

    pub fn off_change(&self, item: &str) -> bool {
        self.shared.listeners.borrow_mut().remove(item).is_some()
    }

    /// Drive an item from outside: LEDs through the poller, write
    /// descriptors through the registry.
    pub async fn trigger<S: SimTransport>(
        &mut self,
        item: &str,
        value: i32,
        registry: &mut SimRegistry<S>,
    ) -> Result<(), Error> {
        let shared = Rc::clone(&self.shared);
        let item = shared.item(item).ok_or(ConfigError::UnknownId)?;

        if let Some(iface) = item.interface.as_ref().filter(|i| i.tag() == InterfaceTag::Led) {
            self.poller.trigger(&iface.id, value).await?;
            return Ok(());
        }
        match &item.sim {
            Some(descriptor) if descriptor.as_write().is_some() => registry.trigger(&descriptor.id, value).await,
            _ => Err(ConfigError::NotTriggerable.into()),
        }
    }

    /// Trigger a write item by the name of one of its positions.
    pub async fn trigger_named<S: SimTransport>(
        &mut self,
        item: &str,
        position: &str,
        registry: &mut SimRegistry<S>,
    ) -> Result<(), Error> {
        let value = self
            .shared
            .item(item)
            .ok_or(ConfigError::UnknownId)?
            .sim
            .as_ref()
            .and_then(Descriptor::as_write)
            .ok_or(ConfigError::NotTriggerable)?
            .value_of(position)
            .ok_or(ConfigError::UnknownId)?;
        self.trigger(item, value, registry).await
    }

    /// Poll the device once and run the actions listeners queued.
    pub async fn poll<S: SimTransport>(&mut self, registry: &mut SimRegistry<S>) -> Result<usize, Error> {
        let changes = self.poller.poll_once().await?;
        self.flush_actions(registry).await;
        Ok(changes)
    }

    /// Execute queued actions. Failures are logged. Returns the number of
    /// actions executed.
    pub async fn flush_actions<S: SimTransport>(&mut self, registry: &mut SimRegistry<S>) -> usize {
        let mut executed = 0;
        while let Some(action) = self.shared.actions.take() {
            let outcome = match &action {
                Action::TriggerSim { id, value } => registry.trigger(id, *value).await,
                Action::Actuate { interface, value } => self.poller.trigger(interface, *value).await.map(|_| ()),
                Action::Report(frame) => self.poller.send_report(frame).await.map(|_| ()),
            };
            if let Err(e) = outcome {
                warn!("board {}: {:?} failed: {}", self.shared.id, action, e);
            }
            executed += 1;
        }
        executed
    }

    pub fn pending_actions(&self) -> usize {
        self.shared.actions.len()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::descriptor::{ReadDescriptor, WriteDescriptor};
    use crate::interface::SwitchPosition;
    use crate::test_support::{block_on, MockHid, MockSim, SimCall};
    use crate::transport::SimEvent;
    use alloc::vec;
    use panel_proto::hid::CMD_TRIGGER_PIN;
    use panel_proto::{ElementType, Field, Layout, Scalar};

    type Seen = Rc<RefCell<Vec<(String, Value)>>>;

    fn capture(board: &Board<MockHid>) -> Seen {
        let seen: Seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        board.on_change_all(Rc::new(move |item: &str, value: &Value| {
            sink.borrow_mut().push((item.into(), value.clone()));
            Ok::<(), CallbackError>(())
        }));
        seen
    }

    fn foo_layout() -> Layout {
        Layout::new(vec![
            Field::new("FOO", ElementType::Boolean).repeat(3),
            Field::new("BAR", ElementType::Int16),
        ])
    }

    fn data_item(handle: u32) -> BoardItem {
        BoardItem::new("block").sim(Descriptor::new(
            "block",
            handle,
            DataDescriptor::new("area", 1, 2, 0).layout(foo_layout()),
        ))
    }

    fn read_item(id: &str, name: &str, position: Option<usize>) -> BoardItem {
        let mut read = ReadDescriptor::new(name);
        read.position = position;
        BoardItem::new(id).sim(Descriptor::new(id, 100, read))
    }

    fn setup(items: Vec<BoardItem>) -> (Board<MockHid>, SimRegistry<MockSim>, MockHid) {
        setup_with(items, Rc::new(CallbackRegistry::new()))
    }

    fn setup_with(
        items: Vec<BoardItem>,
        callbacks: Rc<CallbackRegistry>,
    ) -> (Board<MockHid>, SimRegistry<MockSim>, MockHid) {
        let hid = MockHid::new();
        let mut registry = SimRegistry::new(MockSim::new());
        let mut board = Board::new("fmc", hid.clone(), items, callbacks).unwrap();
        block_on(board.open(&mut registry)).unwrap();
        block_on(registry.connect()).unwrap();
        (board, registry, hid)
    }

    #[test]
    fn test_fan_out_by_position() {
        let (board, registry, _hid) = setup(vec![
            data_item(1),
            read_item("foo0", "FOO", Some(0)),
            read_item("foo1", "FOO", Some(1)),
            read_item("foo2", "FOO", Some(2)),
            read_item("other", "BAZ", None),
        ]);
        let seen = capture(&board);

        let dispatch = registry.dispatch(&SimEvent::ClientData {
            handle: 1,
            data: vec![1, 0, 1, 0, 0],
        });
        assert_eq!(dispatch, crate::registry::Dispatch::Delivered);

        let seen = seen.borrow();
        let scalar = |b| Value::Field(FieldValue::Scalar(Scalar::Bool(b)));
        assert_eq!(
            *seen,
            [
                (String::from("foo0"), scalar(true)),
                (String::from("foo1"), scalar(false)),
                (String::from("foo2"), scalar(true)),
            ]
        );
        assert!(seen.iter().all(|(id, _)| id != "other"));
    }

    #[test]
    fn test_fan_out_whole_field_without_position() {
        let (board, registry, _hid) = setup(vec![data_item(1), read_item("bar", "BAR", None)]);
        let seen = capture(&board);

        let mut data = vec![0, 0, 0];
        data.extend_from_slice(&(-7i16).to_le_bytes());
        registry.dispatch(&SimEvent::ClientData { handle: 1, data });

        assert_eq!(
            *seen.borrow(),
            [(String::from("bar"), Value::Field(FieldValue::Scalar(Scalar::I16(-7))))]
        );
    }

    #[test]
    fn test_read_item_drives_inverted_led() {
        let (mut board, mut registry, hid) = setup(vec![
            data_item(1),
            read_item("exec", "FOO", Some(0)).interface(HardwareInterface::led("l_exec", 4)),
            read_item("msg", "FOO", Some(1)).interface(HardwareInterface::inverted_led("l_msg", 5)),
        ]);

        registry.dispatch(&SimEvent::ClientData {
            handle: 1,
            data: vec![1, 1, 0, 0, 0],
        });
        assert_eq!(board.pending_actions(), 2);
        assert_eq!(block_on(board.flush_actions(&mut registry)), 2);

        assert_eq!(
            hid.requests(),
            vec![vec![CMD_TRIGGER_PIN, 4, 1], vec![CMD_TRIGGER_PIN, 5, 0]]
        );
        assert_eq!(board.poller().interface("l_msg").unwrap().current(), Some(0));
    }

    #[test]
    fn test_wide_fan_out_drives_every_led() {
        const LEDS: usize = 40;
        let mut items = vec![BoardItem::new("lamps").sim(Descriptor::new(
            "lamps",
            1,
            DataDescriptor::new("area", 1, 2, 0)
                .layout(Layout::new(vec![Field::new("LAMP", ElementType::Boolean).repeat(LEDS)])),
        ))];
        for n in 0..LEDS {
            let id = alloc::format!("lamp{}", n);
            items.push(read_item(&id, "LAMP", Some(n)).interface(HardwareInterface::led(id.clone(), n as u16)));
        }
        let (mut board, mut registry, hid) = setup(items);

        registry.dispatch(&SimEvent::ClientData {
            handle: 1,
            data: vec![1; LEDS],
        });
        assert_eq!(board.pending_actions(), LEDS);
        assert_eq!(block_on(board.flush_actions(&mut registry)), LEDS);

        let requests = hid.requests();
        assert_eq!(requests.len(), LEDS);
        for (n, request) in requests.iter().enumerate() {
            assert_eq!(request, &vec![CMD_TRIGGER_PIN, n as u8, 1]);
        }
        assert_eq!(board.pending_actions(), 0);
    }

    #[test]
    fn test_button_press_forwards_to_sim() {
        let (mut board, mut registry, hid) = setup(vec![BoardItem::new("exec")
            .interface(HardwareInterface::button("b_exec", 0))
            .sim(Descriptor::new("cdu_exec", 7, WriteDescriptor::new(69632 + 556)))]);
        let seen = capture(&board);
        let log = registry.transport().log();

        hid.respond(&[0, 1]);
        hid.respond(&[0, 0]);
        block_on(board.poll(&mut registry)).unwrap();
        block_on(board.poll(&mut registry)).unwrap();

        let transmits: Vec<_> = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, SimCall::Transmit(..)))
            .cloned()
            .collect();
        assert_eq!(transmits, [SimCall::Transmit("cdu_exec".into(), 1)]);
        assert_eq!(
            *seen.borrow(),
            [(String::from("exec"), Value::Int(1)), (String::from("exec"), Value::Int(0))]
        );
    }

    #[test]
    fn test_switch_forwards_every_position() {
        let switch = HardwareInterface::switch(
            "s_bat",
            vec![SwitchPosition::new("ON", 1).at(1), SwitchPosition::new("OFF", 0)],
        );
        let (mut board, mut registry, hid) = setup(vec![BoardItem::new("bat")
            .interface(switch)
            .sim(Descriptor::new("bat_sw", 3, WriteDescriptor::new(69633)))]);
        let seen = capture(&board);
        let log = registry.transport().log();

        hid.respond(&[0, 0b10]);
        hid.respond(&[0, 0b00]);
        block_on(board.poll(&mut registry)).unwrap();
        block_on(board.poll(&mut registry)).unwrap();

        let values: Vec<i32> = log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                SimCall::Transmit(_, v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(values, [1, 0]);
        // Only buttons reach the UI from the hardware side.
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_device_read_callback_replaces_forwarding() {
        let callbacks = Rc::new(CallbackRegistry::new());
        callbacks.register_device_read("double", |ctx| {
            ctx.actions.trigger_sim("cdu_exec", ctx.value.value * 2);
            Ok(())
        });
        let (mut board, mut registry, hid) = setup_with(
            vec![BoardItem::new("exec")
                .interface(HardwareInterface::button("b_exec", 0))
                .sim(Descriptor::new("cdu_exec", 7, WriteDescriptor::new(1)))
                .on_device_read("double")],
            callbacks,
        );
        let log = registry.transport().log();

        hid.respond(&[0, 1]);
        block_on(board.poll(&mut registry)).unwrap();
        assert_eq!(log.borrow().last(), Some(&SimCall::Transmit("cdu_exec".into(), 2)));
    }

    #[test]
    fn test_missing_callback_is_not_fatal() {
        let (board, registry, _hid) = setup(vec![
            data_item(1).on_sim_read("nowhere"),
            read_item("foo0", "FOO", Some(0)),
        ]);
        let seen = capture(&board);

        let dispatch = registry.dispatch(&SimEvent::ClientData {
            handle: 1,
            data: vec![1, 0, 0, 0, 0],
        });
        assert_eq!(dispatch, crate::registry::Dispatch::Delivered);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_sim_read_callback_gets_record() {
        let callbacks = Rc::new(CallbackRegistry::new());
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        callbacks.register_sim_read("screen", move |ctx| {
            if let Value::Record(record) = ctx.value {
                *sink.borrow_mut() = record.get("BAR").cloned();
            }
            Ok(())
        });
        let (_board, registry, _hid) = setup_with(vec![data_item(1).on_sim_read("screen")], callbacks);

        registry.dispatch(&SimEvent::ClientData {
            handle: 1,
            data: vec![0, 0, 0, 9, 0],
        });
        assert_eq!(*got.borrow(), Some(FieldValue::Scalar(Scalar::I16(9))));
    }

    #[test]
    fn test_listener_error_does_not_stop_fan_out() {
        let (board, registry, _hid) = setup(vec![
            data_item(1),
            read_item("foo0", "FOO", Some(0)),
            read_item("foo1", "FOO", Some(1)),
        ]);
        board
            .on_change("foo0", |_, _| Err(CallbackError::new("ui gone")))
            .unwrap();
        let seen = capture(&board);

        registry.dispatch(&SimEvent::ClientData {
            handle: 1,
            data: vec![0, 1, 0, 0, 0],
        });
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].0, "foo1");
    }

    #[test]
    fn test_short_block_still_fans_out_covered_fields() {
        let (board, registry, _hid) = setup(vec![
            data_item(1),
            read_item("foo0", "FOO", Some(0)),
            read_item("bar", "BAR", None),
        ]);
        let seen = capture(&board);

        registry.dispatch(&SimEvent::ClientData {
            handle: 1,
            data: vec![1, 0],
        });
        let seen = seen.borrow();
        assert_eq!(seen[0], (String::from("foo0"), Value::Field(FieldValue::Scalar(Scalar::Bool(true)))));
        assert_eq!(seen[1], (String::from("bar"), Value::Field(FieldValue::Array(Vec::new()))));
    }

    #[test]
    fn test_trigger_routing() {
        let (mut board, mut registry, hid) = setup(vec![
            BoardItem::new("exec_light").interface(HardwareInterface::led("l_exec", 2)),
            BoardItem::new("exec").sim(Descriptor::new("cdu_exec", 7, WriteDescriptor::new(1))),
            read_item("foo0", "FOO", Some(0)),
            BoardItem::new("label"),
        ]);

        block_on(board.trigger("exec_light", 1, &mut registry)).unwrap();
        assert_eq!(hid.requests().last(), Some(&vec![CMD_TRIGGER_PIN, 2, 1]));

        block_on(board.trigger("exec", 4, &mut registry)).unwrap();
        assert_eq!(
            registry.transport().log().borrow().last(),
            Some(&SimCall::Transmit("cdu_exec".into(), 4))
        );

        assert_eq!(
            block_on(board.trigger("foo0", 1, &mut registry)),
            Err(Error::Config(ConfigError::NotTriggerable))
        );
        assert_eq!(
            block_on(board.trigger("label", 1, &mut registry)),
            Err(Error::Config(ConfigError::NotTriggerable))
        );
        assert_eq!(
            block_on(board.trigger("missing", 1, &mut registry)),
            Err(Error::Config(ConfigError::UnknownId))
        );
    }

    #[test]
    fn test_trigger_named_position() {
        let (mut board, mut registry, _hid) = setup(vec![BoardItem::new("bat").sim(Descriptor::new(
            "bat_sw",
            3,
            WriteDescriptor::new(69633).value("ON", 1).value("OFF", 0),
        ))]);
        block_on(board.trigger_named("bat", "OFF", &mut registry)).unwrap();
        assert_eq!(
            registry.transport().log().borrow().last(),
            Some(&SimCall::Transmit("bat_sw".into(), 0))
        );
        assert!(block_on(board.trigger_named("bat", "STBY", &mut registry)).is_err());
    }

    #[test]
    fn test_duplicate_item_ids_rejected() {
        let items = vec![BoardItem::new("a"), BoardItem::new("a")];
        assert!(matches!(
            Board::new("fmc", MockHid::new(), items, Rc::new(CallbackRegistry::new())),
            Err(ConfigError::DuplicateId)
        ));
    }

    #[test]
    fn test_open_rolls_back_on_device_failure() {
        let hid = MockHid::new();
        hid.fail_open();
        let mut registry = SimRegistry::new(MockSim::new());
        let mut board = Board::new(
            "fmc",
            hid,
            vec![data_item(1), read_item("foo0", "FOO", Some(0))],
            Rc::new(CallbackRegistry::new()),
        )
        .unwrap();

        assert!(block_on(board.open(&mut registry)).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_open_rolls_back_on_duplicate_descriptor() {
        let mut registry = SimRegistry::new(MockSim::new());
        block_on(registry.register(Descriptor::new("foo1", 5, ReadDescriptor::new("X")))).unwrap();
        let mut board = Board::new(
            "fmc",
            MockHid::new(),
            vec![read_item("foo0", "FOO", Some(0)), read_item("foo1", "FOO", Some(1))],
            Rc::new(CallbackRegistry::new()),
        )
        .unwrap();

        assert_eq!(
            block_on(board.open(&mut registry)),
            Err(Error::Config(ConfigError::DuplicateId))
        );
        assert!(!registry.contains("foo0"));
        assert!(registry.contains("foo1"));
    }

    #[test]
    fn test_open_rolls_back_on_subscribe_failure() {
        let mut sim = MockSim::new();
        sim.fail_subscribe("foo1");
        let mut registry = SimRegistry::new(sim);
        block_on(registry.connect()).unwrap();
        let hid = MockHid::new();
        let mut board = Board::new(
            "fmc",
            hid.clone(),
            vec![read_item("foo0", "FOO", Some(0)), read_item("foo1", "FOO", Some(1))],
            Rc::new(CallbackRegistry::new()),
        )
        .unwrap();

        assert_eq!(
            block_on(board.open(&mut registry)),
            Err(Error::Transport(crate::error::TransportError::Io))
        );
        assert!(registry.is_empty());
        assert!(!hid.is_open());
    }

    #[test]
    fn test_close_unregisters() {
        let (mut board, mut registry, hid) = setup(vec![data_item(1), read_item("foo0", "FOO", Some(0))]);
        assert_eq!(registry.len(), 2);
        block_on(board.close(&mut registry));
        assert!(registry.is_empty());
        assert!(!hid.is_open());
    }

    #[test]
    fn test_listener_exists() {
        let (board, _registry, _hid) = setup(vec![read_item("foo0", "FOO", Some(0))]);
        board.on_change("foo0", |_, _| Ok(())).unwrap();
        assert_eq!(board.on_change("foo0", |_, _| Ok(())), Err(ConfigError::ListenerExists));
        assert_eq!(board.on_change("nope", |_, _| Ok(())), Err(ConfigError::UnknownId));
        assert!(board.off_change("foo0"));
    }
}
