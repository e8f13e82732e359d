//! Side effects requested from inside callbacks.
//!
//! Callbacks run synchronously while an event is being dispatched and
//! cannot await transport I/O. They queue an [`Action`] instead; the board
//! drains the queue once dispatch has returned.
//!
//! The queue is unbounded: one data block may fan out to every item of a
//! board, and none of those actions may be lost.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Transmit `value` through the write descriptor `id`.
    TriggerSim { id: String, value: i32 },
    /// Drive the LED interface `interface`.
    Actuate { interface: String, value: i32 },
    /// Send a raw request frame to the panel.
    Report(Vec<u8>),
}

pub struct Actions {
    queue: Mutex<NoopRawMutex, RefCell<VecDeque<Action>>>,
}

impl Default for Actions {
    fn default() -> Self {
        Self::new()
    }
}

impl Actions {
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn trigger_sim(&self, id: impl Into<String>, value: i32) {
        self.push(Action::TriggerSim {
            id: id.into(),
            value,
        });
    }

    pub fn actuate(&self, interface: impl Into<String>, value: i32) {
        self.push(Action::Actuate {
            interface: interface.into(),
            value,
        });
    }

    pub fn send_report(&self, frame: Vec<u8>) {
        self.push(Action::Report(frame));
    }

    pub fn push(&self, action: Action) {
        self.queue.lock(|q| q.borrow_mut().push_back(action));
    }

    /// Next queued action, oldest first.
    pub fn take(&self) -> Option<Action> {
        self.queue.lock(|q| q.borrow_mut().pop_front())
    }

    pub fn len(&self) -> usize {
        self.queue.lock(|q| q.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock(|q| q.borrow().is_empty())
    }
}
