//! In-memory transports and a minimal executor for unit tests.

extern crate std;

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use crate::descriptor::Descriptor;
use crate::error::TransportError;
use crate::transport::{DeviceProvider, HidTransport, SimEvent, SimTransport};

// Helper to run a future to completion (simple blocking executor)
pub fn block_on<F: Future>(mut f: F) -> F::Output {
    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);

    // SAFETY: We don't move f after pinning
    let mut f = unsafe { Pin::new_unchecked(&mut f) };

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {
                panic!("Mock future returned Pending unexpectedly");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    Connect,
    Disconnect,
    Subscribe(String),
    Unsubscribe(String),
    Transmit(String, i32),
}

/// Simulator mock that records every call.
#[derive(Default)]
pub struct MockSim {
    connected: bool,
    log: Rc<RefCell<Vec<SimCall>>>,
    failing: Vec<String>,
    events: VecDeque<SimEvent>,
}

impl MockSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Rc<RefCell<Vec<SimCall>>> {
        Rc::clone(&self.log)
    }

    /// Make subscribing `id` fail.
    pub fn fail_subscribe(&mut self, id: &str) {
        self.failing.push(id.into());
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    pub fn push_event(&mut self, event: SimEvent) {
        self.events.push_back(event);
    }
}

impl SimTransport for MockSim {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.log.borrow_mut().push(SimCall::Connect);
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.log.borrow_mut().push(SimCall::Disconnect);
        self.connected = false;
    }

    async fn subscribe(&mut self, descriptor: &Descriptor) -> Result<(), TransportError> {
        if self.failing.contains(&descriptor.id) {
            return Err(TransportError::Io);
        }
        self.log.borrow_mut().push(SimCall::Subscribe(descriptor.id.clone()));
        Ok(())
    }

    async fn unsubscribe(&mut self, descriptor: &Descriptor) -> Result<(), TransportError> {
        self.log.borrow_mut().push(SimCall::Unsubscribe(descriptor.id.clone()));
        Ok(())
    }

    async fn transmit(&mut self, descriptor: &Descriptor, value: i32) -> Result<(), TransportError> {
        self.log
            .borrow_mut()
            .push(SimCall::Transmit(descriptor.id.clone(), value));
        Ok(())
    }

    async fn next_event(&mut self) -> Result<SimEvent, TransportError> {
        self.events.pop_front().ok_or(TransportError::NotConnected)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[derive(Default)]
struct HidState {
    open: bool,
    fail_open: bool,
    responses: VecDeque<Result<Vec<u8>, TransportError>>,
    requests: Vec<Vec<u8>>,
}

/// Panel mock. Clones share state, so a test can keep a handle after the
/// device has been moved into a poller.
#[derive(Clone, Default)]
pub struct MockHid {
    state: Rc<RefCell<HidState>>,
}

impl MockHid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response frame. With nothing queued the device answers `[0]`.
    pub fn respond(&self, frame: &[u8]) {
        self.state.borrow_mut().responses.push_back(Ok(frame.to_vec()));
    }

    pub fn respond_err(&self, err: TransportError) {
        self.state.borrow_mut().responses.push_back(Err(err));
    }

    pub fn fail_open(&self) {
        self.state.borrow_mut().fail_open = true;
    }

    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.state.borrow().requests.clone()
    }
}

impl HidTransport for MockHid {
    async fn open(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if state.fail_open {
            return Err(TransportError::Io);
        }
        state.open = true;
        Ok(())
    }

    async fn close(&mut self) {
        self.state.borrow_mut().open = false;
    }

    async fn exchange(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.to_vec());
        state.responses.pop_front().unwrap_or_else(|| Ok(vec![0]))
    }

    fn is_open(&self) -> bool {
        self.state.borrow().open
    }
}

/// Hands out clones of one [`MockHid`].
#[derive(Default)]
pub struct MockProvider {
    pub device: MockHid,
    pub opened: Vec<(u16, u16)>,
}

impl DeviceProvider for MockProvider {
    type Device = MockHid;

    fn device(&mut self, vendor_id: u16, product_id: u16) -> Result<MockHid, TransportError> {
        if vendor_id == 0 || product_id == 0 {
            return Err(TransportError::InvalidDevice);
        }
        self.opened.push((vendor_id, product_id));
        Ok(self.device.clone())
    }
}
