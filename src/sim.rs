//! In-process simulator for running without a flight simulator.
//!
//! Subscribed data descriptors are broadcast once per period: CDU screen
//! areas get a static IDENT page, layout-described areas get a block whose
//! boolean fields toggle every broadcast. Transmitted events are logged and
//! recorded.

use std::collections::VecDeque;

use embassy_time::{Duration, Instant, Timer};
use log::{debug, info};
use panel_core::{Descriptor, DescriptorKind, SimEvent, SimTransport, TransportError, CDU_SCREEN_PARSER};
use panel_proto::{CellColor, ElementType, Layout, ScreenBuffer, SCREEN_SIZE};

/// IDENT page as `(row, column, text)`.
const IDENT_PAGE: &[(usize, usize, &[u8])] = &[
    (0, 8, b"IDENT"),
    (0, 21, b"1/2"),
    (1, 1, b"MODEL"),
    (2, 0, b"737-800W"),
    (12, 0, b"<INDEX"),
    (12, 15, b"POS INIT>"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSimConfig {
    /// Time between data broadcasts.
    pub period: Duration,
}

impl MockSimConfig {
    pub const DEFAULT: Self = Self {
        period: Duration::from_secs(1),
    };
}

impl Default for MockSimConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub struct MockSimulator {
    config: MockSimConfig,
    connected: bool,
    subscribed: Vec<Descriptor>,
    queue: VecDeque<SimEvent>,
    transmitted: Vec<(String, i32)>,
    next_broadcast: Instant,
    tick: u32,
}

impl MockSimulator {
    pub fn new(config: MockSimConfig) -> Self {
        Self {
            config,
            connected: false,
            subscribed: Vec::new(),
            queue: VecDeque::new(),
            transmitted: Vec::new(),
            next_broadcast: Instant::now(),
            tick: 0,
        }
    }

    /// Queue an event as if the simulator had sent it.
    pub fn inject(&mut self, event: SimEvent) {
        self.queue.push_back(event);
    }

    /// `(descriptor id, value)` for every transmit so far.
    pub fn transmitted(&self) -> &[(String, i32)] {
        &self.transmitted
    }

    pub fn subscribed(&self) -> impl Iterator<Item = &str> {
        self.subscribed.iter().map(|d| d.id.as_str())
    }

    /// Queue one data block per subscribed data descriptor.
    pub fn broadcast(&mut self) {
        for descriptor in &self.subscribed {
            let DescriptorKind::Data(data) = &descriptor.kind else {
                continue;
            };
            let block = if data.parser.as_deref() == Some(CDU_SCREEN_PARSER) {
                ident_screen()
            } else if let Some(layout) = &data.layout {
                layout_block(layout, self.tick)
            } else {
                vec![0; data.size]
            };
            self.queue.push_back(SimEvent::ClientData {
                handle: descriptor.handle,
                data: block,
            });
        }
        self.tick = self.tick.wrapping_add(1);
    }
}

fn ident_screen() -> Vec<u8> {
    let mut screen = ScreenBuffer::blank();
    for &(row, col, text) in IDENT_PAGE {
        screen.put_str(row, col, text, CellColor::White);
    }
    screen.powered = true;

    let mut out = [0u8; SCREEN_SIZE];
    screen.encode(&mut out);
    out.to_vec()
}

/// Block for `layout` with every boolean set to `(tick + index) % 2`.
fn layout_block(layout: &Layout, tick: u32) -> Vec<u8> {
    let mut out = vec![0u8; layout.size()];
    let mut offset = 0;
    for field in layout.fields() {
        if field.element == ElementType::Boolean {
            for i in 0..field.repeat {
                out[offset + i] = ((tick as usize + i) % 2) as u8;
            }
        }
        offset += field.byte_size();
    }
    out
}

impl SimTransport for MockSimulator {
    async fn connect(&mut self) -> Result<(), TransportError> {
        info!("mock simulator connected");
        self.connected = true;
        self.next_broadcast = Instant::now() + self.config.period;
        Ok(())
    }

    async fn disconnect(&mut self) {
        info!("mock simulator disconnected");
        self.connected = false;
        self.subscribed.clear();
        self.queue.clear();
    }

    async fn subscribe(&mut self, descriptor: &Descriptor) -> Result<(), TransportError> {
        debug!("mock simulator: subscribe {}", descriptor.id);
        self.subscribed.push(descriptor.clone());
        Ok(())
    }

    async fn unsubscribe(&mut self, descriptor: &Descriptor) -> Result<(), TransportError> {
        self.subscribed.retain(|d| d.id != descriptor.id);
        Ok(())
    }

    async fn transmit(&mut self, descriptor: &Descriptor, value: i32) -> Result<(), TransportError> {
        info!("mock simulator: {} <- {}", descriptor.id, value);
        self.transmitted.push((descriptor.id.clone(), value));
        Ok(())
    }

    async fn next_event(&mut self) -> Result<SimEvent, TransportError> {
        loop {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            if let Some(event) = self.queue.pop_front() {
                return Ok(event);
            }
            Timer::at(self.next_broadcast).await;
            self.next_broadcast += self.config.period;
            self.broadcast();
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
