//! End-to-end runs of the CDU board over the loopback transports.

use std::cell::RefCell;
use std::rc::Rc;

use embassy_futures::block_on;
use panel_core::{Activity, Dispatch, HidTransport, SimTransport, CDU_SCREEN_FIELD};
use panel_proto::pmdg::EVT_CDU_L_EXEC;
use panel_proto::{FieldValue, PmdgGlyphs};
use sim_panel_bridge::{
    fmc, BridgeConfig, LoopbackBridge, LoopbackPanel, LoopbackProvider, MockSimConfig, MockSimulator, SimEvent, Value,
};

fn setup() -> (LoopbackBridge, LoopbackPanel) {
    let mut provider = LoopbackProvider::new();
    let panel = provider.attach(fmc::VENDOR_ID, fmc::PRODUCT_ID);
    let mut bridge = LoopbackBridge::new(
        MockSimulator::new(MockSimConfig::default()),
        provider,
        BridgeConfig::default(),
    );
    fmc::install_callbacks(bridge.callbacks());
    block_on(bridge.register_board("fmc", fmc::VENDOR_ID, fmc::PRODUCT_ID, fmc::board_items())).unwrap();
    block_on(bridge.connect_simulator()).unwrap();
    (bridge, panel)
}

#[test]
fn test_key_press_reaches_simulator() {
    let (mut bridge, panel) = setup();

    // First poll records the idle state.
    block_on(bridge.poll_devices());
    panel.press(4);
    block_on(bridge.poll_devices());
    panel.release(4);
    block_on(bridge.poll_devices());

    let sim = bridge.registry().transport();
    assert_eq!(sim.transmitted(), [(String::from("key_exec"), 1)]);
    let descriptor = bridge.registry().descriptor("key_exec").unwrap();
    assert_eq!(descriptor.as_write().unwrap().event, EVT_CDU_L_EXEC);
}

#[test]
fn test_annunciators_follow_data() {
    let (mut bridge, panel) = setup();
    let handle = bridge.registry().descriptor("PMDG_NG3_Data").unwrap().handle;

    // EXEC and FAIL lit on the captain side.
    let data = vec![1, 0, 0, 1, 1, 0, 0, 0, 0, 0, 64, 64];
    let dispatch = block_on(bridge.handle_sim_event(&SimEvent::ClientData { handle, data }));

    assert_eq!(dispatch, Dispatch::Delivered);
    assert_eq!(panel.level(32), Some(true));
    assert_eq!(panel.level(33), Some(false));
    assert_eq!(panel.level(34), Some(true));
    assert_eq!(panel.level(35), Some(false));
}

#[test]
fn test_screen_reaches_listener() {
    let (mut bridge, _panel) = setup();
    let screen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&screen);
    bridge
        .on_change("fmc", move |item, value| {
            if item == CDU_SCREEN_FIELD {
                *sink.borrow_mut() = Some(value.clone());
            }
            Ok(())
        })
        .unwrap();

    bridge.registry_mut().transport_mut().broadcast();
    for _ in 0..8 {
        if screen.borrow().is_some() {
            break;
        }
        if let Activity::SimError(e) = block_on(bridge.run_once()) {
            panic!("simulator error {}", e);
        }
    }

    let value = screen.borrow_mut().take();
    match value {
        Some(Value::Field(FieldValue::Screen(screen))) => {
            assert!(screen.powered);
            assert!(screen.line(0, &PmdgGlyphs).contains("IDENT"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unregister_board_unsubscribes() {
    let (mut bridge, panel) = setup();
    assert!(bridge.registry().transport().subscribed().count() > 0);

    block_on(bridge.unregister_board("fmc")).unwrap();
    assert_eq!(bridge.registry().transport().subscribed().count(), 0);
    assert!(bridge.registry().is_empty());
    assert!(!panel.is_open());
}

#[test]
fn test_close_disconnects() {
    let (mut bridge, _panel) = setup();
    block_on(bridge.close());
    assert!(!bridge.registry().transport().is_connected());
}
