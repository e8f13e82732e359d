use embassy_executor::Spawner;
use log::{debug, error, info};
use sim_panel_bridge::{fmc, BridgeConfig, LoopbackBridge, LoopbackProvider, MockSimConfig, MockSimulator};

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::init();
    info!("sim-panel-bridge starting...");

    let mut provider = LoopbackProvider::new();
    provider.attach(fmc::VENDOR_ID, fmc::PRODUCT_ID);

    let mut bridge = LoopbackBridge::new(
        MockSimulator::new(MockSimConfig::default()),
        provider,
        BridgeConfig::default(),
    );
    fmc::install_callbacks(bridge.callbacks());

    if let Err(e) = bridge
        .register_board("fmc", fmc::VENDOR_ID, fmc::PRODUCT_ID, fmc::board_items())
        .await
    {
        error!("Failed to register board: {}", e);
        return;
    }

    let listener = bridge.on_change("fmc", |item, value| {
        debug!("fmc: {} changed to {:?}", item, value);
        Ok(())
    });
    if let Err(e) = listener {
        error!("Failed to attach listener: {}", e);
    }

    match bridge.connect_simulator().await {
        Ok(n) => info!("Simulator connected, {} descriptors subscribed", n),
        Err(e) => error!("Simulator connection failed: {}", e),
    }

    bridge.run().await
}
