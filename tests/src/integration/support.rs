//! Test fixtures for the integration flows: fake category services, a
//! recording container runtime, and a fully wired orchestrator harness.

use async_trait::async_trait;
use shared_bus::{EventPublisher, InMemoryEventBus, LabEvent};
use shared_types::{
    AdapterError, ChainImplementation, ChainNode, ChainPorts, LabError, LightningImplementation,
    LightningNode, LightningPorts, MilliSats, Network, NetworkId, PollConfig, Sats, Status,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use voltlab_chain::{ChainInfo, ChainService, ChainServiceFactory, WalletInfo};
use voltlab_lightning::{
    BalanceSnapshot, ChannelInfo, DecodedInvoice, LightningNodeInfo, LightningService,
    LightningServiceFactory, OpenChannelOutcome, PaymentOutcome,
};
use voltlab_orchestrator::{
    ContainerRuntime, NetworkOrchestrator, NetworkStore, NodePorts, Persistence, PortAllocator,
};
use voltlab_tap::TapServiceFactory;

/// Fully wired orchestrator with fake collaborators, all handles exposed.
pub struct Harness {
    pub store: Arc<NetworkStore>,
    pub bus: Arc<InMemoryEventBus>,
    pub runtime: Arc<RecordingRuntime>,
    pub chain: Arc<FakeChainService>,
    pub lightning: Arc<FakeLightningService>,
    pub chain_factory: Arc<ChainServiceFactory>,
    pub lightning_factory: Arc<LightningServiceFactory>,
    pub orchestrator: NetworkOrchestrator,
}

/// Build a harness with every Lightning implementation mapped to one
/// shared fake.
pub fn harness() -> Harness {
    let store = Arc::new(NetworkStore::new());
    let bus = Arc::new(InMemoryEventBus::new());
    let runtime = Arc::new(RecordingRuntime::new());
    let chain = Arc::new(FakeChainService::with_bus(Arc::clone(&bus)));
    let lightning = Arc::new(FakeLightningService::new());

    let mut chain_services: HashMap<ChainImplementation, Arc<dyn ChainService>> = HashMap::new();
    chain_services.insert(ChainImplementation::Bitcoind, Arc::clone(&chain) as _);
    chain_services.insert(ChainImplementation::Btcd, Arc::clone(&chain) as _);
    let chain_factory = Arc::new(ChainServiceFactory::with_services(chain_services));

    let mut ln_services: HashMap<LightningImplementation, Arc<dyn LightningService>> =
        HashMap::new();
    for implementation in [
        LightningImplementation::Lnd,
        LightningImplementation::CoreLightning,
        LightningImplementation::Eclair,
        LightningImplementation::Litd,
    ] {
        ln_services.insert(implementation, Arc::clone(&lightning) as _);
    }
    let lightning_factory = Arc::new(LightningServiceFactory::with_services(ln_services));

    let orchestrator = NetworkOrchestrator::new(
        Arc::clone(&store),
        Arc::clone(&runtime) as _,
        Arc::new(NoConflictPorts) as _,
        Arc::new(NullPersistence) as _,
        Arc::clone(&chain_factory),
        Arc::clone(&lightning_factory),
        Arc::new(TapServiceFactory::with_services(HashMap::new())),
        Arc::clone(&bus) as _,
    );
    Harness {
        store,
        bus,
        runtime,
        chain,
        lightning,
        chain_factory,
        lightning_factory,
        orchestrator,
    }
}

/// Seed a network with chain and Lightning nodes, all Stopped, every
/// Lightning node backed by the first chain node.
pub fn seed_network(
    store: &NetworkStore,
    chain_names: &[&str],
    lightning: &[(&str, LightningImplementation)],
) -> NetworkId {
    let id = store.create("lab");
    store
        .update(id, |network| {
            for (i, name) in chain_names.iter().enumerate() {
                network.chain.push(ChainNode {
                    name: (*name).to_string(),
                    network_id: id,
                    implementation: ChainImplementation::Bitcoind,
                    version: "27.0".to_string(),
                    status: Status::Stopped,
                    ports: ChainPorts {
                        rpc: 18443 + i as u16,
                        p2p: 19444 + i as u16,
                        zmq_block: 28334 + i as u16,
                        zmq_tx: 29335 + i as u16,
                    },
                    managed_image: true,
                    error_message: None,
                });
            }
            for (i, (name, implementation)) in lightning.iter().enumerate() {
                network.lightning.push(LightningNode {
                    name: (*name).to_string(),
                    network_id: id,
                    implementation: *implementation,
                    version: "latest".to_string(),
                    status: Status::Stopped,
                    ports: LightningPorts {
                        rest: 8081 + i as u16,
                        grpc: 10001 + i as u16,
                        p2p: 9735 + i as u16,
                    },
                    backend_name: chain_names.first().unwrap_or(&"backend1").to_string(),
                    managed_image: true,
                    error_message: None,
                });
            }
        })
        .unwrap();
    id
}

/// Chain service fake: instantly online, counting mines. When given a
/// bus it publishes `BlockMined` on every mine, like the production
/// adapters do.
#[derive(Default)]
pub struct FakeChainService {
    mines: AtomicU32,
    wallets: AtomicU32,
    bus: Option<Arc<InMemoryEventBus>>,
}

impl FakeChainService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bus(bus: Arc<InMemoryEventBus>) -> Self {
        Self {
            bus: Some(bus),
            ..Self::default()
        }
    }

    pub fn mine_calls(&self) -> u32 {
        self.mines.load(Ordering::SeqCst)
    }

    pub fn ensure_wallet_calls(&self) -> u32 {
        self.wallets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainService for FakeChainService {
    async fn get_info(&self, _node: &ChainNode) -> Result<ChainInfo, AdapterError> {
        Ok(ChainInfo {
            blocks: u64::from(self.mines.load(Ordering::SeqCst)),
            best_block_hash: "0f".to_string(),
            chain: "regtest".to_string(),
            initial_block_download: false,
        })
    }

    async fn get_wallet_info(&self, _node: &ChainNode) -> Result<WalletInfo, AdapterError> {
        Ok(WalletInfo {
            balance: Sats(0),
            immature_balance: Sats(0),
        })
    }

    async fn get_new_address(&self, _node: &ChainNode) -> Result<String, AdapterError> {
        Ok("bcrt1qfake".to_string())
    }

    async fn connect_peers(&self, _node: &ChainNode, _peers: &[String]) {}

    async fn mine(&self, node: &ChainNode, blocks: u32) -> Result<Vec<String>, AdapterError> {
        self.mines.fetch_add(1, Ordering::SeqCst);
        if let Some(bus) = &self.bus {
            bus.publish(LabEvent::BlockMined {
                network_id: node.network_id,
                blocks,
                node: node.name.clone(),
            })
            .await;
        }
        Ok(vec!["hash".to_string(); blocks as usize])
    }

    async fn send_funds(
        &self,
        _node: &ChainNode,
        _address: &str,
        _amount: Sats,
    ) -> Result<String, AdapterError> {
        Ok("txid".to_string())
    }

    async fn ensure_wallet(&self, _node: &ChainNode) -> Result<(), AdapterError> {
        self.wallets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_until_online(
        &self,
        _node: &ChainNode,
        _config: PollConfig,
    ) -> Result<(), AdapterError> {
        Ok(())
    }
}

/// Lightning service fake: pubkey derived from the node name, peer
/// connections, subscriptions and channel lists all scriptable.
#[derive(Default)]
pub struct FakeLightningService {
    connects: Mutex<Vec<(String, Vec<String>)>>,
    subscribed: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    channels: Mutex<HashMap<String, Vec<ChannelInfo>>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeLightningService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_wait(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn connect_calls(&self) -> Vec<(String, Vec<String>)> {
        self.connects.lock().unwrap().clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscribed.lock().unwrap().clone()
    }

    pub fn removed_listeners(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn set_channels(&self, node_name: &str, channels: Vec<ChannelInfo>) {
        self.channels
            .lock()
            .unwrap()
            .insert(node_name.to_string(), channels);
    }

    fn pubkey_of(name: &str) -> String {
        format!("02{name}")
    }
}

#[async_trait]
impl LightningService for FakeLightningService {
    async fn get_info(&self, node: &LightningNode) -> Result<LightningNodeInfo, AdapterError> {
        let pubkey = Self::pubkey_of(&node.name);
        Ok(LightningNodeInfo {
            rpc_url: format!("{pubkey}@127.0.0.1:{}", node.ports.p2p),
            pubkey,
            alias: node.name.clone(),
            block_height: 101,
            synced_to_chain: true,
        })
    }

    async fn get_balances(&self, _node: &LightningNode) -> Result<BalanceSnapshot, AdapterError> {
        Ok(BalanceSnapshot {
            total: Sats(0),
            confirmed: Sats(0),
            unconfirmed: Sats(0),
        })
    }

    async fn get_new_address(&self, _node: &LightningNode) -> Result<String, AdapterError> {
        Ok("bcrt1qln".to_string())
    }

    async fn get_channels(&self, node: &LightningNode) -> Result<Vec<ChannelInfo>, AdapterError> {
        Ok(self
            .channels
            .lock()
            .unwrap()
            .get(&node.name)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_peers(&self, _node: &LightningNode) -> Result<Vec<String>, AdapterError> {
        Ok(Vec::new())
    }

    async fn connect_peers(&self, node: &LightningNode, urls: &[String]) {
        self.connects
            .lock()
            .unwrap()
            .push((node.name.clone(), urls.to_vec()));
    }

    async fn open_channel(
        &self,
        _node: &LightningNode,
        _peer_url: &str,
        _capacity: Sats,
        _is_private: bool,
    ) -> Result<OpenChannelOutcome, AdapterError> {
        Ok(OpenChannelOutcome {
            txid: "fundingtx".to_string(),
            output_index: 0,
        })
    }

    async fn close_channel(
        &self,
        _node: &LightningNode,
        _channel_point: &str,
    ) -> Result<String, AdapterError> {
        Ok("closetx".to_string())
    }

    async fn create_invoice(
        &self,
        _node: &LightningNode,
        _amount: Sats,
        _memo: &str,
    ) -> Result<String, AdapterError> {
        Ok("lnbcrt1fake".to_string())
    }

    async fn pay_invoice(
        &self,
        _node: &LightningNode,
        _invoice: &str,
        _amount: Option<Sats>,
    ) -> Result<PaymentOutcome, AdapterError> {
        Ok(PaymentOutcome {
            preimage: "00".to_string(),
            amount_msat: MilliSats(0),
        })
    }

    async fn decode_invoice(
        &self,
        _node: &LightningNode,
        _invoice: &str,
    ) -> Result<DecodedInvoice, AdapterError> {
        Ok(DecodedInvoice {
            payment_hash: "hash".to_string(),
            amount_msat: MilliSats(0),
            description: String::new(),
        })
    }

    async fn subscribe_channel_events(&self, node: &LightningNode) -> Result<(), AdapterError> {
        self.subscribed.lock().unwrap().push(node.name.clone());
        Ok(())
    }

    async fn remove_listener(&self, node_name: &str) {
        self.removed.lock().unwrap().push(node_name.to_string());
    }

    async fn wait_until_online(
        &self,
        node: &LightningNode,
        config: PollConfig,
    ) -> Result<(), AdapterError> {
        if self.failing.lock().unwrap().contains(&node.name) {
            Err(AdapterError::Timeout {
                node: node.name.clone(),
                timeout_secs: config.timeout.as_secs(),
                last_error: "connection refused".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Container runtime fake recording every call.
#[derive(Default)]
pub struct RecordingRuntime {
    ops: Mutex<Vec<String>>,
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: String) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl ContainerRuntime for RecordingRuntime {
    async fn start_network(&self, network: &Network) -> Result<(), LabError> {
        self.record(format!("start_network {}", network.id));
        Ok(())
    }

    async fn stop_network(&self, network: &Network) -> Result<(), LabError> {
        self.record(format!("stop_network {}", network.id));
        Ok(())
    }

    async fn start_node(&self, network: &Network, node_name: &str) -> Result<(), LabError> {
        self.record(format!("start_node {} {node_name}", network.id));
        Ok(())
    }

    async fn stop_node(&self, network: &Network, node_name: &str) -> Result<(), LabError> {
        self.record(format!("stop_node {} {node_name}", network.id));
        Ok(())
    }

    async fn save_compose_definition(&self, network: &Network) -> Result<(), LabError> {
        self.record(format!("save_compose {}", network.id));
        Ok(())
    }

    async fn has_image(&self, _image: &str) -> bool {
        true
    }
}

/// Port allocator that never reports a conflict.
pub struct NoConflictPorts;

#[async_trait]
impl PortAllocator for NoConflictPorts {
    async fn open_ports(
        &self,
        _network: &Network,
    ) -> Result<Option<HashMap<String, NodePorts>>, LabError> {
        Ok(None)
    }
}

/// Persistence sink that accepts everything.
pub struct NullPersistence;

#[async_trait]
impl Persistence for NullPersistence {
    async fn save(&self, _network: &Network) -> Result<(), LabError> {
        Ok(())
    }
}
