//! Shared fakes for orchestrator tests: in-memory category services and
//! recording collaborator ports.

use crate::ports::{ContainerRuntime, NodePorts, Persistence, PortAllocator};
use crate::store::NetworkStore;
use async_trait::async_trait;
use shared_types::{
    AdapterError, ChainImplementation, ChainNode, ChainPorts, LabError, LightningImplementation,
    LightningNode, LightningPorts, Network, NetworkId, PollConfig, Sats, Status,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use voltlab_chain::{ChainInfo, ChainService, WalletInfo};
use voltlab_lightning::{
    BalanceSnapshot, ChannelInfo, DecodedInvoice, LightningNodeInfo, LightningService,
    OpenChannelOutcome, PaymentOutcome,
};

/// Seed a network with the given chain and Lightning nodes, all Stopped,
/// every Lightning node backed by the first chain node.
pub fn lab_network(
    store: &NetworkStore,
    chain_names: &[&str],
    lightning: &[(&str, LightningImplementation)],
) -> NetworkId {
    let id = store.create("lab");
    store
        .update(id, |network| {
            for (i, name) in chain_names.iter().enumerate() {
                network.chain.push(chain_node(name, id, i as u16));
            }
            for (i, (name, implementation)) in lightning.iter().enumerate() {
                network.lightning.push(lightning_node(
                    name,
                    id,
                    *implementation,
                    chain_names.first().unwrap_or(&"backend1"),
                    i as u16,
                ));
            }
        })
        .unwrap();
    id
}

pub fn chain_node(name: &str, network_id: NetworkId, index: u16) -> ChainNode {
    ChainNode {
        name: name.to_string(),
        network_id,
        implementation: ChainImplementation::Bitcoind,
        version: "27.0".to_string(),
        status: Status::Stopped,
        ports: ChainPorts {
            rpc: 18443 + index,
            p2p: 19444 + index,
            zmq_block: 28334 + index,
            zmq_tx: 29335 + index,
        },
        managed_image: true,
        error_message: None,
    }
}

pub fn lightning_node(
    name: &str,
    network_id: NetworkId,
    implementation: LightningImplementation,
    backend: &str,
    index: u16,
) -> LightningNode {
    LightningNode {
        name: name.to_string(),
        network_id,
        implementation,
        version: "latest".to_string(),
        status: Status::Stopped,
        ports: LightningPorts {
            rest: 8081 + index,
            grpc: 10001 + index,
            p2p: 9735 + index,
        },
        backend_name: backend.to_string(),
        managed_image: true,
        error_message: None,
    }
}

/// Chain service fake: instantly online unless told otherwise, counting
/// mines and wallet calls.
#[derive(Default)]
pub struct FakeChainService {
    failing: Mutex<HashSet<String>>,
    mine_fails: std::sync::atomic::AtomicBool,
    mines: AtomicU32,
    wallets: AtomicU32,
    height: AtomicU32,
}

impl FakeChainService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `wait_until_online` fail for this node name.
    pub fn fail_wait(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// Make every `mine` call fail from now on.
    pub fn fail_mine(&self) {
        self.mine_fails.store(true, Ordering::SeqCst);
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
            blocks: u64::from(self.height.load(Ordering::SeqCst)),
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
        if self.mine_fails.load(Ordering::SeqCst) {
            return Err(AdapterError::Rpc {
                node: node.name.clone(),
                message: "mining rejected".to_string(),
            });
        }
        self.height.fetch_add(blocks, Ordering::SeqCst);
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
        node: &ChainNode,
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

/// Lightning service fake: pubkey is derived from the node name, peer
/// connections and subscriptions are recorded.
#[derive(Default)]
pub struct FakeLightningService {
    failing: Mutex<HashSet<String>>,
    /// (node name, peer pubkey) pairs considered already connected.
    known_peers: Mutex<Vec<(String, String)>>,
    connects: Mutex<Vec<(String, Vec<String>)>>,
    subscribed: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    channels: Mutex<HashMap<String, Vec<ChannelInfo>>>,
}

impl FakeLightningService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_wait(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// Mark `peer_pubkey` as already connected from `node_name`'s view.
    pub fn preconnect(&self, node_name: &str, peer_pubkey: &str) {
        self.known_peers
            .lock()
            .unwrap()
            .push((node_name.to_string(), peer_pubkey.to_string()));
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

    async fn get_balances(
        &self,
        _node: &LightningNode,
    ) -> Result<BalanceSnapshot, AdapterError> {
        Ok(BalanceSnapshot {
            total: Sats(0),
            confirmed: Sats(0),
            unconfirmed: Sats(0),
        })
    }

    async fn get_new_address(&self, _node: &LightningNode) -> Result<String, AdapterError> {
        Ok("bcrt1qln".to_string())
    }

    async fn get_channels(
        &self,
        node: &LightningNode,
    ) -> Result<Vec<ChannelInfo>, AdapterError> {
        Ok(self
            .channels
            .lock()
            .unwrap()
            .get(&node.name)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_peers(&self, node: &LightningNode) -> Result<Vec<String>, AdapterError> {
        Ok(self
            .known_peers
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == node.name)
            .map(|(_, pubkey)| pubkey.clone())
            .collect())
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
            amount_msat: shared_types::MilliSats(0),
        })
    }

    async fn decode_invoice(
        &self,
        _node: &LightningNode,
        _invoice: &str,
    ) -> Result<DecodedInvoice, AdapterError> {
        Ok(DecodedInvoice {
            payment_hash: "hash".to_string(),
            amount_msat: shared_types::MilliSats(0),
            description: String::new(),
        })
    }

    async fn subscribe_channel_events(
        &self,
        node: &LightningNode,
    ) -> Result<(), AdapterError> {
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

/// Container runtime fake recording every call; individual operations
/// can be made to fail.
#[derive(Default)]
pub struct RecordingRuntime {
    pub ops: Mutex<Vec<String>>,
    failing_ops: Mutex<HashSet<String>>,
    missing_images: Mutex<HashSet<String>>,
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_op(&self, op: &str) {
        self.failing_ops.lock().unwrap().insert(op.to_string());
    }

    pub fn mark_image_missing(&self, image: &str) {
        self.missing_images.lock().unwrap().insert(image.to_string());
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: String) -> Result<(), LabError> {
        let failed = self
            .failing_ops
            .lock()
            .unwrap()
            .contains(op.split(' ').next().unwrap_or(&op));
        self.ops.lock().unwrap().push(op.clone());
        if failed {
            Err(LabError::Runtime(format!("{op} failed")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContainerRuntime for RecordingRuntime {
    async fn start_network(&self, network: &Network) -> Result<(), LabError> {
        self.record(format!("start_network {}", network.id))
    }

    async fn stop_network(&self, network: &Network) -> Result<(), LabError> {
        self.record(format!("stop_network {}", network.id))
    }

    async fn start_node(&self, network: &Network, node_name: &str) -> Result<(), LabError> {
        self.record(format!("start_node {} {node_name}", network.id))
    }

    async fn stop_node(&self, network: &Network, node_name: &str) -> Result<(), LabError> {
        self.record(format!("stop_node {} {node_name}", network.id))
    }

    async fn save_compose_definition(&self, network: &Network) -> Result<(), LabError> {
        self.record(format!("save_compose {}", network.id))
    }

    async fn has_image(&self, image: &str) -> bool {
        !self.missing_images.lock().unwrap().contains(image)
    }
}

/// Port allocator fake: optionally hands out one replacement port map.
#[derive(Default)]
pub struct StaticPortAllocator {
    replacement: Mutex<Option<HashMap<String, NodePorts>>>,
}

impl StaticPortAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_with(&self, ports: HashMap<String, NodePorts>) {
        *self.replacement.lock().unwrap() = Some(ports);
    }
}

#[async_trait]
impl PortAllocator for StaticPortAllocator {
    async fn open_ports(
        &self,
        _network: &Network,
    ) -> Result<Option<HashMap<String, NodePorts>>, LabError> {
        Ok(self.replacement.lock().unwrap().take())
    }
}

/// Persistence fake counting saves.
#[derive(Default)]
pub struct NullPersistence {
    saves: AtomicU32,
}

impl NullPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Persistence for NullPersistence {
    async fn save(&self, _network: &Network) -> Result<(), LabError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
