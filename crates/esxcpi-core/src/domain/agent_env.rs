//! Agent env 記述子
//!
//! JSON にして ISO イメージで新しい VM に渡す。VM 内のエージェントが起動時に読む。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::VmId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlobstoreSpec {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmSpec {
    pub name: String,
    pub id: VmId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEnv {
    pub agent_id: String,
    pub vm: VmSpec,
    pub mbus: String,
    pub ntp: Vec<String>,
    pub networks: serde_json::Value,
    pub env: serde_json::Value,
    pub disks: BTreeMap<String, String>,
    pub blobstore: BlobstoreSpec,
}

impl AgentEnv {
    /// エフェメラルディスクが 2 番目のデバイスである VM 向けの記述子
    pub fn new(agent_id: impl Into<String>, vm: VmSpec) -> Self {
        let mut disks = BTreeMap::new();
        disks.insert("ephemeral".to_string(), "1".to_string());
        Self {
            agent_id: agent_id.into(),
            vm,
            mbus: String::new(),
            ntp: Vec::new(),
            networks: empty_object(),
            env: empty_object(),
            disks,
            blobstore: BlobstoreSpec::default(),
        }
    }

    pub fn with_agent_settings(
        mut self,
        mbus: impl Into<String>,
        ntp: Vec<String>,
        blobstore: BlobstoreSpec,
    ) -> Self {
        self.mbus = mbus.into();
        self.ntp = ntp;
        self.blobstore = blobstore;
        self
    }

    /// `null` は空オブジェクトとして保存する
    pub fn with_deployment(mut self, networks: serde_json::Value, env: serde_json::Value) -> Self {
        self.networks = or_empty(networks);
        self.env = or_empty(env);
        self
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn or_empty(value: serde_json::Value) -> serde_json::Value {
    if value.is_null() { empty_object() } else { value }
}
