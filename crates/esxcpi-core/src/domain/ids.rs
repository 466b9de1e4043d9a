//! リモート識別子（型付き ID）
//!
//! # 学習ポイント
//! - リモート API の ID はどれも不透明な文字列で、ワイヤ上は見分けがつかない
//! - `Id<T>` は phantom マーカーでコンパイル時に区別する（`VmId` を `DiskId` の位置に渡せない）
//! - ワイヤ上の `Id<T>` は文字列そのもの

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// ID の種類ごとのマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// アクションリクエストからデコードするときの引数名（例: `"vm_cid"`）
    fn arg_name() -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ========================================
// マーカー型
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn arg_name() -> &'static str {
        "task_id"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Vm {}

impl IdMarker for Vm {
    fn arg_name() -> &'static str {
        "vm_cid"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Disk {}

impl IdMarker for Disk {
    fn arg_name() -> &'static str {
        "disk_cid"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Image {}

impl IdMarker for Image {
    fn arg_name() -> &'static str {
        "stemcell_cid"
    }
}

/// リモートのバックグラウンドタスクのハンドル（ポーリング間で不変）
pub type TaskId = Id<Task>;

pub type VmId = Id<Vm>;

pub type DiskId = Id<Disk>;

/// イメージは stemcell の実体なので、呼び出し側からは `stemcell_cid` と呼ばれる
pub type ImageId = Id<Image>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_strings() {
        let vm = VmId::new("vm-123");
        assert_eq!(serde_json::to_string(&vm).unwrap(), "\"vm-123\"");

        let back: VmId = serde_json::from_str("\"vm-123\"").unwrap();
        assert_eq!(back, vm);
    }

    #[test]
    fn display_is_the_raw_id() {
        let disk: DiskId = "disk-1".into();
        assert_eq!(disk.to_string(), "disk-1");
        assert_eq!(disk.as_str(), "disk-1");
    }

    #[test]
    fn markers_carry_argument_names() {
        assert_eq!(Vm::arg_name(), "vm_cid");
        assert_eq!(Disk::arg_name(), "disk_cid");
        assert_eq!(Image::arg_name(), "stemcell_cid");
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<VmId>(), size_of::<String>());
    }
}
