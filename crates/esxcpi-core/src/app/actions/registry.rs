//! ActionTable - アクション名 → エントリポイント
//!
//! # 学習ポイント
//! - `HashMap<String, Arc<dyn Action>>` による型消去
//! - 二重登録は `RegistryError` で拒否（起動時に気付ける）

use std::collections::HashMap;
use std::sync::Arc;

use super::Action;

/// 起動時に 1 回だけ構築する。検索は大文字小文字を区別しない
#[derive(Clone, Default)]
pub struct ActionTable {
    actions: HashMap<String, Arc<dyn Action>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Action '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A: Action + 'static>(&mut self, action: A) -> Result<(), RegistryError> {
        let name = action.name().to_lowercase();
        if self.actions.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.actions.insert(name, Arc::new(action));
        Ok(())
    }

    /// Builder 形式の [`register`](Self::register)
    pub fn with<A: Action + 'static>(mut self, action: A) -> Result<Self, RegistryError> {
        self.register(action)?;
        Ok(self)
    }

    pub fn get(&self, method: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(&method.to_lowercase()).cloned()
    }

    /// 登録済みの名前（ソート済み）
    pub fn registered(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Operations;
    use crate::app::actions::Args;
    use crate::domain::ActionError;
    use async_trait::async_trait;

    struct Echo(&'static str);

    #[async_trait]
    impl Action for Echo {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn invoke(&self, _ops: &Operations, args: Args) -> Result<serde_json::Value, ActionError> {
            args.required(0, "value")
        }
    }

    #[test]
    fn register_and_get() {
        let mut table = ActionTable::new();
        table.register(Echo("echo")).unwrap();

        assert!(table.get("echo").is_some());
        assert!(table.get("ECHO").is_some());
        assert!(table.get("other").is_none());
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut table = ActionTable::new();
        table.register(Echo("echo")).unwrap();

        let result = table.register(Echo("Echo"));

        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(name)) if name == "echo"));
    }

    #[test]
    fn registered_lists_sorted_names() {
        let table = ActionTable::new()
            .with(Echo("b"))
            .and_then(|t| t.with(Echo("a")))
            .unwrap();
        assert_eq!(table.registered(), vec!["a", "b"]);
    }
}
