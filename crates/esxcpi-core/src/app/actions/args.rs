//! Args - 位置引数のデコード
//!
//! アクションは JSON 配列を受け取る。引数は位置で取り出して Rust の型にデコードする。
//! 欠落や型違いはリモート呼び出しの前に、引数名入りのメッセージで失敗する。

use serde::de::DeserializeOwned;

use crate::domain::{ActionError, Id, IdMarker};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<serde_json::Value>,
}

impl Args {
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        Self { values }
    }

    /// 引数が `count` 個未満なら失敗
    pub fn expect_at_least(&self, count: usize) -> Result<(), ActionError> {
        if self.values.len() < count {
            let noun = if count == 1 { "argument" } else { "arguments" };
            return Err(ActionError::invalid(format!(
                "Expected at least {count} {noun}, got {}",
                self.values.len()
            )));
        }
        Ok(())
    }

    pub fn required<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, ActionError> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| ActionError::invalid(format!("Missing argument '{name}' at position {index}")))?;
        decode(value, name)
    }

    /// 欠落と `null` はどちらも `None`
    pub fn optional<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<Option<T>, ActionError> {
        match self.values.get(index) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => decode(value, name).map(Some),
        }
    }

    /// 型付き ID（引数名はマーカーから: `vm_cid`, `disk_cid`, ...）
    pub fn id<M: IdMarker>(&self, index: usize) -> Result<Id<M>, ActionError> {
        let name = M::arg_name();
        let raw: String = self.required(index, name)?;
        if raw.is_empty() {
            return Err(ActionError::invalid(format!("Argument '{name}' must not be empty")));
        }
        Ok(Id::new(raw))
    }
}

fn decode<T: DeserializeOwned>(value: &serde_json::Value, name: &str) -> Result<T, ActionError> {
    T::deserialize(value)
        .map_err(|e| ActionError::invalid(format!("Unexpected argument where {name} should be: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::Vm;
    use crate::domain::VmId;
    use serde_json::json;

    #[test]
    fn decodes_by_position() {
        let args = Args::new(vec![json!("vm-1"), json!(2048), json!({"flavor": "f"})]);

        let vm: VmId = args.id::<Vm>(0).unwrap();
        let size: u64 = args.required(1, "size").unwrap();

        assert_eq!(vm.as_str(), "vm-1");
        assert_eq!(size, 2048);
    }

    #[test]
    fn missing_argument_names_it() {
        let err = Args::default().id::<Vm>(0).unwrap_err();
        assert_eq!(err.to_string(), "Missing argument 'vm_cid' at position 0");
    }

    #[test]
    fn wrong_type_names_the_argument() {
        let args = Args::new(vec![json!(42)]);
        let err = args.id::<Vm>(0).unwrap_err();
        assert!(matches!(err, ActionError::InvalidArgument(_)));
        assert!(err.to_string().starts_with("Unexpected argument where vm_cid should be"));
    }

    #[test]
    fn null_is_absent_for_optional_arguments() {
        let args = Args::new(vec![json!(null)]);
        assert_eq!(args.optional::<String>(0, "vm_cid").unwrap(), None);
        assert_eq!(args.optional::<String>(5, "env").unwrap(), None);
    }

    #[test]
    fn arity_check() {
        let args = Args::new(vec![json!(1)]);
        assert!(args.expect_at_least(1).is_ok());
        assert_eq!(
            args.expect_at_least(3).unwrap_err().to_string(),
            "Expected at least 3 arguments, got 1"
        );
    }
}
