use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::PathBuf;

use super::{Action, Args};
use crate::app::Operations;
use crate::domain::ActionError;
use crate::domain::ids::Image;

/// `create_stemcell(image_path, cloud_properties)`
pub struct CreateStemcell;

#[async_trait]
impl Action for CreateStemcell {
    fn name(&self) -> &'static str {
        "create_stemcell"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let path: PathBuf = args.required(0, "image_path")?;
        let image = ops.create_stemcell(&path).await?;
        Ok(json!(image))
    }
}

/// `delete_stemcell(stemcell_cid)`
pub struct DeleteStemcell;

#[async_trait]
impl Action for DeleteStemcell {
    fn name(&self) -> &'static str {
        "delete_stemcell"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let image = args.id::<Image>(0)?;
        ops.delete_stemcell(&image).await?;
        Ok(Value::Null)
    }
}
