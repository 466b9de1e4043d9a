//! Stemcell のアップロード
//!
//! stemcell は gzip 済み tarball で、通常エントリ `image` 自体も gzip 済みディスク
//! イメージ。中身を作業ファイルに展開し、新しいリモートイメージとしてアップロードする。

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use super::Operations;
use crate::domain::{ActionError, CloudError, ImageId};

const IMAGE_ENTRY: &str = "image";

impl Operations {
    pub async fn create_stemcell(&self, stemcell: &Path) -> Result<ImageId, ActionError> {
        let scratch = tempfile::Builder::new()
            .prefix(&self.names.generate("stemcell"))
            .tempdir()?;
        let image = scratch.path().join(IMAGE_ENTRY);

        let source = stemcell.to_path_buf();
        let dest = image.clone();
        tokio::task::spawn_blocking(move || extract_image(&source, &dest))
            .await
            .map_err(io::Error::other)??;
        tracing::info!(stemcell = %stemcell.display(), "extracted stemcell image");

        let created = self
            .step("upload image", self.api.create_image(&image, IMAGE_ENTRY))
            .await?;
        if created.entity.id.is_empty() {
            return Err(CloudError::internal(format!(
                "esxcloud: task '{}' finished without an image id",
                created.id
            ))
            .into());
        }
        Ok(ImageId::new(created.entity.id))
    }

    pub async fn delete_stemcell(&self, image: &ImageId) -> Result<(), ActionError> {
        self.step("delete image", self.api.delete_image(image)).await?;
        Ok(())
    }
}

/// `stemcell` の tarball にある `image` エントリを展開して `dest` にコピー
fn extract_image(stemcell: &Path, dest: &Path) -> Result<(), ActionError> {
    let file = File::open(stemcell)?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    for entry in archive.entries()? {
        let entry = entry?;
        if !entry.header().entry_type().is_file() || !is_image_entry(&entry.path()?) {
            continue;
        }
        let mut inner = GzDecoder::new(entry);
        let mut out = File::create(dest)?;
        io::copy(&mut inner, &mut out)?;
        return Ok(());
    }

    Err(ActionError::invalid(format!(
        "Could not find entry for OVA image in stemcell at path '{}'",
        stemcell.display()
    )))
}

fn is_image_entry(path: &Path) -> bool {
    path == Path::new(IMAGE_ENTRY) || path == PathBuf::from(".").join(IMAGE_ENTRY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::operations::testing::operations;
    use crate::domain::TaskState;
    use crate::impls::{ScriptedRemoteApi, ScriptedRunner};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::sync::Arc;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    /// `entries`（名前, 中身）を含む stemcell tarball を書き出す
    fn stemcell(dir: &Path, entries: &[(&str, Vec<u8>)]) -> PathBuf {
        let path = dir.join("stemcell.tgz");
        let file = File::create(&path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, data.as_slice()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn extracts_and_decompresses_the_image_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = stemcell(
            dir.path(),
            &[
                ("stemcell.MF", b"name: test".to_vec()),
                ("image", gzip(b"ova-bytes")),
            ],
        );
        let dest = dir.path().join("out");

        extract_image(&path, &dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"ova-bytes");
    }

    #[test]
    fn missing_image_entry_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        let path = stemcell(dir.path(), &[("stemcell.MF", b"name: test".to_vec())]);

        let err = extract_image(&path, &dir.path().join("out")).unwrap_err();

        assert!(matches!(err, ActionError::InvalidArgument(_)));
        assert!(err.to_string().contains("Could not find entry for OVA image"));
    }

    #[tokio::test]
    async fn uploads_the_inner_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = stemcell(dir.path(), &[("image", gzip(b"ova-bytes"))]);

        let api = Arc::new(ScriptedRemoteApi::new());
        api.task("create_image", "t-img", "img-1", TaskState::Completed);
        let ops = operations(api.clone(), Arc::new(ScriptedRunner::new()));

        let image = ops.create_stemcell(&path).await.unwrap();

        assert_eq!(image.as_str(), "img-1");
        assert_eq!(api.calls()[0].body, Some(serde_json::json!("ova-bytes")));
    }

    #[tokio::test]
    async fn missing_stemcell_file_is_io_error() {
        let ops = operations(Arc::new(ScriptedRemoteApi::new()), Arc::new(ScriptedRunner::new()));

        let err = ops.create_stemcell(Path::new("/nonexistent/stemcell.tgz")).await.unwrap_err();

        assert!(matches!(err, ActionError::Io(_)));
    }
}
