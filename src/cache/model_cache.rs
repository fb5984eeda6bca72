//! On-disk persistence for trained models.
//!
//! Every variable owns two files in the model directory: `model_<VAR>.bin`
//! holding the bincode encoded model and `model_<VAR>.bin.gz`, a gzip archive of
//! the same bytes. The archive is authoritative: its presence means a complete
//! model is cached. Both files are written to a temporary file first and then
//! renamed into place, so readers never observe a partially written file.
//! Two processes that miss the cache at the same time will both train and the
//! last rename wins.

use crate::cache::error::ModelCacheError;
use crate::model::trained::{TrainedModel, MODEL_FORMAT_VERSION};
use crate::types::variable::Variable;
use async_compression::tokio::bufread::{GzipDecoder, GzipEncoder};
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::info;
use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::{fs, task};

const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Storage for trained models, keyed by variable.
///
/// Nothing expires on its own; a cached model is reused until it is
/// invalidated.
pub trait ModelCache: Send + Sync {
    fn exists(&self, variable: Variable) -> impl Future<Output = bool> + Send;

    fn put(&self, model: &TrainedModel)
        -> impl Future<Output = Result<(), ModelCacheError>> + Send;

    fn get(
        &self,
        variable: Variable,
    ) -> impl Future<Output = Result<TrainedModel, ModelCacheError>> + Send;

    fn invalidate(
        &self,
        variable: Variable,
    ) -> impl Future<Output = Result<(), ModelCacheError>> + Send;
}

#[derive(Debug, Clone)]
pub struct DiskModelCache {
    dir: PathBuf,
}

impl DiskModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the raw serialized model for `variable`.
    pub fn raw_path(&self, variable: Variable) -> PathBuf {
        self.dir.join(format!("{}.bin", variable.model_file_stem()))
    }

    /// Path of the compressed archive for `variable`.
    pub fn archive_path(&self, variable: Variable) -> PathBuf {
        self.dir.join(format!("{}.bin.gz", variable.model_file_stem()))
    }
}

impl ModelCache for DiskModelCache {
    async fn exists(&self, variable: Variable) -> bool {
        fs::metadata(self.archive_path(variable)).await.is_ok()
    }

    async fn put(&self, model: &TrainedModel) -> Result<(), ModelCacheError> {
        let variable = model.variable();
        let bytes = bincode::serde::encode_to_vec(model, BINCODE_CONFIG)
            .map_err(|e| ModelCacheError::Encode(Box::new(e)))?;
        let compressed = gzip(&bytes).await.map_err(ModelCacheError::Compress)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ModelCacheError::DirCreation(self.dir.clone(), e))?;

        let raw_path = self.raw_path(variable);
        let archive_path = self.archive_path(variable);
        write_atomic(raw_path, bytes).await?;
        write_atomic(archive_path.clone(), compressed).await?;
        info!(
            "Cached {} model ({}) to {:?}",
            variable,
            model.order(),
            archive_path
        );
        Ok(())
    }

    async fn get(&self, variable: Variable) -> Result<TrainedModel, ModelCacheError> {
        let archive_path = self.archive_path(variable);
        let compressed = match fs::read(&archive_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ModelCacheError::NotFound(archive_path));
            }
            Err(e) => return Err(ModelCacheError::Read(archive_path, e)),
        };
        let bytes = gunzip(&compressed)
            .await
            .map_err(|e| ModelCacheError::Decompress(archive_path.clone(), e))?;

        let raw_path = self.raw_path(variable);
        write_atomic(raw_path.clone(), bytes.clone()).await?;

        let (model, _) = bincode::serde::decode_from_slice::<TrainedModel, _>(&bytes, BINCODE_CONFIG)
            .map_err(|e| ModelCacheError::Decode(raw_path.clone(), Box::new(e)))?;

        if model.format_version() != MODEL_FORMAT_VERSION {
            return Err(ModelCacheError::VersionMismatch {
                path: raw_path,
                found: model.format_version(),
                expected: MODEL_FORMAT_VERSION,
            });
        }
        if model.variable() != variable {
            return Err(ModelCacheError::VariableMismatch {
                path: raw_path,
                found: model.variable(),
                expected: variable,
            });
        }

        info!(
            "Loaded {} model ({}) trained at {} from {:?}",
            variable,
            model.order(),
            model.trained_at(),
            archive_path
        );
        Ok(model)
    }

    async fn invalidate(&self, variable: Variable) -> Result<(), ModelCacheError> {
        for path in [self.archive_path(variable), self.raw_path(variable)] {
            match fs::remove_file(&path).await {
                Ok(()) => info!("Removed cached model file {:?}", path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(ModelCacheError::Delete(path, e)),
            }
        }
        Ok(())
    }
}

async fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzipEncoder::new(bytes);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await?;
    Ok(compressed)
}

async fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzipDecoder::new(bytes);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).await?;
    Ok(decompressed)
}

/// Writes `bytes` next to `path` in a temporary file and renames it over `path`.
async fn write_atomic(path: PathBuf, bytes: Vec<u8>) -> Result<(), ModelCacheError> {
    task::spawn_blocking(move || {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file =
            NamedTempFile::new_in(dir).map_err(|e| ModelCacheError::Write(path.clone(), e))?;
        temp_file
            .write_all(&bytes)
            .map_err(|e| ModelCacheError::Write(path.clone(), e))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| ModelCacheError::Write(path.clone(), e))?;
        temp_file
            .persist(&path)
            .map_err(|e| ModelCacheError::Write(path.clone(), e.error))?;
        Ok::<(), ModelCacheError>(())
    })
    .await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trainer::AutoArima;

    fn sample_model(variable: Variable) -> TrainedModel {
        let series: Vec<f64> = (0..48)
            .map(|i| 15.0 + 3.0 * (i as f64 / 24.0 * std::f64::consts::TAU).sin())
            .collect();
        let arima = AutoArima::default().fit_series(&series, variable).unwrap();
        TrainedModel::new(variable, arima)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskModelCache::new(dir.path());
        let model = sample_model(Variable::Temperature);

        assert!(!cache.exists(Variable::Temperature).await);
        cache.put(&model).await.unwrap();
        assert!(cache.exists(Variable::Temperature).await);
        assert!(!cache.exists(Variable::Humidity).await);
        assert!(cache.raw_path(Variable::Temperature).exists());
        assert!(cache.archive_path(Variable::Temperature).exists());

        let loaded = cache.get(Variable::Temperature).await.unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.forecast(12), model.forecast(12));
    }

    #[test]
    fn paths_are_derived_from_variable() {
        let cache = DiskModelCache::new("/tmp/models");
        assert_eq!(
            cache.raw_path(Variable::Humidity),
            PathBuf::from("/tmp/models/model_HUM.bin")
        );
        assert_eq!(
            cache.archive_path(Variable::Temperature),
            PathBuf::from("/tmp/models/model_TEMP.bin.gz")
        );
    }

    #[tokio::test]
    async fn get_extracts_raw_file_alongside_archive() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskModelCache::new(dir.path());
        cache.put(&sample_model(Variable::Humidity)).await.unwrap();

        std::fs::remove_file(cache.raw_path(Variable::Humidity)).unwrap();
        cache.get(Variable::Humidity).await.unwrap();
        assert!(cache.raw_path(Variable::Humidity).exists());
    }

    #[tokio::test]
    async fn missing_archive_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskModelCache::new(dir.path());
        assert!(matches!(
            cache.get(Variable::Temperature).await,
            Err(ModelCacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_archive_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskModelCache::new(dir.path());
        std::fs::write(cache.archive_path(Variable::Temperature), b"not gzip").unwrap();
        assert!(matches!(
            cache.get(Variable::Temperature).await,
            Err(ModelCacheError::Decompress(..))
        ));
    }

    #[tokio::test]
    async fn undecodable_payload_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskModelCache::new(dir.path());
        let garbage = gzip(b"\x01\x02").await.unwrap();
        std::fs::write(cache.archive_path(Variable::Humidity), garbage).unwrap();
        assert!(matches!(
            cache.get(Variable::Humidity).await,
            Err(ModelCacheError::Decode(..))
        ));
    }

    #[tokio::test]
    async fn archive_under_wrong_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskModelCache::new(dir.path());
        cache.put(&sample_model(Variable::Temperature)).await.unwrap();
        std::fs::copy(
            cache.archive_path(Variable::Temperature),
            cache.archive_path(Variable::Humidity),
        )
        .unwrap();
        assert!(matches!(
            cache.get(Variable::Humidity).await,
            Err(ModelCacheError::VariableMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn other_format_version_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskModelCache::new(dir.path());
        let model = sample_model(Variable::Temperature).with_format_version(MODEL_FORMAT_VERSION + 1);
        cache.put(&model).await.unwrap();

        assert!(matches!(
            cache.get(Variable::Temperature).await,
            Err(ModelCacheError::VersionMismatch { found, expected, .. })
                if found == MODEL_FORMAT_VERSION + 1 && expected == MODEL_FORMAT_VERSION
        ));
    }

    #[tokio::test]
    async fn invalidate_removes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskModelCache::new(dir.path());
        cache.put(&sample_model(Variable::Temperature)).await.unwrap();

        cache.invalidate(Variable::Temperature).await.unwrap();
        assert!(!cache.exists(Variable::Temperature).await);
        assert!(!cache.raw_path(Variable::Temperature).exists());
        // Invalidating an absent model is a no-op.
        cache.invalidate(Variable::Temperature).await.unwrap();
    }

    #[tokio::test]
    async fn put_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("models");
        let cache = DiskModelCache::new(&nested);
        cache.put(&sample_model(Variable::Humidity)).await.unwrap();
        assert!(nested.join("model_HUM.bin.gz").exists());
    }
}
