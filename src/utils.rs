use log::info;
use std::io;
use std::path::{Path, PathBuf};

const MODEL_DIR_NAME: &str = "weathercast_models";

pub fn get_model_dir() -> io::Result<PathBuf> {
    dirs::cache_dir()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine system cache directory",
            )
        })
        .map(|p| p.join(MODEL_DIR_NAME))
}

pub async fn ensure_model_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Model path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating model directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_dir_and_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_model_dir_exists(&nested).await.unwrap();
        assert!(nested.is_dir());
        ensure_model_dir_exists(&nested).await.unwrap();

        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(ensure_model_dir_exists(&file).await.is_err());
    }

    #[test]
    fn default_dir_is_named_for_the_crate() {
        if let Ok(path) = get_model_dir() {
            assert!(path.ends_with(MODEL_DIR_NAME));
        }
    }
}
