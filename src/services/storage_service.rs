// src/services/storage_service.rs
use crate::models::user::cpf_digits;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Limite de tamanho das fotos de perfil (2 MiB).
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image too large: {0} bytes (max 2 MiB)")]
    TooLarge(usize),

    #[error("Image is empty")]
    Empty,

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ficheiro recebido num formulário multipart.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Imagem já guardada: a chave serve para apagar, o URL vai para a base de dados.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Armazenamento de objetos. A implementação local pode ser trocada por S3.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Chave de um URL gerado por este armazenamento; `None` para URLs externos.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// Guarda os ficheiros num diretório servido em `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        LocalImageStorage {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Nada de caminhos absolutos nem ".." vindos de fora
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("Imagem guardada em {}", path.display());
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path).await?;
        tracing::debug!("Imagem removida: {}", path.display());
        Ok(())
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    slug.split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Chave do tipo `profile-pics/<cpf>-<nome>-<uuid>.<ext>`.
pub fn profile_picture_key(owner_name: &str, owner_cpf: &str, extension: &str) -> String {
    format!(
        "profile-pics/{}-{}-{}.{}",
        cpf_digits(owner_cpf),
        slugify(owner_name),
        Uuid::new_v4().simple(),
        extension
    )
}

/// Valida e envia a foto de perfil.
pub async fn store_profile_picture(
    storage: &dyn ImageStorage,
    image: &UploadedImage,
    owner_name: &str,
    owner_cpf: &str,
) -> Result<StoredImage, StorageError> {
    let extension = extension_for(&image.content_type)
        .ok_or_else(|| StorageError::UnsupportedType(image.content_type.clone()))?;
    if image.bytes.is_empty() {
        return Err(StorageError::Empty);
    }
    if image.bytes.len() > MAX_IMAGE_BYTES {
        return Err(StorageError::TooLarge(image.bytes.len()));
    }

    let key = profile_picture_key(owner_name, owner_cpf, extension);
    tracing::info!(
        "Enviando foto de perfil {:?} ({} bytes) como {}",
        image.file_name,
        image.bytes.len(),
        key
    );
    let url = storage.put(&key, &image.bytes).await?;
    Ok(StoredImage { key, url })
}

/// Imagem já guardada por trás de um URL da base de dados. O placeholder por
/// omissão (URL externo) não tem chave e fica de fora.
pub fn stored_image_at(storage: &dyn ImageStorage, url: &str) -> Option<StoredImage> {
    storage.key_for_url(url).map(|key| StoredImage {
        key,
        url: url.to_string(),
    })
}

/// Remoção de melhor esforço: a imagem não faz parte da transação.
pub async fn discard_image(storage: &dyn ImageStorage, image: &StoredImage) {
    if let Err(e) = storage.remove(&image.key).await {
        tracing::error!("Imagem órfã ({}): {:?}", image.url, e);
    } else {
        tracing::info!("Imagem {} removida.", image.key);
    }
}
