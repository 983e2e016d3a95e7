//! Configuration types for the background removal service

use crate::error::{BgRemovalError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// File extensions accepted for direct uploads
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Maximum accepted upload size in bytes (16 MiB)
pub const MAX_FILE_SIZE: usize = 16 * 1024 * 1024;

/// Default listening port
pub const DEFAULT_PORT: u16 = 10000;

/// Default upper bound for fetching a remote image
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    Png,
    /// JPEG (no transparency, flattened onto white)
    Jpeg,
    /// WebP with alpha channel transparency (lossless)
    WebP,
    /// TIFF with alpha channel transparency
    Tiff,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl OutputFormat {
    /// Parse a client-supplied format tag, ignoring case
    ///
    /// Unknown tags are rejected rather than mapped to a default.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag.trim().to_uppercase().as_str() {
            "PNG" => Ok(Self::Png),
            "JPG" | "JPEG" => Ok(Self::Jpeg),
            "WEBP" => Ok(Self::WebP),
            "TIFF" | "TIF" => Ok(Self::Tiff),
            _ => Err(BgRemovalError::unsupported_format(tag)),
        }
    }

    /// Encoder identifier from the `image` crate
    #[must_use]
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::WebP => image::ImageFormat::WebP,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
            Self::WebP => write!(f, "webp"),
            Self::Tiff => write!(f, "tiff"),
        }
    }
}

/// How the processed image is returned to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    /// Binary attachment
    File,
    /// JSON envelope with base64 image data
    Base64,
}

impl ReturnType {
    /// Only the exact tag `base64` selects the JSON envelope
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        if tag == "base64" {
            Self::Base64
        } else {
            Self::File
        }
    }
}

/// Upload acceptance rules, immutable once the server starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Lowercase extensions accepted for uploads
    pub allowed_extensions: Vec<String>,
    /// Maximum upload size in bytes
    pub max_file_size: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

/// Configuration for the HTTP service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: IpAddr,

    /// Listening port
    pub port: u16,

    /// Upload validation rules
    pub upload: UploadPolicy,

    /// Timeout for fetching remote images
    pub fetch_timeout: Duration,

    /// Serve the HTML demo page on `/`
    pub serve_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            upload: UploadPolicy::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            serve_demo: true,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Socket address the server binds to
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Maximum HTTP body size: the upload cap plus room for multipart framing
    /// and the other form fields
    #[must_use]
    pub fn body_limit(&self) -> usize {
        self.upload.max_file_size.saturating_add(1024 * 1024)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// - Empty extension allow-list
    /// - Zero upload size or fetch timeout
    pub fn validate(&self) -> Result<()> {
        if self.upload.allowed_extensions.is_empty() {
            return Err(BgRemovalError::invalid_config(
                "At least one allowed file extension is required",
            ));
        }
        if self
            .upload
            .allowed_extensions
            .iter()
            .any(|ext| ext.is_empty() || ext.contains('.') || *ext != ext.to_lowercase())
        {
            return Err(BgRemovalError::invalid_config(
                "Allowed extensions must be lowercase and must not contain dots",
            ));
        }
        if self.upload.max_file_size == 0 {
            return Err(BgRemovalError::config_value_error(
                "max file size",
                0,
                "1 byte or more",
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(BgRemovalError::invalid_config(
                "Fetch timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Builder for `ServerConfig`
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    #[must_use]
    pub fn host(mut self, host: IpAddr) -> Self {
        self.config.host = host;
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.upload.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.config.upload.max_file_size = bytes;
        self
    }

    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn serve_demo(mut self, serve: bool) -> Self {
        self.config.serve_demo = serve;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ServerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 10000);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.upload.max_file_size, 16_777_216);
        assert_eq!(
            config.upload.allowed_extensions,
            vec!["png", "jpg", "jpeg", "webp"]
        );
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert!(config.serve_demo);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validation() {
        let config = ServerConfig::builder()
            .port(8080)
            .max_file_size(1024)
            .serve_demo(false)
            .build()
            .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload.max_file_size, 1024);
        assert_eq!(config.body_limit(), 1024 + 1024 * 1024);
        assert!(!config.serve_demo);

        assert!(ServerConfig::builder().max_file_size(0).build().is_err());
        assert!(ServerConfig::builder()
            .fetch_timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(ServerConfig::builder()
            .allowed_extensions(Vec::<String>::new())
            .build()
            .is_err());
        assert!(ServerConfig::builder()
            .allowed_extensions([".PNG"])
            .build()
            .is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("png").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::parse("PNG").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::parse("jpg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("Jpeg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("webp").unwrap(), OutputFormat::WebP);
        assert_eq!(OutputFormat::parse("tiff").unwrap(), OutputFormat::Tiff);

        let err = OutputFormat::parse("bmp").unwrap_err();
        assert!(matches!(err, BgRemovalError::UnsupportedFormat(_)));
        assert!(err.to_string().contains("bmp"));
        assert!(OutputFormat::parse("").is_err());
    }

    #[test]
    fn test_return_type_from_tag() {
        assert_eq!(ReturnType::from_tag("base64"), ReturnType::Base64);
        assert_eq!(ReturnType::from_tag("file"), ReturnType::File);
        assert_eq!(ReturnType::from_tag("BASE64"), ReturnType::File);
        assert_eq!(ReturnType::from_tag(""), ReturnType::File);
    }
}
