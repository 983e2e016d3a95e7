//! Shared helpers for the HTTP integration tests

#![allow(dead_code)]

use bgremove_server::{
    api::Application, BackgroundRemover, BgRemovalError, Result, ServerConfig,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Treats near-white pixels as background and keeps the source alpha
/// everywhere else
#[derive(Debug, Default)]
pub struct WhiteKeyRemover {
    calls: AtomicUsize,
}

impl WhiteKeyRemover {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BackgroundRemover for WhiteKeyRemover {
    fn remove(&self, image: &DynamicImage) -> Result<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rgba = image.to_rgba8();
        let mut out = RgbaImage::new(rgba.width(), rgba.height());
        for (x, y, p) in rgba.enumerate_pixels() {
            let background = p[0] >= 240 && p[1] >= 240 && p[2] >= 240;
            let pixel = if background {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([p[0], p[1], p[2], p[3]])
            };
            out.put_pixel(x, y, pixel);
        }
        Ok(out)
    }

    fn name(&self) -> String {
        "white-key".to_string()
    }
}

/// Always fails
#[derive(Debug, Default)]
pub struct FailingRemover;

impl BackgroundRemover for FailingRemover {
    fn remove(&self, _image: &DynamicImage) -> Result<RgbaImage> {
        Err(BgRemovalError::inference("segmentation model unavailable"))
    }
}

/// Server running on an ephemeral port
pub struct TestApp {
    pub address: String,
    pub remover: Arc<WhiteKeyRemover>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: ServerConfig) -> Self {
        let remover = Arc::new(WhiteKeyRemover::default());
        let address = spawn_server(config, remover.clone()).await;
        Self { address, remover }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Start a server with `remover` and return its base URL
pub async fn spawn_server(config: ServerConfig, remover: Arc<dyn BackgroundRemover>) -> String {
    let app = Application::build(config, remover)
        .await
        .expect("Failed to build application");
    let address = format!("http://{}", app.local_addr());
    tokio::spawn(app.run_until_stopped());
    address
}

/// Default configuration bound to localhost on a random port
pub fn test_config() -> ServerConfig {
    ServerConfig::builder()
        .host(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .port(0)
        .build()
        .expect("valid test config")
}

/// Serve `bytes` at `/image` from a throwaway server, standing in for a
/// remote image host
pub async fn serve_remote_image(bytes: Vec<u8>) -> String {
    use axum::{routing::get, Router};

    let router = Router::new().route(
        "/image",
        get(move || {
            let bytes = bytes.clone();
            async move { bytes }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/image")
}

/// White RGB canvas with a red square in the middle
pub fn red_square_on_white(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for y in height / 4..height * 3 / 4 {
        for x in width / 4..width * 3 / 4 {
            img.put_pixel(x, y, Rgb([220, 20, 20]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Fully transparent RGBA canvas
pub fn transparent(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([30, 60, 90, 0])))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn png(image: &DynamicImage) -> Vec<u8> {
    encode(image, ImageFormat::Png)
}

/// Multipart form with `image` and optional extra text fields
pub fn image_form(
    bytes: Vec<u8>,
    filename: &str,
    fields: &[(&str, &str)],
) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
    let mut form = reqwest::multipart::Form::new().part("image", part);
    for (name, value) in fields {
        form = form.text((*name).to_string(), (*value).to_string());
    }
    form
}

/// Hand-built multipart body for in-process requests
pub fn multipart_body(boundary: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
