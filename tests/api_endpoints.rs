mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{
    encode, image_form, png, red_square_on_white, serve_remote_image, spawn_server, test_config,
    transparent, FailingRemover, TestApp,
};
use image::{ColorType, GenericImageView, ImageFormat};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;

async fn detail(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse JSON");
    body["detail"].as_str().expect("detail is a string").to_string()
}

#[tokio::test]
async fn health_check_returns_fixed_body() {
    let app = TestApp::spawn().await;

    let response = Client::new()
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({"status": "healthy", "service": "Background Remover API"})
    );
}

#[tokio::test]
async fn rejects_unlisted_extension() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    for filename in ["photo.gif", "photo", "archive.png.zip", "photo."] {
        let form = image_form(png(&red_square_on_white(4, 4)), filename, &[]);
        let response = client
            .post(app.url("/remove-bg"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{filename}");
        assert_eq!(
            detail(response).await,
            "Invalid file type. Allowed: png, jpg, jpeg, webp"
        );
    }

    assert_eq!(app.remover.calls(), 0);
}

#[tokio::test]
async fn accepts_extension_in_any_case() {
    let app = TestApp::spawn().await;

    let form = image_form(png(&red_square_on_white(4, 4)), "PHOTO.PnG", &[]);
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn rejects_oversized_upload_before_decoding() {
    let app = TestApp::spawn().await;

    // Not an image at all: the size check must fire first
    let form = image_form(vec![0u8; 16 * 1024 * 1024 + 1], "big.png", &[]);
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(detail(response).await, "File too large. Maximum size is 16MB");
    assert_eq!(app.remover.calls(), 0);
}

#[tokio::test]
async fn missing_image_field_is_unprocessable() {
    let app = TestApp::spawn().await;

    let form = reqwest::multipart::Form::new().text("return_type", "base64");
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn png_download_keeps_size_and_alpha() {
    let app = TestApp::spawn().await;

    let form = image_form(png(&red_square_on_white(40, 30)), "photo.png", &[]);
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    let disposition = response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=removed_bg_"));
    assert!(disposition.ends_with(".png"));

    let bytes = response.bytes().await.unwrap();
    let output = image::load_from_memory(&bytes).unwrap();
    assert_eq!(output.dimensions(), (40, 30));
    assert!(output.color().has_alpha());

    let rgba = output.to_rgba8();
    assert_eq!(rgba.get_pixel(0, 0)[3], 0);
    assert_eq!(rgba.get_pixel(20, 15).0, [220, 20, 20, 255]);
    assert_eq!(app.remover.calls(), 1);
}

#[tokio::test]
async fn jpeg_output_is_opaque_with_white_background() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    for tag in ["jpg", "jpeg", "JPG"] {
        let form = image_form(png(&transparent(16, 16)), "cutout.png", &[("output_format", tag)]);
        let response = client
            .post(app.url("/remove-bg"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{tag}");
        assert_eq!(response.headers()["content-type"], "image/jpeg");
        let disposition = response.headers()["content-disposition"].to_str().unwrap();
        assert!(disposition.ends_with(&format!(".{}", tag.to_lowercase())));

        let bytes = response.bytes().await.unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let output = image::load_from_memory(&bytes).unwrap();
        assert_eq!(output.color(), ColorType::Rgb8);
        let pixel = output.to_rgb8().get_pixel(8, 8).0;
        assert!(pixel.iter().all(|&c| c >= 250), "{pixel:?}");
    }
}

#[tokio::test]
async fn base64_envelope_describes_result() {
    let app = TestApp::spawn().await;

    let form = image_form(
        encode(&red_square_on_white(64, 48), ImageFormat::Jpeg),
        "photo.jpg",
        &[("return_type", "base64"), ("output_format", "PNG")],
    );
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["format"], "PNG");
    assert_eq!(body["original_size"], serde_json::json!([64, 48]));
    assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());

    let image_b64 = body["image"].as_str().unwrap();
    assert!(!image_b64.is_empty());
    let bytes = STANDARD.decode(image_b64).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (64, 48));
}

#[tokio::test]
async fn other_return_types_fall_back_to_download() {
    let app = TestApp::spawn().await;

    let form = image_form(
        png(&red_square_on_white(8, 8)),
        "photo.png",
        &[("return_type", "json"), ("output_format", "tiff")],
    );
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/tiff");
    let disposition = response.headers()["content-disposition"].to_str().unwrap();
    assert!(disposition.ends_with(".tiff"));
}

#[tokio::test]
async fn png_output_keeps_source_transparency() {
    let app = TestApp::spawn().await;

    let form = image_form(png(&transparent(12, 12)), "cutout.png", &[]);
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.bytes().await.unwrap();
    let output = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert!(output.pixels().all(|p| p[3] == 0));
}

#[cfg(feature = "webp-support")]
#[tokio::test]
async fn webp_output_keeps_transparency() {
    let app = TestApp::spawn().await;

    let form = image_form(
        png(&transparent(12, 12)),
        "cutout.webp",
        &[("return_type", "base64"), ("output_format", "webp")],
    );
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let bytes = STANDARD.decode(body["image"].as_str().unwrap()).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);
    let output = image::load_from_memory(&bytes).unwrap();
    assert_eq!(output.to_rgba8().get_pixel(6, 6)[3], 0);
}

#[tokio::test]
async fn unsupported_output_format_is_a_processing_error() {
    let app = TestApp::spawn().await;

    let form = image_form(
        png(&red_square_on_white(8, 8)),
        "photo.png",
        &[("output_format", "bmp")],
    );
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(detail(response).await, "Unsupported output format: bmp");
}

#[tokio::test]
async fn undecodable_upload_is_a_processing_error() {
    let app = TestApp::spawn().await;

    let form = image_form(b"definitely not a png".to_vec(), "photo.png", &[]);
    let response = Client::new()
        .post(app.url("/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(detail(response).await.contains("decode"));
    assert_eq!(app.remover.calls(), 0);
}

#[tokio::test]
async fn remover_failure_is_a_processing_error() {
    let address = spawn_server(test_config(), Arc::new(FailingRemover)).await;

    let form = image_form(png(&red_square_on_white(8, 8)), "photo.png", &[]);
    let response = Client::new()
        .post(format!("{address}/remove-bg"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(detail(response)
        .await
        .contains("segmentation model unavailable"));
}

#[tokio::test]
async fn url_endpoint_processes_remote_image() {
    let app = TestApp::spawn().await;
    let image_url = serve_remote_image(png(&red_square_on_white(30, 20))).await;

    let response = Client::new()
        .post(app.url("/remove-bg-url"))
        .query(&[("image_url", image_url.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["format"], "png");
    assert_eq!(body["original_size"], serde_json::json!([30, 20]));

    let bytes = STANDARD.decode(body["image"].as_str().unwrap()).unwrap();
    let output = image::load_from_memory(&bytes).unwrap();
    assert_eq!(output.to_rgba8().get_pixel(0, 0)[3], 0);
}

#[tokio::test]
async fn url_endpoint_accepts_json_body() {
    let app = TestApp::spawn().await;
    let image_url = serve_remote_image(png(&red_square_on_white(10, 10))).await;

    let response = Client::new()
        .post(app.url("/remove-bg-url"))
        .json(&serde_json::json!({ "image_url": image_url }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["original_size"], serde_json::json!([10, 10]));
}

#[tokio::test]
async fn url_endpoint_reports_unreachable_host() {
    let app = TestApp::spawn().await;

    let response = Client::new()
        .post(app.url("/remove-bg-url"))
        .query(&[("image_url", "http://127.0.0.1:1/nothing.png")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(detail(response)
        .await
        .starts_with("Failed to download image: "));
    assert_eq!(app.remover.calls(), 0);
}

#[tokio::test]
async fn url_endpoint_requires_image_url() {
    let app = TestApp::spawn().await;

    let response = Client::new()
        .post(app.url("/remove-bg-url"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn concurrent_requests_do_not_interfere() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let requests = (0..8u32).map(|i| {
        let client = client.clone();
        let url = app.url("/remove-bg");
        async move {
            let (width, height) = (10 + i, 20 + 2 * i);
            let form = image_form(
                png(&red_square_on_white(width, height)),
                "photo.png",
                &[("return_type", "base64")],
            );
            let body: Value = client
                .post(url)
                .multipart(form)
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            (body, width, height)
        }
    });

    let handles: Vec<_> = requests.map(tokio::spawn).collect();
    for handle in handles {
        let (body, width, height) = handle.await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["original_size"], serde_json::json!([width, height]));
    }
    assert_eq!(app.remover.calls(), 8);
}
