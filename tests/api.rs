//! Endpoint tests: the actix app wired against a wiremock Bria.

use std::sync::Arc;

use actix_web::{App, test, web};
use restyle::AppState;
use restyle::config::{BriaConfig, PollOptions, RetryOptions};
use restyle::handlers::{
    create_batch, extract_style_profile, generate_image, get_batch_status, preview_preset,
};
use restyle::services::{BriaClient, ImageProcessor};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 0];
const BOUNDARY: &str = "----restyle-test-boundary";

fn test_state(base_url: &str) -> AppState {
    let mut config = BriaConfig::new(base_url, "test-token");
    config.extraction_poll = PollOptions::immediate(5);
    config.generation_poll = PollOptions::immediate(5);
    config.preview_poll = PollOptions::immediate(5);
    config.retry = RetryOptions::immediate(0);

    AppState {
        bria_client: Arc::new(BriaClient::new(config).unwrap()),
        image_processor: Arc::new(ImageProcessor::new()),
    }
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .service(
                    web::scope("/api/v1")
                        .route("/extract-style", web::post().to(extract_style_profile))
                        .route("/generate", web::post().to(generate_image))
                        .route("/batch", web::post().to(create_batch))
                        .route("/batch/{job_id}", web::get().to(get_batch_status))
                        .route("/preview", web::post().to(preview_preset)),
                ),
        )
        .await
    };
}

fn push_file_part(body: &mut Vec<u8>, name: &str, filename: &str, data: &[u8]) {
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
}

fn push_text_part(body: &mut Vec<u8>, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn close_multipart(body: &mut Vec<u8>) {
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
}

fn multipart_request(uri: &str, body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post().uri(uri).insert_header((
        "content-type",
        format!("multipart/form-data; boundary={}", BOUNDARY),
    ))
    .set_payload(body)
}

#[actix_web::test]
async fn extraction_continues_past_a_failing_image() {
    let server = MockServer::start().await;

    // Three sequential extraction calls: the second one fails.
    Mock::given(method("POST"))
        .and(path("/structured_prompt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "seed": 1, "structured_prompt": "{\"lighting\": \"warm\"}"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/structured_prompt"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "bad image" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/structured_prompt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "seed": 3, "structured_prompt": "{\"mood\": \"serene\"}"
        })))
        .mount(&server)
        .await;

    let app = test_app!(test_state(&server.uri()));

    let mut body = Vec::new();
    push_file_part(&mut body, "images", "a.png", PNG_BYTES);
    push_file_part(&mut body, "images", "b.png", PNG_BYTES);
    push_file_part(&mut body, "images", "c.png", PNG_BYTES);
    close_multipart(&mut body);

    let response = test::call_service(
        &app,
        multipart_request("/api/v1/extract-style", body).to_request(),
    )
    .await;
    assert!(response.status().is_success());

    let profile: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(profile["processedImages"], 3);
    assert_eq!(profile["images"].as_array().unwrap().len(), 2);
    assert_eq!(profile["errors"].as_array().unwrap().len(), 1);
    assert_eq!(profile["errors"][0]["imageIndex"], 1);
    assert_eq!(profile["images"][0]["imageIndex"], 0);
    assert_eq!(profile["images"][1]["imageIndex"], 2);
}

#[actix_web::test]
async fn extraction_prefers_the_user_supplied_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/structured_prompt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "seed": 1, "structured_prompt": "{\"lighting\": \"warm\"}"
        })))
        .mount(&server)
        .await;

    let app = test_app!(test_state(&server.uri()));

    let mut body = Vec::new();
    push_text_part(&mut body, "name", "  My Vacation Look  ");
    push_file_part(&mut body, "images", "a.png", PNG_BYTES);
    close_multipart(&mut body);

    let response = test::call_service(
        &app,
        multipart_request("/api/v1/extract-style", body).to_request(),
    )
    .await;
    assert!(response.status().is_success());

    let profile: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(profile["name"], "My Vacation Look");
}

#[actix_web::test]
async fn extraction_derives_a_name_when_none_is_given() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/structured_prompt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "seed": 1,
            "structured_prompt": "{\"time_of_day\": \"sunset\", \"mood\": \"serene\"}"
        })))
        .mount(&server)
        .await;

    let app = test_app!(test_state(&server.uri()));

    let mut body = Vec::new();
    push_file_part(&mut body, "images", "a.png", PNG_BYTES);
    close_multipart(&mut body);

    let response = test::call_service(
        &app,
        multipart_request("/api/v1/extract-style", body).to_request(),
    )
    .await;

    let profile: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(profile["name"], "Sunset Serene");
}

#[actix_web::test]
async fn extraction_rejects_an_empty_upload() {
    let server = MockServer::start().await;
    let app = test_app!(test_state(&server.uri()));

    let mut body = Vec::new();
    push_text_part(&mut body, "name", "No Images");
    close_multipart(&mut body);

    let response = test::call_service(
        &app,
        multipart_request("/api/v1/extract-style", body).to_request(),
    )
    .await;
    assert_eq!(response.status(), 400);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn extraction_rejects_non_image_files() {
    let server = MockServer::start().await;
    let app = test_app!(test_state(&server.uri()));

    let mut body = Vec::new();
    push_file_part(&mut body, "images", "notes.txt", b"just some text");
    close_multipart(&mut body);

    let response = test::call_service(
        &app,
        multipart_request("/api/v1/extract-style", body).to_request(),
    )
    .await;
    assert_eq!(response.status(), 400);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn generation_with_dna_parser_omits_the_structured_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/text-to-image/base"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image_url": "https://cdn.example/styled.png",
            "seed": 77
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app!(test_state(&server.uri()));

    let request = test::TestRequest::post()
        .uri("/api/v1/generate")
        .set_json(json!({
            "structured_prompt": "{\"lighting\": \"warm\", \"mood\": \"serene\", \"objects\": [\"tree\"]}",
            "prompt": "a red bicycle",
            "seed": 7,
            "use_style_dna_parser": true
        }))
        .to_request();

    let response = test::call_service(&app, request).await;
    assert!(response.status().is_success());

    let reply: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(reply["image_url"], "https://cdn.example/styled.png");
    assert!(reply["style_dna"].is_object());

    // The outbound Bria request must not carry scene-description fields.
    let requests = server.received_requests().await.unwrap();
    let outbound: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(outbound.get("structured_prompt").is_none());
    let prompt = outbound["prompt"].as_str().unwrap();
    assert!(
        prompt.starts_with("a red bicycle, rendered with:")
            || prompt == "a red bicycle, maintaining the same visual style, lighting, and atmosphere"
    );
    assert_eq!(outbound["seed"], 7);
}

#[actix_web::test]
async fn generation_without_the_flag_forwards_the_structured_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/text-to-image/base"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image_url": "https://cdn.example/scene.png",
            "seed": 5
        })))
        .mount(&server)
        .await;

    let app = test_app!(test_state(&server.uri()));

    let request = test::TestRequest::post()
        .uri("/api/v1/generate")
        .set_json(json!({
            "structured_prompt": "{\"lighting\": \"warm\"}"
        }))
        .to_request();

    let response = test::call_service(&app, request).await;
    assert!(response.status().is_success());

    let reply: serde_json::Value = test::read_body_json(response).await;
    assert!(reply.get("style_dna").is_none());

    let requests = server.received_requests().await.unwrap();
    let outbound: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(outbound["structured_prompt"], "{\"lighting\": \"warm\"}");
}

#[actix_web::test]
async fn generation_requires_a_prompt_of_some_kind() {
    let server = MockServer::start().await;
    let app = test_app!(test_state(&server.uri()));

    let request = test::TestRequest::post()
        .uri("/api/v1/generate")
        .set_json(json!({ "seed": 1 }))
        .to_request();

    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), 400);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn generation_relays_remote_rejections_with_their_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/text-to-image/base"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "message": "rate limited"
        })))
        .mount(&server)
        .await;

    let app = test_app!(test_state(&server.uri()));

    let request = test::TestRequest::post()
        .uri("/api/v1/generate")
        .set_json(json!({ "prompt": "a red bicycle" }))
        .to_request();

    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), 429);

    let reply: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(reply["error"], "rate limited");
    assert!(reply["briaApiError"].is_object());
}

#[actix_web::test]
async fn batch_endpoints_round_trip_the_job_handle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/batch/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "job-7",
            "status": "queued",
            "total_items": 1,
            "completed_items": 0,
            "failed_items": 0
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/batch/jobs/job-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "job-7",
            "status": "completed",
            "total_items": 1,
            "completed_items": 1,
            "failed_items": 0,
            "download_url": "https://cdn.example/archive.zip"
        })))
        .mount(&server)
        .await;

    let app = test_app!(test_state(&server.uri()));

    let create = test::TestRequest::post()
        .uri("/api/v1/batch")
        .set_json(json!({
            "items": [{
                "preset": { "name": "cinematic" },
                "prompt": "a castle at dusk",
                "negativePrompt": "blurry"
            }]
        }))
        .to_request();

    let response = test::call_service(&app, create).await;
    assert!(response.status().is_success());
    let job: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(job["jobId"], "job-7");

    let status = test::TestRequest::get()
        .uri("/api/v1/batch/job-7")
        .to_request();
    let response = test::call_service(&app, status).await;
    assert!(response.status().is_success());
    let job: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["downloadUrl"], "https://cdn.example/archive.zip");
}

#[actix_web::test]
async fn batch_creation_rejects_empty_item_lists() {
    let server = MockServer::start().await;
    let app = test_app!(test_state(&server.uri()));

    let request = test::TestRequest::post()
        .uri("/api/v1/batch")
        .set_json(json!({ "items": [] }))
        .to_request();

    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), 400);
}

#[actix_web::test]
async fn preview_endpoint_polls_to_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/preview"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(json!({ "preview_id": "pv-9" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/preview/pv-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "image_url": "https://cdn.example/pv.png"
        })))
        .mount(&server)
        .await;

    let app = test_app!(test_state(&server.uri()));

    let request = test::TestRequest::post()
        .uri("/api/v1/preview")
        .set_json(json!({
            "preset": { "name": "cinematic", "steps": 20 },
            "prompt": "a misty forest"
        }))
        .to_request();

    let response = test::call_service(&app, request).await;
    assert!(response.status().is_success());

    let reply: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(reply["image_url"], "https://cdn.example/pv.png");
}
