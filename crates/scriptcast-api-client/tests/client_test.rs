use mockito::Matcher;
use scriptcast_api_client::{ApiClient, Auth, ConnectionStatus};
use scriptcast_core::models::{
    BatchExportRequest, BatchGenerateRequest, Emotion, GenerateFromFileRequest, ScriptLine,
    UploadedFile,
};
use scriptcast_core::{BackendGateway, GatewayError, UploadError};
use serde_json::json;
use std::time::Duration;

fn client_for(server: &mockito::ServerGuard) -> ApiClient {
    ApiClient::new(&server.url(), "/api", Duration::from_secs(5), None).unwrap()
}

fn line(text: &str) -> ScriptLine {
    ScriptLine {
        text: text.to_string(),
        emotion: Emotion::Friendly,
        voice: "en-US-JennyNeural".to_string(),
    }
}

#[tokio::test]
async fn test_upload_sends_multipart_and_decodes_parse() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/upload")
        .match_header(
            "content-type",
            Matcher::Regex("multipart/form-data.*".to_string()),
        )
        .match_body(Matcher::Regex("name=\"file\"; filename=\"products.xlsx\"".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "filename": "20260101_products.xlsx",
                "parsed_data": {
                    "product_name": "Widget",
                    "total_scripts": 2,
                    "scripts": ["Buy now", "Limited offer"],
                    "emotion": "Friendly",
                    "voice": "en-US-JennyNeural"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let file = UploadedFile::new("products.xlsx", b"sheet-bytes".to_vec());
    let response = client.upload(&file).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.filename, "20260101_products.xlsx");
    let set = response
        .into_parsed_set("en-US-JennyNeural", Emotion::Calm)
        .unwrap();
    assert_eq!(set.product_name, "Widget");
    assert_eq!(set.scripts.len(), 2);
}

#[tokio::test]
async fn test_success_false_is_rejection() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate-a3-batch")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "error": "voice unavailable"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let request = BatchGenerateRequest {
        product_name: "Widget".to_string(),
        batch_id: 2,
        batch_size: 1,
        scripts: vec![line("Limited offer")],
        rate: 0,
        pitch: 0,
        volume: 0,
    };
    let err = client.generate_batch(&request).await.unwrap_err();
    assert_eq!(err, GatewayError::Rejected("voice unavailable".to_string()));
}

#[tokio::test]
async fn test_non_2xx_is_status_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate-a3-audio")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let client = client_for(&server);
    let request = BatchExportRequest {
        scripts: vec![json!({"english_script": "Buy now"})],
        product_name: "Widget".to_string(),
        batch_id: 1,
    };
    let err = client.generate_audio(&request).await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::Status {
            status: 500,
            body: "internal error".to_string()
        }
    );
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_generate_batch_request_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate-a3-batch")
        .match_body(Matcher::PartialJson(json!({
            "product_name": "Widget",
            "batch_id": 1,
            "batch_size": 1,
            "scripts": [{"english_script": "Buy now", "emotion": "Friendly", "voice": "en-US-JennyNeural"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "statistics": {"total_scripts": 1, "emotion_distribution": {"Friendly": 1}},
                "scripts": [{"english_script": "Buy now", "audio": "Widget_0001_Friendly.mp3"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let request = BatchGenerateRequest {
        product_name: "Widget".to_string(),
        batch_id: 1,
        batch_size: 1,
        scripts: vec![line("Buy now")],
        rate: 0,
        pitch: 0,
        volume: 0,
    };
    let response = client.generate_batch(&request).await.unwrap();
    mock.assert_async().await;
    assert_eq!(response.statistics.unwrap().total_scripts, 1);
    assert_eq!(response.scripts.len(), 1);
}

#[tokio::test]
async fn test_export_and_file_generation() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/export-a3-excel")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "excel_path": "out/Widget_batch_1.xlsx"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/api/generate-from-file")
        .match_body(Matcher::PartialJson(json!({"filename": "stored.xlsx", "emotion": "Calm"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "generated_files": ["a.mp3", "b.mp3"],
                "summary": {"successful": 2, "failed": 0},
                "audio_directory": "out/Widget",
                "output_excel": "out/Widget.xlsx"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let export = client
        .export_spreadsheet(&BatchExportRequest {
            scripts: vec![],
            product_name: "Widget".to_string(),
            batch_id: 1,
        })
        .await
        .unwrap();
    assert_eq!(export.excel_path.as_deref(), Some("out/Widget_batch_1.xlsx"));

    let generated = client
        .generate_from_file(&GenerateFromFileRequest {
            filename: "stored.xlsx".to_string(),
            voice: None,
            emotion: Some(Emotion::Calm),
            rate: Some(0),
            pitch: None,
            volume: None,
        })
        .await
        .unwrap();
    assert_eq!(generated.counts().successful, 2);
    assert_eq!(generated.output_excel.as_deref(), Some("out/Widget.xlsx"));
}

#[tokio::test]
async fn test_status_connected_and_disconnected() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("GET", "/api/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "connected", "tts_service": {"status": "healthy"}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.status().await,
        ConnectionStatus::Connected {
            tts_service: Some("healthy".to_string())
        }
    );
    ok.assert_async().await;
    ok.remove_async().await;

    server
        .mock("GET", "/api/status")
        .with_status(500)
        .with_body(r#"{"status": "error"}"#)
        .create_async()
        .await;
    assert!(!client.status().await.is_connected());
}

#[tokio::test]
async fn test_status_unreachable_backend() {
    let client =
        ApiClient::new("http://127.0.0.1:1", "/api", Duration::from_secs(2), None).unwrap();
    let status = client.status().await;
    assert!(matches!(status, ConnectionStatus::Disconnected { .. }));
}

#[tokio::test]
async fn test_unanswered_request_times_out() {
    // Accepts connections and never writes a response.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = ApiClient::new(
        &format!("http://{}", addr),
        "/api",
        Duration::from_millis(300),
        None,
    )
    .unwrap();
    let request = BatchExportRequest {
        scripts: vec![json!({"english_script": "Buy now"})],
        product_name: "Widget".to_string(),
        batch_id: 1,
    };
    let err = client.generate_audio(&request).await.unwrap_err();
    silent.abort();

    assert!(matches!(err, GatewayError::Timeout(_)), "got {:?}", err);
    assert!(err.is_transport());
    assert!(matches!(
        UploadError::from(err),
        UploadError::NetworkFailure(_)
    ));
}

#[tokio::test]
async fn test_monitoring_endpoints() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/tasks")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total": 4, "completed": 2, "processing": 1, "error": 1, "tasks": []}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/logs")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"status": "success", "data": {"logs": ["10:00:00 - INFO - started\n", "10:00:01 - ERROR - voice unavailable\n"]}}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/get-output-files")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"success": true, "total_count": 1, "files": [{"name": "Widget_0001_Calm.mp3", "path": "Widget/Widget_0001_Calm.mp3", "size": 2048, "modified": 1767225600.5}]}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);

    let counters = client.task_counters().await.unwrap();
    assert_eq!(counters.total, 4);
    assert_eq!(counters.error, 1);

    let logs = client.recent_logs().await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1].level.as_deref(), Some("ERROR"));
    assert_eq!(logs[1].message, "voice unavailable");

    let files = client.output_files().await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].size, 2048);
}

#[tokio::test]
async fn test_api_key_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/tasks")
        .match_header("x-api-key", "secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total": 0}"#)
        .create_async()
        .await;

    let client = ApiClient::new(
        &server.url(),
        "/api",
        Duration::from_secs(5),
        Some(Auth::XApiKey("secret".to_string())),
    )
    .unwrap();
    client.task_counters().await.unwrap();
    mock.assert_async().await;
}

#[test]
fn test_build_url() {
    let client = ApiClient::new(
        "http://localhost:8000/",
        "/api/",
        Duration::from_secs(5),
        Some(Auth::Bearer("t".to_string())),
    )
    .unwrap();
    assert_eq!(client.base_url(), "http://localhost:8000");
    assert_eq!(client.build_url("/status"), "http://localhost:8000/api/status");
}
