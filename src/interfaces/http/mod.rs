mod errors;

use std::sync::Arc;

use actix_cors::Cors;
use actix_multipart::{Field, Multipart};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer};
use futures_util::TryStreamExt;

use crate::application::DatasetUseCase;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::ServerConfig;

/// Multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

pub struct HttpState {
    pub datasets: Arc<DatasetUseCase>,
}

#[post("/upload/")]
async fn upload(data: web::Data<HttpState>, payload: Multipart) -> Result<HttpResponse> {
    let (filename, content) = read_file_field(payload, data.datasets.max_upload_bytes()).await?;
    tracing::info!(filename = %filename, bytes = content.len(), "Upload received");

    let detail = data.datasets.upload(&filename, content).await?;
    Ok(HttpResponse::Created().json(detail))
}

#[get("/datasets/")]
async fn list_datasets(data: web::Data<HttpState>) -> Result<HttpResponse> {
    let entries = data.datasets.list().await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[get("/datasets/{id}/")]
async fn get_dataset(data: web::Data<HttpState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let detail = data.datasets.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[get("/datasets/{id}/csv/")]
async fn dataset_csv(data: web::Data<HttpState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let (filename, content) = data.datasets.csv_content(path.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header(disposition(DispositionType::Attachment, filename))
        .body(content))
}

#[get("/datasets/{id}/report/")]
async fn dataset_report(data: web::Data<HttpState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let report = data.datasets.report(path.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(disposition(DispositionType::Inline, report.filename))
        .body(report.content))
}

fn disposition(kind: DispositionType, filename: String) -> ContentDisposition {
    ContentDisposition {
        disposition: kind,
        parameters: vec![DispositionParam::Filename(filename)],
    }
}

/// Buffer the `file` field of a multipart upload, enforcing `max_bytes`
async fn read_file_field(mut payload: Multipart, max_bytes: usize) -> Result<(String, Vec<u8>)> {
    while let Some(field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::ValidationError("Uploaded file has no filename".to_string())
            })?;
        let content = read_field(field, max_bytes).await?;
        return Ok((filename, content));
    }

    Err(AppError::ValidationError(format!(
        "No '{}' field in upload",
        FILE_FIELD
    )))
}

async fn read_field(mut field: Field, max_bytes: usize) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if content.len() + chunk.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {} byte limit",
                max_bytes
            )));
        }
        content.extend_from_slice(&chunk);
    }
    Ok(content)
}

fn multipart_error(e: actix_multipart::MultipartError) -> AppError {
    AppError::ValidationError(format!("Invalid multipart body: {}", e))
}

/// Register all `/api` routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(upload)
            .service(list_datasets)
            .service(get_dataset)
            .service(dataset_csv)
            .service(dataset_report),
    );
}

pub fn start_server(datasets: Arc<DatasetUseCase>, config: &ServerConfig) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState { datasets });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Browser and desktop clients on any origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    tracing::info!(host = %config.host, port = config.port, "HTTP server listening");
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SummaryEngine;
    use crate::domain::equipment::DatasetDetail;
    use crate::infrastructure::config::DatasetPolicy;
    use crate::infrastructure::db::SqliteDatasetStore;
    use actix_web::http::{header, StatusCode};
    use actix_web::test;

    const BOUNDARY: &str = "chemstat-test-boundary";
    const CSV: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature
Pump-1,Pump,120,5.2,110
Valve-1,Valve,60,4.1,105
Pump-2,Pump,132,5.6,118
";

    async fn state(policy: DatasetPolicy) -> web::Data<HttpState> {
        let store = SqliteDatasetStore::init("sqlite::memory:", 1).await.unwrap();
        let datasets = DatasetUseCase::new(SummaryEngine::default(), Arc::new(store), policy);
        web::Data::new(HttpState {
            datasets: Arc::new(datasets),
        })
    }

    fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(field: &str, filename: &str, content: &[u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/upload/")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(field, filename, content))
    }

    #[actix_web::test]
    async fn test_upload_then_fetch() {
        let app = test::init_service(
            App::new()
                .app_data(state(DatasetPolicy::default()).await)
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, upload_request("file", "plant.csv", CSV.as_bytes()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let detail: DatasetDetail = test::read_body_json(resp).await;
        assert_eq!(detail.entry.filename, "plant.csv");
        assert_eq!(detail.summary.count, 3);
        assert_eq!(detail.summary.type_distribution["Pump"], 2);

        let id = detail.entry.id;
        let req = test::TestRequest::get().uri(&format!("/api/datasets/{id}/")).to_request();
        let fetched: DatasetDetail = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, detail);

        let req = test::TestRequest::get().uri("/api/datasets/").to_request();
        let listed: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);
        assert!(listed[0].get("summary").is_none());

        let req = test::TestRequest::get().uri(&format!("/api/datasets/{id}/csv/")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");
        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), CSV.as_bytes());
    }

    #[actix_web::test]
    async fn test_report_headers() {
        let app = test::init_service(
            App::new()
                .app_data(state(DatasetPolicy::default()).await)
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, upload_request("file", "plant.csv", CSV.as_bytes()).to_request()).await;
        let detail: DatasetDetail = test::read_body_json(resp).await;
        let id = detail.entry.id;

        let req = test::TestRequest::get().uri(&format!("/api/datasets/{id}/report/")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            format!("inline; filename=\"report_{id}.pdf\"").as_str()
        );
        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"%PDF"));
    }

    #[actix_web::test]
    async fn test_error_responses() {
        let app = test::init_service(
            App::new()
                .app_data(
                    state(DatasetPolicy {
                        retention_limit: 5,
                        max_upload_bytes: 32,
                    })
                    .await,
                )
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/datasets/42/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().contains("42"));

        let resp = test::call_service(&app, upload_request("file", "plant.txt", b"type\nPump\n").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(&app, upload_request("other", "plant.csv", b"type\nPump\n").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(&app, upload_request("file", "plant.csv", CSV.as_bytes()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let resp = test::call_service(&app, upload_request("file", "plant.csv", b"type\n\xC3\x28\n").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/datasets/").to_request();
        let listed: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert!(listed.is_empty());
    }
}
