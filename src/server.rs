use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::sync::Arc;
use tera::{Context, Tera};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::connection::{self, ConnectResult, Outcome, GENERIC_FAILURE_MESSAGE, NO_DEVICE_MESSAGE};
use crate::error::PanelError;
use crate::scan::list_networks;
use crate::selection::DeviceSelector;
use crate::status::{get_status, StatusKind};

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        if let Err(e) = tera.add_raw_templates(vec![
            ("index.html", include_str!("../templates/index.html")),
            ("result.html", include_str!("../templates/result.html")),
        ]) {
            error!(error = %e, "template parsing error");
            std::process::exit(1);
        }
        tera.autoescape_on(vec![".html"]);
        tera
    };
}

pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

pub struct AppState {
    pub selector: DeviceSelector,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/select_interface", post(select_interface_handler))
        .route("/submit", post(submit_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: ServerConfig, selector: DeviceSelector) -> anyhow::Result<()> {
    let state = Arc::new(AppState { selector });
    let app = router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("WiFi control panel listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct SelectInterfaceForm {
    #[serde(default)]
    wifi_interface: String,
}

#[derive(Debug, Deserialize)]
struct ConnectForm {
    ssid: String,
    #[serde(default)]
    password: String,
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let selection = state.selector.resolve().await;
    let selected = selection.selected.clone().unwrap_or_default();

    let runner = state.selector.runner();
    let (status, networks) = tokio::join!(
        get_status(runner, &selected),
        list_networks(runner, &selected)
    );

    let mut context = Context::new();
    context.insert("status", &status);
    context.insert("status_label", status.status.label());
    context.insert("status_class", status_class(status.status));
    context.insert("error", &status.error);
    context.insert("devices", &selection.devices);
    context.insert("selected", &selected);
    context.insert("networks", &networks);

    render("index.html", &context, StatusCode::OK)
}

/// Always redirects back to the panel, whether or not the selection was accepted.
async fn select_interface_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SelectInterfaceForm>,
) -> Response {
    state.selector.select_device(&form.wifi_interface).await;
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ConnectForm>,
) -> Response {
    let interface = state.selector.current().await.unwrap_or_default();
    let result = connection::connect(
        state.selector.runner(),
        &interface,
        &form.ssid,
        &form.password,
    )
    .await;

    let code = if interface.is_empty() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    let (headline, detail) = result_summary(&result);
    let mut context = Context::new();
    context.insert("headline", &headline);
    context.insert("detail", &detail);

    render("result.html", &context, code)
}

fn status_class(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Connected => "status-connected",
        StatusKind::Disconnected => "status-disconnected",
        StatusKind::Error => "status-error",
        StatusKind::NoDevice => "status-none",
    }
}

fn result_summary(result: &ConnectResult) -> (String, Option<String>) {
    match result.outcome {
        Outcome::Success => ("Success".to_string(), Some(result.message.clone())),
        Outcome::Failure if result.message == GENERIC_FAILURE_MESSAGE => {
            ("Error: failed to connect.".to_string(), None)
        }
        Outcome::Failure if result.message == NO_DEVICE_MESSAGE => {
            (format!("Error: {}", NO_DEVICE_MESSAGE), None)
        }
        Outcome::Failure => (
            "Error: failed to connect to wifi network".to_string(),
            Some(result.message.clone()),
        ),
    }
}

fn render(template: &str, context: &Context, code: StatusCode) -> Response {
    match TEMPLATES.render(template, context) {
        Ok(html) => (code, Html(html)).into_response(),
        Err(e) => {
            let err = PanelError::TemplateRender(e.to_string());
            error!(template, error = %err, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}
