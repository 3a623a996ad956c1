use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::{Capability, Role};
use crate::guard::http::{DeniedResponse, LoadingResponse};
use crate::routes::{access, health, pages};

#[derive(OpenApi)]
#[openapi(
	paths(
		health::health,
		access::team_access,
		access::navigation,
		pages::page
	),
	components(
		schemas(
			Role,
			Capability,
			DeniedResponse,
			LoadingResponse,
			health::HealthResponse,
			access::AccessResponse,
			access::NavEntry,
			access::NavigationResponse,
			pages::PageView,
			pages::PageResponse
		)
	),
	modifiers(&BearerAuth),
	tags(
		(name = "Health", description = "Service health"),
		(name = "Access", description = "Effective role, capabilities and navigation"),
		(name = "Pages", description = "Guarded team pages")
	)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		let mut scheme = Http::new(HttpAuthScheme::Bearer);
		scheme.bearer_format = Some("JWT".to_string());

		openapi
			.components
			.get_or_insert_with(Default::default)
			.add_security_scheme("bearerAuth", SecurityScheme::Http(scheme));
	}
}

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;
	ensure_servers(&mut doc, port);
	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
