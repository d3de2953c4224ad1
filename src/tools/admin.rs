//! Connectivity, pricing, credential, and cache administration tools.

use rmcp::model::Tool;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::cache::CacheCategory;
use crate::credentials::{save_credentials, CredentialPair};
use crate::gateway::ApiGateway;
use crate::tools::{parse_args, tool, CredentialPersist, NoArgs};

pub(crate) fn tools() -> Vec<Tool> {
    vec![
        tool(
            "ping",
            "Check connectivity and credentials against the registrar API. Returns your public IP on success.",
            json!({"type": "object", "properties": {}}),
        ),
        tool(
            "get_pricing",
            "Retrieve registration, renewal, and transfer pricing for all TLDs. Cached.",
            json!({"type": "object", "properties": {}}),
        ),
        tool(
            "set_credentials",
            "Configure the registrar API credential pair. The pair is held in memory and persisted encrypted when a passphrase is configured.",
            json!({
                "type": "object",
                "properties": {
                    "api_key": {"type": "string", "description": "Registrar API key"},
                    "secret_api_key": {"type": "string", "description": "Registrar secret API key"}
                },
                "required": ["api_key", "secret_api_key"]
            }),
        ),
        tool(
            "clear_cache",
            "Drop every cached upstream response unconditionally.",
            json!({"type": "object", "properties": {}}),
        ),
    ]
}

pub(crate) async fn ping(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let _args: NoArgs = parse_args(arguments)?;
    gw.call("ping", "ping", Map::new(), None).await
}

pub(crate) async fn get_pricing(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let _args: NoArgs = parse_args(arguments)?;
    gw.call(
        "pricing/get",
        "pricing/get",
        Map::new(),
        Some(CacheCategory::Pricing),
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SetCredentialsArgs {
    api_key: String,
    secret_api_key: String,
}

pub(crate) async fn set_credentials(
    gw: &ApiGateway,
    persist: &CredentialPersist,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let args: SetCredentialsArgs = parse_args(arguments)?;
    let pair = CredentialPair::new(args.api_key, args.secret_api_key)?;

    let persisted = match &persist.passphrase {
        Some(passphrase) => {
            let record = pair.encrypt(passphrase)?;
            save_credentials(&persist.path, &record)?;
            true
        }
        None => {
            tracing::warn!(
                "credential passphrase env var unset — credentials held in memory only"
            );
            false
        }
    };

    gw.credentials().set(pair).await;
    // Cached reads from the previous account must not be served to the new one
    gw.clear_cache().await;

    tracing::info!(persisted = %persisted, "API credentials updated");
    Ok(json!({
        "status": "SUCCESS",
        "persisted": persisted,
    }))
}

pub(crate) async fn clear_cache(
    gw: &ApiGateway,
    arguments: Option<Map<String, Value>>,
) -> crate::Result<Value> {
    let _args: NoArgs = parse_args(arguments)?;
    gw.clear_cache().await;
    Ok(json!({
        "status": "SUCCESS",
        "message": "response cache cleared",
    }))
}
