//! Reads SuiVenture objects from a full node over JSON-RPC.

use serde::Deserialize;
use serde_json::{
    Value,
    json,
};
use std::sync::atomic::{
    AtomicU64,
    Ordering,
};
use suiventure::{
    ChainError,
    ObjectId,
    PlayerSnapshot,
    RunObject,
    StateSource,
    SuiAddress,
    chain::TransactionDigest,
    config::{
        ConfigError,
        ContractConfig,
    },
    items::{
        Gear,
        OwnedItem,
        Pet,
    },
};

const PAGE_LIMIT: u64 = 50;
/// Returned by the node while a digest is not yet indexed.
const NOT_FOUND_MARKER: &str = "Could not find";

pub struct SuiRpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
    player_type: String,
    run_type: String,
    equipment_type: String,
    pet_type: String,
}

/// One `suix_getOwnedObjects` page, reduced to ids and Move fields.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedPage {
    pub objects: Vec<(ObjectId, Value)>,
    pub next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageDto {
    #[serde(default)]
    data: Vec<ObjectResponseDto>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Deserialize)]
struct ObjectResponseDto {
    #[serde(default)]
    data: Option<ObjectDataDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectDataDto {
    object_id: ObjectId,
    #[serde(default)]
    content: Option<ContentDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDto {
    data_type: String,
    #[serde(default)]
    fields: Value,
}

impl SuiRpcClient {
    pub fn new(url: impl Into<String>, config: &ContractConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            url: url.into(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            player_type: config.player_type()?,
            run_type: config.run_type()?,
            equipment_type: config.equipment_type()?,
            pet_type: config.pet_type()?,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let transport = |e: reqwest::Error| ChainError::Transport {
            endpoint: self.url.clone(),
            message: e.to_string(),
        };
        let res = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let status = res.status();
        let bytes = res.bytes().await.map_err(transport)?;
        if !status.is_success() {
            return Err(ChainError::Transport {
                endpoint: self.url.clone(),
                message: format!(
                    "{method} responded with {status}: {}",
                    String::from_utf8_lossy(&bytes)
                ),
            });
        }
        parse_response(&bytes)
    }

    pub async fn owned_objects_page(
        &self,
        owner: &SuiAddress,
        struct_type: &str,
        cursor: Option<&str>,
    ) -> Result<OwnedPage, ChainError> {
        let query = json!({
            "filter": { "StructType": struct_type },
            "options": { "showContent": true, "showType": true },
        });
        let result = self
            .call(
                "suix_getOwnedObjects",
                json!([owner.to_string(), query, cursor, PAGE_LIMIT]),
            )
            .await?;
        parse_owned_page(result)
    }

    async fn all_owned(
        &self,
        owner: &SuiAddress,
        struct_type: &str,
    ) -> Result<Vec<(ObjectId, Value)>, ChainError> {
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .owned_objects_page(owner, struct_type, cursor.as_deref())
                .await?;
            objects.extend(page.objects);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(objects)
    }

    async fn first_owned(
        &self,
        owner: &SuiAddress,
        struct_type: &str,
    ) -> Result<Option<(ObjectId, Value)>, ChainError> {
        let page = self.owned_objects_page(owner, struct_type, None).await?;
        Ok(page.objects.into_iter().next())
    }

    /// `Ok(None)` while the node has not indexed `digest` yet.
    pub async fn get_transaction_block(
        &self,
        digest: &TransactionDigest,
    ) -> Result<Option<Value>, ChainError> {
        let params = json!([digest.0, { "showEffects": true }]);
        match self.call("sui_getTransactionBlock", params).await {
            Ok(block) => Ok(Some(block)),
            Err(ChainError::Rpc { message, .. }) if message.contains(NOT_FOUND_MARKER) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fees collected by a transfer policy, in MIST.
    pub async fn transfer_policy_balance(
        &self,
        policy: &ObjectId,
    ) -> Result<u64, ChainError> {
        let result = self
            .call(
                "sui_getObject",
                json!([policy.to_string(), { "showContent": true }]),
            )
            .await?;
        Ok(parse_policy_balance(&result))
    }
}

impl StateSource for SuiRpcClient {
    async fn player(&self, owner: &SuiAddress) -> Result<Option<PlayerSnapshot>, ChainError> {
        let Some((id, fields)) = self.first_owned(owner, &self.player_type).await? else {
            return Ok(None);
        };
        PlayerSnapshot::from_move_fields(id, &fields)
            .map(Some)
            .map_err(|e| ChainError::Decode(e.to_string()))
    }

    async fn run(&self, owner: &SuiAddress) -> Result<Option<RunObject>, ChainError> {
        let Some((id, fields)) = self.first_owned(owner, &self.run_type).await? else {
            return Ok(None);
        };
        RunObject::from_move_fields(id, &fields)
            .map(Some)
            .map_err(|e| ChainError::Decode(e.to_string()))
    }

    async fn owned_items(&self, owner: &SuiAddress) -> Result<Vec<OwnedItem>, ChainError> {
        let (gear, pets) = tokio::join!(
            self.all_owned(owner, &self.equipment_type),
            self.all_owned(owner, &self.pet_type),
        );
        let mut items = Vec::new();
        for (id, fields) in gear? {
            match Gear::from_move_fields(id, &fields) {
                Ok(gear) => items.push(OwnedItem::Gear(gear)),
                Err(e) => tracing::warn!("skipping gear {id}: {e}"),
            }
        }
        for (id, fields) in pets? {
            match Pet::from_move_fields(id, &fields) {
                Ok(pet) => items.push(OwnedItem::Pet(pet)),
                Err(e) => tracing::warn!("skipping pet {id}: {e}"),
            }
        }
        Ok(items)
    }
}

fn parse_response(bytes: &[u8]) -> Result<Value, ChainError> {
    let response: RpcResponse = serde_json::from_slice(bytes)
        .map_err(|e| ChainError::Decode(format!("invalid JSON-RPC payload: {e}")))?;
    if let Some(RpcErrorBody { code, message }) = response.error {
        return Err(ChainError::Rpc { code, message });
    }
    response
        .result
        .ok_or_else(|| ChainError::Decode("JSON-RPC response without result".to_string()))
}

pub fn parse_owned_page(result: Value) -> Result<OwnedPage, ChainError> {
    let page: PageDto = serde_json::from_value(result)
        .map_err(|e| ChainError::Decode(format!("invalid owned objects page: {e}")))?;
    let objects = page
        .data
        .into_iter()
        .filter_map(|entry| entry.data)
        .filter_map(|data| match data.content {
            Some(content) if content.data_type == "moveObject" => {
                Some((data.object_id, content.fields))
            }
            _ => None,
        })
        .collect();
    let next_cursor = if page.has_next_page {
        page.next_cursor
    } else {
        None
    };
    Ok(OwnedPage {
        objects,
        next_cursor,
    })
}

/// Reads `content.fields.balance`, rendered either as `{ value }` or as a
/// bare amount. Anything else counts as an empty balance.
pub fn parse_policy_balance(object: &Value) -> u64 {
    let balance = &object["data"]["content"]["fields"]["balance"];
    let raw = match balance {
        Value::Object(map) => map.get("value").or_else(|| {
            map.get("fields").and_then(|fields| fields.get("value"))
        }),
        other => Some(other),
    };
    match raw {
        Some(Value::String(text)) => text.parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn parse_response__surfaces_rpc_errors() {
        let body = br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Could not find the referenced transaction"}}"#;
        let err = parse_response(body).unwrap_err();
        assert_eq!(
            err,
            ChainError::Rpc {
                code: -32602,
                message: "Could not find the referenced transaction".to_string(),
            }
        );
    }

    #[test]
    fn parse_response__returns_result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":{"data":[]}}"#;
        assert_eq!(parse_response(body).unwrap(), json!({"data": []}));
    }

    #[test]
    fn parse_owned_page__keeps_move_objects_and_cursor() {
        // given
        let result = json!({
            "data": [
                {
                    "data": {
                        "objectId": "0x77",
                        "version": "12",
                        "content": {
                            "dataType": "moveObject",
                            "type": "0x100::game_state::Run",
                            "fields": { "floor": 2 }
                        }
                    }
                },
                { "error": { "code": "deleted" } },
                {
                    "data": {
                        "objectId": "0x78",
                        "content": { "dataType": "package" }
                    }
                }
            ],
            "nextCursor": "0x77",
            "hasNextPage": true
        });

        // when
        let page = parse_owned_page(result).unwrap();

        // then
        assert_eq!(
            page.objects,
            vec![("0x77".parse().unwrap(), json!({ "floor": 2 }))]
        );
        assert_eq!(page.next_cursor.as_deref(), Some("0x77"));
    }

    #[test]
    fn parse_owned_page__last_page_has_no_cursor() {
        let result = json!({ "data": [], "nextCursor": "0x1", "hasNextPage": false });
        assert_eq!(parse_owned_page(result).unwrap().next_cursor, None);
    }

    #[test]
    fn parse_policy_balance__reads_both_balance_shapes() {
        let nested = json!({
            "data": { "content": { "dataType": "moveObject", "fields": {
                "balance": { "type": "0x2::balance::Balance<0x2::sui::SUI>", "value": "2500000000" }
            }}}
        });
        let flat = json!({
            "data": { "content": { "fields": { "balance": "42" } } }
        });
        let missing = json!({ "data": null });

        assert_eq!(parse_policy_balance(&nested), 2_500_000_000);
        assert_eq!(parse_policy_balance(&flat), 42);
        assert_eq!(parse_policy_balance(&missing), 0);
    }

    #[test]
    fn new__needs_a_package_id() {
        let result = SuiRpcClient::new("http://127.0.0.1:9000", &ContractConfig::default());
        assert!(result.is_err());
    }
}
