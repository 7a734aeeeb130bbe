#![forbid(unsafe_code)]

use crate::{
    Args, INVALID_PARAMS, JsonRpcRequest, METHOD_NOT_FOUND, RpcServer, RpcServerConfig,
    SERVER_NAME, SERVER_VERSION, ai_error, args_object, json_rpc_error, json_rpc_response,
    now_rfc3339, optional_string,
};
use sb_core::ids::{OrganizationId, UserId};
use sb_storage::{Scope, SqliteStore};
use serde_json::{Value, json};
use std::collections::BTreeMap;

impl RpcServer {
    pub(crate) fn new(store: SqliteStore, config: RpcServerConfig) -> Self {
        Self {
            store,
            default_scope: config.default_scope,
            window_days: config.window_days,
            pending: BTreeMap::new(),
            pending_seq: 0,
        }
    }

    pub(crate) fn handle(&mut self, request: JsonRpcRequest) -> Option<Value> {
        let JsonRpcRequest {
            method, id, params, ..
        } = request;
        let response = self.respond(&method, id.clone(), params);
        // Notifications never get a reply, not even an error.
        id.as_ref()?;
        Some(response)
    }

    fn respond(&mut self, method: &str, id: Option<Value>, params: Option<Value>) -> Value {
        if method == "ping" {
            return json_rpc_response(
                id,
                json!({
                    "server": SERVER_NAME,
                    "version": SERVER_VERSION,
                    "now": now_rfc3339(),
                }),
            );
        }

        let args = match args_object(params) {
            Ok(args) => args,
            Err(_) => return json_rpc_error(id, INVALID_PARAMS, "params must be an object"),
        };
        match crate::handlers::dispatch_handler(self, method, args) {
            Some(body) => {
                let success = body
                    .get("success")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                tracing::debug!(method, success, "request handled");
                json_rpc_response(id, body)
            }
            None => {
                tracing::debug!(method, "unknown method");
                json_rpc_error(id, METHOD_NOT_FOUND, &format!("Method not found: {method}"))
            }
        }
    }

    /// The configured tenant, unless the call names another `org` / `user`.
    pub(crate) fn scope_for(&self, args: &Args) -> Result<Scope, Value> {
        let organization = match optional_string(args, "org")? {
            Some(raw) => OrganizationId::try_new(raw)
                .map_err(|err| ai_error("INVALID_INPUT", &format!("org: {}", err.message())))?,
            None => self.default_scope.organization.clone(),
        };
        let user = match optional_string(args, "user")? {
            Some(raw) => UserId::try_new(raw)
                .map_err(|err| ai_error("INVALID_INPUT", &format!("user: {}", err.message())))?,
            None => self.default_scope.user.clone(),
        };
        Ok(Scope::new(organization, user))
    }
}
