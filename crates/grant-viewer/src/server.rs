use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use grants_common::mcp_api::{
    GetGrantParams, GetResponseParams, GrantDetailResponse, ListGrantsResponse,
    ReloadGrantsResponse, ResponseDetailResponse,
};

use crate::error::{AppError, LoadError};
use crate::loader::{DatasetLoader, LoadState, LoadedDataset};
use crate::navigation::{self, SelectionPolicy};
use crate::present;

#[derive(Clone)]
pub struct GrantViewerServer {
    state: Arc<RwLock<LoadState>>,
    reload_lock: Arc<Mutex<()>>,
    loader: Arc<DatasetLoader>,
    policy: SelectionPolicy,
    tool_router: ToolRouter<GrantViewerServer>,
}

impl GrantViewerServer {
    pub fn new(loader: Arc<DatasetLoader>, policy: SelectionPolicy) -> Self {
        Self {
            state: Arc::new(RwLock::new(LoadState::Pending)),
            reload_lock: Arc::new(Mutex::new(())),
            loader,
            policy,
            tool_router: Self::tool_router(),
        }
    }

    #[cfg(test)]
    pub async fn load_state(&self) -> LoadState {
        self.state.read().await.clone()
    }

    /// Discard the current dataset and run the one-shot load again from empty.
    pub async fn reload(&self) -> Result<Arc<LoadedDataset>, LoadError> {
        let _guard = self.reload_lock.lock().await;
        *self.state.write().await = LoadState::Pending;

        match self.loader.load().await {
            Ok(dataset) => {
                let dataset = Arc::new(dataset);
                *self.state.write().await = LoadState::Loaded(Arc::clone(&dataset));
                Ok(dataset)
            }
            Err(e) => {
                error!(source = %self.loader.source(), error = %e, "grants data failed to load");
                *self.state.write().await = LoadState::Failed(e.user_message());
                Err(e)
            }
        }
    }

    async fn dataset(&self) -> Result<Arc<LoadedDataset>, String> {
        match &*self.state.read().await {
            LoadState::Loaded(dataset) => Ok(Arc::clone(dataset)),
            LoadState::Pending => Err("grants data is still loading".to_string()),
            LoadState::Failed(message) => Err(message.clone()),
        }
    }
}

#[tool_router]
impl GrantViewerServer {
    #[tool(description = "List grant applications in dataset order, with response status counts and the default grant.")]
    async fn list_grants(&self) -> Result<Json<ListGrantsResponse>, String> {
        let dataset = self.dataset().await?;
        let repository = &dataset.repository;

        Ok(Json(ListGrantsResponse {
            grants: repository
                .list()
                .into_iter()
                .map(present::grant_summary)
                .collect(),
            default_grant: repository
                .default_selection(self.policy.preferred())
                .map(str::to_string),
            fingerprint: dataset.fingerprint.clone(),
        }))
    }

    #[tool(description = "Show one grant: header metadata, external links, and every response with its limit status. Omit grant_id to open the default grant.")]
    async fn get_grant(
        &self,
        Parameters(params): Parameters<GetGrantParams>,
    ) -> Result<Json<GrantDetailResponse>, String> {
        let dataset = self.dataset().await?;
        let grant = navigation::resolve(
            &dataset.repository,
            params.grant_id.as_deref(),
            &self.policy,
        )
        .map_err(|e| e.to_string())?;

        Ok(Json(present::grant_detail(grant)))
    }

    #[tool(description = "Show one response in full: question, plain text to copy, and limit status.")]
    async fn get_response(
        &self,
        Parameters(params): Parameters<GetResponseParams>,
    ) -> Result<Json<ResponseDetailResponse>, String> {
        let grant_id = params.grant_id.trim().to_string();
        if grant_id.is_empty() {
            return Err("grant_id must not be empty".to_string());
        }
        let response_key = params.response_key.trim().to_string();
        if response_key.is_empty() {
            return Err("response_key must not be empty".to_string());
        }

        let dataset = self.dataset().await?;
        let grant = dataset
            .repository
            .get(&grant_id)
            .map_err(|e| e.to_string())?;
        let response = grant.response(&response_key).ok_or_else(|| {
            AppError::ResponseNotFound {
                grant_id: grant_id.clone(),
                response_key: response_key.clone(),
            }
            .to_string()
        })?;

        Ok(Json(present::response_detail(&grant.id, &response_key, response)))
    }

    #[tool(description = "Reload the grants dataset from its source, replacing what is loaded.")]
    async fn reload_grants(&self) -> Result<Json<ReloadGrantsResponse>, String> {
        info!("reload_grants tool invoked");

        let dataset = self.reload().await.map_err(|e| e.user_message())?;
        let repository = &dataset.repository;

        Ok(Json(ReloadGrantsResponse {
            grant_count: repository.len(),
            fingerprint: dataset.fingerprint.clone(),
            default_grant: repository
                .default_selection(self.policy.preferred())
                .map(str::to_string),
        }))
    }
}

#[tool_handler]
impl ServerHandler for GrantViewerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "grant-viewer".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only viewer for grant applications. Use list_grants to browse, get_grant \
                 for a grant's metadata and response statuses (over limit, needs completion, \
                 complete), get_response for a response's full text to copy, and reload_grants \
                 to load the dataset again."
                    .to_string(),
            ),
        }
    }
}
