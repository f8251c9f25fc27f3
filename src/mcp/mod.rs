use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use habitual_core::{EffectSink, HabitEngine, HabitError};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router,
    schemars::JsonSchema,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct McpServer {
    engine: HabitEngine,
    sink: Arc<dyn EffectSink>,
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MarkHabitRequest {
    #[schemars(description = "The habit ID to mark as completed")]
    pub habit_id: String,
    #[schemars(description = "The user who owns the habit")]
    pub user_id: String,
    #[schemars(description = "RFC 3339 completion time; defaults to now")]
    #[serde(default)]
    pub completion_date: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UnmarkHabitRequest {
    #[schemars(description = "The habit ID to unmark")]
    pub habit_id: String,
    #[schemars(description = "The user who owns the habit")]
    pub user_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DashboardRequest {
    #[schemars(description = "The user to summarise")]
    pub user_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HeatmapRequest {
    #[schemars(description = "The user whose completions to count")]
    pub user_id: String,
    #[schemars(description = "First day of the range (YYYY-MM-DD)")]
    pub start: String,
    #[schemars(description = "Last day of the range (YYYY-MM-DD)")]
    pub end: String,
}

#[derive(Debug, Serialize)]
pub struct StreakSummary {
    pub habit_id: Uuid,
    pub title: String,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub is_completed: bool,
}

impl McpServer {
    pub fn new(engine: HabitEngine, sink: Arc<dyn EffectSink>) -> Self {
        Self {
            engine,
            sink,
            tool_router: Self::tool_router(),
        }
    }

    fn parse_uuid(s: &str) -> Result<Uuid, McpError> {
        Uuid::parse_str(s)
            .map_err(|e| McpError::invalid_params(format!("Invalid UUID: {}", e), None))
    }

    fn parse_day(s: &str) -> Result<NaiveDate, McpError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| McpError::invalid_params(format!("Invalid date '{}': {}", s, e), None))
    }

    fn to_mcp_error(err: HabitError) -> McpError {
        if err.is_client_error() {
            McpError::invalid_params(err.to_string(), None)
        } else {
            McpError::internal_error(err.to_string(), None)
        }
    }

    fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_router]
impl McpServer {
    #[tool(description = "Mark a habit as completed for today (or a given time) and return its streak")]
    async fn mark_habit_completed(
        &self,
        params: Parameters<MarkHabitRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let habit_id = Self::parse_uuid(&req.habit_id)?;
        let completion_date = req
            .completion_date
            .as_deref()
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| McpError::invalid_params(format!("Invalid time: {}", e), None))
            })
            .transpose()?;

        let habit = self
            .engine
            .mark_completed(habit_id, &req.user_id, completion_date)
            .map_err(Self::to_mcp_error)?
            .dispatch(self.sink.as_ref());

        Self::json_result(&StreakSummary {
            habit_id: habit.id,
            title: habit.title,
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            is_completed: habit.is_completed,
        })
    }

    #[tool(description = "Undo the most recent completion of a habit")]
    async fn unmark_habit_completed(
        &self,
        params: Parameters<UnmarkHabitRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let habit_id = Self::parse_uuid(&req.habit_id)?;

        let habit = self
            .engine
            .unmark_completed(habit_id, &req.user_id)
            .map_err(Self::to_mcp_error)?
            .dispatch(self.sink.as_ref());

        Self::json_result(&StreakSummary {
            habit_id: habit.id,
            title: habit.title,
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            is_completed: habit.is_completed,
        })
    }

    #[tool(description = "Get habit totals and the best current streak for a user")]
    async fn get_dashboard(
        &self,
        params: Parameters<DashboardRequest>,
    ) -> Result<CallToolResult, McpError> {
        let metrics = self
            .engine
            .get_dashboard_metrics(&params.0.user_id)
            .map_err(Self::to_mcp_error)?;
        Self::json_result(&metrics)
    }

    #[tool(description = "Get per-day completion counts for a user over a date range")]
    async fn get_heatmap(
        &self,
        params: Parameters<HeatmapRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let start = Self::parse_day(&req.start)?;
        let end = Self::parse_day(&req.end)?;

        let heatmap = self
            .engine
            .get_heatmap_data(&req.user_id, start, end)
            .map_err(Self::to_mcp_error)?;
        Self::json_result(&heatmap)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Habitual MCP server for tracking habit completions and streaks".into()),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(engine: HabitEngine, sink: Arc<dyn EffectSink>) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(engine, sink);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
