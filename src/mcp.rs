//! MCP adapter for hover lookups.
//!
//! An editor host (or any MCP client) resolves the token under the cursor and
//! calls the `lookup_code` tool; the returned text is rendered as the hover.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use gcode_hover::cache::JsonFileCache;
//! use gcode_hover::fetcher::HaasClient;
//! use gcode_hover::lookup::HoverLookup;
//! use gcode_hover::mcp::HoverTool;
//!
//! async fn example() {
//!     let cache = JsonFileCache::in_dir("storage".as_ref());
//!     let lookup = HoverLookup::open(cache, HaasClient::new()).await;
//!     let _tool = HoverTool::new(Arc::new(lookup));
//! }
//! ```

use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities};
use rmcp::{ServerHandler, model::ServerInfo, tool};
use rmcp::{
    model::{Content, IntoContents},
    schemars,
};
use std::sync::Arc;

use crate::cache::JsonFileCache;
use crate::fetcher::HaasClient;
use crate::lookup::HoverLookup;

pub type DefaultLookup = HoverLookup<JsonFileCache, HaasClient>;

/// Hover text for a token, or nothing to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverContent(pub Option<String>);

impl IntoContents for HoverContent {
    fn into_contents(self) -> Vec<Content> {
        self.0.map(Content::text).into_iter().collect()
    }
}

#[derive(Clone)]
pub struct HoverTool {
    lookup: Arc<DefaultLookup>,
}

#[tool(tool_box)]
impl HoverTool {
    pub fn new(lookup: Arc<DefaultLookup>) -> Self {
        Self { lookup }
    }

    /// Documentation for a G-code or M-code token, served from the local
    /// cache when fresh and fetched from the Haas reference otherwise.
    #[tool(description = "Look up documentation for a CNC G-code or M-code (e.g. G1, M06)")]
    async fn lookup_code(
        &self,
        #[tool(param)]
        #[schemars(
            description = "Token under the cursor, e.g. 'g1' or 'M30'. \
                           Characters after the code digits are ignored."
        )]
        token: String,
    ) -> HoverContent {
        HoverContent(self.lookup.lookup(&token).await)
    }
}

#[tool(tool_box)]
impl ServerHandler for HoverTool {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "This server provides hover documentation for CNC G-codes and M-codes. \
                Call 'lookup_code' with the token under the cursor. \
                An empty result means no documentation is available. \
                Results are cached for seven days.".to_string()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn tool_for(base_url: &str) -> HoverTool {
        let lookup = HoverLookup::new(
            JsonFileCache::in_memory(),
            HaasClient::with_base_url(base_url),
        );
        HoverTool::new(Arc::new(lookup))
    }

    #[test]
    fn test_hover_content_into_contents() {
        let contents = HoverContent(Some("Rapid move".to_string())).into_contents();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].as_text().unwrap().text, "Rapid move");

        assert!(HoverContent(None).into_contents().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_code_non_code() {
        let tool = tool_for("http://127.0.0.1:9");
        assert_eq!(tool.lookup_code("X10".to_string()).await, HoverContent(None));
    }

    #[tokio::test]
    async fn test_lookup_code_fetches() {
        let mut server = Server::new_async().await;
        let m = server
            .mock(
                "GET",
                "/service/codes-settings.type=mcode.machine=mill.value=M30.html",
            )
            .with_status(200)
            .with_body(
                r#"<div class="code-setting-detail-content-inner"><p>Program end</p></div>"#,
            )
            .expect(1)
            .create_async()
            .await;

        let tool = tool_for(&server.url());
        let first = tool.lookup_code("m30".to_string()).await;
        let second = tool.lookup_code("M30".to_string()).await;
        m.assert_async().await;

        assert_eq!(first, HoverContent(Some("Program end".to_string())));
        assert_eq!(second, first);
    }

    #[test]
    fn test_get_info() {
        let info = tool_for("http://127.0.0.1:9").get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("lookup_code"));
    }
}
