use crate::dispatch::handle_request;
use crate::handler::McpHandler;
use crate::rpc::RpcRequest;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Run the stdio transport: one JSON-RPC request per line on stdin, one
/// JSON-RPC response per line on stdout. Used when CubeGate is launched
/// directly by an MCP client as a subprocess, bound to a single database
/// resolved from startup configuration rather than a session header.
pub async fn serve_stdio(handler: McpHandler) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request: RpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse stdio JSON-RPC request");
                continue;
            }
        };

        let response = handle_request(request, &handler).await;
        let mut payload = serde_json::to_string(&response)
            .expect("RpcResponse always serializes");
        payload.push('\n');
        stdout.write_all(payload.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}
