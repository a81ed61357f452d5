use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::Result;
use crate::gemini::GenerationResponse;

pub const PROMPT: &str = "Explain how AI works in a few words";

/// A remote text-generation endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse>;
}

/// Sends [`PROMPT`] once and writes the reply plus a newline to `out`.
///
/// On error nothing has been written.
pub async fn ask_once<G, W>(generator: &G, out: &mut W) -> Result<()>
where
    G: TextGenerator + ?Sized,
    W: AsyncWrite + Unpin,
{
    info!("Asking: {}", PROMPT);

    let response = generator.generate(PROMPT).await?;

    debug!(
        "Response: {} chars, {} tokens",
        response.text.chars().count(),
        response.usage.total_token_count
    );

    let line = format!("{}\n", response.text);
    out.write_all(line.as_bytes()).await?;
    out.flush().await?;

    Ok(())
}
