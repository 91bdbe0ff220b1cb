use anyhow::{Context, Result};
use tracing::debug;

/// Seam over "open this URL in the system browser" so the view-model can
/// be exercised in tests without launching anything.
pub trait LinkOpener {
    fn open(&self, url: &str) -> Result<()>;
}

/// Hands the URL to the OS default handler. Fire-and-forget: the spawned
/// program's outcome is not consumed beyond the launch itself.
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        debug!(url, "opening apply link");
        open::that(url).with_context(|| format!("Failed to open {url} in browser"))
    }
}
