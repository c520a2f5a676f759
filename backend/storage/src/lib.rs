//! Screenshot enumeration.
//!
//! Lists a user's objects in the screenshots bucket and resolves each to a
//! stable public URL, the join key used by the output cache.

pub mod enumerator;
pub mod memory;
pub mod supabase;

pub use enumerator::ScreenshotEnumerator;
pub use memory::InMemoryStorage;
pub use supabase::{SupabaseStorage, SupabaseStorageConfig};

use anyhow::{bail, Context, Result};
use reqwest::Url;

/// Parse and validate a storage base URL.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid storage URL: {raw}"))?;
    if url.cannot_be_a_base() {
        bail!("Storage URL cannot be used as a base: {raw}");
    }
    Ok(url)
}

/// `{base}/storage/v1/object/public/{bucket}/{object_path}`, with each path
/// segment percent-encoded.
pub(crate) fn public_object_url(base: &Url, bucket: &str, object_path: &str) -> String {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["storage", "v1", "object", "public", bucket])
            .extend(object_path.split('/'));
    }
    url.to_string()
}
