use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::debug;

use crate::error::{EngineError, Result};

#[cfg(not(target_arch = "wasm32"))]
pub fn decode(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|source| EngineError::TextureRead {
        path: path.to_path_buf(),
        source,
    })?;
    decode_bytes(path, &bytes)
}

/// Decodes an already fetched JPEG or PNG. `path` only labels errors.
pub fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes).map_err(|source| EngineError::TextureDecode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image.to_rgba8();
    debug!("decoded {:?} ({}x{})", path, image.width(), image.height());
    Ok(image)
}

/// Fetches `path` relative to the page URL.
#[cfg(target_arch = "wasm32")]
async fn fetch(path: &Path) -> Result<Vec<u8>> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    let failed = |reason: JsValue| EngineError::TextureFetch {
        path: path.to_path_buf(),
        reason: format!("{reason:?}"),
    };
    let window = web_sys::window().ok_or_else(|| failed(JsValue::from_str("no window")))?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(&path.to_string_lossy()))
        .await
        .map_err(failed)?
        .dyn_into()
        .map_err(failed)?;
    if !response.ok() {
        return Err(EngineError::TextureFetch {
            path: path.to_path_buf(),
            reason: format!("HTTP {}", response.status()),
        });
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(failed)?)
        .await
        .map_err(failed)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(target_arch = "wasm32")]
async fn load(path: &Path) -> Result<RgbaImage> {
    let bytes = fetch(path).await?;
    decode_bytes(path, &bytes)
}

/// Decodes every pool texture and hands each result to `deliver` with its
/// pool index. Native targets decode on worker threads, the web build fetches
/// over HTTP on the page's executor; results may arrive in any order.
pub fn spawn_loads<F>(paths: &[PathBuf], deliver: F)
where
    F: Fn(usize, Result<RgbaImage>) + Clone + Send + 'static,
{
    for (index, path) in paths.iter().cloned().enumerate() {
        let deliver = deliver.clone();
        cfg_if::cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                wasm_bindgen_futures::spawn_local(async move { deliver(index, load(&path).await) });
            } else {
                std::thread::spawn(move || deliver(index, decode(&path)));
            }
        }
    }
}
