// Comic service client: resolves the latest comic number, picks a random one
// and downloads its metadata and image.

use crate::error::{PosterError, Result};
use crate::http::Transport;
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Comic metadata as served by `info.0.json`. Other fields are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Comic {
    pub num: u64,
    pub img: String,
    pub title: String,
    pub alt: String,
}

impl Comic {
    /// Post text: title, blank line, alt text.
    pub fn caption(&self) -> String {
        format!("{}\n\n{}", self.title, self.alt)
    }
}

pub struct ComicClient<'a, T: Transport + ?Sized> {
    transport: &'a T,
    base_url: String,
}

impl<'a, T: Transport + ?Sized> ComicClient<'a, T> {
    pub fn new(transport: &'a T, base_url: &str) -> Self {
        ComicClient {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn latest(&self) -> Result<Comic> {
        self.metadata(&format!("{}/info.0.json", self.base_url))
    }

    pub fn comic(&self, id: u64) -> Result<Comic> {
        self.metadata(&format!("{}/{}/info.0.json", self.base_url, id))
    }

    /// Uniformly random comic number in `[1, latest]`.
    pub fn pick_random_comic_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u64> {
        let latest = self.latest()?;
        if latest.num == 0 {
            return Err(PosterError::remote(
                format!("{}/info.0.json", self.base_url),
                "latest comic number is 0",
            ));
        }
        let id = rng.random_range(1..=latest.num);
        info!(latest = latest.num, picked = id, "picked comic");
        Ok(id)
    }

    /// Download comic `id`, write its image to `destination` and return the caption.
    pub fn fetch_comic(&self, id: u64, destination: &Path) -> Result<String> {
        let comic = self.comic(id)?;
        debug!(id, img = %comic.img, "downloading image");
        let image = self.transport.get(&comic.img, &[])?.error_for_status()?;
        fs::write(destination, &image.body)?;
        info!(id, title = %comic.title, bytes = image.body.len(), "comic saved");
        Ok(comic.caption())
    }

    fn metadata(&self, url: &str) -> Result<Comic> {
        let res = self.transport.get(url, &[])?.error_for_status()?;
        res.json::<Comic>()
            .map_err(|e| PosterError::remote(url, format!("malformed comic metadata: {e}")))
    }
}
