// One run: pick a comic, download it, push it through the platform's upload
// sequence and post it. Stages run strictly in order; the first error ends the
// run and the scratch space is cleaned up on every exit path.

use crate::comic::ComicClient;
use crate::config::Settings;
use crate::error::PosterError;
use crate::http::Transport;
use crate::platform::PlatformClient;
use crate::scratch::ScratchDir;
use rand::Rng;
use std::fmt;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    LocatingComic,
    FetchingComic,
    RequestingSlot,
    Uploading,
    Registering,
    Publishing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Idle => "idle",
            Stage::LocatingComic => "locating comic",
            Stage::FetchingComic => "fetching comic",
            Stage::RequestingSlot => "requesting upload slot",
            Stage::Uploading => "uploading image",
            Stage::Registering => "registering photo",
            Stage::Publishing => "publishing post",
            Stage::Done => "done",
        };
        f.write_str(label)
    }
}

/// A failed run: the stage it stopped in and why.
#[derive(Debug, Error)]
#[error("{stage} failed")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: PosterError,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedComic {
    pub comic_id: u64,
    pub caption: String,
    pub attachment: String,
    pub post_id: Option<i64>,
}

pub struct Pipeline<'a, T: Transport + ?Sized> {
    settings: &'a Settings,
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> Pipeline<'a, T> {
    pub fn new(settings: &'a Settings, transport: &'a T) -> Self {
        Pipeline {
            settings,
            transport,
        }
    }

    /// Run every stage once. `observer` is told about each stage as it starts.
    pub fn run<R, F>(&self, rng: &mut R, mut observer: F) -> Result<PostedComic, PipelineError>
    where
        R: Rng + ?Sized,
        F: FnMut(Stage),
    {
        observer(Stage::Idle);
        let scratch = ScratchDir::create(&self.settings.scratch_dir, &self.settings.scratch_file)
            .map_err(|e| PipelineError {
                stage: Stage::Idle,
                source: e.into(),
            })?;

        let outcome = self.run_stages(&scratch, rng, &mut observer);

        if let Err(e) = scratch.remove() {
            warn!(error = %e, "could not clean up scratch space");
        }

        match &outcome {
            Ok(posted) => {
                observer(Stage::Done);
                info!(comic = posted.comic_id, attachment = %posted.attachment, "comic posted");
            }
            Err(e) => error!(stage = %e.stage, error = %e.source, "run failed"),
        }
        outcome
    }

    fn run_stages<R, F>(
        &self,
        scratch: &ScratchDir,
        rng: &mut R,
        observer: &mut F,
    ) -> Result<PostedComic, PipelineError>
    where
        R: Rng + ?Sized,
        F: FnMut(Stage),
    {
        let settings = self.settings;
        let group_id = settings.group_id;
        let comics = ComicClient::new(self.transport, &settings.comic_url);
        let platform =
            PlatformClient::new(self.transport, &settings.platform_url, &settings.credentials);

        let mut enter = |stage: Stage| {
            info!(%stage, "stage started");
            observer(stage);
            move |source: PosterError| PipelineError { stage, source }
        };

        let fail = enter(Stage::LocatingComic);
        let comic_id = comics.pick_random_comic_id(rng).map_err(fail)?;

        let fail = enter(Stage::FetchingComic);
        let caption = comics
            .fetch_comic(comic_id, scratch.file_path())
            .map_err(fail)?;

        let fail = enter(Stage::RequestingSlot);
        let target = platform.request_upload_slot(group_id).map_err(fail)?;

        let fail = enter(Stage::Uploading);
        let upload = platform
            .upload_image(&target.upload_url, scratch.file_path())
            .map_err(fail)?;

        let fail = enter(Stage::Registering);
        let photo = platform.register_photo(&upload, group_id).map_err(fail)?;

        let fail = enter(Stage::Publishing);
        let post = platform
            .publish_post(photo, &caption, group_id)
            .map_err(fail)?;

        Ok(PostedComic {
            comic_id,
            caption,
            attachment: photo.attachment(),
            post_id: post.post_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_chain_prints_cause_once() {
        let err = PipelineError {
            stage: Stage::Uploading,
            source: PosterError::PlatformApi {
                code: 0,
                message: "photo not uploaded".into(),
            },
        };
        assert_eq!(err.to_string(), "uploading image failed");

        let err = anyhow::Error::new(err);
        assert_eq!(
            format!("{err:#}"),
            "uploading image failed: platform error 0: photo not uploaded"
        );
    }
}
