// Platform API client: upload slot, direct upload, photo registration and
// the final wall post.
//
// The platform reports logical failures (bad token, missing rights, unknown
// group) inside a 200 response as `{"error": {...}}`, so every method reply
// goes through `parse_reply` before its payload is looked at.

use crate::config::Credentials;
use crate::error::{PosterError, Result};
use crate::http::{HttpResponse, Transport};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const UPLOAD_FIELD: &str = "photo";
/// Value of `photo` the upload server returns when it found no image.
pub const EMPTY_PHOTO: &str = "[]";

// ---------------------------------------------------------------------------
// Reply envelope
// ---------------------------------------------------------------------------

/// Error object embedded in a platform reply.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlatformFault {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
}

/// A decoded method reply: either the payload or the platform's own error.
#[must_use]
#[derive(Debug, PartialEq)]
pub enum PlatformReply<T> {
    Success(T),
    Failure(PlatformFault),
}

impl<T> PlatformReply<T> {
    pub fn into_result(self) -> Result<T> {
        match self {
            PlatformReply::Success(value) => Ok(value),
            PlatformReply::Failure(fault) => Err(PosterError::PlatformApi {
                code: fault.error_code,
                message: fault.error_msg,
            }),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    response: Option<Value>,
    error: Option<PlatformFault>,
}

/// Decode a method reply body. Shape problems are `DataShape`; an embedded
/// error object is returned as `Failure`, not as an `Err`.
pub fn parse_reply<T: DeserializeOwned>(body: &[u8]) -> Result<PlatformReply<T>> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| PosterError::DataShape(format!("malformed platform reply: {e}")))?;
    if let Some(fault) = envelope.error {
        return Ok(PlatformReply::Failure(fault));
    }
    let response = envelope
        .response
        .ok_or_else(|| PosterError::DataShape("reply has neither `response` nor `error`".into()))?;
    serde_json::from_value(response)
        .map(PlatformReply::Success)
        .map_err(|e| PosterError::DataShape(e.to_string()))
}

// ---------------------------------------------------------------------------
// Data shapes
// ---------------------------------------------------------------------------

/// One-time URL for a direct upload.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UploadTarget {
    pub upload_url: String,
}

/// Opaque identifier the upload server returns as either a number or a string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ServerId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerId::Number(n) => write!(f, "{n}"),
            ServerId::Text(s) => f.write_str(s),
        }
    }
}

/// What the upload server hands back; all three go to `photos.saveWallPhoto`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UploadResult {
    pub server: ServerId,
    pub photo: String,
    pub hash: String,
}

/// A photo saved into the group's media library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredPhoto {
    pub owner_id: i64,
    pub media_id: i64,
}

impl RegisteredPhoto {
    /// Attachment reference for `wall.post`.
    pub fn attachment(&self) -> String {
        format!("photo{}_{}", self.owner_id, self.media_id)
    }
}

#[derive(Deserialize)]
struct SavedPhoto {
    owner_id: i64,
    id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    pub post_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Typed call parameters
// ---------------------------------------------------------------------------

/// `photos.getWallUploadServer`
pub struct UploadServerParams<'a> {
    pub credentials: &'a Credentials,
    pub group_id: u64,
}

impl UploadServerParams<'_> {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.credentials.pairs();
        pairs.push(("group_id", self.group_id.to_string()));
        pairs
    }
}

/// `photos.saveWallPhoto`
pub struct SaveWallPhotoParams<'a> {
    pub credentials: &'a Credentials,
    pub group_id: u64,
    pub upload: &'a UploadResult,
}

impl SaveWallPhotoParams<'_> {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.credentials.pairs();
        pairs.push(("group_id", self.group_id.to_string()));
        pairs.push(("server", self.upload.server.to_string()));
        pairs.push(("photo", self.upload.photo.clone()));
        pairs.push(("hash", self.upload.hash.clone()));
        pairs
    }
}

/// `wall.post`, always as the group itself.
pub struct WallPostParams<'a> {
    pub credentials: &'a Credentials,
    pub group_id: u64,
    pub message: &'a str,
    pub photo: RegisteredPhoto,
}

impl WallPostParams<'_> {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.credentials.pairs();
        // A negative owner id addresses the group's own wall.
        pairs.push(("owner_id", format!("-{}", self.group_id)));
        pairs.push(("from_group", "1".to_string()));
        pairs.push(("message", self.message.to_string()));
        pairs.push(("attachments", self.photo.attachment()));
        pairs
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct PlatformClient<'a, T: Transport + ?Sized> {
    transport: &'a T,
    base_url: String,
    credentials: &'a Credentials,
}

impl<'a, T: Transport + ?Sized> PlatformClient<'a, T> {
    pub fn new(transport: &'a T, base_url: &str, credentials: &'a Credentials) -> Self {
        PlatformClient {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    pub fn request_upload_slot(&self, group_id: u64) -> Result<UploadTarget> {
        let params = UploadServerParams {
            credentials: self.credentials,
            group_id,
        };
        let url = self.method_url("photos.getWallUploadServer");
        let res = self.transport.get(&url, &params.pairs())?;
        let target: UploadTarget = reply(res)?;
        debug!(upload_url = %target.upload_url, "upload slot issued");
        Ok(target)
    }

    /// Send the file at `source` to the one-time upload URL.
    pub fn upload_image(&self, upload_url: &str, source: &Path) -> Result<UploadResult> {
        let bytes = fs::read(source)?;
        let file_name = source
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("comic.png");
        let res = self
            .transport
            .post_file(upload_url, UPLOAD_FIELD, file_name, bytes)?
            .error_for_status()?;

        // The upload server answers with a bare object, but still uses the
        // `error` key when it rejects a request.
        let value: Value = res
            .json()
            .map_err(|e| PosterError::DataShape(format!("upload reply is not JSON: {e}")))?;
        if let Some(fault) = value.get("error") {
            let fault: PlatformFault = serde_json::from_value(fault.clone())
                .map_err(|e| PosterError::DataShape(e.to_string()))?;
            return PlatformReply::<UploadResult>::Failure(fault).into_result();
        }
        let upload: UploadResult =
            serde_json::from_value(value).map_err(|e| PosterError::DataShape(e.to_string()))?;
        if upload.photo == EMPTY_PHOTO {
            return Err(PosterError::PlatformApi {
                code: 0,
                message: "photo not uploaded".into(),
            });
        }
        info!(server = %upload.server, "image uploaded");
        Ok(upload)
    }

    pub fn register_photo(&self, upload: &UploadResult, group_id: u64) -> Result<RegisteredPhoto> {
        let params = SaveWallPhotoParams {
            credentials: self.credentials,
            group_id,
            upload,
        };
        let url = self.method_url("photos.saveWallPhoto");
        let res = self.transport.get(&url, &params.pairs())?;
        let saved: Vec<SavedPhoto> = reply(res)?;
        let first = saved
            .into_iter()
            .next()
            .ok_or_else(|| PosterError::DataShape("photos.saveWallPhoto returned no photos".into()))?;
        let photo = RegisteredPhoto {
            owner_id: first.owner_id,
            media_id: first.id,
        };
        info!(attachment = %photo.attachment(), "photo registered");
        Ok(photo)
    }

    pub fn publish_post(
        &self,
        photo: RegisteredPhoto,
        caption: &str,
        group_id: u64,
    ) -> Result<PublishedPost> {
        let params = WallPostParams {
            credentials: self.credentials,
            group_id,
            message: caption,
            photo,
        };
        let url = self.method_url("wall.post");
        let res = self.transport.post_form(&url, &params.pairs())?;
        let body: Value = reply(res)?;
        let post_id = body.get("post_id").and_then(Value::as_i64);
        info!(?post_id, "wall post created");
        Ok(PublishedPost { post_id })
    }
}

fn reply<P: DeserializeOwned>(res: HttpResponse) -> Result<P> {
    let res = res.error_for_status()?;
    parse_reply::<P>(&res.body)?.into_result()
}
