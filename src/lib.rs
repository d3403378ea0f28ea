// Library root
// -----------
// The binary (`main.rs`) wires these modules into a single run that picks a
// random comic and publishes it to a group wall.
//
// Module responsibilities:
// - `config`: environment settings and the shared platform credentials.
// - `http`: the blocking transport seam and its reqwest implementation.
// - `comic`: talks to the comic service (latest id, metadata, image bytes).
// - `platform`: upload slot, image upload, photo registration, wall post.
// - `scratch`: the temporary image directory and its guaranteed removal.
// - `pipeline`: sequences the stages and reports where a run failed.
// - `ui`: spinner and coloured error output for the terminal.
pub mod comic;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod platform;
pub mod scratch;
pub mod ui;

pub use error::{PosterError, Result};
