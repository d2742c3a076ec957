//! Reel - clip montage builder
//!
//! Turns a directory of video clips into a single montage with a soundtrack.
//!
//! # Overview
//!
//! A run:
//! - Finds the video clips in a directory and orders them by file name
//! - Remuxes each clip into a common container in a scratch directory
//! - Concatenates them losslessly through ffmpeg's concat demuxer
//! - Replaces or mixes the audio with a local track or one fetched by yt-dlp
//! - Cleans up and opens the result in a media player
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `discovery` - Clip and audio file discovery
//! - `tools` - External tool invocation (ffmpeg, yt-dlp, player)
//! - `pipeline` - Stage coordination
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use reel::config::Settings;
//! use reel::pipeline::{Balance, MontageRequest, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings);
//!
//!     let report = pipeline
//!         .run(&MontageRequest {
//!             workdir: "clips".into(),
//!             youtube: None,
//!             balance: Some(Balance::new(0.3)?),
//!         })
//!         .await?;
//!     println!("Wrote {}", report.output.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod pipeline;
pub mod tools;

pub use error::{ReelError, Result};
