use std::path::{Path, PathBuf};

use crate::domain::value_objects::{AspectMode, DestinationSet, Invocation, StreamRequest};

/// Transcoder binary used when none is configured.
pub const DEFAULT_TRANSCODER: &str = "ffmpeg";

const VIDEO_BITRATE: &str = "2500k";
const VIDEO_BUFFER: &str = "5000k";
const KEYFRAME_INTERVAL: &str = "60";
const AUDIO_BITRATE: &str = "128k";

pub struct CommandBuilder {
    transcoder: PathBuf,
}

impl CommandBuilder {
    pub fn new(transcoder: impl Into<PathBuf>) -> Self {
        Self {
            transcoder: transcoder.into(),
        }
    }

    pub fn transcoder(&self) -> &Path {
        &self.transcoder
    }

    pub fn build_for(&self, request: &StreamRequest) -> Invocation {
        self.build(request.source_path(), request.destinations(), request.aspect())
    }

    /// Convert a stream request into a single looping encode that fans out
    /// through the tee muxer to every destination.
    pub fn build(
        &self,
        source: &Path,
        destinations: &DestinationSet,
        aspect: AspectMode,
    ) -> Invocation {
        let mut args: Vec<String> = vec![
            "-re".into(),
            "-stream_loop".into(),
            "-1".into(),
            "-i".into(),
            source.to_string_lossy().into_owned(),
        ];

        args.extend(
            [
                "-c:v",
                "h264",
                "-preset",
                "veryfast",
                "-b:v",
                VIDEO_BITRATE,
                "-maxrate",
                VIDEO_BITRATE,
                "-bufsize",
                VIDEO_BUFFER,
                "-g",
                KEYFRAME_INTERVAL,
                "-keyint_min",
                KEYFRAME_INTERVAL,
                "-c:a",
                "aac",
                "-b:a",
                AUDIO_BITRATE,
            ]
            .map(String::from),
        );

        if let Some(filter) = aspect.scale_filter() {
            args.push("-vf".into());
            args.push(filter.into());
        }

        args.push("-f".into());
        args.push("tee".into());
        args.push(Self::tee_target(destinations));

        Invocation::new(self.transcoder.clone(), args)
    }

    fn tee_target(destinations: &DestinationSet) -> String {
        destinations
            .iter()
            .map(|d| format!("[f={}]{}", d.platform().container(), d.ingest_url()))
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSCODER)
    }
}
