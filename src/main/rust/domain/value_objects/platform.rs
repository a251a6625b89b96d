use std::fmt;

use serde::Serialize;

/// Supported live-ingest platforms, declared in destination order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Platform {
    Facebook,
    YouTube,
    Twitch,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Facebook,
        Platform::YouTube,
        Platform::Twitch,
        Platform::TikTok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::YouTube => "YouTube",
            Platform::Twitch => "Twitch",
            Platform::TikTok => "TikTok",
        }
    }

    /// Ingest URL prefix; the stream key is appended verbatim.
    pub fn ingest_base(&self) -> &'static str {
        match self {
            Platform::Facebook => "rtmps://live-api-s.facebook.com:443/rtmp/",
            Platform::YouTube => "rtmp://a.rtmp.youtube.com/live2/",
            Platform::Twitch => "rtmp://live.twitch.tv/app/",
            Platform::TikTok => "rtmp://global-live.musical.ly:80/live/",
        }
    }

    /// Container format every platform ingests.
    pub fn container(&self) -> &'static str {
        "flv"
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
