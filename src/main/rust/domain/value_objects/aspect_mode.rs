#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectMode {
    #[default]
    Normal,
    /// 720x1280 reframe for short-form vertical platforms.
    VerticalShorts,
}

impl AspectMode {
    pub fn from_shorts_flag(shorts: bool) -> Self {
        if shorts {
            AspectMode::VerticalShorts
        } else {
            AspectMode::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectMode::Normal => "normal",
            AspectMode::VerticalShorts => "vertical-shorts",
        }
    }

    pub fn scale_filter(&self) -> Option<&'static str> {
        match self {
            AspectMode::Normal => None,
            AspectMode::VerticalShorts => Some("scale=720:1280"),
        }
    }
}
