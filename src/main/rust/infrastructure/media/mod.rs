mod media_library;

pub use media_library::{MediaLibrary, VIDEO_EXTENSIONS};
