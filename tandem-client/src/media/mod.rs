mod local_track;
mod media_source;
mod synthetic;

pub use local_track::*;
pub use media_source::*;
pub use synthetic::*;
