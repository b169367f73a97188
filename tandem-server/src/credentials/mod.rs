mod broker;
mod upstream;

pub use broker::*;
pub use upstream::*;
