mod changelog;
mod info;
mod workshop;

pub use changelog::*;
pub use info::*;
pub use workshop::*;
