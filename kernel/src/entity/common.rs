mod limit;
mod time;

pub use self::{limit::*, time::*};
