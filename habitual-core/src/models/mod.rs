mod analytics;
mod completion;
mod habit;
mod streak;

pub use analytics::*;
pub use completion::*;
pub use habit::*;
pub use streak::*;
