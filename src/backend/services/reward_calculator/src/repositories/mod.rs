pub mod traits;

pub use traits::{ChainStateSource, ChainStateUpdate};
