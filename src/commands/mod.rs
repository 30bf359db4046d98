pub mod frequency;
pub mod merge;
pub mod overlap;

pub use frequency::frequency;
pub use merge::merge;
pub use overlap::overlap;
