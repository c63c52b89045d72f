pub mod names;
pub mod post;
pub mod pre;

pub use names::ClassNames;
pub use post::PostProcessor;
pub use pre::{LetterboxTransform, PreProcessor};
