pub mod component;
pub mod markdown;
pub mod post;

pub use component::{Component, Container, Spacing};
pub use post::{ExtractedPost, Extraction, Post};
