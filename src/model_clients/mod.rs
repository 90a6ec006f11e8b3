//! Model Clients (§4.A) — uniform capability contracts for text/vision/
//! image generation, each independent of a specific provider, with retry
//! and fallback handled once here rather than ad hoc per call site.

pub mod http;
pub mod image_gen;
pub mod retry;
pub mod text;
pub mod trace;
pub mod vision;

pub use http::{HttpImageGenProvider, HttpTextProvider, HttpVisionProvider};
pub use image_gen::{ImageGenClient, ImageGenProvider};
pub use retry::{ModelCallError, RetryPolicy};
pub use text::{TextProvider, TextStructuredClient};
pub use vision::{VisionClient, VisionProvider};
