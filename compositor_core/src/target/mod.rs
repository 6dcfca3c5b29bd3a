//! Off-screen render targets

mod render_target;

pub use render_target::{AttachmentKind, RenderTarget, RenderTargetSpec, MAX_COLOR_ATTACHMENTS};
