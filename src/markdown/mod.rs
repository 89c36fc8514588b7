//! Markup → Markdown conversion.
//!
//! - [`escape`]: Markdown escaping and code fence sizing
//! - [`slugify`]: anchor slugs and per-document slug allocation
//! - [`render`]: markup tree → Markdown
//!
//! The rendering follows a small, fixed mapping:
//!
//! - **Blocks**: headings keep their depth, paragraphs and containers are
//!   separated by one blank line, `<br>` becomes a line break
//! - **Inline**: strong `**`, emphasis `*`, underline `++`, highlight `==`,
//!   strike-through `~~`, code spans with enough backticks
//! - **Lists**: flattened to one `- ` / `N. ` line per item; nested lists are
//!   folded into their parent item's text
//! - **Tables**: one row per line with a separator synthesized under the
//!   first row, whether or not it is a header

mod escape;
mod render;
mod slugify;

pub use escape::{calculate_fence_length, calculate_inline_code_ticks, escape_markdown};
pub use render::{html_to_markdown, render_element};
pub use slugify::{SlugAllocator, slugify};
