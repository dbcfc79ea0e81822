//! Configuration section definitions.
//!
//! Each module corresponds to a section in `pack.toml`:
//!
//! | Module    | TOML Section                | Purpose                          |
//! |-----------|-----------------------------|----------------------------------|
//! | `rules`   | `[[rules]]`                 | Ordered path → chain dispatch    |
//! | `output`  | `[output]`, `[minify]`      | Output dir, templates, manifest  |
//! | `resolve` | `[resolve]`                 | Extensions, module dirs, aliases |
//! | `copy`    | `[[static_copies]]`         | Verbatim copies                  |
//! | `html`    | `[[html]]`                  | Template pages                   |

mod copy;
mod html;
pub mod output;
mod resolve;
mod rules;

pub use copy::StaticCopy;
pub use html::HtmlPage;
pub use output::{MinifyConfig, OutputConfig};
pub use resolve::ResolveConfig;
pub use rules::RuleConfig;
