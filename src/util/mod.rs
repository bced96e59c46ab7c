//! Utility functions for common operations.
//!
//! - **URL validation**: SSRF guard for feed and proxy URLs read from config
//! - **Text processing**: snippet cleanup, headline word cleanup, and
//!   terminal-safe rendering helpers
//!
//! # Examples
//!
//! ```
//! use newsquiz::util::{clean_snippet, strip_control_chars, truncate_to_width, validate_url};
//!
//! let url = validate_url("https://tfl.gov.uk/info-for/media/press-releases/rss").unwrap();
//! assert_eq!(url.scheme(), "https");
//!
//! assert_eq!(clean_snippet("<p>Tube <b>strike</b></p>"), "Tube strike");
//! assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m"), "red");
//! assert_eq!(truncate_to_width("Elizabeth line", 11), "Elizabet...");
//! ```

mod text;
mod url_validator;

pub use text::{clean_snippet, clean_word, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_proxy_url, validate_url, UrlValidationError};
