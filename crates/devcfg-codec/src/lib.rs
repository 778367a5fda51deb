//! Line codec for hierarchical device configuration.
//!
//! Converts typed configuration objects into ordered `set`/`delete`
//! statements and parses device dumps back into the same objects:
//!
//! - [`statement`]: [`Statement`], quoting and the [`StatementWriter`]
//! - [`tokenize`](mod@tokenize): pure tokenizer and [`PrefixTable`] matcher
//! - [`dump`]: start/end marker scoping of `display set` output
//! - [`block`]: identifier-keyed nested blocks and the [`Validator`]
//! - [`secret`]: [`SecretDecoder`] implementations
//! - [`object`]: the [`ConfigObject`] trait with [`render`] and [`parse`]
//!
//! Nothing in this crate performs I/O.
//!
//! # Example
//!
//! ```ignore
//! use devcfg_codec::{parse_into, render, to_dump, PlainDecoder};
//!
//! let statements = render(&app, &["applications", "application", "web"])?;
//! for statement in &statements {
//!     println!("{statement}");
//! }
//!
//! let back = parse_into(App::named("web"), &dump_text, &PlainDecoder)?;
//! ```

pub mod block;
pub mod dump;
pub mod error;
pub mod object;
pub mod secret;
pub mod statement;
pub mod tokenize;

pub use block::{block_entry, Block, Validator};
pub use error::{CodecError, CodecResult, ValidationProblem};
pub use object::{parse, parse_into, render, to_dump, ConfigObject, ReadContext};
pub use secret::{PlainDecoder, SecretDecoder, Type9Decoder};
pub use statement::{join_words, quote_word, Statement, StatementWriter, Verb};
pub use tokenize::{tokenize, PrefixTable, Words};
