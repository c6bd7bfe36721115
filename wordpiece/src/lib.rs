#![cfg_attr(doc, forbid(rustdoc::broken_intra_doc_links, rustdoc::private_intra_doc_links))]
//! A word piece tokenizer which converts sequences and sequence pairs into fixed-size encodings.
//!
//! The tokenizer is based on a word piece vocabulary and consists of a Bert normalizer, a Bert
//! pre-tokenizer, a word piece model and a post-tokenizer including truncation and padding
//! strategies. The encodings can be of any numerical data type which implements
//! [`Num`]` + `[`FromPrimitive`]` + `[`Copy`].
//!
//! The special tokens depend on the [`Family`] of the model:
//! - [`Family::Bert`] uses `[CLS]`, `[SEP]`, `[PAD]` and `[UNK]`.
//! - [`Family::MpNet`] uses `<s>`, `</s>`, `<pad>` and `<unk>`.
//!
//! Special tokens which are missing from the vocabulary fall back to the well-known ids of the
//! family.
//!
//! ```no_run
//! use wordpiece::{Builder, Family, Padding, Truncation};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tokenizer = Builder::<i64>::from_file("tokenizer.json")?
//!         .with_family(Family::Bert)
//!         .with_type_ids(true)
//!         .with_truncation(Truncation::fixed(128))
//!         .with_padding(Padding::fixed(128))
//!         .build()?;
//!
//!     let encoding = tokenizer.encode("This is a sequence.");
//!     let encoding = tokenizer.encode_pair("What is this?", "This is a sequence.");
//!     let encodings = tokenizer.encode_batch(&["This is a sequence.", "And another one!"]);
//!
//!     Ok(())
//! }
//! ```
//!
//! [`Num`]: num_traits::Num
//! [`FromPrimitive`]: num_traits::FromPrimitive

mod builder;
mod description;
mod encoding;
mod model;
mod normalizer;
mod padding;
mod post_tokenizer;
mod pre_tokenizer;
mod tokenizer;
mod truncation;
mod vocab;

pub use crate::{
    builder::{Builder, BuilderError},
    description::Description,
    encoding::Encoding,
    padding::{Padding, PaddingError},
    tokenizer::{Tokenizer, TokenizerError},
    truncation::{Truncation, TruncationError},
    vocab::{Family, SpecialToken, SpecialTokens, Vocab, VocabError},
};

/// A stack allocated string with a maximum length of eight bytes.
type SmallString = smallstr::SmallString<[u8; 8]>;
