//! # tagsight-parser
//!
//! The syntax layer of tagsight: a fault-tolerant HTML scanner, a tree-building
//! parser, and an offset-addressed document model.
//!
//! Malformed markup is a first-class input here, not an error case. The scanner
//! never fails, it degrades to `Unknown` tokens with an attached message; the
//! parser applies explicit recovery policies (implicit close, ignored end tags,
//! force-close at end of input) and always produces a tree with well-formed
//! range invariants.
//!
//! The crate speaks byte offsets only. Line/character positions, protocol
//! types, and documentation lookup live in `tagsight-analysis`, which drives
//! this crate through [`html::Scanner`] and [`html::parse`].

pub mod html;
