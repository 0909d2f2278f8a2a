//! The core word catalog.
//!
//! Registers the domain-independent words: stack shuffling, arithmetic,
//! comparisons, sequence and string words, address-set words, and the
//! handful of miscellaneous builtins (`apply`, `debug`, `type`, `pos`).
//! Domain words over debug info live in their own crate and extend the
//! vocabulary built here.

mod arith;
mod aset;
mod cmp;
mod misc;
mod seq;
mod shuffle;
mod strw;

use crate::vocabulary::Vocabulary;

/// The core vocabulary.
pub fn core_voc() -> Vocabulary {
    let mut voc = Vocabulary::new();
    shuffle::register(&mut voc);
    arith::register(&mut voc);
    cmp::register(&mut voc);
    seq::register(&mut voc);
    strw::register(&mut voc);
    aset::register(&mut voc);
    misc::register(&mut voc);
    voc
}
