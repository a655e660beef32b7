#[macro_use]
mod par;

pub mod align;
pub mod entrez;
pub mod error;
pub mod fetch;
pub mod phylo;
