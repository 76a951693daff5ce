// anirec: anime recommendations by similarity or genre.
//
// This is the library root. Each module corresponds to one stage of the
// recommendation flow, from raw catalog data to terminal output.

pub mod catalog;
pub mod config;
pub mod normalize;
pub mod output;
pub mod recommend;
pub mod similarity;
