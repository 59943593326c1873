pub mod chunk;
pub mod chunk_generator;
pub mod config;
pub mod error;
pub mod grid;
pub mod ground;
pub mod layer;
pub mod map;
pub mod merge;
pub mod noise_field;
pub mod normalize;
pub mod placement;
pub mod rand_source;
pub mod sink;
pub mod species;
