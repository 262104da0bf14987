//! IBGE territorial-data client: polygon meshes and locality metadata.

mod client;

pub use client::{IbgeClient, LayerSource, DEFAULT_LOCALIDADES_URL, DEFAULT_MALHAS_URL};
