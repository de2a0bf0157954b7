//! Chunk specifications filtered to the dimensions at hand.

use crate::config::ChunkSpec;
use crate::data::ArrayCollection;

/// Entries of `chunks` whose dimension exists in `ds`.
pub fn get_all_compatible_chunk_sizes<C: ArrayCollection>(chunks: &ChunkSpec, ds: &C) -> ChunkSpec {
    let dims = ds.dims();
    chunks
        .iter()
        .filter(|(dim, _)| dims.contains_key(dim.as_str()))
        .map(|(dim, len)| (dim.clone(), *len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_input_chunks;
    use crate::data::{Dataset, LazyArray, Variable};
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_only_present_dims_survive() {
        let data = LazyArray::from_array(ArrayD::zeros(IxDyn(&[3, 4, 5])));
        let mut ds = Dataset::new();
        let var = Variable::from_dims(&["time_counter", "deptht", "x"], data).unwrap();
        ds.insert_data_var("v", var).unwrap();
        let chunks = get_all_compatible_chunk_sizes(&default_input_chunks(), &ds);
        let expected: ChunkSpec = [("deptht", 2), ("time_counter", 1), ("x", 200)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(chunks, expected);
        assert!(get_all_compatible_chunk_sizes(&ChunkSpec::new(), &ds).is_empty());
    }
}
