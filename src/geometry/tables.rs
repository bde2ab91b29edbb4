//! Text-file loaders for externally-supplied neighbor and bond tables.
//!
//! Both formats are `num_spins` rows of `num_neighbors` whitespace-separated
//! columns; the loaders only care about the token stream, not line breaks.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PamcError, Result};

fn load_table<T: FromStr>(path: &Path, expected: usize, what: &str) -> Result<Vec<T>> {
    let contents = fs::read_to_string(path)?;
    let mut values = Vec::with_capacity(expected);
    for token in contents.split_whitespace() {
        if values.len() == expected {
            break;
        }
        let value = token.parse::<T>().map_err(|_| {
            PamcError::MalformedTable(format!(
                "{what} table {}: unparseable entry '{token}'",
                path.display()
            ))
        })?;
        values.push(value);
    }
    if values.len() < expected {
        return Err(PamcError::MalformedTable(format!(
            "{what} table {}: expected {expected} entries, found {}",
            path.display(),
            values.len()
        )));
    }
    Ok(values)
}

/// Load a neighbor table: `num_spins * num_neighbors` non-negative integers.
pub fn load_neighbor_table(
    path: impl AsRef<Path>,
    num_spins: usize,
    num_neighbors: usize,
) -> Result<Vec<u32>> {
    load_table(path.as_ref(), num_spins * num_neighbors, "neighbor")
}

/// Load a bond table: `num_spins * num_neighbors` real couplings.
pub fn load_bond_table(
    path: impl AsRef<Path>,
    num_spins: usize,
    num_neighbors: usize,
) -> Result<Vec<f64>> {
    load_table(path.as_ref(), num_spins * num_neighbors, "bond")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("pamc_{}_{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_neighbor_table() {
        let path = scratch_file("nbr_ok", "1 0\n0 1\n");
        let table = load_neighbor_table(&path, 2, 2).unwrap();
        assert_eq!(table, vec![1, 0, 0, 1]);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_load_bond_table_ignores_layout() {
        // Token count matters, line structure does not.
        let path = scratch_file("bond_ok", "1.0 -1.0 0.5\n0.25");
        let table = load_bond_table(&path, 2, 2).unwrap();
        assert_eq!(table, vec![1.0, -1.0, 0.5, 0.25]);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_short_input_is_malformed() {
        let path = scratch_file("nbr_short", "1 0 0");
        let err = load_neighbor_table(&path, 2, 2);
        assert!(matches!(err, Err(PamcError::MalformedTable(_))));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_unparseable_input_is_malformed() {
        let path = scratch_file("bond_bad", "1.0 x 2.0 3.0");
        let err = load_bond_table(&path, 2, 2);
        assert!(matches!(err, Err(PamcError::MalformedTable(_))));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_neighbor_table("/nonexistent/pamc_table", 2, 2);
        assert!(matches!(err, Err(PamcError::Io(_))));
    }
}
