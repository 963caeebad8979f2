//! Binary `ivf.bin` snapshot format (spec.md §6):
//! centroids (`K * D` float32, row-major) + inverted lists as a sequence of
//! `(cluster_id: u32, list_len: u32, row_indices: u32[list_len])` + trailer
//! `{k: u32, n_trained: u32}`. All integers are little-endian.

use crate::error::{IndexError, Result};
use crate::ivf::IVFIndex;
use nanoindex_core::distance::norm_sq;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

impl IVFIndex {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        for &f in self.centroids() {
            w.write_all(&f.to_le_bytes())?;
        }

        for (cluster_id, list) in self.inverted_lists().iter().enumerate() {
            w.write_all(&(cluster_id as u32).to_le_bytes())?;
            w.write_all(&(list.len() as u32).to_le_bytes())?;
            for &row in list {
                w.write_all(&(row as u32).to_le_bytes())?;
            }
        }

        w.write_all(&(self.k() as u32).to_le_bytes())?;
        w.write_all(&(self.n_trained() as u32).to_le_bytes())?;
        w.flush()?;
        info!(path = %path.display(), "ivf snapshot saved");
        Ok(())
    }

    /// Reads just the trailer's `k` without parsing the rest of the file —
    /// used on startup when the caller doesn't yet know what `k` a
    /// previous `train` call used.
    pub fn peek_k(path: &Path) -> Result<usize> {
        let mut file = File::open(path)?;
        let mut tail = [0u8; 8];
        use std::io::{Seek, SeekFrom};
        file.seek(SeekFrom::End(-8))
            .map_err(|_| IndexError::CorruptSnapshot("file too short for a trailer".to_string()))?;
        file.read_exact(&mut tail)?;
        Ok(u32::from_le_bytes(tail[0..4].try_into().unwrap()) as usize)
    }

    pub fn load(path: &Path, dim: usize, k: usize) -> Result<Self> {
        let file = File::open(path)?;
        let mut r = BufReader::new(file);
        let mut buf = Vec::new();
        r.read_to_end(&mut buf)?;

        if buf.len() < 8 {
            return Err(IndexError::CorruptSnapshot(
                "file too short for a trailer".to_string(),
            ));
        }
        let trailer_k = u32::from_le_bytes(buf[buf.len() - 8..buf.len() - 4].try_into().unwrap()) as usize;
        let n_trained = u32::from_le_bytes(buf[buf.len() - 4..].try_into().unwrap()) as usize;
        if trailer_k != k {
            return Err(IndexError::CorruptSnapshot(format!(
                "trailer k={trailer_k} does not match requested k={k}"
            )));
        }

        let body = &buf[..buf.len() - 8];
        let centroid_bytes = k * dim * 4;
        if body.len() < centroid_bytes {
            return Err(IndexError::CorruptSnapshot(
                "file too short for centroid matrix".to_string(),
            ));
        }
        let mut centroids = Vec::with_capacity(k * dim);
        for chunk in body[..centroid_bytes].chunks_exact(4) {
            centroids.push(f32::from_le_bytes(chunk.try_into().unwrap()));
        }

        let mut inverted_lists: Vec<Vec<usize>> = vec![Vec::new(); k];
        let mut cursor = centroid_bytes;
        while cursor < body.len() {
            if cursor + 8 > body.len() {
                return Err(IndexError::CorruptSnapshot(
                    "truncated inverted list header".to_string(),
                ));
            }
            let cluster_id =
                u32::from_le_bytes(body[cursor..cursor + 4].try_into().unwrap()) as usize;
            let list_len =
                u32::from_le_bytes(body[cursor + 4..cursor + 8].try_into().unwrap()) as usize;
            cursor += 8;

            if cluster_id >= k {
                return Err(IndexError::CorruptSnapshot(format!(
                    "cluster_id {cluster_id} out of range for k={k}"
                )));
            }
            let needed = list_len * 4;
            if cursor + needed > body.len() {
                return Err(IndexError::CorruptSnapshot(
                    "truncated inverted list body".to_string(),
                ));
            }
            let mut rows = Vec::with_capacity(list_len);
            for chunk in body[cursor..cursor + needed].chunks_exact(4) {
                rows.push(u32::from_le_bytes(chunk.try_into().unwrap()) as usize);
            }
            inverted_lists[cluster_id] = rows;
            cursor += needed;
        }

        let centroid_norms: Vec<f32> = (0..k)
            .map(|c| norm_sq(&centroids[c * dim..(c + 1) * dim]))
            .collect();

        info!(path = %path.display(), k, n_trained, "ivf snapshot loaded");
        Ok(IVFIndex::from_parts(
            dim,
            k,
            n_trained,
            centroids,
            centroid_norms,
            inverted_lists,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanoindex_store::DataStore;

    #[test]
    fn round_trips_through_disk() {
        let store_dir = tempfile::tempdir().unwrap();
        let mut store = DataStore::open(store_dir.path(), 2, 8).unwrap();
        let vectors = [0.0, 0.0, 10.0, 10.0, 0.1, 0.1, 9.9, 10.1];
        let ids = [1i64, 2, 3, 4];
        store.add(&vectors, &ids).unwrap();

        let index =
            IVFIndex::train(&store, 2, crate::ivf::TrainParams::new(7)).unwrap();

        let snapshot_path = store_dir.path().join("ivf.bin");
        index.save(&snapshot_path).unwrap();
        let reloaded = IVFIndex::load(&snapshot_path, 2, 2).unwrap();

        assert_eq!(reloaded.n_trained(), index.n_trained());
        assert_eq!(reloaded.centroids(), index.centroids());
        assert_eq!(reloaded.inverted_lists(), index.inverted_lists());
    }

    #[test]
    fn rejects_mismatched_k() {
        let store_dir = tempfile::tempdir().unwrap();
        let mut store = DataStore::open(store_dir.path(), 2, 8).unwrap();
        store.add(&[0.0, 0.0, 1.0, 1.0], &[1, 2]).unwrap();
        let index = IVFIndex::train(&store, 1, crate::ivf::TrainParams::new(1)).unwrap();
        let snapshot_path = store_dir.path().join("ivf.bin");
        index.save(&snapshot_path).unwrap();
        assert!(IVFIndex::load(&snapshot_path, 2, 2).is_err());
    }
}
