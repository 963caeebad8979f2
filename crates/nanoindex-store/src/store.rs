use crate::error::{Result, StoreError};
use crate::meta::Meta;
use memmap2::{MmapMut, MmapOptions};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const VECTOR_ELEM_SIZE: usize = std::mem::size_of::<f32>();
const ID_ELEM_SIZE: usize = std::mem::size_of::<i64>();

fn vectors_path(dir: &Path) -> PathBuf {
    dir.join("vectors.bin")
}

fn ids_path(dir: &Path) -> PathBuf {
    dir.join("ids.bin")
}

fn open_sized(path: &Path, min_len: u64) -> std::io::Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)?;
    if file.metadata()?.len() < min_len {
        file.set_len(min_len)?;
    }
    Ok(file)
}

/// Reinterprets an `f32` mmap range as bytes for writing, and vice versa for
/// reading. Offsets into the map are always multiples of the element size,
/// so alignment of the cast pointer is guaranteed.
unsafe fn f32_slice(bytes: &[u8]) -> &[f32] {
    std::slice::from_raw_parts(bytes.as_ptr().cast::<f32>(), bytes.len() / VECTOR_ELEM_SIZE)
}

/// Persistent vector store backed by two memory-mapped files: a row-major
/// `f32` matrix (`vectors.bin`) and a parallel `i64` id array (`ids.bin`),
/// plus a small JSON metadata sidecar (spec.md §4.2, §6).
///
/// Growth, norm-cache recomputation, and row access are all served directly
/// out of the mmap with no intervening copy. Concurrency is not handled
/// here: the spec's single-writer/multi-reader model (§5) is enforced one
/// level up, by `nanoindex-service` holding a single `RwLock` over the
/// store and the index together. The only internal synchronization is the
/// norm cache, which can be recomputed concurrently by readers holding
/// nothing stronger than a shared reference.
#[derive(Debug)]
pub struct DataStore {
    dim: usize,
    data_dir: PathBuf,
    vectors_file: File,
    ids_file: File,
    vectors_mmap: MmapMut,
    ids_mmap: MmapMut,
    capacity: usize,
    count: usize,
    id_to_row: HashMap<i64, usize>,
    norm_cache: RwLock<Option<Arc<Vec<f32>>>>,
    read_only: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DataStoreStats {
    pub dim: usize,
    pub count: usize,
    pub capacity: usize,
}

impl DataStore {
    /// Opens an existing store at `data_dir`, or creates one for vectors of
    /// dimension `dim` if absent. On open, `dim` is validated against the
    /// sidecar's recorded dimension (spec.md §4.2 persistence format).
    pub fn open(data_dir: &Path, dim: usize, initial_capacity: usize) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let meta_path = Meta::path(data_dir);

        let (capacity, count, is_fresh) = if meta_path.exists() {
            let meta = Meta::load(data_dir)?;
            if meta.dim != dim {
                return Err(StoreError::CorruptMeta(format!(
                    "dim mismatch: store has {}, requested {dim}",
                    meta.dim
                )));
            }
            (meta.capacity, meta.count, false)
        } else {
            (initial_capacity.max(1), 0, true)
        };

        let vectors_file = open_sized(&vectors_path(data_dir), (capacity * dim * VECTOR_ELEM_SIZE) as u64)?;
        let ids_file = open_sized(&ids_path(data_dir), (capacity * ID_ELEM_SIZE) as u64)?;
        let vectors_mmap = unsafe { MmapOptions::new().map_mut(&vectors_file)? };
        let ids_mmap = unsafe { MmapOptions::new().map_mut(&ids_file)? };

        let mut id_to_row = HashMap::with_capacity(count);
        for row in 0..count {
            let start = row * ID_ELEM_SIZE;
            let bytes: [u8; ID_ELEM_SIZE] = ids_mmap[start..start + ID_ELEM_SIZE]
                .try_into()
                .expect("ID_ELEM_SIZE slice");
            id_to_row.insert(i64::from_le_bytes(bytes), row);
        }

        let store = Self {
            dim,
            data_dir: data_dir.to_path_buf(),
            vectors_file,
            ids_file,
            vectors_mmap,
            ids_mmap,
            capacity,
            count,
            id_to_row,
            norm_cache: RwLock::new(None),
            read_only: false,
        };

        if is_fresh {
            Meta::new(dim, capacity).save(data_dir)?;
            info!(dim, capacity, "created new DataStore");
        } else {
            info!(dim, capacity, count, "opened existing DataStore");
        }

        Ok(store)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> DataStoreStats {
        DataStoreStats {
            dim: self.dim,
            count: self.count,
            capacity: self.capacity,
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    /// Appends a batch of vectors as one atomic all-or-nothing operation
    /// (spec.md §4.2). `vectors` is a flat row-major buffer of
    /// `ids.len() * dim` floats. Returns the assigned row indices in
    /// insertion order.
    pub fn add(&mut self, vectors: &[f32], ids: &[i64]) -> Result<Vec<usize>> {
        self.ensure_writable()?;

        if vectors.len() % self.dim != 0 {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: vectors.len() % self.dim,
            });
        }
        let n_batch = vectors.len() / self.dim;
        if n_batch != ids.len() {
            return Err(StoreError::BatchLengthMismatch {
                n_vectors: n_batch,
                n_ids: ids.len(),
            });
        }
        if n_batch == 0 {
            return Ok(Vec::new());
        }

        // Reject the whole batch on any conflict, including duplicates
        // within the batch itself, before mutating anything.
        let mut seen_in_batch = std::collections::HashSet::with_capacity(n_batch);
        for &id in ids {
            if self.id_to_row.contains_key(&id) || !seen_in_batch.insert(id) {
                return Err(StoreError::DuplicateId(id));
            }
        }

        let required = self.count + n_batch;
        if required > self.capacity {
            let mut new_capacity = self.capacity.max(1);
            while new_capacity < required {
                new_capacity *= 2;
            }
            self.grow_to(new_capacity)?;
        }

        let base_row = self.count;
        let vec_start = base_row * self.dim * VECTOR_ELEM_SIZE;
        let vec_bytes = unsafe {
            std::slice::from_raw_parts(vectors.as_ptr().cast::<u8>(), vectors.len() * VECTOR_ELEM_SIZE)
        };
        self.vectors_mmap[vec_start..vec_start + vec_bytes.len()].copy_from_slice(vec_bytes);

        let ids_start = base_row * ID_ELEM_SIZE;
        for (i, &id) in ids.iter().enumerate() {
            let start = ids_start + i * ID_ELEM_SIZE;
            self.ids_mmap[start..start + ID_ELEM_SIZE].copy_from_slice(&id.to_le_bytes());
        }

        let mut rows = Vec::with_capacity(n_batch);
        for (i, &id) in ids.iter().enumerate() {
            let row = base_row + i;
            self.id_to_row.insert(id, row);
            rows.push(row);
        }
        self.count += n_batch;
        *self.norm_cache.write() = None;

        let mut meta = Meta::new(self.dim, self.capacity);
        meta.count = self.count;
        if let Err(e) = meta.save(&self.data_dir) {
            self.read_only = true;
            return Err(e);
        }

        Ok(rows)
    }

    fn grow_to(&mut self, new_capacity: usize) -> Result<()> {
        let old_capacity = self.capacity;
        let result: std::io::Result<(MmapMut, MmapMut)> = (|| {
            self.vectors_file
                .set_len((new_capacity * self.dim * VECTOR_ELEM_SIZE) as u64)?;
            self.ids_file.set_len((new_capacity * ID_ELEM_SIZE) as u64)?;
            let vectors_mmap = unsafe { MmapOptions::new().map_mut(&self.vectors_file)? };
            let ids_mmap = unsafe { MmapOptions::new().map_mut(&self.ids_file)? };
            Ok((vectors_mmap, ids_mmap))
        })();

        match result {
            Ok((vectors_mmap, ids_mmap)) => {
                self.vectors_mmap = vectors_mmap;
                self.ids_mmap = ids_mmap;
                self.capacity = new_capacity;
                info!(old_capacity, new_capacity, "grew DataStore capacity");
                Ok(())
            }
            Err(e) => {
                self.read_only = true;
                Err(StoreError::Io(e))
            }
        }
    }

    /// O(1) zero-copy view into mapped memory. Callers must not mutate.
    pub fn get_row(&self, row: usize) -> Result<&[f32]> {
        if row >= self.count {
            return Err(StoreError::RowOutOfBounds(row));
        }
        let start = row * self.dim * VECTOR_ELEM_SIZE;
        let end = start + self.dim * VECTOR_ELEM_SIZE;
        Ok(unsafe { f32_slice(&self.vectors_mmap[start..end]) })
    }

    pub fn get_by_id(&self, id: i64) -> Result<(usize, &[f32])> {
        let row = *self.id_to_row.get(&id).ok_or(StoreError::IdNotFound(id))?;
        Ok((row, self.get_row(row)?))
    }

    pub fn row_of(&self, id: i64) -> Option<usize> {
        self.id_to_row.get(&id).copied()
    }

    /// View of the full N x D matrix, row-major.
    pub fn all_vectors(&self) -> &[f32] {
        let end = self.count * self.dim * VECTOR_ELEM_SIZE;
        unsafe { f32_slice(&self.vectors_mmap[..end]) }
    }

    /// External id for a given row, used to resolve search results back to
    /// caller-facing ids.
    pub fn external_id(&self, row: usize) -> Result<i64> {
        if row >= self.count {
            return Err(StoreError::RowOutOfBounds(row));
        }
        let start = row * ID_ELEM_SIZE;
        let bytes: [u8; ID_ELEM_SIZE] = self.ids_mmap[start..start + ID_ELEM_SIZE]
            .try_into()
            .expect("ID_ELEM_SIZE slice");
        Ok(i64::from_le_bytes(bytes))
    }

    /// Lazily (re)materializes ‖v‖² for every row. A dirty cache triggers a
    /// full pass over `vectors`; a clean one is returned as-is.
    pub fn norms_sq(&self) -> Arc<Vec<f32>> {
        if let Some(cached) = self.norm_cache.read().as_ref() {
            return cached.clone();
        }
        let mut guard = self.norm_cache.write();
        if let Some(cached) = guard.as_ref() {
            return cached.clone();
        }
        let matrix = self.all_vectors();
        let mut norms = Vec::with_capacity(self.count);
        for row in 0..self.count {
            let v = &matrix[row * self.dim..(row + 1) * self.dim];
            norms.push(nanoindex_core::distance::norm_sq(v));
        }
        let computed = Arc::new(norms);
        *guard = Some(computed.clone());
        computed
    }

    /// Truncates the store back to zero rows. Capacity and allocated file
    /// sizes are left as-is so a subsequent `add` doesn't immediately
    /// re-grow.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.count = 0;
        self.id_to_row.clear();
        *self.norm_cache.write() = None;
        Meta::new(self.dim, self.capacity).save(&self.data_dir)?;
        Ok(())
    }

    /// Ensures durability of mapped pages and the metadata sidecar.
    pub fn flush(&self) -> Result<()> {
        self.vectors_mmap.flush()?;
        self.ids_mmap.flush()?;
        self.vectors_file.sync_all()?;
        self.ids_file.sync_all()?;
        let mut meta = Meta::new(self.dim, self.capacity);
        meta.count = self.count;
        meta.save(&self.data_dir)?;
        Ok(())
    }
}
