use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail, ensure};
use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::{Mmap, MmapOptions};

/// Upper bound on the subfile table; the retail containers never exceed it.
const MAX_SUBFILES: usize = 100;
const COUNT_SIZE: usize = 2;
const OFFSET_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApSubfile {
    pub index: u16,
    pub offset: u32,
    pub size: u32,
}

impl ApSubfile {
    pub fn data_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        let end = start + self.size as usize;
        start..end
    }
}

/// Memory-mapped `.ap` container: a subfile count followed by an offset table.
#[derive(Debug)]
pub struct ApArchive {
    path: PathBuf,
    mmap: Mmap,
    subfiles: Vec<ApSubfile>,
}

impl ApArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)
            .with_context(|| format!("opening AP container at {}", path_buf.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("memory-mapping AP container {}", path_buf.display()))?;

        let subfiles = parse_index(&mmap)
            .with_context(|| format!("parsing AP container {}", path_buf.display()))?;

        Ok(ApArchive {
            path: path_buf,
            mmap,
            subfiles,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn subfiles(&self) -> &[ApSubfile] {
        &self.subfiles
    }

    pub fn subfile(&self, index: u16) -> Option<&ApSubfile> {
        self.subfiles.get(index as usize)
    }

    pub fn read_subfile(&self, index: u16) -> Result<&[u8]> {
        let subfile = self.subfile(index).ok_or_else(|| {
            anyhow!(
                "subfile {index} not present in {} ({} entries)",
                self.path.display(),
                self.subfiles.len()
            )
        })?;
        Ok(&self.mmap[subfile.data_range()])
    }

    pub fn extract_subfile<P: AsRef<Path>>(&self, index: u16, dest: P) -> Result<()> {
        let bytes = self.read_subfile(index)?;
        let mut file = File::create(dest.as_ref())
            .with_context(|| format!("creating {}", dest.as_ref().display()))?;
        file.write_all(bytes)
            .with_context(|| format!("writing {}", dest.as_ref().display()))?;
        Ok(())
    }
}

fn parse_index(bytes: &[u8]) -> Result<Vec<ApSubfile>> {
    let mut cursor = Cursor::new(bytes);
    let count = cursor
        .read_u16::<LittleEndian>()
        .context("AP container is too small to contain a subfile count")?
        as usize;
    ensure!(
        count <= MAX_SUBFILES,
        "AP container reports {count} subfiles (limit {MAX_SUBFILES})"
    );

    let table_end = COUNT_SIZE + count * OFFSET_SIZE;
    ensure!(
        table_end <= bytes.len(),
        "AP container truncated inside its offset table"
    );

    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(cursor.read_u32::<LittleEndian>()? as usize);
    }

    let mut subfiles = Vec::with_capacity(count);
    for (index, &offset) in offsets.iter().enumerate() {
        let end = offsets.get(index + 1).copied().unwrap_or(bytes.len());
        ensure!(
            offset >= table_end,
            "subfile {index} starts inside the offset table (offset {offset})"
        );
        ensure!(
            end >= offset,
            "subfile {index} offsets are not ascending ({offset} > {end})"
        );
        ensure!(end <= bytes.len(), "subfile {index} extends beyond file");

        subfiles.push(ApSubfile {
            index: index as u16,
            offset: offset as u32,
            size: (end - offset) as u32,
        });
    }

    Ok(subfiles)
}

/// Every `.ap` container of a game directory, numbered in name order.
#[derive(Debug)]
pub struct ApDirectory {
    archives: Vec<ApArchive>,
}

impl ApDirectory {
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }

        let mut paths: Vec<_> = fs::read_dir(dir)
            .with_context(|| format!("reading AP directory {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("ap"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        // File numbers are positional, so a broken container cannot be skipped.
        let archives = paths
            .iter()
            .map(ApArchive::open)
            .collect::<Result<Vec<_>>>()?;

        if archives.is_empty() {
            bail!("no AP containers found in {}", dir.display());
        }

        Ok(Self { archives })
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn archive(&self, file: usize) -> Option<&ApArchive> {
        self.archives.get(file)
    }

    pub fn archives(&self) -> &[ApArchive] {
        &self.archives
    }

    /// Copies a subfile out of the mapped container.
    pub fn load(&self, file: usize, subfile: u16) -> Result<Vec<u8>> {
        let archive = self
            .archive(file)
            .ok_or_else(|| anyhow!("file {file} out of range ({} containers)", self.len()))?;
        Ok(archive.read_subfile(subfile)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, tempdir};

    fn build_container(parts: &[&[u8]]) -> Vec<u8> {
        let table_end = COUNT_SIZE + parts.len() * OFFSET_SIZE;
        let mut data = Vec::new();
        data.extend_from_slice(&(parts.len() as u16).to_le_bytes());
        let mut offset = table_end;
        for part in parts {
            data.extend_from_slice(&(offset as u32).to_le_bytes());
            offset += part.len();
        }
        for part in parts {
            data.extend_from_slice(part);
        }
        data
    }

    #[test]
    fn parses_subfile_table() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&build_container(&[&b"ABCD"[..], &b""[..], &b"xyz"[..]]))
            .unwrap();

        let archive = ApArchive::open(file.path()).unwrap();
        assert_eq!(archive.subfiles().len(), 3);
        assert_eq!(
            archive.subfile(0),
            Some(&ApSubfile {
                index: 0,
                offset: 14,
                size: 4
            })
        );
        assert_eq!(archive.subfile(1).map(|s| s.size), Some(0));
        assert_eq!(archive.read_subfile(0).unwrap(), b"ABCD");
        assert_eq!(archive.read_subfile(2).unwrap(), b"xyz");
        assert!(archive.read_subfile(3).is_err());
    }

    #[test]
    fn rejects_descending_offsets() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&14u32.to_le_bytes());
        data.extend_from_slice(&10u32.to_le_bytes());
        data.extend_from_slice(b"payload!");
        let err = parse_index(&data).unwrap_err();
        assert!(err.to_string().contains("not ascending"));
    }

    #[test]
    fn rejects_truncated_table() {
        let mut data = Vec::new();
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&6u32.to_le_bytes());
        assert!(parse_index(&data).is_err());
    }

    #[test]
    fn directory_numbers_containers_by_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("S01.AP"), build_container(&[&b"second"[..]])).unwrap();
        fs::write(dir.path().join("S00.AP"), build_container(&[&b"first"[..]])).unwrap();
        fs::write(dir.path().join("readme.txt"), b"ignored").unwrap();

        let directory = ApDirectory::load_from_dir(dir.path()).unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.load(0, 0).unwrap(), b"first");
        assert_eq!(directory.load(1, 0).unwrap(), b"second");
        assert!(directory.load(2, 0).is_err());
    }
}
