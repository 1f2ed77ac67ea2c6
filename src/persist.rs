use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{Error, DATA_VERSION};
use crate::vocab::Count;

///Everything needed to reconstruct an engine: the three term maps plus the
///construction parameters they were built under. The delete index is not
///part of the format; it is rebuilt deterministically on load. Ordered maps
///keep the serialized form stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    pub data_version: u32,
    pub present_terms: BTreeMap<String, Count>,
    pub below_threshold_terms: BTreeMap<String, Count>,
    pub bigrams: BTreeMap<String, Count>,
    pub bigram_count_min: Count,
    pub max_length: usize,
    pub max_dictionary_edit_distance: usize,
    pub prefix_length: usize,
    pub count_threshold: Count,
}

impl PersistedState {
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer(writer, self)
            .map_err(|err| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let state: PersistedState =
            serde_json::from_reader(reader).map_err(|err| Error::Parse(err.to_string()))?;
        if state.data_version != DATA_VERSION {
            return Err(Error::InvalidArgument(format!(
                "unsupported data version {} (expected {})",
                state.data_version, DATA_VERSION
            )));
        }
        Ok(state)
    }

    ///Write the state to a file, atomically: the document lands in a
    ///temporary file next to the target and is renamed over it
    pub fn to_file(&self, path: &Path) -> Result<(), Error> {
        let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut temp = match directory {
            Some(directory) => tempfile::NamedTempFile::new_in(directory)?,
            None => tempfile::NamedTempFile::new()?,
        };
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            self.to_writer(&mut writer)?;
            writer.flush()?;
        }
        temp.persist(path).map_err(|err| Error::Io(err.error))?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedState {
        let mut present = BTreeMap::new();
        present.insert("word".to_string(), 12);
        PersistedState {
            data_version: DATA_VERSION,
            present_terms: present,
            below_threshold_terms: BTreeMap::new(),
            bigrams: BTreeMap::new(),
            bigram_count_min: u64::MAX,
            max_length: 4,
            max_dictionary_edit_distance: 2,
            prefix_length: 7,
            count_threshold: 1,
        }
    }

    #[test]
    fn round_trip_through_buffer() {
        let state = sample();
        let mut buffer = Vec::new();
        state.to_writer(&mut buffer).unwrap();
        let restored = PersistedState::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(state, restored);
    }

    #[test]
    fn version_mismatch_fails() {
        let mut state = sample();
        state.data_version = 2;
        let mut buffer = Vec::new();
        serde_json::to_writer(&mut buffer, &state).unwrap();
        assert!(PersistedState::from_reader(buffer.as_slice()).is_err());
    }
}
