//! Lookup of per-station profile tables on disk.

use crate::error::ProfileError;
use crate::table::parse_profile_file;
use lib_types::earth::EarthModel;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "res_model_";
const FILE_SUFFIX: &str = ".txt";

/// Ordered set of directories holding `res_model_<STATION>.txt` files.
#[derive(Clone, Debug, Default)]
pub struct ProfileStore {
    dirs: Vec<PathBuf>,
}

impl ProfileStore {
    /// Search exactly `dirs`, in order.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Search `extra` first, then the per-user locations
    /// `~/.gmag/Stations` and `~/Stations`.
    pub fn with_default_dirs(extra: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut dirs: Vec<PathBuf> = extra.into_iter().collect();
        dirs.extend(default_dirs());
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// File name of a station's table.
    pub fn file_name(station: &str) -> String {
        format!("{}{}{}", FILE_PREFIX, station, FILE_SUFFIX)
    }

    /// First existing table for `station`.
    ///
    /// In each directory the code is tried as written, then upper-cased.
    pub fn find(&self, station: &str) -> Option<PathBuf> {
        let station = station.trim();
        if station.is_empty() {
            return None;
        }

        let upper = station.to_ascii_uppercase();
        let mut names = vec![Self::file_name(station)];
        if upper != station {
            names.push(Self::file_name(&upper));
        }

        self.dirs
            .iter()
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
    }

    /// Load the model for `station`; `Ok(None)` when no table exists.
    pub fn load(&self, station: &str) -> Result<Option<EarthModel>, ProfileError> {
        match self.find(station) {
            Some(path) => {
                tracing::debug!("Station {} profile at {:?}", station, path);
                parse_profile_file(&path).map(Some)
            }
            None => {
                tracing::debug!(
                    "No profile for station {} in {} director(ies)",
                    station,
                    self.dirs.len()
                );
                Ok(None)
            }
        }
    }

    /// Station codes with a table in any search directory, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut stations = BTreeSet::new();
        for dir in &self.dirs {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                if let Some(code) = station_code(&entry.path()) {
                    stations.insert(code);
                }
            }
        }
        stations.into_iter().collect()
    }
}

/// The per-user search directories that exist on this platform.
pub fn default_dirs() -> Vec<PathBuf> {
    directories::BaseDirs::new()
        .map(|base| {
            let home = base.home_dir();
            vec![home.join(".gmag").join("Stations"), home.join("Stations")]
        })
        .unwrap_or_default()
}

fn station_code(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    let name = path.file_name()?.to_str()?;
    let code = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    (!code.is_empty()).then(|| code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_profile(dir: &Path, station: &str, content: &str) {
        fs::write(dir.join(ProfileStore::file_name(station)), content).unwrap();
    }

    #[test]
    fn test_file_name() {
        assert_eq!(ProfileStore::file_name("GILL"), "res_model_GILL.txt");
    }

    #[test]
    fn test_search_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_profile(first.path(), "GILL", "100\n");
        write_profile(second.path(), "GILL", "200\n");
        write_profile(second.path(), "FCHU", "300\n");

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let store = ProfileStore::new(dirs);

        let gill = store.load("GILL").unwrap().unwrap();
        assert_eq!(gill.resistivities(), &[100.0]);

        let fchu = store.load("FCHU").unwrap().unwrap();
        assert_eq!(fchu.resistivities(), &[300.0]);
    }

    #[test]
    fn test_lowercase_station_code() {
        let dir = TempDir::new().unwrap();
        write_profile(dir.path(), "PINA", "50,1000\n500\n");

        let store = ProfileStore::new(vec![dir.path().to_path_buf()]);
        let model = store.load("pina").unwrap().unwrap();
        assert_eq!(model.num_layers(), 2);
    }

    #[test]
    fn test_missing_station_is_none() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::new(vec![dir.path().to_path_buf(), dir.path().join("absent")]);

        assert!(store.find("XXXX").is_none());
        assert!(store.load("XXXX").unwrap().is_none());
        assert!(store.load("").unwrap().is_none());
    }

    #[test]
    fn test_malformed_table_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_profile(dir.path(), "BAD", "100\n200\n");

        let store = ProfileStore::new(vec![dir.path().to_path_buf()]);
        assert!(matches!(
            store.load("BAD"),
            Err(ProfileError::Syntax { line: 1, .. })
        ));
    }

    #[test]
    fn test_list() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write_profile(a.path(), "GILL", "100\n");
        write_profile(b.path(), "GILL", "100\n");
        write_profile(b.path(), "ISLL", "100\n");
        fs::write(b.path().join("notes.txt"), "").unwrap();
        fs::create_dir(b.path().join("res_model_DIR.txt")).unwrap();

        let store = ProfileStore::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        assert_eq!(store.list(), vec!["GILL".to_string(), "ISLL".to_string()]);
    }

    #[test]
    fn test_default_dirs_come_last() {
        let extra = PathBuf::from("/data/profiles");
        let store = ProfileStore::with_default_dirs([extra.clone()]);
        assert_eq!(store.dirs()[0], extra);
        assert_eq!(store.dirs().len(), 1 + default_dirs().len());
    }
}
