/// Volume enumeration
///
/// Resolves the target set of volumes for a run. Pure query, no side
/// effects: a bad selection (unknown volume, empty explicit list) fails the
/// run before any snapshot or mount state exists.
use crate::config::types::{Result, SnapbackError, Volume, VolumeSelection};
use crate::platform::VolumeStore;
use log::info;

/// Resolve the selection against the volume store.
///
/// The returned order is the store's order; mount ordering does not depend
/// on it because destination parent chains are created recursively.
pub fn enumerate(store: &dyn VolumeStore, selection: &VolumeSelection) -> Result<Vec<Volume>> {
    let volumes = store.list_volumes(selection)?;
    if volumes.is_empty() {
        return Err(SnapbackError::VolumeQuery(
            "selection resolved to no volumes".to_string(),
        ));
    }
    info!("resolved {} volume(s) to process", volumes.len());
    Ok(volumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FixedStore(Vec<Volume>);

    impl VolumeStore for FixedStore {
        fn list_volumes(&self, selection: &VolumeSelection) -> Result<Vec<Volume>> {
            match selection {
                VolumeSelection::All => Ok(self.0.clone()),
                VolumeSelection::Explicit(names)
                | VolumeSelection::ExplicitRecursive(names) => {
                    let mut out = Vec::new();
                    for name in names {
                        match self.0.iter().find(|v| &v.name == name) {
                            Some(v) => out.push(v.clone()),
                            None => {
                                return Err(SnapbackError::VolumeQuery(format!(
                                    "dataset does not exist: {}",
                                    name
                                )))
                            }
                        }
                    }
                    Ok(out)
                }
            }
        }

        fn create_snapshot(&self, _: &str, _: &str) -> Result<()> {
            unreachable!("enumeration must not create snapshots")
        }

        fn list_snapshots(&self) -> Result<Vec<String>> {
            unreachable!("enumeration must not list snapshots")
        }

        fn destroy_snapshot(&self, _: &str) -> Result<()> {
            unreachable!("enumeration must not destroy snapshots")
        }
    }

    fn store() -> FixedStore {
        FixedStore(vec![
            Volume {
                name: "tank/a".to_string(),
                mountpoint: Some(PathBuf::from("/a")),
            },
            Volume {
                name: "tank/b".to_string(),
                mountpoint: None,
            },
        ])
    }

    #[test]
    fn test_enumerate_explicit() {
        let volumes = enumerate(
            &store(),
            &VolumeSelection::Explicit(vec!["tank/a".to_string()]),
        )
        .unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name, "tank/a");
    }

    #[test]
    fn test_enumerate_unknown_volume_fails() {
        let err = enumerate(
            &store(),
            &VolumeSelection::Explicit(vec!["tank/missing".to_string()]),
        )
        .unwrap_err();
        assert!(matches!(err, SnapbackError::VolumeQuery(_)));
    }

    #[test]
    fn test_enumerate_all() {
        let volumes = enumerate(&store(), &VolumeSelection::All).unwrap();
        assert_eq!(volumes.len(), 2);
    }

    #[test]
    fn test_empty_resolution_is_an_error() {
        let empty = FixedStore(Vec::new());
        assert!(enumerate(&empty, &VolumeSelection::All).is_err());
    }
}
