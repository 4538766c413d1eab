use bdx_core::{BagError, Result, Segment, SegmentId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Parse the sequence number embedded in a segment filename.
///
/// The name must be `<prefix>_<digits>.<extension>` with the digits directly
/// before the extension, e.g. `bag_12.db3`.
///
/// # Errors
/// Returns [`BagError::MalformedSegmentName`] for any other shape, including
/// a number that does not fit in a `u64`.
pub fn segment_id(path: &Path) -> Result<SegmentId> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let malformed = || BagError::MalformedSegmentName { name: name.clone() };

    // Format: {prefix}_{id}.{ext}
    let stem = match (path.file_stem(), path.extension()) {
        (Some(stem), Some(_)) => stem.to_str().ok_or_else(malformed)?,
        _ => return Err(malformed()),
    };
    let (prefix, digits) = stem.rsplit_once('_').ok_or_else(malformed)?;

    if prefix.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    digits
        .parse::<u64>()
        .map(SegmentId::new)
        .map_err(|_| malformed())
}

/// Sort discovered segment paths by their embedded sequence number.
///
/// The input order is irrelevant. Every path must carry a parseable id and
/// no two paths may share one.
///
/// # Errors
/// Returns [`BagError::MalformedSegmentName`] for the first unparseable name
/// and [`BagError::DuplicateSegmentId`] when two files map to the same id.
pub fn order_segments(paths: Vec<PathBuf>) -> Result<Vec<Segment>> {
    let mut seen: HashMap<SegmentId, String> = HashMap::with_capacity(paths.len());
    let mut segments = Vec::with_capacity(paths.len());

    for path in paths {
        let id = segment_id(&path)?;
        let segment = Segment::new(id, path);

        if let Some(first) = seen.insert(id, segment.file_name()) {
            let mut names = [first, segment.file_name()];
            names.sort();
            let [first, second] = names;
            return Err(BagError::DuplicateSegmentId {
                id: id.get(),
                first,
                second,
            });
        }

        segments.push(segment);
    }

    segments.sort_by_key(|s| s.id);
    Ok(segments)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bdx_core::ErrorKind;
    use proptest::prelude::*;

    fn names(segments: &[Segment]) -> Vec<String> {
        segments.iter().map(Segment::file_name).collect()
    }

    #[test]
    fn test_segment_id_parsing() {
        assert_eq!(segment_id(Path::new("bag_0.db3")).unwrap().get(), 0);
        assert_eq!(segment_id(Path::new("/data/run/run_42.db3")).unwrap().get(), 42);
        assert_eq!(segment_id(Path::new("my_long_name_007.seg")).unwrap().get(), 7);
    }

    #[test]
    fn test_segment_id_rejects_malformed() {
        for name in [
            "bag_x.seg",
            "bag.seg",
            "bag_.seg",
            "_3.seg",
            "bag_3",
            "bag_3a.seg",
            "bag_-1.seg",
            "bag_99999999999999999999999.seg",
        ] {
            let err = segment_id(Path::new(name)).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::MalformedSegmentName, "{name}");
        }
    }

    #[test]
    fn test_order_numeric_not_lexical() {
        let paths = vec![
            PathBuf::from("bag_10.db3"),
            PathBuf::from("bag_2.db3"),
            PathBuf::from("bag_1.db3"),
            PathBuf::from("bag_0.db3"),
        ];

        let ordered = order_segments(paths).unwrap();
        assert_eq!(
            names(&ordered),
            vec!["bag_0.db3", "bag_1.db3", "bag_2.db3", "bag_10.db3"]
        );
    }

    #[test]
    fn test_order_fails_on_single_malformed_name() {
        let paths = vec![
            PathBuf::from("bag_0.seg"),
            PathBuf::from("bag_x.seg"),
            PathBuf::from("bag_1.seg"),
        ];

        let err = order_segments(paths).err().unwrap();
        assert!(matches!(err, BagError::MalformedSegmentName { ref name } if name == "bag_x.seg"));
    }

    #[test]
    fn test_order_rejects_duplicate_ids() {
        let paths = vec![PathBuf::from("bag_1.db3"), PathBuf::from("other_01.db3")];

        match order_segments(paths).err().unwrap() {
            BagError::DuplicateSegmentId { id, first, second } => {
                assert_eq!(id, 1);
                assert_eq!(first, "bag_1.db3");
                assert_eq!(second, "other_01.db3");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_order_empty() {
        assert!(order_segments(Vec::new()).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_order_is_strictly_ascending(
            ids in proptest::collection::hash_set(0u64..1_000_000, 0..64),
            seed in any::<u64>(),
        ) {
            let mut paths: Vec<PathBuf> = ids
                .iter()
                .map(|id| PathBuf::from(format!("rec_{id}.seg")))
                .collect();
            // Deterministic shuffle driven by the seed.
            let len = paths.len();
            if len > 1 {
                let mut state = seed;
                for i in (1..len).rev() {
                    state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                    let j = usize::try_from(state % (i as u64 + 1)).unwrap();
                    paths.swap(i, j);
                }
            }

            let ordered = order_segments(paths).unwrap();
            prop_assert_eq!(ordered.len(), ids.len());
            for pair in ordered.windows(2) {
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }
}
