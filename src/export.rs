//! Output files of a finished session and reloading of the polygon record.
//!
//! The record maps stringified positional indices to polygons:
//! `{ "0": { "label": "...", "points": [[x, y], ...] }, ... }`.

use image::RgbImage;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::AnnotateError;
use crate::model::{Polygon, PolygonSet};

const OUTPUT_PREFIX: &str = "(performance_tool)-";

/// Where the overlay image and the record of one session are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTargets {
    output_dir: PathBuf,
    stem: String,
}

impl OutputTargets {
    pub fn new(image_path: &Path, output_dir: &Path) -> Self {
        let stem = image_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        Self {
            output_dir: output_dir.to_path_buf(),
            stem,
        }
    }

    pub fn image_path(&self) -> PathBuf {
        self.output_dir.join(format!("{OUTPUT_PREFIX}{}.png", self.stem))
    }

    pub fn record_path(&self) -> PathBuf {
        self.output_dir.join(format!("{OUTPUT_PREFIX}{}.json", self.stem))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReport {
    pub image_path: PathBuf,
    pub record_path: PathBuf,
    pub polygon_count: usize,
}

struct Record<'a>(&'a [Polygon]);

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0
                .iter()
                .enumerate()
                .map(|(index, polygon)| (index.to_string(), polygon)),
        )
    }
}

/// Index/polygon pairs in the order they appear in the document. Repeated
/// keys are kept so they can be reported.
struct RecordEntries(Vec<(usize, Polygon)>);

impl<'de> Deserialize<'de> for RecordEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RecordEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from positional index to polygon")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<usize, Polygon>()? {
                    entries.push(entry);
                }
                Ok(RecordEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn encode_record(polygons: &[Polygon]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    Record(polygons).serialize(&mut ser)?;
    Ok(buf)
}

/// Renders the record as JSON indented with four spaces.
pub fn record_to_string(polygons: &[Polygon]) -> Result<String, AnnotateError> {
    let buf = encode_record(polygons).map_err(AnnotateError::RecordEncode)?;
    Ok(String::from_utf8(buf)?)
}

/// Parses a record back into polygons in commit order. Keys must be
/// exactly `"0"..="n-1"`, each appearing once.
pub fn parse_record(json: &str) -> Result<Vec<Polygon>, AnnotateError> {
    let RecordEntries(mut entries) = serde_json::from_str(json)?;
    entries.sort_by_key(|(index, _)| *index);
    if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(AnnotateError::InvalidRecord(format!(
            "index {} appears more than once",
            pair[0].0
        )));
    }
    let mut polygons = Vec::with_capacity(entries.len());
    for (expected, (index, polygon)) in entries.into_iter().enumerate() {
        if index != expected {
            return Err(AnnotateError::InvalidRecord(format!(
                "expected index {expected}, found {index}"
            )));
        }
        polygons.push(polygon);
    }
    Ok(polygons)
}

pub fn load_record(path: &Path) -> Result<Vec<Polygon>, AnnotateError> {
    let json = std::fs::read_to_string(path)?;
    parse_record(&json)
}

/// Writes the overlay PNG, then the JSON record. No rollback if the second
/// write fails.
pub fn write_outputs(
    targets: &OutputTargets,
    overlay: &RgbImage,
    polygons: &PolygonSet,
) -> Result<ExportReport, AnnotateError> {
    let image_path = targets.image_path();
    overlay
        .save_with_format(&image_path, image::ImageFormat::Png)
        .map_err(|source| AnnotateError::ImageWrite {
            path: image_path.clone(),
            source,
        })?;
    log::info!("wrote overlay {}", image_path.display());

    let record_path = targets.record_path();
    let json = encode_record(polygons.as_slice()).map_err(|source| {
        AnnotateError::RecordWrite {
            path: record_path.clone(),
            source,
        }
    })?;
    std::fs::write(&record_path, json).map_err(|source| AnnotateError::FileWrite {
        path: record_path.clone(),
        source,
    })?;
    log::info!(
        "wrote {} polygon(s) to {}",
        polygons.len(),
        record_path.display()
    );

    Ok(ExportReport {
        image_path,
        record_path,
        polygon_count: polygons.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    fn poly(label: &str, raw: &[(i32, i32)]) -> Polygon {
        Polygon::new(label, raw.iter().copied().map(Point::from).collect()).unwrap()
    }

    #[test]
    fn target_paths_use_prefix_and_stem() {
        let t = OutputTargets::new(Path::new("/data/img/scene.v2.jpg"), Path::new("/out"));
        assert_eq!(t.image_path(), PathBuf::from("/out/(performance_tool)-scene.v2.png"));
        assert_eq!(t.record_path(), PathBuf::from("/out/(performance_tool)-scene.v2.json"));
    }

    #[test]
    fn empty_record_is_empty_object() {
        assert_eq!(record_to_string(&[]).unwrap(), "{}");
        assert!(parse_record("{}").unwrap().is_empty());
    }

    #[test]
    fn record_layout_matches_expected_text() {
        let json = record_to_string(&[poly("box", &[(10, 10), (50, 10), (50, 50)])]).unwrap();
        let expected = r#"{
    "0": {
        "label": "box",
        "points": [
            [
                10,
                10
            ],
            [
                50,
                10
            ],
            [
                50,
                50
            ]
        ]
    }
}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn keys_keep_commit_order_past_ten() {
        let polys: Vec<Polygon> = (0..12)
            .map(|i| poly(&format!("p{i}"), &[(i, 0), (i + 1, 0), (i, 1)]))
            .collect();
        let json = record_to_string(&polys).unwrap();
        let pos2 = json.find("\"2\"").unwrap();
        let pos10 = json.find("\"10\"").unwrap();
        assert!(pos2 < pos10);
        assert_eq!(parse_record(&json).unwrap(), polys);
    }

    #[test]
    fn gap_in_indices_is_rejected() {
        let json = r#"{"0":{"label":"a","points":[[0,0],[1,0],[0,1]]},
                       "2":{"label":"b","points":[[0,0],[1,0],[0,1]]}}"#;
        assert!(matches!(
            parse_record(json),
            Err(AnnotateError::InvalidRecord(_))
        ));
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let json = r#"{"0":{"label":"a","points":[[0,0],[1,0],[0,1]]},
                       "0":{"label":"b","points":[[0,0],[1,0],[0,1]]}}"#;
        match parse_record(json) {
            Err(AnnotateError::InvalidRecord(msg)) => assert!(msg.contains("index 0"), "{msg}"),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[test]
    fn record_write_failure_names_the_record_path() {
        let dir = tempfile::tempdir().unwrap();
        let targets = OutputTargets::new(Path::new("scene.png"), dir.path());
        // a directory where the record should go makes only the second write fail
        std::fs::create_dir(targets.record_path()).unwrap();
        let overlay = RgbImage::new(4, 4);

        let err = write_outputs(&targets, &overlay, &PolygonSet::new()).unwrap_err();
        match err {
            AnnotateError::FileWrite { path, .. } => assert_eq!(path, targets.record_path()),
            other => panic!("expected FileWrite, got {other:?}"),
        }
        assert!(targets.image_path().is_file());
    }

    #[test]
    fn short_polygon_is_rejected() {
        let json = r#"{"0":{"label":"a","points":[[0,0],[1,0]]}}"#;
        assert!(matches!(parse_record(json), Err(AnnotateError::RecordParse(_))));
    }
}
