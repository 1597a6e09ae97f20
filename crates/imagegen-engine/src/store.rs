use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use imagegen_contracts::events::{EventLog, ToolEvent};
use imagegen_contracts::images::ImageDescriptor;
use imagegen_contracts::requests::DEFAULT_FILENAME;
use imagegen_contracts::{ImageGenError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, warn};

use crate::resolver::ImageResolver;

pub const MAX_FILENAME_LENGTH: usize = 64;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("filename pattern compiles"));

/// Collapses every run of unsafe characters to `_` and caps the length.
pub fn sanitize_filename(name: &str) -> String {
    let mut safe = UNSAFE_FILENAME_CHARS.replace_all(name, "_").into_owned();
    safe.truncate(MAX_FILENAME_LENGTH);
    safe
}

/// ISO-8601 UTC timestamp with `:` and `.` replaced so it is filename-safe.
pub fn filename_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Writes resolved images under one output directory.
pub struct ImageStore {
    resolver: ImageResolver,
    output_dir: PathBuf,
    events: EventLog,
    clock: Clock,
}

impl ImageStore {
    pub fn new(resolver: ImageResolver, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            output_dir: output_dir.into(),
            events: EventLog::disabled(),
            clock: Box::new(Utc::now),
        }
    }

    pub fn with_events(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Saves images one at a time and returns the paths that were written.
    ///
    /// A failure on one image is logged and skipped; only failing to create the
    /// output directory aborts the batch.
    pub fn save_images(&self, images: &[ImageDescriptor], base_filename: &str) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ImageGenError::FileWrite {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut saved = Vec::new();
        for (idx, image) in images.iter().enumerate() {
            let index = idx + 1;
            match self.save_image(image, base_filename, index) {
                Ok((path, size)) => {
                    info!("saved image #{index} to {}", path.display());
                    self.record(ToolEvent::ImageSaved {
                        index,
                        path: path.to_string_lossy().to_string(),
                        bytes: size,
                    });
                    saved.push(path);
                }
                Err(err) => {
                    error!(kind = err.kind(), "failed to save image #{index}: {err}");
                    self.record(ToolEvent::ImageSaveFailed {
                        index,
                        kind: err.kind().to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(saved)
    }

    fn save_image(
        &self,
        image: &ImageDescriptor,
        base_filename: &str,
        index: usize,
    ) -> Result<(PathBuf, usize)> {
        let resolved = self.resolver.resolve(image)?;
        let path = self.file_path(base_filename, resolved.extension, index);
        fs::write(&path, &resolved.bytes).map_err(|source| ImageGenError::FileWrite {
            path: path.clone(),
            source,
        })?;
        Ok((path, resolved.bytes.len()))
    }

    fn file_path(&self, base_filename: &str, extension: &str, index: usize) -> PathBuf {
        let base = if base_filename.is_empty() {
            DEFAULT_FILENAME
        } else {
            base_filename
        };
        let stamp = filename_timestamp((self.clock)());
        self.output_dir.join(format!(
            "{}_{stamp}_{index}.{extension}",
            sanitize_filename(base)
        ))
    }

    fn record(&self, event: ToolEvent) {
        if let Err(err) = self.events.record(&event) {
            warn!("event log write failed: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone, Utc};
    use imagegen_contracts::events::EventLog;
    use imagegen_contracts::images::ImageDescriptor;
    use imagegen_contracts::{ImageGenError, Result};
    use serde_json::Value;

    use super::{filename_timestamp, sanitize_filename, ImageStore};
    use crate::fetch::{FetchedImage, ImageFetcher};
    use crate::resolver::ImageResolver;

    struct NoNetwork;

    impl ImageFetcher for NoNetwork {
        fn fetch(&self, url: &str) -> Result<FetchedImage> {
            Err(ImageGenError::processing(format!("no network for {url}")))
        }
    }

    fn fixed_store(dir: &std::path::Path) -> ImageStore {
        ImageStore::new(ImageResolver::new(Box::new(NoNetwork)), dir).with_clock(|| {
            Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7)
                .single()
                .unwrap_or_default()
        })
    }

    #[test]
    fn sanitize_collapses_runs_and_truncates() {
        assert_eq!(sanitize_filename("file name!!"), "file_name_");
        assert_eq!(sanitize_filename("ok-name_1"), "ok-name_1");
        assert_eq!(sanitize_filename("../../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_filename("café au lait"), "caf_au_lait");
        let long = "a".repeat(100);
        assert_eq!(sanitize_filename(&long).len(), 64);
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn timestamp_has_no_colons_or_dots() {
        let at = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .unwrap_or_default();
        assert_eq!(filename_timestamp(at), "2024-01-02T03-04-05-000Z");
    }

    #[test]
    fn saves_into_created_directory_with_expected_name() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out = temp.path().join("nested").join("generated_images");
        let store = fixed_store(&out);

        let saved = store.save_images(
            &[ImageDescriptor::from_url("data:image/webp;base64,UklGRg==")],
            "my cat!",
        )?;

        assert_eq!(saved.len(), 1);
        assert_eq!(
            saved[0],
            out.join("my_cat__2025-03-04T05-06-07-000Z_1.webp")
        );
        assert_eq!(fs::read(&saved[0])?, b"RIFF");
        Ok(())
    }

    #[test]
    fn blank_base_name_uses_default() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = fixed_store(temp.path());
        let saved = store.save_images(&[ImageDescriptor::from_base64("AQID")], "")?;
        let name = saved[0]
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        assert_eq!(name, "generated_image_2025-03-04T05-06-07-000Z_1.png");
        Ok(())
    }

    #[test]
    fn one_failed_write_does_not_stop_the_batch() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("events.jsonl");
        let out = temp.path().join("out");
        let store = fixed_store(&out).with_events(EventLog::with_session(&events_path, "s1"));

        // A directory squatting on the second target path makes that write fail.
        fs::create_dir_all(out.join("batch_2025-03-04T05-06-07-000Z_2.png"))?;

        let images = vec![
            ImageDescriptor::from_base64("AQID"),
            ImageDescriptor::from_base64("BAUG"),
            ImageDescriptor::from_base64("BwgJ"),
        ];
        let saved = store.save_images(&images, "batch")?;

        assert_eq!(
            saved,
            vec![
                out.join("batch_2025-03-04T05-06-07-000Z_1.png"),
                out.join("batch_2025-03-04T05-06-07-000Z_3.png"),
            ]
        );
        assert_eq!(fs::read(&saved[1])?, vec![7, 8, 9]);

        let events: Vec<Value> = fs::read_to_string(&events_path)?
            .lines()
            .map(serde_json::from_str)
            .collect::<std::result::Result<_, _>>()?;
        let types: Vec<&str> = events
            .iter()
            .filter_map(|event| event["type"].as_str())
            .collect();
        assert_eq!(types, vec!["image_saved", "image_save_failed", "image_saved"]);
        assert_eq!(events[1]["kind"], "file_write_failure");
        assert_eq!(events[1]["index"], 2);
        Ok(())
    }

    #[test]
    fn unresolvable_image_is_skipped() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = fixed_store(temp.path());
        let images = vec![
            ImageDescriptor::default(),
            ImageDescriptor::from_url("https://cdn/a.png"),
            ImageDescriptor::from_base64("AQID"),
        ];
        let saved = store.save_images(&images, "mixed")?;
        assert_eq!(saved.len(), 1);
        assert!(saved[0].to_string_lossy().ends_with("_3.png"));
        Ok(())
    }

    #[test]
    fn uncreatable_directory_fails_the_batch() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"not a dir")?;
        let store = fixed_store(&blocker.join("out"));
        let result = store.save_images(&[ImageDescriptor::from_base64("AQID")], "x");
        assert!(matches!(result, Err(ImageGenError::FileWrite { .. })));
        Ok(())
    }
}
